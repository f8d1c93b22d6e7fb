/*
 * generate_urls (§4.4). Template placeholders follow the `${name}` convention the teacher's own
 * schedule fetch already uses (odin_hrrr/src/schedule.rs: `url_template.replace("${yyyyMMdd}", ...)`).
 */
use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::config::{ModelConfig, VariableConfig};

impl ModelConfig {
    /// one URL per forecast hour (NOMADS: all matching variables' query fragments joined with
    /// `&` onto the base template) or one URL per (forecast_hour, variable) pair otherwise,
    /// honoring each variable's `skip` list.
    pub fn generate_urls(&self, cycle_time: DateTime<Utc>) -> Vec<String> {
        let duration = self.forecast_duration(cycle_time.hour());
        let is_nomads = self.metadata.source_agency.eq_ignore_ascii_case("NOMADS");

        let mut urls = Vec::new();
        for fh in 0..=duration {
            let fhour = format_fhour(fh, self.download.fhour_digits);
            let active_vars: Vec<&VariableConfig> =
                self.variables.iter().filter(|v| !v.skip.as_ref().is_some_and(|s| s.contains(&fh))).collect();

            if active_vars.is_empty() {
                continue;
            }

            if is_nomads {
                let base = substitute(&self.download.url_template, cycle_time, &fhour, None);
                let fragments: Vec<String> = active_vars
                    .iter()
                    .map(|v| substitute(&self.download.url_variable_template, cycle_time, &fhour, Some(v)))
                    .collect();
                urls.push(format!("{base}{}", fragments.join("&")));
            } else {
                for v in active_vars {
                    urls.push(substitute(&self.download.url_template, cycle_time, &fhour, Some(v)));
                }
            }
        }
        urls
    }
}

fn format_fhour(fh: u32, digits: u32) -> String {
    format!("{:0width$}", fh, width = digits as usize)
}

fn substitute(template: &str, cycle_time: DateTime<Utc>, fhour: &str, var: Option<&VariableConfig>) -> String {
    let yyyymmdd = format!("{:04}{:02}{:02}", cycle_time.year(), cycle_time.month(), cycle_time.day());
    let hh = format!("{:02}", cycle_time.hour());

    let mut out = template.replace("${yyyymmdd}", &yyyymmdd).replace("${hh}", &hh).replace("${fhour}", fhour);

    if let Some(v) = var {
        out = out.replace("${url_id}", &v.url_id).replace("${url_level}", &v.url_level);
    }
    out
}
