/*
 * model configuration document (§4.4) - loaded from a plain YAML file via serde_yaml. Much
 * simpler than the teacher's `odin_config` (RON + XDG search path + optional encryption at rest);
 * this system's configuration is a single per-model file with no secrets in it, so a direct
 * `serde_yaml::from_reader` is the whole loader (see DESIGN.md).
 */
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::errors::Result;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub metadata: ModelMetadata,
    pub schedule: ScheduleConfig,
    pub download: DownloadConfig,
    pub variables: Vec<VariableConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelMetadata {
    pub id: String,
    pub source_agency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    pub lead_minutes: i64,
    pub interval_hours: i64,
    pub all_cycles: BTreeSet<u32>,
    pub cycle_configs: CycleConfigs,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CycleConfigs {
    pub long_run: CycleRunConfig,
    pub short_run: CycleRunConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CycleRunConfig {
    pub applies_to_hours: BTreeSet<u32>,
    pub forecast_hours: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    pub fhour_digits: u32,
    pub url_template: String,
    pub url_variable_template: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariableConfig {
    pub internal_id: String,
    pub grib_id: String,
    pub grib_level: String,
    pub url_id: String,
    pub url_level: String,
    #[serde(default)]
    pub formula: Option<String>,
    /// forecast hours to omit this variable from, if any
    #[serde(default)]
    pub skip: Option<BTreeSet<u32>>,
}

impl ModelConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let config: ModelConfig = serde_yaml::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    pub fn from_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
metadata:
  id: hrdps
  source_agency: NOMADS
schedule:
  lead_minutes: 180
  interval_hours: 6
  all_cycles: [0, 6, 12, 18]
  cycle_configs:
    long_run:
      applies_to_hours: [0, 12]
      forecast_hours: 48
    short_run:
      applies_to_hours: [6, 18]
      forecast_hours: 18
download:
  fhour_digits: 3
  url_template: "https://example.test/${yyyymmdd}/${hh}/forecast.t${hh}z.f${fhour}"
  url_variable_template: "var=${url_id}&lev_${url_level}=on"
variables:
  - internal_id: temp_2m
    grib_id: TMP
    grib_level: "2 m above ground"
    url_id: TMP
    url_level: "2_m_above_ground"
    formula: "x - 273.15"
"#;

    #[test]
    fn parses_full_sample_document() {
        let config = ModelConfig::from_str(SAMPLE).unwrap();
        assert_eq!(config.metadata.id, "hrdps");
        assert_eq!(config.schedule.all_cycles.len(), 4);
        assert_eq!(config.schedule.cycle_configs.long_run.forecast_hours, 48);
        assert_eq!(config.variables[0].internal_id, "temp_2m");
        assert!(config.variables[0].skip.is_none());
    }
}
