/*
 * forecast_duration / check_status (§4.4). Unlike the teacher's HRRR-specific schedule estimator
 * (odin_hrrr::schedule, which derives per-forecast-hour delays from a directory listing), this
 * scheduler just walks backward from the current hour over a model's configured cycle hours - the
 * spec's scheduling model needs no statistics, only the READY/WAITING/MISSED state machine.
 */
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};

use wepx_common::datetime::full_hour;

use crate::config::ModelConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleStatus {
    Ready(DateTime<Utc>),
    Waiting(DateTime<Utc>),
    Missed(DateTime<Utc>),
    NoCycle,
}

/// how many hours back `check_status` scans looking for a candidate cycle.
const LOOKBACK_HOURS: i64 = 24;

impl ModelConfig {
    /// §4.4: `long_run.forecast_hours` if `cycle_hour` is in `long_run.applies_to_hours`, else
    /// `short_run.forecast_hours` if in `short_run.applies_to_hours`, else 0.
    pub fn forecast_duration(&self, cycle_hour: u32) -> u32 {
        let cfg = &self.schedule.cycle_configs;
        if cfg.long_run.applies_to_hours.contains(&cycle_hour) {
            cfg.long_run.forecast_hours
        } else if cfg.short_run.applies_to_hours.contains(&cycle_hour) {
            cfg.short_run.forecast_hours
        } else {
            0
        }
    }

    /// scan backward from `floor_to_hour(now_utc)` over up to 24 candidate hours, returning the
    /// first READY cycle found, else the closest WAITING, else the closest MISSED, else NoCycle.
    pub fn check_status(&self, now_utc: DateTime<Utc>, max_wait_minutes: i64) -> CycleStatus {
        let floor = full_hour(now_utc);
        let mut first_waiting = None;
        let mut first_missed = None;

        for back in 0..LOOKBACK_HOURS {
            let candidate = floor - ChronoDuration::hours(back);
            if !self.schedule.all_cycles.contains(&candidate.hour()) {
                continue;
            }

            let start = candidate + ChronoDuration::minutes(self.schedule.lead_minutes);
            let end = start + ChronoDuration::minutes(max_wait_minutes);

            if start <= now_utc && now_utc <= end {
                return CycleStatus::Ready(candidate);
            } else if now_utc < start {
                first_waiting.get_or_insert(candidate);
            } else {
                first_missed.get_or_insert(candidate);
            }
        }

        if let Some(c) = first_waiting {
            CycleStatus::Waiting(c)
        } else if let Some(c) = first_missed {
            CycleStatus::Missed(c)
        } else {
            CycleStatus::NoCycle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CycleConfigs, CycleRunConfig, DownloadConfig, ModelMetadata, ScheduleConfig};
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn sample_config() -> ModelConfig {
        ModelConfig {
            metadata: ModelMetadata { id: "hrdps".into(), source_agency: "NOMADS".into() },
            schedule: ScheduleConfig {
                lead_minutes: 30,
                interval_hours: 6,
                all_cycles: BTreeSet::from([0, 6, 12, 18]),
                cycle_configs: CycleConfigs {
                    long_run: CycleRunConfig { applies_to_hours: BTreeSet::from([0, 12]), forecast_hours: 48 },
                    short_run: CycleRunConfig { applies_to_hours: BTreeSet::from([6, 18]), forecast_hours: 18 },
                },
            },
            download: DownloadConfig { fhour_digits: 3, url_template: String::new(), url_variable_template: String::new() },
            variables: vec![],
        }
    }

    #[test]
    fn forecast_duration_picks_long_run_short_run_or_zero() {
        let config = sample_config();
        assert_eq!(config.forecast_duration(0), 48);
        assert_eq!(config.forecast_duration(6), 18);
        assert_eq!(config.forecast_duration(3), 0);
    }

    #[test]
    fn s5_ready_cycle_found_at_lead_plus_window() {
        let config = sample_config();
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 12, 45, 0).unwrap();
        let status = config.check_status(now, 60);
        assert_eq!(status, CycleStatus::Ready(Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap()));
    }

    #[test]
    fn waiting_when_lead_has_not_elapsed_yet() {
        let config = sample_config();
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 12, 10, 0).unwrap();
        let status = config.check_status(now, 60);
        assert_eq!(status, CycleStatus::Waiting(Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap()));
    }

    #[test]
    fn missed_once_wait_window_has_passed() {
        let config = sample_config();
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 14, 0, 0).unwrap();
        let status = config.check_status(now, 60);
        assert_eq!(status, CycleStatus::Missed(Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap()));
    }

    #[test]
    fn ready_wins_even_when_an_earlier_cycle_would_be_missed() {
        let config = sample_config();
        // 12:45 -> cycle 12 is READY (start=12:30,end=13:30); cycle 6 would otherwise be MISSED.
        let now = Utc.with_ymd_and_hms(2026, 7, 28, 12, 45, 0).unwrap();
        assert_eq!(config.check_status(now, 60), CycleStatus::Ready(Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap()));
    }
}
