/*
 * wepx - the CLI/entry loop (C7, §4, §6 "Environment / CLI"): a periodic tick that checks every
 * configured model's schedule and fans out READY cycles to a worker pool. Generalizes the
 * teacher's `odin_hrrr::run_downloads` periodic loop (a single hardcoded HRRR config) to many
 * independently-scheduled models running concurrently, with `tokio::spawn` standing in for the
 * "process pool" §5 describes - each spawned task is independent, shares no per-stream state with
 * any other, and the cycle lock file (not shared memory) is still the only thing that keeps two
 * workers from double-processing the same cycle (see DESIGN.md).
 */
#![allow(unused)]

pub mod errors;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;
use tracing::{error, info, warn};

use wepx_action::NoDataAction;
use wepx_model::{CycleStatus, ModelConfig};
use wepx_run::{run_cycle, CycleLock, DownloadOptions, OrchestratorConfig};

pub use errors::{Result, WepxError};

/// how long to wait, past a cycle's lead time, before giving up on it (§4.4 `check_status`'s
/// `max_wait_minutes`).
const DEFAULT_MAX_WAIT_MINUTES: i64 = 120;

/// stale lock files older than this are assumed to be left behind by a crashed worker and are
/// removed on startup (§9 design notes).
const STALE_LOCK_MAX_AGE: Duration = Duration::from_secs(6 * 3600);

pub struct RunnerConfig {
    pub models_dir: PathBuf,
    pub out_root: PathBuf,
    pub lockdir: PathBuf,
    pub tick_interval: Duration,
    pub max_wait_minutes: i64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            models_dir: PathBuf::from("models"),
            out_root: PathBuf::from("data"),
            lockdir: PathBuf::from("locks"),
            tick_interval: Duration::from_secs(10),
            max_wait_minutes: DEFAULT_MAX_WAIT_MINUTES,
        }
    }
}

pub struct Runner {
    cfg: RunnerConfig,
    models: Vec<ModelConfig>,
    client: Client,
}

impl Runner {
    /// load every `*.yaml`/`*.yml` model config found directly under `cfg.models_dir`.
    pub fn load(cfg: RunnerConfig) -> Result<Self> {
        let mut models = Vec::new();
        for entry in std::fs::read_dir(&cfg.models_dir)? {
            let entry = entry?;
            let path = entry.path();
            let is_yaml = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e == "yaml" || e == "yml");
            if path.is_file() && is_yaml {
                models.push(ModelConfig::load(&path)?);
            }
        }
        info!(n_models = models.len(), dir = %cfg.models_dir.display(), "loaded model configs");
        Ok(Runner { cfg, models, client: Client::new() })
    }

    /// remove stale cycle locks, then tick forever at `cfg.tick_interval` (§6: "a loop-forever
    /// entry invokes the scheduler every 10 seconds and fans out READY cycles to a process
    /// pool").
    pub async fn run_forever(&self) -> Result<()> {
        if let Err(e) = CycleLock::clean_stale(&self.cfg.lockdir, STALE_LOCK_MAX_AGE) {
            warn!(error = %e, "failed to clean stale lock files");
        }

        let mut interval = tokio::time::interval(self.cfg.tick_interval);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// one scheduler pass (§4.4/§4.5): check every model's status, and for each READY one spawn
    /// an independent worker task to drive its cycle. Workers never share in-memory state -
    /// §5's "process-level fan-out" is realized here as one task per (model, cycle).
    pub async fn tick(&self) {
        let now = Utc::now();
        let mut handles = Vec::new();

        for model in &self.models {
            match model.check_status(now, self.cfg.max_wait_minutes) {
                CycleStatus::Ready(cycle_time) => {
                    info!(model = %model.metadata.id, %cycle_time, "cycle ready, dispatching worker");
                    let orchestrator_cfg = OrchestratorConfig {
                        out_root: self.cfg.out_root.clone(),
                        lockdir: self.cfg.lockdir.clone(),
                        download_opts: DownloadOptions::default(),
                    };
                    let model = model.clone();
                    let client = self.client.clone();
                    handles.push(tokio::spawn(async move {
                        let frame_action = NoDataAction::new();
                        if let Err(e) = run_cycle(&client, &orchestrator_cfg, &model, cycle_time, &frame_action).await {
                            error!(model = %model.metadata.id, %cycle_time, error = %e, "cycle failed");
                        }
                    }));
                }
                CycleStatus::Waiting(cycle_time) => {
                    info!(model = %model.metadata.id, %cycle_time, "cycle waiting for lead time");
                }
                CycleStatus::Missed(cycle_time) => {
                    warn!(model = %model.metadata.id, %cycle_time, "cycle missed its wait window");
                }
                CycleStatus::NoCycle => {}
            }
        }

        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_ten_second_tick() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.tick_interval, Duration::from_secs(10));
    }
}
