/*
 * wepx_model - model configuration (§4.4): YAML config document, forecast-duration lookup,
 * cycle-readiness scheduler and per-cycle URL generation.
 */
#![allow(unused)]

pub mod config;
pub mod errors;
pub mod schedule;
pub mod urls;

pub use config::{CycleConfigs, CycleRunConfig, DownloadConfig, ModelConfig, ModelMetadata, ScheduleConfig, VariableConfig};
pub use errors::{Result, WepxModelError};
pub use schedule::CycleStatus;
