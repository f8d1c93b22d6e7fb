/*
 * wepx_run - the run orchestrator (C5): downloader (§4.8), restricted per-pixel formula
 * evaluator (§9), process-level cycle lock (§3 "Lock record", §4.5 step 1), and the pipeline that
 * ties a ready model cycle to the codec/stream crates below it.
 */
#![allow(unused)]

pub mod downloader;
pub mod errors;
pub mod formula;
pub mod lock;
pub mod pipeline;

pub use downloader::{download, DownloadOptions};
pub use errors::{Result, WepxRunError};
pub use formula::Formula;
pub use lock::CycleLock;
pub use pipeline::{run_cycle, FrameAppended, OrchestratorConfig};
