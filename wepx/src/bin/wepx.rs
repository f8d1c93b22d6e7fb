use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use wepx::{Result, Runner, RunnerConfig};

#[derive(Parser, Debug)]
#[command(about = "wepx model-run scheduler: discovers ready model cycles and streams their frames to .wepx files")]
struct Args {
    /// directory of per-model YAML config files
    #[arg(long, default_value = "models")]
    models_dir: PathBuf,

    /// output root for `.wepx` stream files
    #[arg(long, default_value = "data")]
    out: PathBuf,

    /// directory for cycle lock files
    #[arg(long, default_value = "locks")]
    lockdir: PathBuf,

    /// seconds between scheduler ticks
    #[arg(long, default_value_t = 10)]
    tick_seconds: u64,

    /// minutes past a cycle's lead time before it is considered missed
    #[arg(long, default_value_t = 120)]
    max_wait_minutes: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = RunnerConfig {
        models_dir: args.models_dir,
        out_root: args.out,
        lockdir: args.lockdir,
        tick_interval: Duration::from_secs(args.tick_seconds),
        max_wait_minutes: args.max_wait_minutes,
    };

    let runner = Runner::load(cfg)?;
    runner.run_forever().await
}
