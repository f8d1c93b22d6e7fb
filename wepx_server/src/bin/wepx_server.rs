use clap::Parser;

use wepx_server::{Result, TailStreamingServer};

#[derive(Parser, Debug)]
#[command(about = "wepx tail-streaming server")]
struct Args {
    /// address to listen on
    #[arg(short, long, default_value = "0.0.0.0:9011")]
    listen: String,

    /// root directory under which `.wepx` stream files live
    #[arg(short, long, default_value = "data")]
    data_root: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let server = TailStreamingServer::bind(&args.listen, args.data_root).await?;
    server.serve().await
}
