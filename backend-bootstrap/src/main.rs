use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "hemolink-backend")]
#[command(about = "Hemolink Blood Shortage Alert Engine", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var("HEMOLINK_CONFIG", config);
    }

    backend_bootstrap::run().await
}
