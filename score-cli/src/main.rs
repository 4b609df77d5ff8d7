mod commands;

use clap::Parser;

#[derive(Debug, clap::Parser)]
#[command(name = "zkscore", about = "Zero-knowledge credit-score witness pipeline")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    cli.command.run().await
}
