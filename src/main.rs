use clap::Parser;
use agency_portal::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL and JWT_SECRET can live there
    let _ = dotenvy::dotenv();
    cli::init_logging();

    let cli = Cli::parse();
    if let Err(e) = cli::run(cli).await {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
