use std::net::SocketAddr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::config;
use crate::database::DatabaseManager;
use crate::services::user_service::UserInput;
use crate::services::UserService;

#[derive(Parser)]
#[command(name = "agency-portal")]
#[command(about = "Agency Portal - business-management API for an influencer-marketing agency")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API server (default)")]
    Serve {
        #[arg(long, help = "Override the configured listen port")]
        port: Option<u16>,
    },

    #[command(about = "Apply pending database migrations and exit")]
    Migrate,

    #[command(about = "Create a portal user, typically the first admin")]
    CreateUser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "AGENCY_USER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "admin")]
        role: String,
    },
}

/// Text logs in development, JSON when `LOG_FORMAT=json` or the profile asks
/// for it. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if config().server.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config();
    DatabaseManager::init(&config.database).context("failed to create database pool")?;

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => serve(port).await,
        Commands::Migrate => {
            DatabaseManager::migrate().await?;
            Ok(())
        }
        Commands::CreateUser { email, name, password, role } => {
            let input = UserInput {
                name: Some(name),
                email: Some(email),
                password: Some(password),
                role: Some(role),
                is_active: Some(true),
            };
            let user = UserService::new()?.create(input).await?;
            println!("Created {} user {} ({})", user.role, user.email, user.id);
            Ok(())
        }
    }
}

async fn serve(port: Option<u16>) -> anyhow::Result<()> {
    let config = config();
    tracing::info!("Starting Agency Portal in {:?} mode", config.environment);
    if crate::is_production!() && config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in production");
    }

    if config.database.run_migrations {
        // The server still starts when the database is unreachable; /health reports it
        if let Err(e) = DatabaseManager::migrate().await {
            tracing::error!(error = %e, "Migrations failed");
        }
    }

    crate::jobs::spawn_overdue_sweep(config.billing.overdue_sweep_secs);

    let bind_addr = format!("{}:{}", config.server.host, port.unwrap_or(config.server.port));
    let addr: SocketAddr = bind_addr.parse().with_context(|| format!("invalid listen address {bind_addr}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("Agency Portal listening on http://{}", addr);

    axum::serve(listener, crate::routes::app())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    DatabaseManager::close().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["agency-portal"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_user_defaults_to_admin() {
        let cli = Cli::try_parse_from([
            "agency-portal",
            "create-user",
            "--email",
            "owner@agency.test",
            "--name",
            "Owner",
            "--password",
            "long-enough",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::CreateUser { role, email, .. }) => {
                assert_eq!(role, "admin");
                assert_eq!(email, "owner@agency.test");
            }
            _ => panic!("expected create-user"),
        }
    }

    #[test]
    fn serve_accepts_a_port() {
        let cli = Cli::try_parse_from(["agency-portal", "serve", "--port", "4100"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(4100) })));
    }
}
