//! geostacksd — the GeoStacks daemon.
//!
//! Single binary that assembles the site lifecycle service:
//! - Settings (TOML file + flag overrides)
//! - Automation engine client (Pulumi CLI)
//! - REST API
//!
//! # Usage
//!
//! ```text
//! geostacksd serve --port 8000 --data-dir /var/lib/geostacks
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use geostacks_core::Settings;
use geostacks_engine::PulumiEngine;

#[derive(Parser)]
#[command(name = "geostacksd", about = "GeoStacks daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the site lifecycle service.
    Serve {
        /// Port to listen on.
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Settings file (TOML). Flags below override its values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory for engine workspaces.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Project namespace for stacks.
        #[arg(long)]
        project: Option<String>,

        /// Cloud region for new stacks.
        #[arg(long)]
        region: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,geostacksd=debug,geostacks=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            port,
            config,
            data_dir,
            project,
            region,
        } => {
            let mut settings = match config {
                Some(path) => Settings::from_file(&path)
                    .with_context(|| format!("failed to load settings from {}", path.display()))?,
                None => Settings::default(),
            };
            if let Some(data_dir) = data_dir {
                settings.data_dir = data_dir;
            }
            if let Some(project) = project {
                settings.project = project;
            }
            if let Some(region) = region {
                settings.region = region;
            }

            serve(port, settings).await
        }
    }
}

/// Validate server environment credentials before accepting requests.
///
/// Presence check only. Live validation (an STS identity call) is left to
/// the engine's first provisioning operation, which fails with the
/// provider's own message if the credentials are bad.
fn ensure_aws_credentials() -> anyhow::Result<()> {
    let required = ["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"];
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|var| std::env::var(var).is_err())
        .collect();

    if !missing.is_empty() {
        bail!(
            "missing required AWS credentials: {}. Set the environment variables for an IAM user \
             permitted to manage buckets.",
            missing.join(", ")
        );
    }
    Ok(())
}

async fn serve(port: u16, settings: Settings) -> anyhow::Result<()> {
    info!(project = %settings.project, "GeoStacks daemon starting");

    ensure_aws_credentials()?;

    std::fs::create_dir_all(&settings.data_dir)?;

    // Engine client. Preflight verifies the binary and installs the
    // provider plugin so requests never pay for it.
    let engine = PulumiEngine::new(&settings)?;
    engine.preflight().await?;
    info!("engine client initialized");

    // ── Start API server ───────────────────────────────────────

    let router = geostacks_api::build_router(Arc::new(engine), settings);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
    });

    server.await?;

    info!("GeoStacks daemon stopped");
    Ok(())
}
