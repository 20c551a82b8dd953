// Engine main entry point
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use swing_engine::config::EngineSettings;
use swing_engine::ml::{CentroidTrainer, JsonFileModelStore};
use swing_engine::services::Server;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Swing-point training and prediction server")]
struct Args {
    /// JSON settings file; built-in defaults are used when omitted
    #[arg(short, long, env = "SWING_ENGINE_CONFIG")]
    config: Option<PathBuf>,

    /// Override tcp.host
    #[arg(long)]
    host: Option<String>,

    /// Override tcp.port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override model.dir
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => EngineSettings::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => EngineSettings::default(),
    };
    if let Some(host) = args.host {
        settings.tcp.host = host;
    }
    if let Some(port) = args.port {
        settings.tcp.port = port;
    }
    if let Some(dir) = args.model_dir {
        settings.model.dir = dir;
    }
    settings.validate()?;

    // RUST_LOG wins; otherwise the configured level.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting swing engine...");
    let trainer = Arc::new(CentroidTrainer::new());
    let store = Arc::new(JsonFileModelStore::new(settings.model.dir.clone()));
    info!(model_dir = %store.dir().display(), model_key = %settings.model.key, "Model store configured");
    let server = Server::bind(&settings, trainer, store).await?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error_detail = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    info!("Swing engine stopped");
    Ok(())
}
