mod cli;
mod engine;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command};
use engine::Engine;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let config = common::config::load_config().context("loading engine configuration")?;
    let engine = Engine::bootstrap(&config).await.context("bootstrapping engine components")?;

    let cli = Cli::parse();
    match cli.command {
        Command::Ingest { path } => {
            let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("document.txt");
            let report = engine.ingest_file(&bytes, filename).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        query @ Command::Query { .. } => {
            let request = query.into_query_request()?;
            let response = engine.query(request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Reset => {
            engine.reset().await?;
            println!("{{\"status\":\"reset complete\"}}");
        }
        Command::Health => {
            let status = engine.health().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
