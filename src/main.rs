use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use student_pass::{build_state, start_server, Config, DataLoader};

#[actix_web::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("student_pass=info,actix_web=info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    info!("loading student data from {}", config.data.display());
    let loader = DataLoader::new(&config.data, config.delimiter_byte());
    let state = build_state(&loader, &config)
        .with_context(|| format!("failed to prepare model from {}", config.data.display()))?;

    info!(
        accuracy = %format!("{:.2}", state.model.accuracy()),
        "model ready\n{}",
        state.model.report()
    );

    start_server(state, &config.host, config.port)
        .await
        .context("dashboard server stopped")?;

    Ok(())
}
