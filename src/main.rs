mod config;
mod gitlab;
mod tools;
mod users;

pub const USER_AGENT: &str = concat!("labscout/", env!("CARGO_PKG_VERSION"), " (MCP Server)");

use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use tools::LabScout;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = config::Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("labscout=info".parse()?),
        )
        .init();

    let config = cli.into_config()?;
    info!(
        api_url = %config.api_url,
        authenticated = config.token.is_some(),
        "starting labscout MCP server"
    );

    let service = LabScout::new(&config)?
        .serve(stdio())
        .await
        .inspect_err(|e| tracing::error!("failed to start server: {e}"))?;

    service.waiting().await?;
    info!("server stopped");
    Ok(())
}
