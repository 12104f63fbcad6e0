//! Stock analyst HTTP server
//!
//! # Usage
//!
//! ```bash
//! # Local Ollama with the default model
//! cargo run --bin analyst-server -- --port 8000
//!
//! # Enable LLM-assisted lookup and report files
//! ANALYST_LLM_LOOKUP=true ANALYST_REPORT_DIR=reports cargo run --bin analyst-server
//! ```

use analyst_core::{AnalystConfig, RequestHandler};
use analyst_server::{AppState, serve};
use anyhow::Context;
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "analyst-server", version, about = "Taiwan stock analyst HTTP API")]
struct Args {
    /// Address to bind
    #[arg(long, env = "ANALYST_HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "ANALYST_PORT", default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    analyst_utils::init_tracing();

    let args = Args::parse();
    let config = AnalystConfig::from_env().context("invalid configuration")?;
    info!(
        companies = %config.companies_path.display(),
        model = %config.model,
        "Starting analyst server"
    );

    let handler = RequestHandler::from_config(&config).await?;
    serve(AppState::new(handler), SocketAddr::new(args.host, args.port)).await
}
