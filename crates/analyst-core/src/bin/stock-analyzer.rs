//! One-shot stock analysis
//!
//! # Usage
//!
//! ```bash
//! # Analyze by name, alias or ticker
//! cargo run --bin stock-analyzer -p analyst-core -- --company 台積電
//!
//! # Use an OpenAI-compatible server and keep a report file
//! ANALYST_LLM_BACKEND=openai OPENAI_API_BASE=http://localhost:1234/v1 \
//!   cargo run --bin stock-analyzer -p analyst-core -- --company 2330 --report-dir reports
//! ```

use analyst_core::{AnalystConfig, RequestHandler};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stock-analyzer", version, about = "Analyze a Taiwan-listed company")]
struct Args {
    /// Company name, alias or ticker
    #[arg(short, long)]
    company: String,

    /// Override the model name
    #[arg(long, env = "ANALYST_MODEL")]
    model: Option<String>,

    /// Write the result as a JSON report into this directory
    #[arg(long)]
    report_dir: Option<PathBuf>,

    /// Company list file
    #[arg(long, env = "ANALYST_COMPANIES_PATH")]
    companies: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    analyst_utils::init_tracing();

    let args = Args::parse();

    let mut config = AnalystConfig::from_env().context("invalid configuration")?;
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(dir) = args.report_dir {
        config.report_dir = Some(dir);
    }
    if let Some(path) = args.companies {
        config.companies_path = path;
    }
    config.validate()?;

    let handler = RequestHandler::from_config(&config).await?;
    let result = handler
        .analyze(&args.company)
        .await
        .with_context(|| format!("analysis of '{}' failed", args.company))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
