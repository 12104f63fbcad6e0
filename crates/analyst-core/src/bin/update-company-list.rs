//! Refresh the Taiwan company list from the exchange open data APIs
//!
//! Exits with status 1 when the refresh fails; the existing list is left
//! untouched in that case.

use analyst_core::api::TwseCompanySource;
use analyst_core::{AnalystConfig, DirectoryHandle, DirectoryStore};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "update-company-list", version, about = "Refresh the company list file")]
struct Args {
    /// Company list file to rewrite
    #[arg(long, env = "ANALYST_COMPANIES_PATH")]
    companies: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    analyst_utils::init_tracing();

    let args = Args::parse();
    let mut config = AnalystConfig::from_env().context("invalid configuration")?;
    if let Some(path) = args.companies {
        config.companies_path = path;
    }

    let source = Arc::new(TwseCompanySource::new(
        config.twse_url.as_str(),
        config.tpex_url.as_str(),
        config.request_timeout,
    )?);
    let handle = DirectoryHandle::load(DirectoryStore::new(&config.companies_path), source)
        .await
        .with_context(|| format!("cannot load {}", config.companies_path.display()))?;

    match handle.refresh().await {
        Ok(report) => {
            for line in &report.log {
                println!("{line}");
            }
            println!(
                "Company list updated: {} companies ({} added, {} removed)",
                report.total, report.added, report.removed
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            for line in &e.log {
                eprintln!("{line}");
            }
            eprintln!("Company list update failed: {}", e.source);
            Ok(ExitCode::FAILURE)
        }
    }
}
