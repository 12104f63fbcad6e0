//! Taiwan stock analysis core
//!
//! This crate resolves a company name, alias or ticker against a local
//! directory of Taiwan-listed companies and produces an LLM-written analysis
//! from recent market data. It includes:
//!
//! - A refreshable company directory with exact and fuzzy lookup, persisted
//!   as JSON and rebuilt from the TWSE and TPEx open data lists
//! - Daily bars from Yahoo Finance and a small set of technical factors
//! - A four-section analysis pipeline (market, technical, risk, investment)
//!   driven by fixed prompt templates
//! - Optional LLM-assisted company lookup and JSON report files
//! - [`RequestHandler`], the entry point used by the HTTP server and CLIs
//!
//! # Example
//!
//! ```rust,ignore
//! use analyst_core::{AnalystConfig, RequestHandler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AnalystConfig::from_env()?;
//!     let handler = RequestHandler::from_config(&config).await?;
//!
//!     let result = handler.analyze("台積電").await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod factors;
pub mod handler;
pub mod market;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod resolver;
pub mod result;

pub use config::{AnalystConfig, LlmBackend};
pub use directory::{
    CompanyDirectory, CompanyRecord, CompanySource, DirectoryHandle, DirectoryStore,
    ListedCompany, RefreshReport,
};
pub use error::{AnalystError, Result};
pub use factors::{FactorMap, compute_factors};
pub use handler::{AnalysisRequest, AnalyzeError, RequestHandler, UpdateListResponse, UpdateStatus};
pub use market::{Bar, MarketDataSource, MarketSnapshot};
pub use pipeline::{AnalysisPipeline, PipelineSettings};
pub use report::ReportWriter;
pub use resolver::LlmCompanyResolver;
pub use result::{AnalysisResult, Narrative};
