//! Transport-independent request handling
//!
//! [`RequestHandler`] holds no per-request state. It resolves the company,
//! runs the pipeline and maps failures onto user-facing status codes; the
//! HTTP layer only translates the outcome into a response.

use crate::api::{TwseCompanySource, YahooFinanceClient};
use crate::config::AnalystConfig;
use crate::directory::{CompanyRecord, DirectoryHandle, DirectoryStore, MatchKind};
use crate::error::Result;
use crate::pipeline::{AnalysisPipeline, PipelineSettings};
use crate::report::ReportWriter;
use crate::resolver::LlmCompanyResolver;
use crate::result::AnalysisResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Body of an analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Company name, alias or ticker
    pub company: String,
}

/// Why an analysis request was not served
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzeError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PipelineFailure(String),
}

impl AnalyzeError {
    /// HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::PipelineFailure(_) => 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStatus {
    Success,
    Failure,
}

/// Outcome of a company list refresh; always delivered with status 200
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateListResponse {
    pub status: UpdateStatus,
    pub message: String,
    /// Progress log of the refresh
    pub output: String,
}

/// Entry point shared by the HTTP server and the command-line tools
#[derive(Clone)]
pub struct RequestHandler {
    directory: Arc<DirectoryHandle>,
    pipeline: Arc<AnalysisPipeline>,
    resolver: Option<Arc<LlmCompanyResolver>>,
    reports: Option<ReportWriter>,
}

impl RequestHandler {
    pub fn new(directory: Arc<DirectoryHandle>, pipeline: Arc<AnalysisPipeline>) -> Self {
        Self {
            directory,
            pipeline,
            resolver: None,
            reports: None,
        }
    }

    /// Enable LLM-assisted lookup for queries the directory cannot match
    pub fn with_resolver(mut self, resolver: Arc<LlmCompanyResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Save every successful result into a report directory
    pub fn with_reports(mut self, reports: ReportWriter) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Wire up the production components from configuration
    pub async fn from_config(config: &AnalystConfig) -> Result<Self> {
        let source = Arc::new(TwseCompanySource::new(
            config.twse_url.as_str(),
            config.tpex_url.as_str(),
            config.request_timeout,
        )?);
        let store = DirectoryStore::new(config.companies_path.clone());
        let directory = Arc::new(DirectoryHandle::load(store, source).await?);

        let llm = config.build_llm_provider()?;
        let market = Arc::new(YahooFinanceClient::new(config.request_timeout));
        let pipeline = Arc::new(AnalysisPipeline::new(
            market,
            Arc::clone(&llm),
            PipelineSettings {
                model: config.model.clone(),
                max_tokens: config.max_tokens,
                temperature: config.temperature,
                lookback_days: config.lookback_days,
            },
        )?);

        let mut handler = Self::new(directory, pipeline);
        if config.llm_lookup {
            handler = handler.with_resolver(Arc::new(LlmCompanyResolver::new(
                llm,
                config.model.as_str(),
            )?));
        }
        if let Some(dir) = &config.report_dir {
            handler = handler.with_reports(ReportWriter::new(dir));
        }

        info!(
            backend = ?config.llm_backend,
            model = %config.model,
            llm_lookup = config.llm_lookup,
            "Request handler ready"
        );
        Ok(handler)
    }

    pub fn directory(&self) -> &Arc<DirectoryHandle> {
        &self.directory
    }

    /// Number of companies in the current directory
    pub async fn company_count(&self) -> usize {
        self.directory.snapshot().await.len()
    }

    /// Resolve `company` and analyze it
    ///
    /// Unknown companies are reported as `NotFound` before the pipeline is
    /// invoked.
    #[instrument(skip(self))]
    pub async fn analyze(
        &self,
        company: &str,
    ) -> std::result::Result<AnalysisResult, AnalyzeError> {
        let query = company.trim();
        if query.is_empty() {
            return Err(AnalyzeError::InvalidRequest(
                "company must not be empty".to_string(),
            ));
        }

        let record = self
            .resolve(query)
            .await
            .ok_or_else(|| AnalyzeError::NotFound(format!("Company not found: {query}")))?;

        let result = self.pipeline.run(&record).await.map_err(|e| {
            warn!(ticker = %record.ticker, error = %e, "Analysis failed");
            AnalyzeError::PipelineFailure(format!("Analysis failed: {e}"))
        })?;

        if let Some(reports) = &self.reports {
            if let Err(e) = reports.write(&result).await {
                warn!(error = %e, "Failed to save analysis report");
            }
        }

        Ok(result)
    }

    async fn resolve(&self, query: &str) -> Option<CompanyRecord> {
        let snapshot = self.directory.snapshot().await;

        if let Some(hit) = snapshot.find(query) {
            if hit.kind == MatchKind::Fuzzy {
                info!(query, ticker = %hit.record.ticker, "Fuzzy company match");
            }
            return Some(hit.record.clone());
        }

        let resolver = self.resolver.as_ref()?;
        let record = resolver.resolve(query, &snapshot).await;
        if let Some(record) = &record {
            info!(query, ticker = %record.ticker, "Company resolved by LLM lookup");
        }
        record
    }

    /// Refresh the company list; failures are reported in the body
    #[instrument(skip(self))]
    pub async fn refresh_directory(&self) -> UpdateListResponse {
        match self.directory.refresh().await {
            Ok(report) => UpdateListResponse {
                status: UpdateStatus::Success,
                message: format!(
                    "Company list updated: {} companies ({} added, {} removed)",
                    report.total, report.added, report.removed
                ),
                output: report.log.join("\n"),
            },
            Err(e) => UpdateListResponse {
                status: UpdateStatus::Failure,
                message: format!("Company list update failed: {}", e.source),
                output: e.log.join("\n"),
            },
        }
    }
}
