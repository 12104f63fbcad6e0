//! Writes analysis results to JSON report files

use crate::error::Result;
use crate::result::AnalysisResult;
use std::path::{Path, PathBuf};
use tracing::info;

/// Persists results as `{ticker}_analysis_report_{YYYYmmdd_HHMMSS}.json`
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a result
    pub fn file_name(result: &AnalysisResult) -> String {
        format!(
            "{}_analysis_report_{}.json",
            result.company.ticker,
            result.timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write the result and return the file path
    pub async fn write(&self, result: &AnalysisResult) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(Self::file_name(result));
        let body = serde_json::to_vec_pretty(result)?;
        tokio::fs::write(&path, body).await?;

        info!(path = %path.display(), "Analysis report saved");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CompanyRecord;
    use crate::factors::FactorMap;
    use crate::market::MarketSnapshot;
    use crate::market::tests::bars_from_closes;
    use crate::result::Narrative;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn result() -> AnalysisResult {
        let mut result = AnalysisResult::new(
            CompanyRecord::new("2330.TW", "台積電"),
            MarketSnapshot::from_bars(&bars_from_closes(&[1.0, 2.0])).unwrap(),
            FactorMap::new(),
            Narrative {
                market_analysis: json!({}),
                technical_analysis: json!({}),
                risk_assessment: json!({}),
                investment_recommendation: json!({"rating": "持有"}),
            },
        );
        result.timestamp = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        result
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            ReportWriter::file_name(&result()),
            "2330.TW_analysis_report_20250304_050607.json"
        );
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(dir.path().join("reports"));

        let path = writer.write(&result()).await.unwrap();
        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(saved["company"]["name"], "台積電");
        assert_eq!(saved["investment_recommendation"]["rating"], "持有");
    }
}
