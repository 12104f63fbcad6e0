//! Analysis result types

use crate::directory::CompanyRecord;
use crate::factors::FactorMap;
use crate::market::MarketSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

/// Label recorded in every result
pub const ANALYSIS_METHOD: &str = "AI-powered quantitative analysis";

/// Fallback recorded when a section is not valid JSON
pub const INVALID_JSON_ERROR: &str = "LLM response is not valid JSON";

/// The four narrative sections, each the JSON object returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub market_analysis: Value,
    pub technical_analysis: Value,
    pub risk_assessment: Value,
    pub investment_recommendation: Value,
}

/// Parse one section, falling back to an error object with the raw text
///
/// Surrounding Markdown code fences are ignored.
pub fn parse_section(raw: &str) -> Value {
    serde_json::from_str(strip_code_fence(raw)).unwrap_or_else(|_| {
        json!({
            "error": INVALID_JSON_ERROR,
            "raw_content": raw,
        })
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop the info string (`json`), which may be followed by a newline or a space
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()).trim();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// A complete analysis of one company
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub company: CompanyRecord,
    pub market_snapshot: MarketSnapshot,
    pub technical_factors: FactorMap,
    #[serde(flatten)]
    pub narrative: Narrative,
    pub model: String,
    pub provider: String,
    pub analysis_method: String,
}

impl AnalysisResult {
    pub fn new(
        company: CompanyRecord,
        market_snapshot: MarketSnapshot,
        technical_factors: FactorMap,
        narrative: Narrative,
    ) -> Self {
        Self {
            analysis_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            company,
            market_snapshot,
            technical_factors,
            narrative,
            model: String::new(),
            provider: String::new(),
            analysis_method: ANALYSIS_METHOD.to_string(),
        }
    }

    /// Record which backend produced the narrative
    pub fn with_backend(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.provider = provider.into();
        self.model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::tests::bars_from_closes;

    #[test]
    fn test_parse_section_plain_json() {
        let value = parse_section(r#"{"rating": "持有"}"#);
        assert_eq!(value["rating"], "持有");
    }

    #[test]
    fn test_parse_section_code_fence() {
        let value = parse_section("```json\n{\"rating\": \"買入\"}\n```");
        assert_eq!(value["rating"], "買入");

        let value = parse_section("```\n{\"a\": 1}```");
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_parse_section_single_line_fence() {
        let value = parse_section("```json {\"a\": 1}```");
        assert_eq!(value["a"], 1);

        let value = parse_section("```{\"rating\": \"賣出\"}```");
        assert_eq!(value["rating"], "賣出");
    }

    #[test]
    fn test_parse_section_fallback() {
        let value = parse_section("市場看漲");
        assert_eq!(value["error"], INVALID_JSON_ERROR);
        assert_eq!(value["raw_content"], "市場看漲");
    }

    #[test]
    fn test_result_serialization() {
        let section = json!({"ok": true});
        let result = AnalysisResult::new(
            CompanyRecord::new("2330.TW", "台積電"),
            MarketSnapshot::from_bars(&bars_from_closes(&[1.0, 2.0])).unwrap(),
            FactorMap::new(),
            Narrative {
                market_analysis: section.clone(),
                technical_analysis: section.clone(),
                risk_assessment: section.clone(),
                investment_recommendation: section,
            },
        )
        .with_backend("ollama", "gpt-oss:20b");

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["company"]["ticker"], "2330.TW");
        assert_eq!(value["risk_assessment"]["ok"], true);
        assert_eq!(value["model"], "gpt-oss:20b");
        assert_eq!(value["analysis_method"], ANALYSIS_METHOD);
    }
}
