//! Analysis pipeline: market data, factors and the four narrative sections

use crate::directory::CompanyRecord;
use crate::error::{AnalystError, Result};
use crate::factors::compute_factors;
use crate::market::{MarketDataSource, MarketSnapshot};
use crate::prompts::{ANALYST_SYSTEM_PROMPT, PromptSet};
use crate::result::{AnalysisResult, Narrative, parse_section};
use analyst_llm::{CompletionRequest, LLMProvider, Message};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Backend settings applied to every section request
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub lookback_days: u32,
}

/// Runs one analysis per call; every external call is attempted once
pub struct AnalysisPipeline {
    market: Arc<dyn MarketDataSource>,
    llm: Arc<dyn LLMProvider>,
    prompts: PromptSet,
    settings: PipelineSettings,
}

impl AnalysisPipeline {
    pub fn new(
        market: Arc<dyn MarketDataSource>,
        llm: Arc<dyn LLMProvider>,
        settings: PipelineSettings,
    ) -> Result<Self> {
        Ok(Self {
            market,
            llm,
            prompts: PromptSet::new()?,
            settings,
        })
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Analyze one company
    ///
    /// Fails with `DataUnavailable` when no bars can be fetched and with
    /// `BackendError` when the backend errors or answers with nothing.
    #[instrument(skip(self, record), fields(ticker = %record.ticker))]
    pub async fn run(&self, record: &CompanyRecord) -> Result<AnalysisResult> {
        let bars = self
            .market
            .daily_bars(&record.ticker, self.settings.lookback_days)
            .await
            .map_err(|e| match e {
                AnalystError::DataUnavailable { .. } => e,
                other => AnalystError::DataUnavailable {
                    symbol: record.ticker.clone(),
                    reason: other.to_string(),
                },
            })?;

        let snapshot =
            MarketSnapshot::from_bars(&bars).ok_or_else(|| AnalystError::DataUnavailable {
                symbol: record.ticker.clone(),
                reason: format!("no bars in the last {} days", self.settings.lookback_days),
            })?;
        let factors = compute_factors(&bars)?;
        debug!(bars = bars.len(), factors = factors.len(), "Market data ready");

        let market_analysis = self
            .section("market", self.prompts.market(record, &snapshot)?)
            .await?;
        let technical_analysis = self
            .section("technical", self.prompts.technical(record, &factors)?)
            .await?;
        let risk_assessment = self.section("risk", self.prompts.risk(record, &snapshot)?).await?;
        let investment_recommendation = self
            .section("investment", self.prompts.investment(record, &snapshot)?)
            .await?;

        info!("Analysis complete");
        Ok(AnalysisResult::new(
            record.clone(),
            snapshot,
            factors,
            Narrative {
                market_analysis,
                technical_analysis,
                risk_assessment,
                investment_recommendation,
            },
        )
        .with_backend(self.llm.name(), &self.settings.model))
    }

    async fn section(&self, label: &str, prompt: String) -> Result<serde_json::Value> {
        let text = self.ask(prompt).await?;
        let value = parse_section(&text);
        if value.get("raw_content").is_some() && value.get("error").is_some() {
            warn!(section = label, "Section response is not valid JSON");
        }
        Ok(value)
    }

    async fn ask(&self, prompt: String) -> Result<String> {
        let request = CompletionRequest::builder(&self.settings.model)
            .system(ANALYST_SYSTEM_PROMPT)
            .add_message(Message::user(prompt))
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature)
            .json()
            .build();

        let response = self.llm.complete(request).await?;
        let text = response.message.text().ok_or_else(|| {
            AnalystError::BackendError(format!("{} returned an empty response", self.llm.name()))
        })?;

        debug!(
            tokens = response.usage.total(),
            stop_reason = ?response.stop_reason,
            "Backend answered"
        );
        Ok(text.to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::market::Bar;
    use crate::market::tests::bars_from_closes;
    use crate::result::INVALID_JSON_ERROR;
    use analyst_llm::{CompletionResponse, LLMError, StopReason, TokenUsage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned replies in order; repeats the last one when exhausted
    pub(crate) struct MockProvider {
        replies: Mutex<Vec<std::result::Result<String, LLMError>>>,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockProvider {
        pub(crate) fn new(replies: Vec<std::result::Result<String, LLMError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            })
        }

        pub(crate) fn json(reply: &str) -> Arc<Self> {
            Self::new(vec![Ok(reply.to_string())])
        }
    }

    #[async_trait]
    impl LLMProvider for MockProvider {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> analyst_llm::Result<CompletionResponse> {
            let model = request.model.clone();
            self.requests.lock().unwrap().push(request);

            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.remove(0)
            } else {
                match replies.first() {
                    Some(Ok(text)) => Ok(text.clone()),
                    Some(Err(e)) => Err(LLMError::RequestFailed(e.to_string())),
                    None => Ok(String::new()),
                }
            };

            reply.map(|text| CompletionResponse {
                message: Message::assistant(text),
                model,
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    pub(crate) struct StubMarket {
        pub(crate) bars: std::result::Result<Vec<Bar>, String>,
    }

    impl StubMarket {
        pub(crate) fn with_closes(closes: &[f64]) -> Arc<Self> {
            Arc::new(Self {
                bars: Ok(bars_from_closes(closes)),
            })
        }

        pub(crate) fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self {
                bars: Err(reason.to_string()),
            })
        }
    }

    #[async_trait]
    impl MarketDataSource for StubMarket {
        async fn daily_bars(&self, _ticker: &str, _days: u32) -> Result<Vec<Bar>> {
            self.bars
                .clone()
                .map_err(AnalystError::YahooFinanceError)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    pub(crate) fn settings() -> PipelineSettings {
        PipelineSettings {
            model: "test-model".to_string(),
            max_tokens: 256,
            temperature: 0.1,
            lookback_days: 30,
        }
    }

    fn tsmc() -> CompanyRecord {
        CompanyRecord::new("2330.TW", "台積電")
    }

    fn closes(n: usize) -> Vec<f64> {
        (0..n).map(|i| 500.0 + (i % 7) as f64 * 3.0).collect()
    }

    #[tokio::test]
    async fn test_run_success() {
        let llm = MockProvider::new(vec![
            Ok(r#"{"trend_analysis": "上升"}"#.to_string()),
            Ok("```json\n{\"momentum_analysis\": \"強\"}\n```".to_string()),
            Ok(r#"{"overall_risk_level": "中"}"#.to_string()),
            Ok(r#"{"rating": "持有"}"#.to_string()),
        ]);
        let pipeline =
            AnalysisPipeline::new(StubMarket::with_closes(&closes(22)), llm.clone(), settings())
                .unwrap();

        let result = pipeline.run(&tsmc()).await.unwrap();
        assert_eq!(result.company.ticker, "2330.TW");
        assert_eq!(result.narrative.market_analysis["trend_analysis"], "上升");
        assert_eq!(result.narrative.technical_analysis["momentum_analysis"], "強");
        assert_eq!(result.narrative.investment_recommendation["rating"], "持有");
        assert_eq!(result.provider, "mock");
        assert_eq!(result.model, "test-model");
        assert!(result.technical_factors.contains_key("sma_20"));

        let requests = llm.requests.lock().unwrap();
        assert_eq!(requests.len(), 4);
        assert!(requests.iter().all(|r| r.model == "test-model"));
    }

    #[tokio::test]
    async fn test_general_technical_prompt_without_factors() {
        let llm = MockProvider::json(r#"{"general_analysis": "..."}"#);
        let pipeline =
            AnalysisPipeline::new(StubMarket::with_closes(&[500.0]), llm.clone(), settings())
                .unwrap();

        let result = pipeline.run(&tsmc()).await.unwrap();
        assert!(result.technical_factors.is_empty());

        let requests = llm.requests.lock().unwrap();
        let prompt = requests[1].messages[0].text().unwrap();
        assert!(prompt.contains("general_analysis"));
    }

    #[tokio::test]
    async fn test_invalid_json_section_falls_back() {
        let llm = MockProvider::json("這不是 JSON");
        let pipeline =
            AnalysisPipeline::new(StubMarket::with_closes(&closes(10)), llm, settings()).unwrap();

        let result = pipeline.run(&tsmc()).await.unwrap();
        assert_eq!(result.narrative.risk_assessment["error"], INVALID_JSON_ERROR);
        assert_eq!(result.narrative.risk_assessment["raw_content"], "這不是 JSON");
    }

    #[tokio::test]
    async fn test_market_failure_is_data_unavailable() {
        let llm = MockProvider::json("{}");
        let market = StubMarket::failing("HTTP 404");
        let pipeline = AnalysisPipeline::new(market, llm.clone(), settings()).unwrap();

        let err = pipeline.run(&tsmc()).await.unwrap_err();
        match err {
            AnalystError::DataUnavailable { symbol, reason } => {
                assert_eq!(symbol, "2330.TW");
                assert!(reason.contains("HTTP 404"));
            }
            other => panic!("Expected DataUnavailable, got {other:?}"),
        }
        assert!(llm.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_bars_is_data_unavailable() {
        let llm = MockProvider::json("{}");
        let pipeline =
            AnalysisPipeline::new(StubMarket::with_closes(&[]), llm, settings()).unwrap();

        assert!(matches!(
            pipeline.run(&tsmc()).await,
            Err(AnalystError::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_backend_failure() {
        let llm =
            MockProvider::new(vec![Err(LLMError::RequestFailed("connection refused".into()))]);
        let pipeline =
            AnalysisPipeline::new(StubMarket::with_closes(&closes(10)), llm.clone(), settings())
                .unwrap();

        let err = pipeline.run(&tsmc()).await.unwrap_err();
        assert!(matches!(err, AnalystError::BackendError(_)));
        assert_eq!(llm.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_reply_is_backend_error() {
        let llm = MockProvider::json("   ");
        let pipeline =
            AnalysisPipeline::new(StubMarket::with_closes(&closes(10)), llm, settings()).unwrap();

        assert!(matches!(
            pipeline.run(&tsmc()).await,
            Err(AnalystError::BackendError(_))
        ));
    }
}
