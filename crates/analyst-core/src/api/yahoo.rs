//! Yahoo Finance market data client

use crate::error::{AnalystError, Result};
use crate::market::{Bar, MarketDataSource};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

/// Daily bars from Yahoo Finance (no API key required)
pub struct YahooFinanceClient {
    timeout: Duration,
}

impl YahooFinanceClient {
    /// Create a client with the given per-request timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Historical daily quotes between two instants
    #[instrument(skip(self))]
    pub async fn get_historical_bars(
        &self,
        ticker: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Bar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| AnalystError::YahooFinanceError(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| AnalystError::YahooFinanceError(format!("Invalid end timestamp: {e}")))?;

        let response = tokio::time::timeout(
            self.timeout,
            provider.get_quote_history(ticker, start_odt, end_odt),
        )
        .await
        .map_err(|_| {
            AnalystError::YahooFinanceError(format!("request timed out after {:?}", self.timeout))
        })?
        .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| AnalystError::YahooFinanceError(e.to_string()))?;

        let bars: Vec<Bar> = quotes
            .iter()
            .filter(|q| q.close.is_finite() && q.close > 0.0)
            .filter_map(|q| {
                let timestamp = i64::try_from(q.timestamp)
                    .ok()
                    .and_then(|t| DateTime::from_timestamp(t, 0))?;
                Some(Bar {
                    timestamp,
                    open: q.open,
                    high: q.high,
                    low: q.low,
                    close: q.close,
                    volume: q.volume,
                })
            })
            .collect();

        debug!(ticker, raw = quotes.len(), kept = bars.len(), "Fetched quote history");
        Ok(bars)
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceClient {
    async fn daily_bars(&self, ticker: &str, days: u32) -> Result<Vec<Bar>> {
        let end = Utc::now();
        let start = end - ChronoDuration::days(i64::from(days));
        let mut bars = self.get_historical_bars(ticker, start, end).await?;
        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }

    fn name(&self) -> &str {
        "yahoo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_daily_bars() {
        let client = YahooFinanceClient::default();
        let bars = client.daily_bars("2330.TW", 30).await.unwrap();
        assert!(!bars.is_empty());
        assert!(bars.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
