//! Daily price bars and the summary snapshot derived from them

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trading days per year used to annualize volatility
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// One daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Provider of historical daily bars
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Bars for the last `days` calendar days, oldest first
    async fn daily_bars(&self, ticker: &str, days: u32) -> Result<Vec<Bar>>;

    fn name(&self) -> &str;
}

/// Summary of the fetched window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub latest_price: f64,
    /// Percent change from the first to the last close
    pub price_change_pct: f64,
    pub average_volume: f64,
    /// Standard deviation of daily returns, annualized, in percent
    pub annualized_volatility_pct: Option<f64>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub trading_days: usize,
}

impl MarketSnapshot {
    /// Summarize a non-empty, oldest-first series
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        let first = bars.first()?;
        let last = bars.last()?;

        let price_change_pct = if first.close == 0.0 {
            0.0
        } else {
            (last.close - first.close) / first.close * 100.0
        };

        let average_volume =
            bars.iter().map(|b| b.volume as f64).sum::<f64>() / bars.len() as f64;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let annualized_volatility_pct = std_dev(&daily_returns(&closes))
            .map(|sd| sd * TRADING_DAYS_PER_YEAR.sqrt() * 100.0);

        Some(Self {
            latest_price: last.close,
            price_change_pct,
            average_volume,
            annualized_volatility_pct,
            period_start: first.timestamp,
            period_end: last.timestamp,
            trading_days: bars.len(),
        })
    }
}

/// Fractional day-over-day changes; pairs with a zero base are skipped
pub(crate) fn daily_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] != 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect()
}

/// Sample standard deviation; needs at least two values
pub(crate) fn std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Oldest-first bars with the given closes and a flat volume of 1000
    pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn test_snapshot() {
        let bars = bars_from_closes(&[100.0, 102.0, 101.0, 110.0]);
        let snap = MarketSnapshot::from_bars(&bars).unwrap();

        assert!((snap.latest_price - 110.0).abs() < f64::EPSILON);
        assert!((snap.price_change_pct - 10.0).abs() < 1e-9);
        assert!((snap.average_volume - 1000.0).abs() < f64::EPSILON);
        assert_eq!(snap.trading_days, 4);
        assert!(snap.annualized_volatility_pct.unwrap() > 0.0);
    }

    #[test]
    fn test_snapshot_single_bar() {
        let snap = MarketSnapshot::from_bars(&bars_from_closes(&[50.0])).unwrap();
        assert!((snap.price_change_pct).abs() < f64::EPSILON);
        assert!(snap.annualized_volatility_pct.is_none());
    }

    #[test]
    fn test_snapshot_empty() {
        assert!(MarketSnapshot::from_bars(&[]).is_none());
    }

    #[test]
    fn test_std_dev() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138_089_935).abs() < 1e-6);
    }
}
