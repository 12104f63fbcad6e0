//! Technical factors computed from daily bars

use crate::error::{AnalystError, Result};
use crate::market::{Bar, TRADING_DAYS_PER_YEAR, daily_returns, std_dev};
use std::collections::BTreeMap;
use ta::{
    Next,
    indicators::{ExponentialMovingAverage, RelativeStrengthIndex, SimpleMovingAverage},
};

/// Factor name to value, ordered by name
pub type FactorMap = BTreeMap<String, f64>;

const MOMENTUM_WINDOWS: [usize; 3] = [5, 10, 20];
const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const VOLUME_WINDOW: usize = 5;

/// Compute every factor the series is long enough for
///
/// Bars must be ordered oldest first. Factors that would need more history
/// than available, or that come out non-finite, are left out.
pub fn compute_factors(bars: &[Bar]) -> Result<FactorMap> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
    let mut factors = FactorMap::new();

    let Some(&last) = closes.last() else {
        return Ok(factors);
    };

    for window in MOMENTUM_WINDOWS {
        if closes.len() > window {
            let base = closes[closes.len() - 1 - window];
            if base != 0.0 {
                insert(&mut factors, &format!("momentum_{window}d"), (last / base - 1.0) * 100.0);
            }
        }
    }

    if closes.len() > RSI_PERIOD {
        let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD)
            .map_err(|e| AnalystError::IndicatorError(e.to_string()))?;
        let value = closes.iter().fold(0.0, |_, &c| rsi.next(c));
        insert(&mut factors, "rsi_14", value);
    }

    for period in [5, 20] {
        if let Some(sma) = last_sma(&closes, period)? {
            insert(&mut factors, &format!("sma_{period}"), sma);
            if period == 20 && sma != 0.0 {
                insert(&mut factors, "price_to_sma_20", last / sma);
            }
        }
    }

    if closes.len() >= MACD_SLOW {
        let mut fast = ExponentialMovingAverage::new(MACD_FAST)
            .map_err(|e| AnalystError::IndicatorError(e.to_string()))?;
        let mut slow = ExponentialMovingAverage::new(MACD_SLOW)
            .map_err(|e| AnalystError::IndicatorError(e.to_string()))?;
        let macd = closes
            .iter()
            .fold(0.0, |_, &c| fast.next(c) - slow.next(c));
        insert(&mut factors, "macd", macd);
    }

    if volumes.len() >= VOLUME_WINDOW {
        let recent = mean(&volumes[volumes.len() - VOLUME_WINDOW..]);
        if recent > 0.0 {
            insert(&mut factors, "volume_ratio_5d", volumes[volumes.len() - 1] / recent);
        }

        if volumes.len() >= 2 * VOLUME_WINDOW {
            let end = volumes.len() - VOLUME_WINDOW;
            let prior = mean(&volumes[end - VOLUME_WINDOW..end]);
            if prior > 0.0 {
                insert(&mut factors, "volume_momentum_5d", (recent / prior - 1.0) * 100.0);
            }
        }
    }

    if let Some(sd) = std_dev(&daily_returns(&closes)) {
        insert(
            &mut factors,
            "annualized_volatility",
            sd * TRADING_DAYS_PER_YEAR.sqrt() * 100.0,
        );
    }

    Ok(factors)
}

fn last_sma(closes: &[f64], period: usize) -> Result<Option<f64>> {
    if closes.len() < period {
        return Ok(None);
    }
    let mut sma = SimpleMovingAverage::new(period)
        .map_err(|e| AnalystError::IndicatorError(e.to_string()))?;
    Ok(Some(closes.iter().fold(0.0, |_, &c| sma.next(c))))
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn insert(factors: &mut FactorMap, name: &str, value: f64) {
    if value.is_finite() {
        factors.insert(name.to_string(), value);
    }
}
