//! Momentum signals derived from daily price history

use crate::api::market::PriceBar;
use serde::{Deserialize, Serialize};
use ta::Next;
use ta::indicators::{RelativeStrengthIndex, SimpleMovingAverage};

const RSI_PERIOD: usize = 14;
const SMA_SHORT: usize = 50;
const SMA_LONG: usize = 200;

/// One qualitative momentum signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    RsiOverbought(f64),
    RsiOversold(f64),
    RsiNeutral(f64),
    AboveSma50,
    BelowSma50,
}

impl Signal {
    /// Human-readable description for the terminal
    pub fn describe(&self) -> String {
        match self {
            Self::RsiOverbought(rsi) => format!("RSI {rsi:.1} (overbought)"),
            Self::RsiOversold(rsi) => format!("RSI {rsi:.1} (oversold)"),
            Self::RsiNeutral(rsi) => format!("RSI {rsi:.1} (neutral)"),
            Self::AboveSma50 => "Price above 50-day SMA".to_string(),
            Self::BelowSma50 => "Price below 50-day SMA".to_string(),
        }
    }
}

/// Momentum indicator values plus qualitative signals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumSignals {
    /// 14-period RSI, when enough bars exist
    pub rsi: Option<f64>,
    /// 50-day simple moving average
    pub sma_50: Option<f64>,
    /// 200-day simple moving average
    pub sma_200: Option<f64>,
    pub signals: Vec<Signal>,
}

impl MomentumSignals {
    fn empty() -> Self {
        Self {
            rsi: None,
            sma_50: None,
            sma_200: None,
            signals: Vec::new(),
        }
    }
}

fn run_indicator<I: Next<f64, Output = f64>>(mut indicator: I, closes: &[f64]) -> Option<f64> {
    let mut last = None;
    for &close in closes {
        last = Some(indicator.next(close));
    }
    last
}

/// Compute momentum signals over daily bars (oldest-first).
///
/// Each indicator is only reported once the history covers its window, so a
/// short history yields a partially filled result rather than misleading
/// values seeded from too few bars.
pub fn momentum(bars: &[PriceBar]) -> MomentumSignals {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    if closes.is_empty() {
        return MomentumSignals::empty();
    }

    let gated = |period: usize, value: Option<f64>| -> Option<f64> {
        if closes.len() >= period { value } else { None }
    };

    let rsi = gated(
        RSI_PERIOD,
        RelativeStrengthIndex::new(RSI_PERIOD)
            .ok()
            .and_then(|i| run_indicator(i, &closes)),
    );
    let sma_50 = gated(
        SMA_SHORT,
        SimpleMovingAverage::new(SMA_SHORT)
            .ok()
            .and_then(|i| run_indicator(i, &closes)),
    );
    let sma_200 = gated(
        SMA_LONG,
        SimpleMovingAverage::new(SMA_LONG)
            .ok()
            .and_then(|i| run_indicator(i, &closes)),
    );

    let mut signals = Vec::new();
    if let Some(rsi) = rsi {
        signals.push(if rsi >= 70.0 {
            Signal::RsiOverbought(rsi)
        } else if rsi <= 30.0 {
            Signal::RsiOversold(rsi)
        } else {
            Signal::RsiNeutral(rsi)
        });
    }
    if let (Some(sma), Some(&last)) = (sma_50, closes.last()) {
        signals.push(if last > sma {
            Signal::AboveSma50
        } else {
            Signal::BelowSma50
        });
    }

    MomentumSignals {
        rsi,
        sma_50,
        sma_200,
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .map(|&close| PriceBar {
                timestamp: Utc::now(),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000,
            })
            .collect()
    }

    #[test]
    fn test_empty_history() {
        let result = momentum(&[]);
        assert!(result.rsi.is_none());
        assert!(result.signals.is_empty());
    }

    #[test]
    fn test_short_history_gates_indicators() {
        let result = momentum(&bars(&[100.0, 101.0, 102.0]));
        assert!(result.rsi.is_none());
        assert!(result.sma_50.is_none());
        assert!(result.sma_200.is_none());
    }

    #[test]
    fn test_rising_series_is_overbought() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let result = momentum(&bars(&closes));

        let rsi = result.rsi.unwrap();
        assert!(rsi > 70.0);
        assert!(matches!(result.signals[0], Signal::RsiOverbought(_)));
        assert!(result.signals.contains(&Signal::AboveSma50));
        // 200-day window not covered by 60 bars
        assert!(result.sma_200.is_none());
    }

    #[test]
    fn test_falling_series_is_oversold_below_sma() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let result = momentum(&bars(&closes));

        assert!(matches!(result.signals[0], Signal::RsiOversold(_)));
        assert!(result.signals.contains(&Signal::BelowSma50));
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Signal::RsiOverbought(72.5).describe(),
            "RSI 72.5 (overbought)"
        );
        assert_eq!(Signal::AboveSma50.describe(), "Price above 50-day SMA");
    }
}
