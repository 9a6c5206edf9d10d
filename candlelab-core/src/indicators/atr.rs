//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR is the simple rolling mean of the true range.
//! Lookback: period (the first candle has no previous close, so TR[0] is `NaN`).

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        rolling_mean(&true_range(candles), self.period)
    }
}

/// True Range: max(high-low, |high-prev_close|, |low-prev_close|).
/// `NaN` at index 0, where there is no previous close.
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(candles.windows(2).map(|pair| {
            let (prev_close, c) = (pair[0].close, &pair[1]);
            (c.high - c.low)
                .max((c.high - prev_close).abs())
                .max((c.low - prev_close).abs())
        }))
        .take(candles.len())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::make_candles;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn true_range_uses_previous_close_gap() {
        let mut candles = make_candles(&[100.0, 100.0]);
        // Gap up: prev close 100, current range 110..112
        candles[1].high = 112.0;
        candles[1].low = 110.0;
        let tr = true_range(&candles);
        assert!(tr[0].is_nan());
        assert_approx(tr[1], 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn atr_constant_range() {
        // make_candles with flat closes → every TR = 2.0
        let candles = make_candles(&[50.0; 6]);
        let result = Atr::new(3).compute(&candles);
        assert!(result[2].is_nan());
        assert_approx(result[3], 2.0, DEFAULT_EPSILON);
        assert_approx(result[5], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_of_empty_and_single_candle() {
        assert!(true_range(&[]).is_empty());
        let tr = true_range(&make_candles(&[10.0]));
        assert_eq!(tr.len(), 1);
        assert!(tr[0].is_nan());
    }

    #[test]
    fn atr_lookback() {
        assert_eq!(Atr::new(14).lookback(), 14);
    }
}
