//! Vortex indicator (VI+ / VI-).
//!
//! VM+[t] = |high[t] - low[t-1]|, VM-[t] = |low[t] - high[t-1]|
//! VI± = rolling_sum(VM±, period) / rolling_sum(TR, period)
//! Lookback: period (VM needs a previous candle).

use super::atr::true_range;
use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Candle;

/// Which vortex line to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VortexLine {
    Positive,
    Negative,
}

#[derive(Debug, Clone)]
pub struct Vortex {
    period: usize,
    line: VortexLine,
    name: String,
}

impl Vortex {
    pub fn new(period: usize, line: VortexLine) -> Self {
        assert!(period >= 1, "Vortex period must be >= 1");
        let suffix = match line {
            VortexLine::Positive => "plus",
            VortexLine::Negative => "minus",
        };
        Self {
            period,
            line,
            name: format!("vi_{suffix}_{period}"),
        }
    }
}

impl Indicator for Vortex {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut movement = vec![f64::NAN; n];
        for i in 1..n {
            movement[i] = match self.line {
                VortexLine::Positive => (candles[i].high - candles[i - 1].low).abs(),
                VortexLine::Negative => (candles[i].low - candles[i - 1].high).abs(),
            };
        }

        let tr = true_range(candles);

        // Ratio of means over the same window equals the ratio of sums.
        let vm_mean = rolling_mean(&movement, self.period);
        let tr_mean = rolling_mean(&tr, self.period);

        vm_mean
            .iter()
            .zip(&tr_mean)
            .map(|(&vm, &tr)| if tr > 0.0 { vm / tr } else { f64::NAN })
            .collect()
    }
}
