//! Relative Strength Index (RSI).
//!
//! Close-to-close changes are split into gains and losses. The first candle
//! has no change and counts as zero in both series. Each series is averaged
//! and RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//!
//! Averaging:
//! - Wilder: recursive mean `m[t] = m[t-1] + (x[t] - m[t-1]) / period`,
//!   started at `m[0] = x[0]`. Defined from candle 1.
//! - Simple: rolling mean over the last `period` values. Defined from
//!   candle `period - 1`.
//!
//! No movement at all (both averages zero) is `NaN`; only gains is 100.

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Smoothing {
    Wilder,
    Simple,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    smoothing: Smoothing,
    name: String,
}

impl Rsi {
    /// RSI with Wilder's recursive averaging.
    pub fn wilder(period: usize) -> Self {
        Self::build(period, Smoothing::Wilder, "rsi")
    }

    /// RSI with plain rolling averages of gains and losses.
    pub fn simple(period: usize) -> Self {
        Self::build(period, Smoothing::Simple, "rsi_sma")
    }

    fn build(period: usize, smoothing: Smoothing, prefix: &str) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            smoothing,
            name: format!("{prefix}_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.smoothing {
            Smoothing::Wilder => 1,
            Smoothing::Simple => (self.period - 1).max(1),
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let (gains, losses) = gains_and_losses(candles);
        let (avg_gain, avg_loss) = match self.smoothing {
            Smoothing::Wilder => (
                wilder_mean(&gains, self.period),
                wilder_mean(&losses, self.period),
            ),
            Smoothing::Simple => (
                rolling_mean(&gains, self.period),
                rolling_mean(&losses, self.period),
            ),
        };

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&gain, &loss)| strength_index(gain, loss))
            .collect()
    }
}

fn gains_and_losses(candles: &[Candle]) -> (Vec<f64>, Vec<f64>) {
    let mut gains = vec![0.0; candles.len()];
    let mut losses = vec![0.0; candles.len()];
    for (i, pair) in candles.windows(2).enumerate() {
        let change = pair[1].close - pair[0].close;
        gains[i + 1] = change.max(0.0);
        losses[i + 1] = (-change).max(0.0);
    }
    (gains, losses)
}

fn wilder_mean(values: &[f64], period: usize) -> Vec<f64> {
    let alpha = 1.0 / period as f64;
    let mut out = Vec::with_capacity(values.len());
    let mut mean: Option<f64> = None;
    for &v in values {
        let next = match mean {
            Some(m) => m + alpha * (v - m),
            None => v,
        };
        mean = Some(next);
        out.push(next);
    }
    out
}

fn strength_index(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_gain.is_nan() || avg_loss.is_nan() {
        return f64::NAN;
    }
    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { f64::NAN } else { 100.0 };
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}
