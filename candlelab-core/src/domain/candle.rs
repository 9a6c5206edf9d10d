//! Candle: the fundamental market data unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DataIntegrityError;

/// OHLCV summary of one fixed time interval for a single instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// Returns true if every OHLCV field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite()
            && self.volume.is_finite()
    }

    /// True when `low..=high` contains both `open` and `close`.
    pub fn range_is_consistent(&self) -> bool {
        self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }
}

/// Check that a candle series can be replayed.
///
/// Rejects empty series, non-finite fields, a high/low range that does not
/// contain open and close, any non-positive price, and any timestamp that
/// does not strictly increase over its predecessor.
/// Gaps between timestamps are not checked.
pub fn validate_series(candles: &[Candle]) -> Result<(), DataIntegrityError> {
    if candles.is_empty() {
        return Err(DataIntegrityError::Empty);
    }

    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_finite() {
            return Err(DataIntegrityError::NonFinite { index });
        }
        if !candle.range_is_consistent() {
            return Err(DataIntegrityError::InconsistentRange {
                index,
                high: candle.high,
                low: candle.low,
            });
        }
        // With a consistent range the low is the smallest price.
        if candle.low <= 0.0 {
            return Err(DataIntegrityError::NonPositivePrice {
                index,
                price: candle.low,
            });
        }
        if index > 0 {
            let previous = candles[index - 1].timestamp;
            if candle.timestamp == previous {
                return Err(DataIntegrityError::DuplicateTimestamp {
                    index,
                    timestamp: candle.timestamp,
                });
            }
            if candle.timestamp < previous {
                return Err(DataIntegrityError::OutOfOrder {
                    index,
                    timestamp: candle.timestamp,
                    previous,
                });
            }
        }
    }

    Ok(())
}

/// Build hourly candles from close prices, starting at 2024-01-01T00:00Z.
///
/// open = previous close (or close for the first candle),
/// high = max(open, close) + 1.0, low = min(open, close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use chrono::TimeZone;
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                timestamp: start + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}
