//! Candle loading for the runner.
//!
//! Sources:
//! 1. CSV with a header row `timestamp,open,high,low,close,volume`
//! 2. Parquet with the same columns
//! 3. Synthetic random walk, seeded from the symbol (developer mode)
//!
//! Timestamps in CSV may be epoch milliseconds, RFC 3339, or
//! `YYYY-MM-DD HH:MM:SS` (read as UTC). In Parquet they may be Int64
//! milliseconds or any Datetime unit. Every loaded series is validated
//! before it is returned, so a caller never receives unordered or
//! duplicated candles.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use candlelab_core::domain::{validate_series, Candle};
use candlelab_core::DataIntegrityError;

use crate::config::CandleInterval;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported candle file extension '{0}' (expected .csv or .parquet)")]
    UnsupportedFormat(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognised timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("invalid candle data: {0}")]
    Integrity(#[from] DataIntegrityError),
}

/// Where a candle series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandleSource {
    Csv,
    Parquet,
    Synthetic,
}

/// A validated candle series plus its provenance.
#[derive(Debug, Clone)]
pub struct LoadedCandles {
    pub candles: Vec<Candle>,
    pub source: CandleSource,
    /// BLAKE3 over every timestamp and OHLCV value.
    pub dataset_hash: String,
}

impl LoadedCandles {
    fn new(candles: Vec<Candle>, source: CandleSource) -> Result<Self, LoadError> {
        validate_series(&candles)?;
        let dataset_hash = dataset_hash(&candles);
        debug!(
            count = candles.len(),
            source = ?source,
            hash = %dataset_hash,
            "candles loaded"
        );
        Ok(Self {
            candles,
            source,
            dataset_hash,
        })
    }
}

/// Load candles from a `.csv` or `.parquet` file.
pub fn load_candles(path: &Path) -> Result<LoadedCandles, LoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => LoadedCandles::new(read_csv(path)?, CandleSource::Csv),
        "parquet" | "pq" => LoadedCandles::new(read_parquet(path)?, CandleSource::Parquet),
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

/// Synthetic candles wrapped with provenance; see [`generate_synthetic`].
pub fn load_synthetic(
    symbol: &str,
    count: usize,
    start: DateTime<Utc>,
    interval: CandleInterval,
) -> Result<LoadedCandles, LoadError> {
    LoadedCandles::new(
        generate_synthetic(symbol, count, start, interval),
        CandleSource::Synthetic,
    )
}

/// Keep only the most recent `periods` candles (all of them when `None` or
/// when the series is shorter).
pub fn select_periods(candles: &[Candle], periods: Option<usize>) -> &[Candle] {
    match periods {
        Some(n) if n < candles.len() => &candles[candles.len() - n..],
        _ => candles,
    }
}

/// Deterministic BLAKE3 hash over all candle data, in series order.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    for candle in candles {
        hasher.update(&candle.timestamp.timestamp_millis().to_le_bytes());
        hasher.update(&candle.open.to_le_bytes());
        hasher.update(&candle.high.to_le_bytes());
        hasher.update(&candle.low.to_le_bytes());
        hasher.update(&candle.close.to_le_bytes());
        hasher.update(&candle.volume.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

// ─── CSV ────────────────────────────────────────────────────────────

/// One CSV row. Column aliases accept exchange-style kline exports.
#[derive(Debug, Deserialize)]
struct CsvCandle {
    #[serde(alias = "open_time", alias = "date", alias = "time")]
    timestamp: String,
    #[serde(alias = "open_price")]
    open: f64,
    #[serde(alias = "high_price")]
    high: f64,
    #[serde(alias = "low_price")]
    low: f64,
    #[serde(alias = "close_price")]
    close: f64,
    volume: f64,
}

fn read_csv(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);

    let mut candles = Vec::new();
    for (row, record) in reader.deserialize::<CsvCandle>().enumerate() {
        let record = record?;
        let timestamp = parse_timestamp(&record.timestamp).ok_or_else(|| LoadError::Timestamp {
            row,
            value: record.timestamp.clone(),
        })?;
        candles.push(Candle::new(
            timestamp,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
        ));
    }
    Ok(candles)
}

/// Epoch milliseconds, RFC 3339, or a naive `YYYY-MM-DD[ T]HH:MM:SS` in UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(millis) = value.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Write candles as CSV with epoch-millisecond timestamps.
pub fn write_candles_csv(candles: &[Candle], path: &Path) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["timestamp", "open", "high", "low", "close", "volume"])?;
    for c in candles {
        writer.write_record([
            c.timestamp.timestamp_millis().to_string(),
            c.open.to_string(),
            c.high.to_string(),
            c.low.to_string(),
            c.close.to_string(),
            c.volume.to_string(),
        ])?;
    }
    writer.flush().map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

// ─── Parquet ────────────────────────────────────────────────────────

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

fn read_parquet(path: &Path) -> Result<Vec<Candle>, LoadError> {
    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| LoadError::Parquet(format!("read: {e}")))?;

    for name in COLUMNS {
        if df.column(name).is_err() {
            return Err(LoadError::Parquet(format!("missing column '{name}'")));
        }
    }
    dataframe_to_candles(&df)
}

fn dataframe_to_candles(df: &DataFrame) -> Result<Vec<Candle>, LoadError> {
    let map_err = |e: PolarsError| LoadError::Parquet(format!("column read: {e}"));

    let raw_ts = df.column("timestamp").map_err(map_err)?;
    let millis = match raw_ts.dtype() {
        DataType::Datetime(_, _) => raw_ts
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .and_then(|c| c.cast(&DataType::Int64)),
        _ => raw_ts.cast(&DataType::Int64),
    }
    .map_err(|e| LoadError::Parquet(format!("timestamp cast: {e}")))?;
    let ts_ca = millis
        .i64()
        .map_err(|e| LoadError::Parquet(format!("timestamp column type: {e}")))?;

    let float_column = |name: &str| -> Result<Column, LoadError> {
        df.column(name)
            .map_err(map_err)?
            .cast(&DataType::Float64)
            .map_err(|e| LoadError::Parquet(format!("{name} cast: {e}")))
    };
    let opens = float_column("open")?;
    let highs = float_column("high")?;
    let lows = float_column("low")?;
    let closes = float_column("close")?;
    let volumes = float_column("volume")?;

    let as_f64 = |c: &Column| {
        c.f64()
            .cloned()
            .map_err(|e| LoadError::Parquet(format!("{} column type: {e}", c.name())))
    };
    let open_ca = as_f64(&opens)?;
    let high_ca = as_f64(&highs)?;
    let low_ca = as_f64(&lows)?;
    let close_ca = as_f64(&closes)?;
    let vol_ca = as_f64(&volumes)?;

    let mut candles = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let ms = ts_ca
            .get(i)
            .ok_or_else(|| LoadError::Parquet(format!("null timestamp at row {i}")))?;
        let timestamp = DateTime::from_timestamp_millis(ms).ok_or(LoadError::Timestamp {
            row: i,
            value: ms.to_string(),
        })?;

        // Nulls become NaN and are rejected by validation.
        candles.push(Candle::new(
            timestamp,
            open_ca.get(i).unwrap_or(f64::NAN),
            high_ca.get(i).unwrap_or(f64::NAN),
            low_ca.get(i).unwrap_or(f64::NAN),
            close_ca.get(i).unwrap_or(f64::NAN),
            vol_ca.get(i).unwrap_or(f64::NAN),
        ));
    }
    Ok(candles)
}

/// Write candles to Parquet with an Int64 millisecond timestamp column.
pub fn write_candles_parquet(candles: &[Candle], path: &Path) -> Result<(), LoadError> {
    let timestamps: Vec<i64> = candles.iter().map(|c| c.timestamp.timestamp_millis()).collect();
    let opens: Vec<f64> = candles.iter().map(|c| c.open).collect();
    let highs: Vec<f64> = candles.iter().map(|c| c.high).collect();
    let lows: Vec<f64> = candles.iter().map(|c| c.low).collect();
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let mut df = DataFrame::new(vec![
        Column::new("timestamp".into(), timestamps),
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| LoadError::Parquet(format!("dataframe creation: {e}")))?;

    let file = fs::File::create(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| LoadError::Parquet(format!("write parquet: {e}")))?;
    Ok(())
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Generate a deterministic random-walk series for development.
///
/// The RNG is seeded from the symbol, so the same symbol, count, start and
/// interval always produce the same candles.
pub fn generate_synthetic(
    symbol: &str,
    count: usize,
    start: DateTime<Utc>,
    interval: CandleInterval,
) -> Vec<Candle> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut candles = Vec::with_capacity(count);
    let mut price = 100.0_f64;
    let mut timestamp = start;

    for _ in 0..count {
        let step: f64 = rng.gen_range(-0.02..0.02);
        let open = price;
        let close = price * (1.0 + step);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(100.0..10_000.0);

        candles.push(Candle::new(timestamp, open, high, low, close, volume));
        price = close;
        timestamp += interval.duration();
    }

    candles
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn timestamps_in_all_supported_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(parse_timestamp("1709294400000"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T12:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T15:00:00+03:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:00:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn synthetic_data_is_deterministic() {
        let a = generate_synthetic("BTCUSDT", 50, start(), CandleInterval::OneHour);
        let b = generate_synthetic("BTCUSDT", 50, start(), CandleInterval::OneHour);
        assert_eq!(a, b);
        assert_eq!(dataset_hash(&a), dataset_hash(&b));
    }

    #[test]
    fn different_symbols_get_different_synthetic_data() {
        let btc = generate_synthetic("BTCUSDT", 20, start(), CandleInterval::OneHour);
        let eth = generate_synthetic("ETHUSDT", 20, start(), CandleInterval::OneHour);
        assert_eq!(btc.len(), eth.len());
        assert_ne!(btc[0].close, eth[0].close);
        assert_ne!(dataset_hash(&btc), dataset_hash(&eth));
    }

    #[test]
    fn synthetic_candles_are_sane_and_spaced() {
        let candles = generate_synthetic("SOLUSDT", 200, start(), CandleInterval::FifteenMinutes);
        assert!(validate_series(&candles).is_ok());
        assert_eq!(
            candles[1].timestamp - candles[0].timestamp,
            chrono::Duration::minutes(15)
        );
    }

    #[test]
    fn select_periods_keeps_the_tail() {
        let candles = generate_synthetic("X", 10, start(), CandleInterval::OneHour);
        assert_eq!(select_periods(&candles, Some(3)), &candles[7..]);
        assert_eq!(select_periods(&candles, Some(30)).len(), 10);
        assert_eq!(select_periods(&candles, None).len(), 10);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_candles(Path::new("candles.xlsx")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_candles(Path::new("/no/such/candles.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
