//! File-level tests: candle files in and artifact bundles out.
//!
//! Tests:
//! 1. CSV written by the loader reads back to the same candles
//! 2. Parquet written by the loader reads back to the same candles
//! 3. Hand-written CSV with RFC 3339 and kline-style headers loads
//! 4. Unordered or duplicated CSV rows are rejected
//! 5. Run artifacts are written and reload to the same result
//! 6. Comparison writes one directory per strategy plus comparison.csv
//! 7. Comparison refuses two runs that map to the same directory

use std::fs;

use chrono::{TimeZone, Utc};

use candlelab_core::strategy::StrategyParams;
use candlelab_core::DataIntegrityError;
use candlelab_runner::data_loader::{
    dataset_hash, load_candles, write_candles_csv, write_candles_parquet, CandleSource,
};
use candlelab_runner::export::{load_artifacts, save_artifacts, save_comparison};
use candlelab_runner::{
    compare_strategies, generate_synthetic, run_backtest, run_from_path, CandleInterval,
    LoadError, RunConfig,
};

fn sample_candles(n: usize) -> Vec<candlelab_core::domain::Candle> {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
    generate_synthetic("ETHUSDT", n, start, CandleInterval::FifteenMinutes)
}

// ── Candle files ──

#[test]
fn csv_roundtrip_preserves_candles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("candles.csv");
    let candles = sample_candles(120);

    write_candles_csv(&candles, &path).unwrap();
    let loaded = load_candles(&path).unwrap();

    assert_eq!(loaded.source, CandleSource::Csv);
    assert_eq!(loaded.candles, candles);
    assert_eq!(loaded.dataset_hash, dataset_hash(&candles));
}

#[test]
fn parquet_roundtrip_preserves_candles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("candles.parquet");
    let candles = sample_candles(120);

    write_candles_parquet(&candles, &path).unwrap();
    let loaded = load_candles(&path).unwrap();

    assert_eq!(loaded.source, CandleSource::Parquet);
    assert_eq!(loaded.candles, candles);
}

#[test]
fn csv_accepts_rfc3339_and_kline_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("klines.csv");
    fs::write(
        &path,
        "open_time,open_price,high_price,low_price,close_price,volume\n\
         2024-01-01T00:00:00Z,100,101,99,100.5,10\n\
         2024-01-01 01:00:00,100.5,102,100,101.5,12\n",
    )
    .unwrap();

    let loaded = load_candles(&path).unwrap();
    assert_eq!(loaded.candles.len(), 2);
    assert_eq!(loaded.candles[1].close, 101.5);
    assert_eq!(
        loaded.candles[1].timestamp,
        Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()
    );
}

#[test]
fn csv_rejects_out_of_order_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    fs::write(
        &path,
        "timestamp,open,high,low,close,volume\n\
         1704070800000,100,101,99,100,1\n\
         1704067200000,100,101,99,100,1\n",
    )
    .unwrap();

    let err = load_candles(&path).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Integrity(DataIntegrityError::OutOfOrder { index: 1, .. })
    ));
}

#[test]
fn csv_rejects_duplicate_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dup.csv");
    fs::write(
        &path,
        "timestamp,open,high,low,close,volume\n\
         1704067200000,100,101,99,100,1\n\
         1704067200000,100,101,99,100,1\n",
    )
    .unwrap();

    assert!(matches!(
        load_candles(&path).unwrap_err(),
        LoadError::Integrity(DataIntegrityError::DuplicateTimestamp { .. })
    ));
}

#[test]
fn csv_rejects_bad_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ts.csv");
    fs::write(
        &path,
        "timestamp,open,high,low,close,volume\nnot-a-time,100,101,99,100,1\n",
    )
    .unwrap();

    assert!(matches!(
        load_candles(&path).unwrap_err(),
        LoadError::Timestamp { row: 0, .. }
    ));
}

// ── Artifacts ──

#[test]
fn run_artifacts_are_written_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let candle_path = dir.path().join("candles.csv");
    write_candles_csv(&sample_candles(300), &candle_path).unwrap();

    let config = RunConfig {
        interval: Some(CandleInterval::FifteenMinutes),
        ..Default::default()
    };
    let result = run_from_path(&candle_path, &config).unwrap();
    let run_dir = save_artifacts(&result, &dir.path().join("out")).unwrap();

    for file in ["result.json", "equity.csv", "trades.csv", "summary.csv"] {
        assert!(run_dir.join(file).exists(), "{file} missing");
    }
    let equity = fs::read_to_string(run_dir.join("equity.csv")).unwrap();
    assert_eq!(equity.lines().count(), 301);
    let trades = fs::read_to_string(run_dir.join("trades.csv")).unwrap();
    assert_eq!(trades.lines().count(), result.trades_history.len() + 1);

    let reloaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(reloaded, result);
}

#[test]
fn comparison_writes_every_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let candles = sample_candles(250);
    let strategies = StrategyParams::all_defaults();

    let results = compare_strategies(&candles, &RunConfig::default(), &strategies).unwrap();
    let csv_path = save_comparison(&results, dir.path()).unwrap();

    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), strategies.len() + 1);
    for (line, params) in lines[1..].iter().zip(&strategies) {
        assert!(line.starts_with(params.name()));
    }
    for result in &results {
        let single = run_backtest(&candles, &RunConfig::default().with_strategy(
            StrategyParams::from_name(&result.strategy).unwrap(),
        ))
        .unwrap();
        assert_eq!(single.final_balance(), result.final_balance());
    }
}

#[test]
fn comparison_refuses_colliding_run_directories() {
    let dir = tempfile::tempdir().unwrap();
    let candles = sample_candles(120);
    let vortex = StrategyParams::from_name("vortex").unwrap();

    let results =
        compare_strategies(&candles, &RunConfig::default(), &[vortex.clone(), vortex]).unwrap();
    let err = save_comparison(&results, dir.path()).unwrap_err();

    assert!(err.to_string().contains("share the artifact directory"));
    assert!(!dir.path().join("comparison.csv").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}
