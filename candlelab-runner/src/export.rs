//! Result export: JSON, CSV and plain-text artifacts.
//!
//! A run directory holds:
//! - `result.json`: the full `BacktestResult` with its schema version
//! - `equity.csv`: one row per candle
//! - `trades.csv`: one row per closed trade
//! - `summary.csv`: `metric,value` pairs
//!
//! A comparison directory holds `comparison.csv` plus one run directory per
//! strategy. Unknown schema versions are rejected on load.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use candlelab_core::domain::{EquityPoint, TradeRecord};

use crate::compare::{comparison_rows, ComparisonRow};
use crate::result::{BacktestResult, SCHEMA_VERSION};

// ─── JSON ───────────────────────────────────────────────────────────

pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult`, rejecting schema versions newer than ours.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV ────────────────────────────────────────────────────────────

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: timestamp, balance.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "balance"])?;
    for point in equity_curve {
        wtr.write_record([point.timestamp.to_rfc3339(), format!("{:.6}", point.balance)])?;
    }
    finish(wtr)
}

/// Columns: entry_timestamp, exit_timestamp, entry_index, exit_index,
/// entry_price, exit_price, quantity, commission, profit_amount,
/// profit_percentage, outcome, exit_reason
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "entry_timestamp",
        "exit_timestamp",
        "entry_index",
        "exit_index",
        "entry_price",
        "exit_price",
        "quantity",
        "commission",
        "profit_amount",
        "profit_percentage",
        "outcome",
        "exit_reason",
    ])?;

    for t in trades {
        wtr.write_record([
            t.entry_timestamp.to_rfc3339(),
            t.exit_timestamp.to_rfc3339(),
            t.entry_index.to_string(),
            t.exit_index.to_string(),
            format!("{:.6}", t.entry_price),
            format!("{:.6}", t.exit_price),
            format!("{:.8}", t.quantity),
            format!("{:.6}", t.commission),
            format!("{:.6}", t.profit_amount),
            format!("{:.6}", t.profit_percentage),
            t.outcome.as_str().to_string(),
            t.exit_reason.as_str().to_string(),
        ])?;
    }
    finish(wtr)
}

/// `metric,value` rows for the headline numbers of a run.
pub fn export_summary_csv(result: &BacktestResult) -> Result<String> {
    let m = &result.metrics;
    let optional = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();

    let mut rows: Vec<(String, String)> = vec![
        ("strategy".into(), result.strategy.clone()),
        ("symbol".into(), result.symbol.clone()),
        ("candles".into(), result.candle_count.to_string()),
        ("initial_balance".into(), format!("{:.6}", result.initial_balance)),
        ("final_balance".into(), format!("{:.6}", m.final_balance)),
        ("profit_amount".into(), format!("{:.6}", m.profit_amount)),
        ("profit_percentage".into(), format!("{:.6}", m.profit_percentage)),
        ("total_trades".into(), m.total_trades.to_string()),
        ("winning_trades".into(), m.winning_trades.to_string()),
        ("losing_trades".into(), m.losing_trades.to_string()),
        ("breakeven_trades".into(), m.breakeven_trades.to_string()),
        ("win_rate".into(), format!("{:.6}", m.win_rate)),
        ("max_drawdown".into(), format!("{:.6}", m.max_drawdown)),
        ("sharpe_ratio".into(), format!("{:.6}", m.sharpe_ratio)),
        ("sortino_ratio".into(), format!("{:.6}", m.sortino_ratio)),
        ("annualized_sharpe".into(), optional(m.annualized_sharpe)),
        ("annualized_sortino".into(), optional(m.annualized_sortino)),
        ("profit_factor".into(), optional(m.profit_factor)),
        ("avg_win".into(), format!("{:.6}", m.avg_win)),
        ("avg_loss".into(), format!("{:.6}", m.avg_loss)),
        ("skipped_entries".into(), result.skipped_entries.to_string()),
        ("run_id".into(), result.run_id.clone()),
        ("dataset_hash".into(), result.dataset_hash.clone()),
    ];
    for (reason, count) in &m.exit_reasons {
        rows.push((format!("exits_{reason}"), count.to_string()));
    }

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["metric", "value"])?;
    for (metric, value) in &rows {
        wtr.write_record([metric, value])?;
    }
    finish(wtr)
}

/// One row per strategy, in the order given.
pub fn export_comparison_csv(rows: &[ComparisonRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for row in rows {
        wtr.serialize(row)?;
    }
    if rows.is_empty() {
        wtr.write_record([
            "strategy",
            "final_balance",
            "profit_percentage",
            "total_trades",
            "win_rate",
            "max_drawdown",
            "sharpe_ratio",
            "sortino_ratio",
        ])?;
    }
    finish(wtr)
}

// ─── Artifact bundles ───────────────────────────────────────────────

/// Directory name for a run: `{strategy}_{symbol}`, filesystem-safe.
pub fn run_dir_name(result: &BacktestResult) -> String {
    format!("{}_{}", result.strategy, result.symbol)
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// Save the full artifact set for one run under `output_dir`.
///
/// Returns the created run directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let run_dir = output_dir.join(run_dir_name(result));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    write_file(&run_dir.join("result.json"), &export_json(result)?)?;
    write_file(
        &run_dir.join("equity.csv"),
        &export_equity_csv(&result.equity_curve)?,
    )?;
    write_file(
        &run_dir.join("trades.csv"),
        &export_trades_csv(&result.trades_history)?,
    )?;
    write_file(&run_dir.join("summary.csv"), &export_summary_csv(result)?)?;

    Ok(run_dir)
}

/// Save `comparison.csv` plus every run's artifacts under `output_dir`.
///
/// Fails before writing anything if two results would share a run
/// directory.
pub fn save_comparison(results: &[BacktestResult], output_dir: &Path) -> Result<PathBuf> {
    let mut seen = BTreeSet::new();
    for result in results {
        let name = run_dir_name(result);
        if !seen.insert(name.clone()) {
            bail!("two comparison runs share the artifact directory '{name}'");
        }
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;
    for result in results {
        save_artifacts(result, output_dir)?;
    }
    let path = output_dir.join("comparison.csv");
    write_file(&path, &export_comparison_csv(&comparison_rows(results))?)?;
    Ok(path)
}

/// Load a `BacktestResult` from a run directory's `result.json`.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Text reports ───────────────────────────────────────────────────

/// Human-readable summary of one run.
pub fn render_summary(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut out = String::with_capacity(512);
    let _ = writeln!(out, "Strategy:        {}", result.strategy);
    let _ = writeln!(out, "Symbol:          {}", result.symbol);
    let _ = writeln!(out, "Candles:         {}", result.candle_count);
    let _ = writeln!(out, "Initial balance: {:.2}", result.initial_balance);
    let _ = writeln!(out, "Final balance:   {:.2}", m.final_balance);
    let _ = writeln!(
        out,
        "Profit:          {:.2} ({:.2}%)",
        m.profit_amount,
        m.profit_percentage * 100.0
    );
    let _ = writeln!(
        out,
        "Trades:          {} ({} won, {} lost, {} even)",
        m.total_trades, m.winning_trades, m.losing_trades, m.breakeven_trades
    );
    let _ = writeln!(out, "Win rate:        {:.2}%", m.win_rate * 100.0);
    let _ = writeln!(out, "Max drawdown:    {:.2}%", m.max_drawdown * 100.0);
    let _ = writeln!(out, "Sharpe:          {:.4}", m.sharpe_ratio);
    let _ = writeln!(out, "Sortino:         {:.4}", m.sortino_ratio);
    if let (Some(sharpe), Some(sortino)) = (m.annualized_sharpe, m.annualized_sortino) {
        let _ = writeln!(out, "Annualized:      sharpe {sharpe:.4}, sortino {sortino:.4}");
    }
    if let Some(position) = &result.open_position {
        let _ = writeln!(
            out,
            "Open position:   {:.8} @ {:.2} since candle {}",
            position.quantity, position.entry_price, position.entry_index
        );
    }
    out
}

/// Fixed-width comparison table, one line per strategy.
pub fn render_comparison(rows: &[ComparisonRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36} {:>14} {:>10} {:>7} {:>9} {:>9} {:>9}",
        "Strategy", "Final balance", "Profit %", "Trades", "Win %", "Max DD %", "Sharpe"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<36} {:>14.2} {:>10.2} {:>7} {:>9.2} {:>9.2} {:>9.4}",
            row.strategy,
            row.final_balance,
            row.profit_percentage * 100.0,
            row.total_trades,
            row.win_rate * 100.0,
            row.max_drawdown * 100.0,
            row.sharpe_ratio,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;
    use crate::metrics::Metrics;
    use candlelab_core::domain::{ExitReason, TradeOutcome};
    use chrono::{Duration, TimeZone, Utc};

    fn sample_trade() -> TradeRecord {
        let entry = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        TradeRecord {
            entry_index: 0,
            entry_timestamp: entry,
            entry_price: 100.0,
            exit_index: 9,
            exit_timestamp: entry + Duration::hours(9),
            exit_price: 120.0,
            exit_reason: ExitReason::Signal,
            quantity: 1.0,
            commission: 0.0,
            profit_amount: 20.0,
            profit_percentage: 0.2,
            outcome: TradeOutcome::Win,
        }
    }

    fn sample_result() -> BacktestResult {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let equity_curve: Vec<EquityPoint> = [100.0, 110.0, 120.0]
            .iter()
            .enumerate()
            .map(|(i, &balance)| EquityPoint {
                timestamp: start + Duration::hours(i as i64),
                balance,
            })
            .collect();
        let trades = vec![sample_trade()];
        BacktestResult {
            schema_version: SCHEMA_VERSION,
            run_id: "abc".into(),
            strategy: "moving_average_cross".into(),
            symbol: "BTCUSDT".into(),
            dataset_hash: "def".into(),
            candle_count: 3,
            initial_balance: 100.0,
            metrics: Metrics::compute(&equity_curve, &trades, 100.0, None),
            equity_curve,
            trades_history: trades,
            open_position: None,
            skipped_entries: 0,
            config: RunConfig::default(),
        }
    }

    #[test]
    fn json_roundtrip() {
        let original = sample_result();
        let json = export_json(&original).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn json_rejects_unknown_version() {
        let mut result = sample_result();
        result.schema_version = 99;
        let json = export_json(&result).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn csv_trades_header_and_row() {
        let csv = export_trades_csv(&[sample_trade()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("entry_timestamp,exit_timestamp"));
        assert!(lines[1].contains("120.000000"));
        assert!(lines[1].ends_with("win,signal"));
    }

    #[test]
    fn csv_empty_trades() {
        let csv = export_trades_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn csv_equity_basic() {
        let result = sample_result();
        let csv = export_equity_csv(&result.equity_curve).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,balance");
        assert_eq!(lines.len(), 4);
        assert!(lines[3].ends_with(",120.000000"));
    }

    #[test]
    fn csv_summary_has_headline_metrics() {
        let csv = export_summary_csv(&sample_result()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "metric,value");
        assert!(lines.contains(&"final_balance,120.000000"));
        assert!(lines.contains(&"win_rate,1.000000"));
        assert!(lines.contains(&"profit_factor,"));
        assert!(lines.contains(&"exits_signal,1"));
    }

    #[test]
    fn csv_comparison_rows() {
        let result = sample_result();
        let csv = export_comparison_csv(&comparison_rows(&[result.clone(), result])).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("strategy,final_balance"));
        assert!(lines[1].starts_with("moving_average_cross,120"));
    }

    #[test]
    fn run_dir_name_is_filesystem_safe() {
        let mut result = sample_result();
        result.strategy = "rsi_threshold+vortex".into();
        result.symbol = "BTC/USDT".into();
        assert_eq!(run_dir_name(&result), "rsi_threshold_vortex_BTC_USDT");
    }

    #[test]
    fn text_reports_mention_strategy() {
        let result = sample_result();
        assert!(render_summary(&result).contains("moving_average_cross"));
        let table = render_comparison(&comparison_rows(&[result]));
        assert_eq!(table.lines().count(), 2);
    }
}
