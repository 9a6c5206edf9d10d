//! Criterion benchmarks for CandleLab hot paths.
//!
//! Benchmarks:
//! 1. Simulator loop with a scripted adapter (pure engine overhead)
//! 2. Simulator loop with each shipped strategy (prefix evaluation cost)
//! 3. Indicator computation over a long series

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use candlelab_core::domain::{Candle, Decision};
use candlelab_core::engine::{run, CostModel, PositionSizing, SimulationConfig};
use candlelab_core::indicators::{Atr, Indicator, Rsi, Sma, Vortex, VortexLine};
use candlelab_core::strategy::{DecisionSchedule, SignalAdapter, StrategyParams};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_candles(n: usize) -> Vec<Candle> {
    let start = chrono::DateTime::from_timestamp(1_704_067_200, 0).unwrap_or_default();
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Candle::new(
                start + chrono::Duration::hours(i as i64),
                open,
                close + 1.5,
                close - 1.5,
                close,
                1_000.0 + (i % 500) as f64,
            )
        })
        .collect()
}

fn config() -> SimulationConfig {
    SimulationConfig::new(10_000.0, PositionSizing::PercentOfCash(100.0))
        .with_costs(CostModel::new(0.001, 0.0005))
}

// ── 1. Engine overhead ───────────────────────────────────────────────

fn bench_scripted(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator_scripted");
    for n in [1_000usize, 10_000] {
        let candles = make_candles(n);
        let schedule = DecisionSchedule::from_decisions((0..n).map(|i| match i % 20 {
            0 => Decision::EnterLong,
            10 => Decision::ExitLong,
            _ => Decision::Hold,
        }));
        let config = config();
        group.bench_with_input(BenchmarkId::from_parameter(n), &candles, |b, candles| {
            b.iter(|| run(black_box(candles), &schedule, &config))
        });
    }
    group.finish();
}

// ── 2. Strategies ────────────────────────────────────────────────────

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator_strategy");
    group.sample_size(10);
    let candles = make_candles(1_000);
    let config = config();
    for params in StrategyParams::all_defaults() {
        let Ok(strategy) = params.build() else {
            continue;
        };
        let adapter = SignalAdapter::new(strategy);
        group.bench_function(params.name(), |b| {
            b.iter(|| run(black_box(&candles), &adapter, &config))
        });
    }
    group.finish();
}

// ── 3. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let candles = make_candles(10_000);
    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(40)),
        Box::new(Rsi::wilder(14)),
        Box::new(Atr::new(10)),
        Box::new(Vortex::new(14, VortexLine::Positive)),
    ];

    let mut group = c.benchmark_group("indicators");
    for indicator in &indicators {
        group.bench_function(indicator.name(), |b| {
            b.iter(|| indicator.compute(black_box(&candles)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_scripted, bench_strategies, bench_indicators);
criterion_main!(benches);
