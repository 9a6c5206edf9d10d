//! Adapters that turn signal functions into per-candle decisions.

use tracing::trace;

use super::{Strategy, StrategyAdapter};
use crate::domain::{Candle, Decision};
use crate::error::StrategyError;

/// Wraps a single [`Strategy`]: `Long → EnterLong`, `Flat → ExitLong`,
/// inconclusive `→ Hold`.
#[derive(Debug, Clone)]
pub struct SignalAdapter<S> {
    strategy: S,
}

impl<S: Strategy> SignalAdapter<S> {
    pub fn new(strategy: S) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}

impl<S: Strategy> StrategyAdapter for SignalAdapter<S> {
    fn decide(&self, candles: &[Candle]) -> Result<Decision, StrategyError> {
        if candles.len() < self.strategy.warmup_candles() {
            return Ok(Decision::Hold);
        }
        self.strategy.evaluate(candles).map(Decision::from)
    }

    fn label(&self) -> String {
        self.strategy.name().to_string()
    }
}

/// Main strategy with a secondary one consulted only when the main one is
/// inconclusive.
pub struct FallbackAdapter {
    main: Box<dyn Strategy>,
    fallback: Box<dyn Strategy>,
}

impl FallbackAdapter {
    pub fn new(main: Box<dyn Strategy>, fallback: Box<dyn Strategy>) -> Self {
        Self { main, fallback }
    }
}

impl StrategyAdapter for FallbackAdapter {
    fn decide(&self, candles: &[Candle]) -> Result<Decision, StrategyError> {
        if let Some(stance) = self.main.evaluate(candles)? {
            return Ok(Decision::from_stance(Some(stance)));
        }
        trace!(
            main = self.main.name(),
            fallback = self.fallback.name(),
            index = candles.len().saturating_sub(1),
            "main strategy inconclusive, consulting fallback"
        );
        self.fallback.evaluate(candles).map(Decision::from)
    }

    fn label(&self) -> String {
        format!("{}+{}", self.main.name(), self.fallback.name())
    }
}

impl std::fmt::Debug for FallbackAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackAdapter")
            .field("main", &self.main.name())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candle::make_candles;
    use crate::domain::Stance;

    struct Fixed {
        name: &'static str,
        stance: Option<Stance>,
        warmup: usize,
    }

    impl Strategy for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn warmup_candles(&self) -> usize {
            self.warmup
        }

        fn evaluate(&self, _candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
            Ok(self.stance)
        }
    }

    struct Failing;

    impl Strategy for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn warmup_candles(&self) -> usize {
            0
        }

        fn evaluate(&self, _candles: &[Candle]) -> Result<Option<Stance>, StrategyError> {
            Err(StrategyError::new("failing", "boom"))
        }
    }

    fn fixed(name: &'static str, stance: Option<Stance>) -> Fixed {
        Fixed {
            name,
            stance,
            warmup: 0,
        }
    }

    #[test]
    fn signal_adapter_maps_stances() {
        let candles = make_candles(&[100.0]);
        let long = SignalAdapter::new(fixed("a", Some(Stance::Long)));
        let flat = SignalAdapter::new(fixed("b", Some(Stance::Flat)));
        let none = SignalAdapter::new(fixed("c", None));
        assert_eq!(long.decide(&candles), Ok(Decision::EnterLong));
        assert_eq!(flat.decide(&candles), Ok(Decision::ExitLong));
        assert_eq!(none.decide(&candles), Ok(Decision::Hold));
        assert_eq!(long.label(), "a");
    }

    #[test]
    fn signal_adapter_holds_during_warmup() {
        let adapter = SignalAdapter::new(Fixed {
            name: "warm",
            stance: Some(Stance::Long),
            warmup: 3,
        });
        let candles = make_candles(&[1.0, 2.0, 3.0]);
        assert_eq!(adapter.decide(&candles[..2]), Ok(Decision::Hold));
        assert_eq!(adapter.decide(&candles), Ok(Decision::EnterLong));
    }

    #[test]
    fn fallback_used_only_when_main_inconclusive() {
        let candles = make_candles(&[100.0]);
        let adapter = FallbackAdapter::new(
            Box::new(fixed("main", None)),
            Box::new(fixed("backup", Some(Stance::Long))),
        );
        assert_eq!(adapter.decide(&candles), Ok(Decision::EnterLong));
        assert_eq!(adapter.label(), "main+backup");

        let adapter = FallbackAdapter::new(
            Box::new(fixed("main", Some(Stance::Flat))),
            Box::new(Failing),
        );
        assert_eq!(adapter.decide(&candles), Ok(Decision::ExitLong));
    }

    #[test]
    fn errors_propagate() {
        let candles = make_candles(&[100.0]);
        let adapter = SignalAdapter::new(Failing);
        assert!(adapter.decide(&candles).is_err());
    }
}
