//! Per-candle trade decisions.

use serde::{Deserialize, Serialize};

/// What the simulator should do at a candle.
///
/// Long-only: ENTER while a position is open and EXIT while flat are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    EnterLong,
    ExitLong,
    Hold,
}

/// Desired market exposure as expressed by a strategy signal.
///
/// A strategy returns `Option<Stance>`; `None` means the signal is
/// inconclusive at this candle (e.g. still warming up).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stance {
    /// Want to hold the instrument.
    Long,
    /// Want no exposure.
    Flat,
}

impl Decision {
    /// Normalize a strategy stance into a decision.
    pub fn from_stance(stance: Option<Stance>) -> Self {
        match stance {
            Some(Stance::Long) => Decision::EnterLong,
            Some(Stance::Flat) => Decision::ExitLong,
            None => Decision::Hold,
        }
    }
}

impl From<Option<Stance>> for Decision {
    fn from(stance: Option<Stance>) -> Self {
        Decision::from_stance(stance)
    }
}
