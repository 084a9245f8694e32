//! Protective stop placement and trailing
//!
//! Initial stops are derived from ATR and the volatility regime; once a
//! position is open, the trailing engine ratchets its stop as profit accrues.

mod calculator;
mod trailing;

pub use calculator::StopCalculator;
pub use trailing::{StopUpdate, TrailingStopEngine};
