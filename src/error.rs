//! Risk core error taxonomy
//!
//! All variants are local, recoverable conditions. The orchestration layer
//! decides whether to skip the cycle, retry on the next tick, or escalate.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::position::PositionId;

/// Risk core errors
#[derive(Debug, Error)]
pub enum RiskError {
    /// Zero or negative risk per unit; sizing aborted
    #[error("Invalid stop distance: risk per unit {0} is not positive")]
    InvalidStop(Decimal),
    /// Non-positive entry price; no position may be opened
    #[error("Invalid entry price for stop placement: {0}")]
    InvalidVolatility(Decimal),
    /// Tick older than the last applied tick; dropped without state change
    #[error("Stale tick: received {received}, last applied {last_applied}")]
    StaleData {
        last_applied: DateTime<Utc>,
        received: DateTime<Utc>,
    },
    /// Sized notional exceeds available balance even after the cap
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        required: Decimal,
        available: Decimal,
    },
    /// Position not tracked by this engine
    #[error("Unknown position: {0}")]
    UnknownPosition(PositionId),
    /// Agent not registered with the governor
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
}
