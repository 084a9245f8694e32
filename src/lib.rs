//! risk-engine: risk governance core for a multi-agent trading platform
//!
//! This library provides the core components for:
//! - ATR-based initial stop placement scaled by volatility regime
//! - Confidence- and regime-adjusted position sizing
//! - Per-position trailing stop state machine with a ratchet invariant
//! - Portfolio and per-agent drawdown limits with advisory pause decisions
//! - Kelly-style capital reallocation across agents
//! - Collaborator traits for market data, regime classification and execution
//! - Full observability stack

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod feed;
pub mod governor;
pub mod position;
pub mod regime;
pub mod sizing;
pub mod stops;
pub mod telemetry;
