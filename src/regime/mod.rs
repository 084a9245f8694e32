//! Market regime boundary contract
//!
//! Classification happens outside the risk core; this module defines the
//! snapshot consumed by stop placement and sizing, and the mapping from
//! volatility state to a position-size multiplier.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::RegimeConfig;

/// Discrete trend classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendState {
    TrendingUp,
    TrendingDown,
    Ranging,
}

/// Discrete volatility classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilityState {
    Low,
    Normal,
    High,
}

/// Point-in-time regime classification, consumed read-only
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegimeSnapshot {
    pub trend_state: TrendState,
    pub volatility_state: VolatilityState,
    pub observed_at: DateTime<Utc>,
}

impl RegimeSnapshot {
    /// Position-size multiplier for this regime.
    /// Trend carries no directional bias change; only volatility scales size.
    pub fn size_multiplier(&self, config: &RegimeConfig) -> Decimal {
        match self.volatility_state {
            VolatilityState::Low => config.low_vol_size_multiplier,
            VolatilityState::Normal => config.normal_vol_size_multiplier,
            VolatilityState::High => config.high_vol_size_multiplier,
        }
    }
}

/// Trait for regime classification providers
pub trait RegimeProvider: Send + Sync {
    /// Current regime for a symbol
    fn get_regime(&self, symbol: &str) -> RegimeSnapshot;
}

/// Fixed regime provider for tests and simulation
#[derive(Debug, Clone)]
pub struct StaticRegime {
    snapshot: RegimeSnapshot,
}

impl StaticRegime {
    pub fn new(trend_state: TrendState, volatility_state: VolatilityState) -> Self {
        Self {
            snapshot: RegimeSnapshot {
                trend_state,
                volatility_state,
                observed_at: Utc::now(),
            },
        }
    }
}

impl Default for StaticRegime {
    fn default() -> Self {
        Self::new(TrendState::Ranging, VolatilityState::Normal)
    }
}

impl RegimeProvider for StaticRegime {
    fn get_regime(&self, _symbol: &str) -> RegimeSnapshot {
        self.snapshot
    }
}
