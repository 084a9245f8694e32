//! Initial stop placement

use rust_decimal::Decimal;

use crate::config::{RiskConfig, StopConfig};
use crate::error::RiskError;
use crate::position::Direction;
use crate::regime::VolatilityState;

/// Derives the initial protective stop from entry price, direction and ATR
///
/// Wider stops under high volatility avoid noise-driven stop-outs; tighter
/// stops under low volatility match the smaller expected excursions.
#[derive(Debug, Clone)]
pub struct StopCalculator {
    multipliers: StopConfig,
    /// Fallback stop distance as a fraction of entry when ATR is zero
    default_stop_pct: Decimal,
}

impl StopCalculator {
    /// Create a calculator from configuration
    pub fn new(stops: StopConfig, risk: &RiskConfig) -> Self {
        Self {
            multipliers: stops,
            default_stop_pct: risk.default_stop_pct,
        }
    }

    /// ATR multiplier for a volatility state
    pub fn multiplier(&self, volatility: VolatilityState) -> Decimal {
        match volatility {
            VolatilityState::Low => self.multipliers.low_multiplier,
            VolatilityState::Normal => self.multipliers.normal_multiplier,
            VolatilityState::High => self.multipliers.high_multiplier,
        }
    }

    /// Compute the initial stop price for a new position
    pub fn initial_stop(
        &self,
        entry_price: Decimal,
        direction: Direction,
        atr: Decimal,
        volatility: VolatilityState,
    ) -> Result<Decimal, RiskError> {
        if entry_price <= Decimal::ZERO {
            return Err(RiskError::InvalidVolatility(entry_price));
        }

        // Zero ATR: fall back to a fixed fractional stop
        let distance = if atr <= Decimal::ZERO {
            entry_price * self.default_stop_pct
        } else {
            self.multiplier(volatility) * atr
        };

        let stop = match direction {
            Direction::Long => entry_price - distance,
            Direction::Short => entry_price + distance,
        };

        Ok(stop)
    }
}

impl Default for StopCalculator {
    fn default() -> Self {
        Self::new(StopConfig::default(), &RiskConfig::default())
    }
}
