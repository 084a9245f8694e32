//! Entry planning facade
//!
//! Bundles stop placement, regime multipliers and position sizing into the
//! one call the orchestration layer makes when a signal arrives.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::Config;
use crate::error::RiskError;
use crate::position::{Direction, Position, PositionStatus, ProfitLevel};
use crate::regime::RegimeSnapshot;
use crate::sizing::PositionSizer;
use crate::stops::StopCalculator;

/// A trade signal ready for risk processing
#[derive(Debug, Clone)]
pub struct EntryRequest {
    pub agent_id: String,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub atr: Decimal,
    /// Signal confidence, 0-100
    pub confidence: Decimal,
    /// Historical win rate from the agent's trade history, 0-1
    pub win_rate: Decimal,
    pub balance: Decimal,
    pub regime: RegimeSnapshot,
}

/// A sized, stop-protected entry plan
#[derive(Debug, Clone, Copy)]
pub struct EntryPlan {
    pub stop_price: Decimal,
    pub size_dollars: Decimal,
    pub size_units: Decimal,
}

/// Stop calculator + sizer behind a single entry point
pub struct RiskEngine {
    stops: StopCalculator,
    sizer: PositionSizer,
    regime_config: crate::config::RegimeConfig,
}

impl RiskEngine {
    /// Build the engine from configuration
    pub fn new(config: &Config) -> Self {
        Self {
            stops: StopCalculator::new(config.stops.clone(), &config.risk),
            sizer: PositionSizer::new(&config.risk),
            regime_config: config.regime.clone(),
        }
    }

    /// Turn a signal into a sized, stop-protected plan
    ///
    /// Stop first, then size from the stop distance; the regime's volatility
    /// state drives both the stop multiplier and the size multiplier.
    pub fn size_and_stop(&self, request: &EntryRequest) -> Result<EntryPlan, RiskError> {
        let stop_price = self.stops.initial_stop(
            request.entry_price,
            request.direction,
            request.atr,
            request.regime.volatility_state,
        )?;

        let size = self.sizer.calculate(
            request.balance,
            request.entry_price,
            stop_price,
            request.confidence,
            request.win_rate,
            request.regime.size_multiplier(&self.regime_config),
        )?;

        tracing::info!(
            agent_id = %request.agent_id,
            symbol = %request.symbol,
            direction = ?request.direction,
            entry = %request.entry_price,
            stop = %stop_price,
            size_dollars = %size.dollars,
            "Entry planned"
        );

        Ok(EntryPlan {
            stop_price,
            size_dollars: size.dollars,
            size_units: size.units,
        })
    }

    /// Materialize a plan into an open position for the trailing engine
    pub fn open_position(&self, request: &EntryRequest, plan: &EntryPlan) -> Position {
        let now = Utc::now();
        Position {
            id: Uuid::new_v4(),
            agent_id: request.agent_id.clone(),
            symbol: request.symbol.clone(),
            direction: request.direction,
            entry_price: request.entry_price,
            size_units: plan.size_units,
            size_dollars: plan.size_dollars,
            atr_at_entry: request.atr,
            current_stop: plan.stop_price,
            profit_level: ProfitLevel::Initial,
            opened_at: now,
            last_tick_at: now,
            status: PositionStatus::Open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{RegimeProvider, StaticRegime, TrendState, VolatilityState};
    use rust_decimal_macros::dec;

    fn make_request(volatility: VolatilityState) -> EntryRequest {
        let regime = StaticRegime::new(TrendState::TrendingUp, volatility).get_regime("BTCUSDT");
        EntryRequest {
            agent_id: "agent-1".to_string(),
            symbol: "BTCUSDT".to_string(),
            direction: Direction::Long,
            entry_price: dec!(50000),
            atr: dec!(500),
            confidence: dec!(85),
            win_rate: dec!(0.6),
            balance: dec!(100000),
            regime,
        }
    }

    #[test]
    fn test_size_and_stop_normal_volatility() {
        let engine = RiskEngine::new(&Config::default());
        let plan = engine.size_and_stop(&make_request(VolatilityState::Normal)).unwrap();

        assert_eq!(plan.stop_price, dec!(49000));
        // Capped at 10% of balance
        assert_eq!(plan.size_dollars, dec!(10000));
        assert_eq!(plan.size_units, dec!(0.2));
    }

    #[test]
    fn test_high_volatility_widens_stop_and_shrinks_size() {
        let engine = RiskEngine::new(&Config::default());
        let normal = engine.size_and_stop(&make_request(VolatilityState::Normal)).unwrap();
        let high = engine.size_and_stop(&make_request(VolatilityState::High)).unwrap();

        assert!(high.stop_price < normal.stop_price);
        assert!(high.size_dollars <= normal.size_dollars);
    }

    #[test]
    fn test_invalid_entry_propagates() {
        let engine = RiskEngine::new(&Config::default());
        let mut request = make_request(VolatilityState::Normal);
        request.entry_price = dec!(0);

        assert!(matches!(
            engine.size_and_stop(&request),
            Err(RiskError::InvalidVolatility(_))
        ));
    }

    #[test]
    fn test_open_position_carries_plan() {
        let engine = RiskEngine::new(&Config::default());
        let request = make_request(VolatilityState::Normal);
        let plan = engine.size_and_stop(&request).unwrap();
        let position = engine.open_position(&request, &plan);

        assert_eq!(position.current_stop, plan.stop_price);
        assert_eq!(position.size_units, plan.size_units);
        assert_eq!(position.profit_level, ProfitLevel::Initial);
        assert_eq!(position.status, PositionStatus::Open);
        // Notional respects the cap relative to balance at entry
        assert!(position.size_dollars <= request.balance * dec!(0.10));
    }
}
