//! Trailing stop engine
//!
//! Owns the open positions of one agent and ratchets each protective stop
//! as unrealized profit grows. The stop never loosens: a long stop is
//! non-decreasing, a short stop is non-increasing. Profit levels only move
//! forward, even when price retraces.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::TrailingConfig;
use crate::error::RiskError;
use crate::feed::PriceTick;
use crate::position::{ClosedTrade, Direction, Position, PositionId, PositionStatus, ProfitLevel};

/// Result of applying one tick to a position
#[derive(Debug, Clone, Copy)]
pub struct StopUpdate {
    /// Stop in force after this tick
    pub new_stop: Decimal,
    /// Profit level after this tick
    pub profit_level: ProfitLevel,
    /// Whether price has crossed the stop and the position must close
    pub should_exit: bool,
}

/// Per-agent trailing stop state machine
pub struct TrailingStopEngine {
    config: TrailingConfig,
    open: HashMap<PositionId, Position>,
}

impl TrailingStopEngine {
    /// Create an engine with the given level tables
    pub fn new(config: TrailingConfig) -> Self {
        Self {
            config,
            open: HashMap::new(),
        }
    }

    /// Take ownership of a newly opened position
    pub fn track(&mut self, position: Position) -> PositionId {
        let id = position.id;
        tracing::debug!(
            position_id = %id,
            agent_id = %position.agent_id,
            entry = %position.entry_price,
            stop = %position.current_stop,
            "Tracking position"
        );
        self.open.insert(id, position);
        id
    }

    /// Look up an open position
    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.open.get(&id)
    }

    /// Number of open positions
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Iterate over open positions
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.open.values()
    }

    /// Highest profit level satisfied at the given unrealized profit
    fn level_for_profit(thresholds: &[Decimal; 5], profit_pct: Decimal) -> Option<ProfitLevel> {
        let mut reached = None;
        for (i, threshold) in thresholds.iter().enumerate() {
            if profit_pct >= *threshold {
                reached = Some(ProfitLevel::from_table_index(i));
            }
        }
        reached
    }

    /// Candidate stop for a position at its current level
    ///
    /// A zero level multiplier means the stop moves to entry (breakeven),
    /// not to the current price.
    fn candidate_stop(
        multipliers: &[Decimal; 5],
        position: &Position,
        price: Decimal,
        atr: Decimal,
    ) -> Option<Decimal> {
        let index = position.profit_level.table_index()?;
        let multiplier = multipliers[index];

        if multiplier.is_zero() {
            return Some(position.entry_price);
        }

        let distance = multiplier * atr;
        Some(match position.direction {
            Direction::Long => price - distance,
            Direction::Short => price + distance,
        })
    }

    /// Apply one price tick to a position
    ///
    /// Ticks must arrive in non-decreasing timestamp order; an older tick is
    /// a `StaleData` error and leaves the position untouched. A tick without
    /// a usable ATR skips the stop recompute but still runs the exit test
    /// against the retained stop.
    pub fn update(&mut self, id: PositionId, tick: &PriceTick) -> Result<StopUpdate, RiskError> {
        let thresholds = self.config.thresholds;
        let multipliers = self.config.multipliers;

        let position = self
            .open
            .get_mut(&id)
            .ok_or(RiskError::UnknownPosition(id))?;

        if tick.timestamp < position.last_tick_at {
            return Err(RiskError::StaleData {
                last_applied: position.last_tick_at,
                received: tick.timestamp,
            });
        }

        let profit_pct = position.unrealized_profit_pct(tick.price);

        // Levels only move forward, never backward on a retrace
        if let Some(reached) = Self::level_for_profit(&thresholds, profit_pct) {
            if reached > position.profit_level {
                tracing::info!(
                    position_id = %id,
                    from = ?position.profit_level,
                    to = ?reached,
                    profit_pct = %profit_pct,
                    "Trailing level promoted"
                );
                position.profit_level = reached;
            }
        }

        let atr = tick.atr.filter(|a| *a > Decimal::ZERO);

        // Ratchet: the stop never loosens
        let new_stop = match atr {
            Some(atr) => match Self::candidate_stop(&multipliers, position, tick.price, atr) {
                Some(candidate) => match position.direction {
                    Direction::Long => position.current_stop.max(candidate),
                    Direction::Short => position.current_stop.min(candidate),
                },
                None => position.current_stop,
            },
            // Missing ATR: keep the previous stop rather than compute a
            // degenerate value
            None => position.current_stop,
        };

        position.current_stop = new_stop;
        position.last_tick_at = tick.timestamp;

        let should_exit = position.stop_hit(tick.price, new_stop);

        Ok(StopUpdate {
            new_stop,
            profit_level: position.profit_level,
            should_exit,
        })
    }

    /// Close a position and produce its immutable trade record
    ///
    /// Realized P&L is computed here, exactly once.
    pub fn close(
        &mut self,
        id: PositionId,
        exit_price: Decimal,
        closed_at: DateTime<Utc>,
    ) -> Result<ClosedTrade, RiskError> {
        let mut position = self.open.remove(&id).ok_or(RiskError::UnknownPosition(id))?;
        position.status = PositionStatus::Closed;
        let trade = ClosedTrade::from_position(&position, exit_price, closed_at);

        tracing::info!(
            position_id = %id,
            agent_id = %trade.agent_id,
            exit = %exit_price,
            pnl = %trade.realized_pnl,
            "Position closed"
        );

        Ok(trade)
    }
}

impl Default for TrailingStopEngine {
    fn default() -> Self {
        Self::new(TrailingConfig::default())
    }
}
