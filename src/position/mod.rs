//! Position data model
//!
//! An open position is owned by its agent's trailing stop engine; closing
//! converts it into an immutable `ClosedTrade` record exactly once.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Position identifier (opaque handle into the open-position map)
pub type PositionId = Uuid;

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// P&L sign: +1 for long, -1 for short
    pub fn sign(&self) -> Decimal {
        match self {
            Direction::Long => Decimal::ONE,
            Direction::Short => Decimal::NEGATIVE_ONE,
        }
    }
}

/// Trailing stop profit level
///
/// Ordered by the unrealized-profit threshold required to reach it.
/// Transitions are forward-only: a retrace never demotes the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProfitLevel {
    Initial,
    Breakeven,
    Level1,
    Level2,
    Level3,
    Level4,
}

impl ProfitLevel {
    /// Index into the trailing threshold/multiplier tables.
    /// `Initial` has no table entry (the entry stop is still in force).
    pub fn table_index(&self) -> Option<usize> {
        match self {
            ProfitLevel::Initial => None,
            ProfitLevel::Breakeven => Some(0),
            ProfitLevel::Level1 => Some(1),
            ProfitLevel::Level2 => Some(2),
            ProfitLevel::Level3 => Some(3),
            ProfitLevel::Level4 => Some(4),
        }
    }

    /// Level reached at a given threshold table index
    pub fn from_table_index(index: usize) -> ProfitLevel {
        match index {
            0 => ProfitLevel::Breakeven,
            1 => ProfitLevel::Level1,
            2 => ProfitLevel::Level2,
            3 => ProfitLevel::Level3,
            _ => ProfitLevel::Level4,
        }
    }
}

/// Position lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

/// An open position under trailing stop management
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Position identifier
    pub id: PositionId,
    /// Owning agent
    pub agent_id: String,
    /// Traded symbol
    pub symbol: String,
    /// Trade direction
    pub direction: Direction,
    /// Entry price
    pub entry_price: Decimal,
    /// Position size in units
    pub size_units: Decimal,
    /// Position notional in dollars
    pub size_dollars: Decimal,
    /// ATR observed at entry
    pub atr_at_entry: Decimal,
    /// Current protective stop
    pub current_stop: Decimal,
    /// Current trailing profit level
    pub profit_level: ProfitLevel,
    /// Entry timestamp
    pub opened_at: DateTime<Utc>,
    /// Timestamp of the last applied tick
    pub last_tick_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: PositionStatus,
}

impl Position {
    /// Unrealized profit as a fraction of entry price, signed by direction
    pub fn unrealized_profit_pct(&self, current_price: Decimal) -> Decimal {
        if self.entry_price == Decimal::ZERO {
            return Decimal::ZERO;
        }
        (current_price - self.entry_price) / self.entry_price * self.direction.sign()
    }

    /// Whether a price has crossed the given stop
    pub fn stop_hit(&self, price: Decimal, stop: Decimal) -> bool {
        match self.direction {
            Direction::Long => price <= stop,
            Direction::Short => price >= stop,
        }
    }
}

/// An immutable record of a closed trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    /// Original position identifier
    pub position_id: PositionId,
    /// Owning agent
    pub agent_id: String,
    /// Traded symbol
    pub symbol: String,
    /// Trade direction
    pub direction: Direction,
    /// Entry price
    pub entry_price: Decimal,
    /// Exit price
    pub exit_price: Decimal,
    /// Position size in units
    pub size_units: Decimal,
    /// Realized P&L, set exactly once at close
    pub realized_pnl: Decimal,
    /// Entry timestamp
    pub opened_at: DateTime<Utc>,
    /// Exit timestamp
    pub closed_at: DateTime<Utc>,
}

impl ClosedTrade {
    /// Build the close record for a position
    pub fn from_position(
        position: &Position,
        exit_price: Decimal,
        closed_at: DateTime<Utc>,
    ) -> Self {
        let realized_pnl =
            (exit_price - position.entry_price) * position.size_units * position.direction.sign();

        Self {
            position_id: position.id,
            agent_id: position.agent_id.clone(),
            symbol: position.symbol.clone(),
            direction: position.direction,
            entry_price: position.entry_price,
            exit_price,
            size_units: position.size_units,
            realized_pnl,
            opened_at: position.opened_at,
            closed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_position(direction: Direction, entry: Decimal) -> Position {
        Position {
            id: Uuid::new_v4(),
            agent_id: "agent-1".to_string(),
            symbol: "BTCUSDT".to_string(),
            direction,
            entry_price: entry,
            size_units: dec!(2),
            size_dollars: entry * dec!(2),
            atr_at_entry: dec!(500),
            current_stop: dec!(49000),
            profit_level: ProfitLevel::Initial,
            opened_at: Utc::now(),
            last_tick_at: Utc::now(),
            status: PositionStatus::Open,
        }
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(Direction::Long.sign(), dec!(1));
        assert_eq!(Direction::Short.sign(), dec!(-1));
    }

    #[test]
    fn test_profit_level_ordering() {
        assert!(ProfitLevel::Initial < ProfitLevel::Breakeven);
        assert!(ProfitLevel::Breakeven < ProfitLevel::Level1);
        assert!(ProfitLevel::Level3 < ProfitLevel::Level4);
    }

    #[test]
    fn test_unrealized_profit_long() {
        let pos = make_position(Direction::Long, dec!(50000));
        assert_eq!(pos.unrealized_profit_pct(dec!(52500)), dec!(0.05));
        assert_eq!(pos.unrealized_profit_pct(dec!(47500)), dec!(-0.05));
    }

    #[test]
    fn test_unrealized_profit_short() {
        let pos = make_position(Direction::Short, dec!(50000));
        assert_eq!(pos.unrealized_profit_pct(dec!(47500)), dec!(0.05));
        assert_eq!(pos.unrealized_profit_pct(dec!(52500)), dec!(-0.05));
    }

    #[test]
    fn test_stop_hit() {
        let long = make_position(Direction::Long, dec!(50000));
        assert!(long.stop_hit(dec!(49000), dec!(49000)));
        assert!(long.stop_hit(dec!(48500), dec!(49000)));
        assert!(!long.stop_hit(dec!(49500), dec!(49000)));

        let short = make_position(Direction::Short, dec!(50000));
        assert!(short.stop_hit(dec!(51000), dec!(51000)));
        assert!(!short.stop_hit(dec!(50500), dec!(51000)));
    }

    #[test]
    fn test_realized_pnl_long() {
        // Long opened at 50000, 2 units, exit at 51000 -> +2000
        let pos = make_position(Direction::Long, dec!(50000));
        let trade = ClosedTrade::from_position(&pos, dec!(51000), Utc::now());
        assert_eq!(trade.realized_pnl, dec!(2000));
    }

    #[test]
    fn test_realized_pnl_short() {
        let pos = make_position(Direction::Short, dec!(50000));
        let trade = ClosedTrade::from_position(&pos, dec!(51000), Utc::now());
        assert_eq!(trade.realized_pnl, dec!(-2000));
    }

    #[test]
    fn test_closed_trade_serialize() {
        let pos = make_position(Direction::Long, dec!(50000));
        let trade = ClosedTrade::from_position(&pos, dec!(51000), Utc::now());
        let json = serde_json::to_string(&trade).unwrap();
        let back: ClosedTrade = serde_json::from_str(&json).unwrap();
        assert_eq!(back.realized_pnl, dec!(2000));
        assert_eq!(back.position_id, pos.id);
    }
}
