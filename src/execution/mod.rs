//! Execution boundary
//!
//! Order routing is an external collaborator; the risk core only emits
//! open and close instructions through this trait. A paper implementation
//! records them in memory for tests and simulation.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::position::{Direction, PositionId};

/// An instruction sent to the execution layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderInstruction {
    Open {
        position_id: PositionId,
        direction: Direction,
        size_units: Decimal,
        stop_price: Decimal,
    },
    Close {
        position_id: PositionId,
        exit_price: Decimal,
    },
}

/// Trait for execution layer implementations
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    /// Submit a new stop-protected order
    async fn open_order(
        &self,
        position_id: PositionId,
        direction: Direction,
        size_units: Decimal,
        stop_price: Decimal,
    ) -> anyhow::Result<()>;

    /// Close an open order at the given price
    async fn close_order(&self, position_id: PositionId, exit_price: Decimal)
        -> anyhow::Result<()>;
}

/// Paper execution: records instructions instead of routing them
pub struct PaperExecution {
    instructions: Arc<RwLock<Vec<OrderInstruction>>>,
}

impl PaperExecution {
    pub fn new() -> Self {
        Self {
            instructions: Arc::new(RwLock::new(vec![])),
        }
    }

    /// All instructions recorded so far
    pub async fn instructions(&self) -> Vec<OrderInstruction> {
        self.instructions.read().await.clone()
    }
}

impl Default for PaperExecution {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionClient for PaperExecution {
    async fn open_order(
        &self,
        position_id: PositionId,
        direction: Direction,
        size_units: Decimal,
        stop_price: Decimal,
    ) -> anyhow::Result<()> {
        tracing::info!(%position_id, ?direction, %size_units, %stop_price, "Paper order opened");
        self.instructions.write().await.push(OrderInstruction::Open {
            position_id,
            direction,
            size_units,
            stop_price,
        });
        Ok(())
    }

    async fn close_order(
        &self,
        position_id: PositionId,
        exit_price: Decimal,
    ) -> anyhow::Result<()> {
        tracing::info!(%position_id, %exit_price, "Paper order closed");
        self.instructions.write().await.push(OrderInstruction::Close {
            position_id,
            exit_price,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_paper_execution_records_instructions() {
        let exec = PaperExecution::new();
        let id = Uuid::new_v4();

        exec.open_order(id, Direction::Long, dec!(2), dec!(49000))
            .await
            .unwrap();
        exec.close_order(id, dec!(51000)).await.unwrap();

        let instructions = exec.instructions().await;
        assert_eq!(instructions.len(), 2);
        assert_eq!(
            instructions[0],
            OrderInstruction::Open {
                position_id: id,
                direction: Direction::Long,
                size_units: dec!(2),
                stop_price: dec!(49000),
            }
        );
        assert_eq!(
            instructions[1],
            OrderInstruction::Close {
                position_id: id,
                exit_price: dec!(51000),
            }
        );
    }
}
