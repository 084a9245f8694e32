//! Governor actor
//!
//! A single tokio task owns the `RiskGovernor`; agent loops send commands
//! over a channel, so every read-modify-write on portfolio state is
//! serialized without a shared lock.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};

use super::{PauseDecision, PortfolioState, RiskGovernor};
use crate::error::RiskError;
use crate::position::ClosedTrade;

enum GovernorCommand {
    RecordClose {
        trade: ClosedTrade,
        reply: oneshot::Sender<Result<(), RiskError>>,
    },
    CheckLimits {
        reply: oneshot::Sender<HashMap<String, PauseDecision>>,
    },
    IsPaused {
        agent_id: String,
        reply: oneshot::Sender<bool>,
    },
    Rebalance {
        reply: oneshot::Sender<HashMap<String, Decimal>>,
    },
    Resume {
        agent_id: String,
        reply: oneshot::Sender<Result<(), RiskError>>,
    },
    ResetDaily {
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<PortfolioState>,
    },
}

/// Cloneable handle to the governor task
#[derive(Clone)]
pub struct GovernorHandle {
    tx: mpsc::Sender<GovernorCommand>,
}

impl GovernorHandle {
    /// Record a closed trade against its agent
    pub async fn record_close(&self, trade: ClosedTrade) -> anyhow::Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(GovernorCommand::RecordClose { trade, reply })
            .await?;
        rx.await??;
        Ok(())
    }

    /// Recompute limits and fetch pause decisions for all agents
    pub async fn check_limits(&self) -> anyhow::Result<HashMap<String, PauseDecision>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(GovernorCommand::CheckLimits { reply }).await?;
        Ok(rx.await?)
    }

    /// Whether an agent is currently paused (unknown agents read as paused)
    pub async fn is_paused(&self, agent_id: &str) -> anyhow::Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(GovernorCommand::IsPaused {
                agent_id: agent_id.to_string(),
                reply,
            })
            .await?;
        Ok(rx.await?)
    }

    /// Compute capital-reallocation weights
    pub async fn rebalance(&self) -> anyhow::Result<HashMap<String, Decimal>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(GovernorCommand::Rebalance { reply }).await?;
        Ok(rx.await?)
    }

    /// Explicitly clear an agent's pause
    pub async fn resume(&self, agent_id: &str) -> anyhow::Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(GovernorCommand::Resume {
                agent_id: agent_id.to_string(),
                reply,
            })
            .await?;
        rx.await??;
        Ok(())
    }

    /// Start a new trading day
    pub async fn reset_daily(&self) -> anyhow::Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(GovernorCommand::ResetDaily { reply }).await?;
        rx.await?;
        Ok(())
    }

    /// Read-only portfolio snapshot for dashboards
    pub async fn snapshot(&self) -> anyhow::Result<PortfolioState> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(GovernorCommand::Snapshot { reply }).await?;
        Ok(rx.await?)
    }
}

/// Spawn the governor task and return a handle to it
///
/// The task exits when the last handle is dropped.
pub fn spawn_governor(mut governor: RiskGovernor) -> GovernorHandle {
    let (tx, mut rx) = mpsc::channel::<GovernorCommand>(64);

    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                GovernorCommand::RecordClose { trade, reply } => {
                    let _ = reply.send(governor.record_close(trade));
                }
                GovernorCommand::CheckLimits { reply } => {
                    let _ = reply.send(governor.check_limits());
                }
                GovernorCommand::IsPaused { agent_id, reply } => {
                    let _ = reply.send(governor.is_paused(&agent_id));
                }
                GovernorCommand::Rebalance { reply } => {
                    let _ = reply.send(governor.rebalance(Utc::now()));
                }
                GovernorCommand::Resume { agent_id, reply } => {
                    let _ = reply.send(governor.resume(&agent_id));
                }
                GovernorCommand::ResetDaily { reply } => {
                    governor.reset_daily();
                    let _ = reply.send(());
                }
                GovernorCommand::Snapshot { reply } => {
                    let _ = reply.send(governor.snapshot());
                }
            }
        }
        tracing::debug!("Governor task stopped");
    });

    GovernorHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LimitsConfig, RebalanceConfig};
    use crate::position::Direction;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn make_trade(agent_id: &str, pnl: Decimal) -> ClosedTrade {
        ClosedTrade {
            position_id: Uuid::new_v4(),
            agent_id: agent_id.to_string(),
            symbol: "BTCUSDT".to_string(),
            direction: Direction::Long,
            entry_price: dec!(50000),
            exit_price: dec!(50000),
            size_units: dec!(1),
            realized_pnl: pnl,
            opened_at: Utc::now(),
            closed_at: Utc::now(),
        }
    }

    fn make_governor() -> RiskGovernor {
        let mut gov = RiskGovernor::new(LimitsConfig::default(), RebalanceConfig::default());
        gov.register_agent("a", dec!(100000));
        gov.register_agent("b", dec!(100000));
        gov
    }

    #[tokio::test]
    async fn test_record_and_check_round_trip() {
        let handle = spawn_governor(make_governor());

        handle.record_close(make_trade("a", dec!(-3500))).await.unwrap();
        let decisions = handle.check_limits().await.unwrap();

        assert!(decisions["a"].paused);
        assert!(!decisions["b"].paused);
        assert!(handle.is_paused("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_resume_and_snapshot() {
        let handle = spawn_governor(make_governor());

        handle.record_close(make_trade("a", dec!(-3500))).await.unwrap();
        handle.check_limits().await.unwrap();
        handle.resume("a").await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert!(!snapshot.agents["a"].paused);
        assert_eq!(snapshot.agents["a"].balance, dec!(96500));
    }

    #[tokio::test]
    async fn test_rebalance_through_handle() {
        let handle = spawn_governor(make_governor());
        let weights = handle.rebalance().await.unwrap();

        assert_eq!(weights.len(), 2);
        let total: Decimal = weights.values().copied().sum();
        assert_eq!(total, dec!(1));
    }

    #[tokio::test]
    async fn test_concurrent_record_close_serialized() {
        let handle = spawn_governor(make_governor());

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let h = handle.clone();
            tasks.push(tokio::spawn(async move {
                h.record_close(make_trade("a", dec!(-100))).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.agents["a"].balance, dec!(99000));
        assert_eq!(snapshot.agents["a"].trade_history.len(), 10);
    }
}
