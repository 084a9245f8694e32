//! Market data boundary
//!
//! Ticks are pushed in by an external collaborator; the risk core never
//! blocks on I/O while processing them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// A single price tick with its volatility reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    /// Trading symbol (e.g., "BTCUSDT")
    pub symbol: String,
    /// Trade price
    pub price: Decimal,
    /// ATR at this tick; `None` when the volatility window is not ready
    pub atr: Option<Decimal>,
    /// Tick timestamp
    pub timestamp: DateTime<Utc>,
}

/// Trait for price feed implementations
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Subscribe to price updates
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PriceTick>>;
}

/// Feed that replays a scripted tick sequence, for tests and simulation
pub struct ReplayFeed {
    ticks: Vec<PriceTick>,
}

impl ReplayFeed {
    pub fn new(ticks: Vec<PriceTick>) -> Self {
        Self { ticks }
    }
}

#[async_trait]
impl PriceFeed for ReplayFeed {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<PriceTick>> {
        let (tx, rx) = mpsc::channel(64);
        let ticks = self.ticks.clone();
        tokio::spawn(async move {
            for tick in ticks {
                if tx.send(tick).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tick(price: Decimal) -> PriceTick {
        PriceTick {
            symbol: "BTCUSDT".to_string(),
            price,
            atr: Some(dec!(500)),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_replay_feed_delivers_in_order() {
        let feed = ReplayFeed::new(vec![tick(dec!(50000)), tick(dec!(50100)), tick(dec!(50200))]);
        let mut rx = feed.subscribe().await.unwrap();

        assert_eq!(rx.recv().await.unwrap().price, dec!(50000));
        assert_eq!(rx.recv().await.unwrap().price, dec!(50100));
        assert_eq!(rx.recv().await.unwrap().price, dec!(50200));
        assert!(rx.recv().await.is_none());
    }
}
