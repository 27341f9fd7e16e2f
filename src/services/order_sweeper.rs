// services/order_sweeper.rs - periodic cancellation of stale pending orders
use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::OrderConfig;
use crate::database::DatabaseError;
use crate::repositories::OrderRepository;

#[derive(Clone)]
pub struct OrderSweeper {
    pool: PgPool,
    orders: OrderRepository,
    interval: Duration,
    grace: chrono::Duration,
}

impl OrderSweeper {
    pub fn new(pool: PgPool, config: &OrderConfig) -> Self {
        Self {
            pool,
            orders: OrderRepository::new(),
            interval: config.sweep_interval(),
            grace: config.grace_window(),
        }
    }

    /// Cancels every order that is still pending past the grace window.
    pub async fn sweep_once(&self) -> Result<u64, DatabaseError> {
        self.sweep_at(Utc::now()).await
    }

    /// Same as [`sweep_once`](Self::sweep_once) with an explicit clock.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let cutoff = now - self.grace;
        let mut conn = self.pool.acquire().await?;
        let cancelled = self.orders.cancel_expired(&mut conn, cutoff).await?;
        if cancelled > 0 {
            tracing::info!(count = cancelled, cutoff = %cutoff, "cancelled expired orders");
        } else {
            tracing::debug!(cutoff = %cutoff, "no expired orders");
        }
        Ok(cancelled)
    }

    /// Runs a sweep on every tick until `shutdown` flips to `true` or its
    /// sender goes away. A failed run is logged and waits for the next tick.
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(interval_secs = self.interval.as_secs(), "order sweeper started");

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.sweep_once().await {
                            tracing::error!(error = %e, "order sweep failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!("order sweeper stopped");
        })
    }
}
