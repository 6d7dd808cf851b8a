// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Queries whose results are re-published whenever their table changes.
//!
//! A [`LiveQuery`] owns a background task: it runs the query once, publishes
//! the rows, then sleeps until the store bumps the change counter of the
//! watched table and runs again. Results travel through a `watch` channel, so
//! every subscriber sees the latest snapshot and late subscribers replay it.
//! A failed run is published too, so waiters settle with the error instead
//! of waiting for rows that never come.

use std::future::Future;
use std::sync::Arc;

use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::database::{Store, Table};

/// Why a subscription could not produce rows.
#[derive(Debug, Clone, Error)]
pub enum LiveQueryError {
    #[error("{0:#}")]
    Query(Arc<anyhow::Error>),

    #[error("Live query stopped")]
    Stopped,
}

/// What the producer last published. `error` is set by a failed run and
/// cleared by the next successful one; `rows` keeps the last good result.
struct Snapshot<T> {
    rows: Option<T>,
    error: Option<LiveQueryError>,
}

impl<T> Snapshot<T> {
    fn pending() -> Self {
        Self {
            rows: None,
            error: None,
        }
    }

    fn is_settled(&self) -> bool {
        self.rows.is_some() || self.error.is_some()
    }
}

impl<T: Clone> Snapshot<T> {
    fn outcome(&self) -> Result<T, LiveQueryError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        self.rows.clone().ok_or(LiveQueryError::Stopped)
    }
}

/// A live query producer. Dropping it stops the producer; existing
/// subscriptions keep their last value but receive no further updates.
pub struct LiveQuery<T> {
    rx: watch::Receiver<Snapshot<T>>,
    task: JoinHandle<()>,
}

impl<T> LiveQuery<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Spawns a producer re-running `query` after every change to `table`.
    /// Must be called from within a Tokio runtime.
    pub fn watch<F, Fut>(store: &Store, table: Table, query: F) -> Self
    where
        F: Fn(SqlitePool) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Snapshot::pending());
        let pool = store.pool().clone();
        let mut changes = store.subscribe(table);

        let task = tokio::spawn(async move {
            loop {
                // Mark the current counter as seen before querying so a write
                // landing mid-query triggers another run.
                changes.borrow_and_update();

                match query(pool.clone()).await {
                    Ok(rows) => tx.send_modify(|snapshot| {
                        snapshot.rows = Some(rows);
                        snapshot.error = None;
                    }),
                    // Previous rows stay readable, the next change retries.
                    Err(e) => {
                        error!("Live query on {} failed: {:?}", table.name(), e);
                        tx.send_modify(|snapshot| {
                            snapshot.error = Some(LiveQueryError::Query(Arc::new(e)));
                        });
                    }
                }

                if tx.is_closed() || changes.changed().await.is_err() {
                    break;
                }
            }
            debug!("Live query on {} stopped.", table.name());
        });

        Self { rx, task }
    }

    /// Derives a live query whose value is `f` applied to every snapshot of
    /// this one. Failures of the source are passed through.
    pub fn map<U, F>(self, f: F) -> LiveQuery<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + 'static,
    {
        let (tx, rx) = watch::channel(Snapshot::pending());
        let mut upstream = self.subscribe();

        let task = tokio::spawn(async move {
            // Owning the source keeps its producer running.
            let _source = self;
            loop {
                let mapped = {
                    let current = upstream.rx.borrow_and_update();
                    Snapshot {
                        rows: current.rows.as_ref().map(&f),
                        error: current.error.clone(),
                    }
                };
                if mapped.is_settled() {
                    tx.send_replace(mapped);
                }
                if tx.is_closed() || upstream.rx.changed().await.is_err() {
                    break;
                }
            }
        });

        LiveQuery { rx, task }
    }

    /// Latest good snapshot, `None` until a query has succeeded.
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().rows.clone()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.rx.clone(),
        }
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A consumer handle on a [`LiveQuery`].
#[derive(Clone)]
pub struct Subscription<T> {
    rx: watch::Receiver<Snapshot<T>>,
}

impl<T: Clone> Subscription<T> {
    pub fn latest(&self) -> Option<T> {
        self.rx.borrow().rows.clone()
    }

    /// Waits for the first run of the query to finish.
    pub async fn first(&mut self) -> Result<T, LiveQueryError> {
        self.wait_for(|_| true).await
    }

    /// Waits until a snapshot satisfies `predicate` and returns it. Settles
    /// early with the error if a run fails, or with
    /// [`LiveQueryError::Stopped`] if the producer stops first.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&T) -> bool,
    ) -> Result<T, LiveQueryError> {
        let snapshot = self
            .rx
            .wait_for(|s| s.error.is_some() || s.rows.as_ref().is_some_and(|r| predicate(r)))
            .await
            .map_err(|_| LiveQueryError::Stopped)?;
        snapshot.outcome()
    }

    /// Waits for the next snapshot this subscription has not seen yet.
    pub async fn changed(&mut self) -> Result<T, LiveQueryError> {
        self.rx
            .changed()
            .await
            .map_err(|_| LiveQueryError::Stopped)?;
        self.rx.borrow_and_update().outcome()
    }
}
