// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Persistence and state layer for the diary, task and quote screens.
//!
//! Data flows one way: view-states forward user intents to repositories,
//! repositories to data-access objects, and every committed write wakes the
//! live queries watching the touched table, which republish to the UI.

pub mod clock;
pub mod config;
pub mod dao;
pub mod database;
pub mod live;
pub mod quotes_api;
pub mod repository;
pub mod validation;
pub mod view_state;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::dao::{DiaryDao, QuoteDao, TaskDao};
use crate::database::{Store, MIGRATIONS, SCHEMA_VERSION};
use crate::quotes_api::{QuoteSource, ZenQuotesClient};
use crate::repository::{DiaryRepository, QuoteRepository, TaskRepository};
use crate::view_state::{DiariesViewState, QuotesViewState, TasksViewState};

/// Everything the screens need, built around a single store.
pub struct App {
    pub store: Store,
    pub diaries: DiariesViewState,
    pub tasks: TasksViewState,
    pub quotes: QuotesViewState,
}

impl App {
    /// Opens the configured database and wires the real clock and quote
    /// client. Must be called from within a Tokio runtime.
    pub async fn start(config: &AppConfig) -> Result<Self> {
        let store = Store::open(&config.database_url, SCHEMA_VERSION, MIGRATIONS).await?;
        let client = ZenQuotesClient::new(&config.quotes_api_url, config.request_timeout())
            .context("Failed to build quote client")?;
        info!("Using quote service at {}", config.quotes_api_url);

        Ok(Self::assemble(store, Arc::new(SystemClock), Arc::new(client)))
    }

    /// Builds the repositories and view-states on top of an open store.
    pub fn assemble(store: Store, clock: Arc<dyn Clock>, source: Arc<dyn QuoteSource>) -> Self {
        let diary_repository = DiaryRepository::new(DiaryDao::new(store.clone()));
        let task_repository = TaskRepository::new(TaskDao::new(store.clone()));
        let quote_repository = QuoteRepository::new(QuoteDao::new(store.clone()), clock.clone());

        Self {
            diaries: DiariesViewState::new(diary_repository),
            tasks: TasksViewState::new(task_repository, clock),
            quotes: QuotesViewState::new(quote_repository, source),
            store,
        }
    }
}
