// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use anyhow::Result;
use common::{DiaryEntity, QuoteEntity, TaskEntity};
use tracing::info;

use crate::clock::Clock;
use crate::dao::{DiaryDao, QuoteDao, TaskDao};
use crate::live::LiveQuery;

/// Format of the timestamp recorded when a quote is favourited.
pub const QUOTE_DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Single entry point to diary data for the view-state layer.
#[derive(Clone)]
pub struct DiaryRepository {
    dao: DiaryDao,
}

impl DiaryRepository {
    pub fn new(dao: DiaryDao) -> Self {
        Self { dao }
    }

    pub fn get_all_diaries(&self) -> LiveQuery<Vec<DiaryEntity>> {
        self.dao.get_all_diaries()
    }

    pub fn get_diary_by_id(&self, id: i64) -> LiveQuery<Option<DiaryEntity>> {
        self.dao.get_diary_by_id(id)
    }

    pub async fn add_diary(&self, diary: &DiaryEntity) -> Result<i64> {
        self.dao.insert_diary(diary).await
    }

    pub async fn update_diary(&self, diary: &DiaryEntity) -> Result<bool> {
        self.dao.update_diary(diary).await
    }

    pub async fn remove_diary(&self, diary: &DiaryEntity) -> Result<bool> {
        self.dao.delete_diary(diary).await
    }
}

#[derive(Clone)]
pub struct TaskRepository {
    dao: TaskDao,
}

impl TaskRepository {
    pub fn new(dao: TaskDao) -> Self {
        Self { dao }
    }

    pub fn all_tasks(&self) -> LiveQuery<Vec<TaskEntity>> {
        self.dao.get_all_tasks()
    }

    pub async fn insert_task(&self, task: &TaskEntity) -> Result<i64> {
        self.dao.insert_task(task).await
    }

    pub async fn update_task(&self, task: &TaskEntity) -> Result<bool> {
        self.dao.update_task(task).await
    }

    pub async fn delete_task(&self, task: &TaskEntity) -> Result<bool> {
        self.dao.delete_task(task).await
    }

    /// Wipes every task and every diary entry in one transaction.
    pub async fn reset_database(&self) -> Result<()> {
        let removed = self.dao.delete_all_tasks_and_diaries().await?;
        info!("Database reset, {} rows removed.", removed);
        Ok(())
    }
}

/// Favourite quotes. Stamps each favourite with the clock's current time.
#[derive(Clone)]
pub struct QuoteRepository {
    dao: QuoteDao,
    clock: Arc<dyn Clock>,
}

impl QuoteRepository {
    pub fn new(dao: QuoteDao, clock: Arc<dyn Clock>) -> Self {
        Self { dao, clock }
    }

    pub fn get_all_favorite_quotes(&self) -> LiveQuery<Vec<QuoteEntity>> {
        self.dao.get_all_quotes()
    }

    pub async fn save_quote(&self, quote: &str, author: &str) -> Result<i64> {
        let entity = QuoteEntity {
            id: 0,
            quote: quote.to_string(),
            author: author.to_string(),
            date: self.clock.now().format(QUOTE_DATE_FORMAT).to_string(),
        };
        self.dao.insert_quote(&entity).await
    }

    pub async fn is_quote_saved(&self, quote: &str, author: &str) -> Result<bool> {
        self.dao.quote_exists(quote, author).await
    }

    pub async fn delete_quote(&self, quote: &str, author: &str) -> Result<bool> {
        self.dao.delete_quote(quote, author).await
    }
}
