// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use anyhow::{Context, Result};
use common::{DiaryEntity, QuoteEntity, TaskEntity};
use tracing::debug;

use crate::database::{Store, Table};
use crate::live::LiveQuery;

/// Ids of `0` (or below) mean "not persisted yet" and are bound as NULL so
/// SQLite assigns the next one.
fn row_id(id: i64) -> Option<i64> {
    (id > 0).then_some(id)
}

/// Database operations for diary entries.
#[derive(Clone)]
pub struct DiaryDao {
    store: Store,
}

impl DiaryDao {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Wakes diary observers only when a row was touched.
    fn notify_if_changed(&self, rows_affected: u64) -> bool {
        let changed = rows_affected > 0;
        if changed {
            self.store.notify(Table::Diaries);
        }
        changed
    }

    /// All diaries, newest first.
    pub fn get_all_diaries(&self) -> LiveQuery<Vec<DiaryEntity>> {
        LiveQuery::watch(&self.store, Table::Diaries, |pool| async move {
            sqlx::query_as::<_, DiaryEntity>("SELECT * FROM diary_table ORDER BY date DESC")
                .fetch_all(&pool)
                .await
                .context("Failed to retrieve diaries from DB")
        })
    }

    /// A single diary, `None` when no row has this id.
    pub fn get_diary_by_id(&self, id: i64) -> LiveQuery<Option<DiaryEntity>> {
        LiveQuery::watch(&self.store, Table::Diaries, move |pool| async move {
            sqlx::query_as::<_, DiaryEntity>("SELECT * FROM diary_table WHERE id = ? LIMIT 1")
                .bind(id)
                .fetch_optional(&pool)
                .await
                .with_context(|| format!("Failed to retrieve diary with ID: {}", id))
        })
    }

    /// Inserts a diary, replacing any row with the same id. Returns the id.
    pub async fn insert_diary(&self, diary: &DiaryEntity) -> Result<i64> {
        debug!("Insert diary: title={}, date={}", diary.title, diary.date);
        let id = sqlx::query(
            "INSERT OR REPLACE INTO diary_table (id, title, content, date) VALUES (?, ?, ?, ?)",
        )
        .bind(row_id(diary.id))
        .bind(&diary.title)
        .bind(&diary.content)
        .bind(&diary.date)
        .execute(self.store.pool())
        .await
        .context("Failed to insert diary into DB")?
        .last_insert_rowid();

        self.store.notify(Table::Diaries);
        Ok(id)
    }

    /// Updates the row matching `diary.id`. Returns false when there was none.
    pub async fn update_diary(&self, diary: &DiaryEntity) -> Result<bool> {
        let result = sqlx::query("UPDATE diary_table SET title = ?, content = ?, date = ? WHERE id = ?")
            .bind(&diary.title)
            .bind(&diary.content)
            .bind(&diary.date)
            .bind(diary.id)
            .execute(self.store.pool())
            .await
            .with_context(|| format!("Failed to update diary with ID: {}", diary.id))?;

        Ok(self.notify_if_changed(result.rows_affected()))
    }

    pub async fn delete_diary(&self, diary: &DiaryEntity) -> Result<bool> {
        let result = sqlx::query("DELETE FROM diary_table WHERE id = ?")
            .bind(diary.id)
            .execute(self.store.pool())
            .await
            .with_context(|| format!("Failed to delete diary with ID: {}", diary.id))?;

        Ok(self.notify_if_changed(result.rows_affected()))
    }
}

/// Database operations for tasks.
#[derive(Clone)]
pub struct TaskDao {
    store: Store,
}

impl TaskDao {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    fn notify_if_changed(&self, rows_affected: u64) -> bool {
        let changed = rows_affected > 0;
        if changed {
            self.store.notify(Table::Tasks);
        }
        changed
    }

    pub fn get_all_tasks(&self) -> LiveQuery<Vec<TaskEntity>> {
        LiveQuery::watch(&self.store, Table::Tasks, |pool| async move {
            sqlx::query_as::<_, TaskEntity>("SELECT * FROM tasks_table")
                .fetch_all(&pool)
                .await
                .context("Failed to retrieve tasks from DB")
        })
    }

    pub fn get_task_by_id(&self, id: i64) -> LiveQuery<Option<TaskEntity>> {
        LiveQuery::watch(&self.store, Table::Tasks, move |pool| async move {
            sqlx::query_as::<_, TaskEntity>("SELECT * FROM tasks_table WHERE id = ? LIMIT 1")
                .bind(id)
                .fetch_optional(&pool)
                .await
                .with_context(|| format!("Failed to retrieve task with ID: {}", id))
        })
    }

    pub async fn insert_task(&self, task: &TaskEntity) -> Result<i64> {
        debug!(
            "Insert task: title={}, deadline={}, isCompleted={}",
            task.title, task.deadline, task.is_completed
        );
        let id = sqlx::query(
            "INSERT OR REPLACE INTO tasks_table (id, title, deadline, isCompleted) VALUES (?, ?, ?, ?)",
        )
        .bind(row_id(task.id))
        .bind(&task.title)
        .bind(&task.deadline)
        .bind(task.is_completed)
        .execute(self.store.pool())
        .await
        .context("Failed to insert task into DB")?
        .last_insert_rowid();

        self.store.notify(Table::Tasks);
        Ok(id)
    }

    pub async fn update_task(&self, task: &TaskEntity) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE tasks_table SET title = ?, deadline = ?, isCompleted = ? WHERE id = ?",
        )
        .bind(&task.title)
        .bind(&task.deadline)
        .bind(task.is_completed)
        .bind(task.id)
        .execute(self.store.pool())
        .await
        .with_context(|| format!("Failed to update task with ID: {}", task.id))?;

        Ok(self.notify_if_changed(result.rows_affected()))
    }

    pub async fn delete_task(&self, task: &TaskEntity) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks_table WHERE id = ?")
            .bind(task.id)
            .execute(self.store.pool())
            .await
            .with_context(|| format!("Failed to delete task with ID: {}", task.id))?;

        Ok(self.notify_if_changed(result.rows_affected()))
    }

    /// Empties the task and diary tables together.
    pub async fn delete_all_tasks_and_diaries(&self) -> Result<u64> {
        self.store.clear_tables(&[Table::Tasks, Table::Diaries]).await
    }
}

/// Database operations for favourite quotes. Lookups and deletes go through
/// the `(quote, author)` pair rather than the numeric id.
#[derive(Clone)]
pub struct QuoteDao {
    store: Store,
}

impl QuoteDao {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn get_all_quotes(&self) -> LiveQuery<Vec<QuoteEntity>> {
        LiveQuery::watch(&self.store, Table::Quotes, |pool| async move {
            sqlx::query_as::<_, QuoteEntity>("SELECT * FROM quotes_table")
                .fetch_all(&pool)
                .await
                .context("Failed to retrieve quotes from DB")
        })
    }

    pub async fn insert_quote(&self, quote: &QuoteEntity) -> Result<i64> {
        debug!("Insert quote: author={}, date={}", quote.author, quote.date);
        let id = sqlx::query(
            "INSERT OR REPLACE INTO quotes_table (id, quote, author, date) VALUES (?, ?, ?, ?)",
        )
        .bind(row_id(quote.id))
        .bind(&quote.quote)
        .bind(&quote.author)
        .bind(&quote.date)
        .execute(self.store.pool())
        .await
        .context("Failed to insert quote into DB")?
        .last_insert_rowid();

        self.store.notify(Table::Quotes);
        Ok(id)
    }

    pub async fn get_quote(&self, quote: &str, author: &str) -> Result<Option<QuoteEntity>> {
        sqlx::query_as::<_, QuoteEntity>(
            "SELECT * FROM quotes_table WHERE quote = ? AND author = ? LIMIT 1",
        )
        .bind(quote)
        .bind(author)
        .fetch_optional(self.store.pool())
        .await
        .context("Failed to look up quote")
    }

    pub async fn quote_exists(&self, quote: &str, author: &str) -> Result<bool> {
        let found: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM quotes_table WHERE quote = ? AND author = ?)",
        )
        .bind(quote)
        .bind(author)
        .fetch_one(self.store.pool())
        .await
        .context("Failed to check whether quote is saved")?;
        Ok(found != 0)
    }

    /// Deletes every row with this `(quote, author)` pair. Deleting a pair
    /// that was never saved is not an error.
    pub async fn delete_quote(&self, quote: &str, author: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM quotes_table WHERE quote = ? AND author = ?")
            .bind(quote)
            .bind(author)
            .execute(self.store.pool())
            .await
            .context("Failed to delete quote")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }
        self.store.notify(Table::Quotes);
        Ok(true)
    }
}
