// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tokio::sync::watch;
use tracing::{debug, info};

/// Schema version this build of the application expects.
pub const SCHEMA_VERSION: i64 = 3;

const CREATE_DIARY_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS diary_table (
        id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        date TEXT NOT NULL
    )
"#;

const CREATE_TASKS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS tasks_table (
        id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
        title TEXT NOT NULL,
        deadline TEXT NOT NULL,
        isCompleted INTEGER NOT NULL DEFAULT 0
    )
"#;

const CREATE_QUOTES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS quotes_table (
        id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
        quote TEXT NOT NULL,
        author TEXT NOT NULL,
        date TEXT NOT NULL
    )
"#;

/// Every table paired with the schema version that introduced it.
const TABLES: &[(i64, &str)] = &[
    (1, CREATE_DIARY_TABLE),
    (2, CREATE_TASKS_TABLE),
    (3, CREATE_QUOTES_TABLE),
];

/// One schema upgrade step. The SQL must be safe to run twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub from: i64,
    pub to: i64,
    pub sql: &'static str,
}

/// Adds the tasks table without touching existing diary entries.
pub const MIGRATION_1_2: Migration = Migration {
    from: 1,
    to: 2,
    sql: CREATE_TASKS_TABLE,
};

/// Adds the favourite quotes table.
pub const MIGRATION_2_3: Migration = Migration {
    from: 2,
    to: 3,
    sql: CREATE_QUOTES_TABLE,
};

pub const MIGRATIONS: &[Migration] = &[MIGRATION_1_2, MIGRATION_2_3];

/// The tables observers can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Diaries,
    Tasks,
    Quotes,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Diaries => "diary_table",
            Table::Tasks => "tasks_table",
            Table::Quotes => "quotes_table",
        }
    }
}

/// Per-table change counters. Every committed write bumps the counter of the
/// table it touched, which wakes up the live queries watching that table.
struct TableChanges {
    diaries: watch::Sender<u64>,
    tasks: watch::Sender<u64>,
    quotes: watch::Sender<u64>,
}

impl TableChanges {
    fn new() -> Self {
        Self {
            diaries: watch::Sender::new(0),
            tasks: watch::Sender::new(0),
            quotes: watch::Sender::new(0),
        }
    }

    fn sender(&self, table: Table) -> &watch::Sender<u64> {
        match table {
            Table::Diaries => &self.diaries,
            Table::Tasks => &self.tasks,
            Table::Quotes => &self.quotes,
        }
    }
}

/// Handle to the on-device database.
///
/// Cloning is cheap and every clone shares the same pool and change
/// counters, so the composition root opens one store and hands clones to
/// the data-access objects.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    changes: Arc<TableChanges>,
}

impl Store {
    /// Opens (creating it if needed) the database at `database_url` and
    /// brings its schema to `version`, running `migrations` in ascending order.
    pub async fn open(database_url: &str, version: i64, migrations: &[Migration]) -> Result<Self> {
        if !Sqlite::database_exists(database_url).await.unwrap_or(false) {
            ensure_parent_dir(database_url)?;
            info!("Creating database {}", database_url);
            Sqlite::create_database(database_url)
                .await
                .context("Failed to create database")?;
        } else {
            info!("Database already exists.");
        }

        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;

        Self::with_pool(pool, version, migrations).await
    }

    /// Opens a private in-memory database. A single connection is kept alive
    /// for the lifetime of the pool, otherwise SQLite would discard the data.
    pub async fn open_in_memory(version: i64, migrations: &[Migration]) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        Self::with_pool(pool, version, migrations).await
    }

    async fn with_pool(pool: SqlitePool, version: i64, migrations: &[Migration]) -> Result<Self> {
        prepare_schema(&pool, version, migrations).await?;
        Ok(Self {
            pool,
            changes: Arc::new(TableChanges::new()),
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Version recorded in the database file.
    pub async fn schema_version(&self) -> Result<i64> {
        user_version(&self.pool).await
    }

    /// Re-runs a single migration statement without touching the recorded
    /// version.
    pub async fn run_migration(&self, migration: &Migration) -> Result<()> {
        sqlx::query(migration.sql)
            .execute(&self.pool)
            .await
            .with_context(|| {
                format!(
                    "Failed to run migration {} -> {}",
                    migration.from, migration.to
                )
            })?;
        Ok(())
    }

    pub async fn table_exists(&self, table: Table) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table.name())
                .fetch_one(&self.pool)
                .await
                .context("Failed to inspect sqlite_master")?;
        Ok(count > 0)
    }

    /// Deletes every row of `tables` in one transaction. Observers are only
    /// notified once the transaction has committed.
    pub async fn clear_tables(&self, tables: &[Table]) -> Result<u64> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let mut removed = 0;
        for table in tables {
            let sql = format!("DELETE FROM {}", table.name());
            removed += sqlx::query(&sql)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to clear {}", table.name()))?
                .rows_affected();
        }
        tx.commit().await.context("Failed to commit table reset")?;

        for table in tables {
            self.notify(*table);
        }
        info!("Cleared {} rows across {} tables.", removed, tables.len());
        Ok(removed)
    }

    /// Signals that `table` changed.
    pub fn notify(&self, table: Table) {
        self.changes.sender(table).send_modify(|counter| *counter += 1);
        debug!("Table {} changed.", table.name());
    }

    pub fn subscribe(&self, table: Table) -> watch::Receiver<u64> {
        self.changes.sender(table).subscribe()
    }
}

/// Resolves the chain of migrations leading from `from` to `to`. At each
/// version the step reaching furthest without overshooting is preferred.
pub fn migration_path(from: i64, to: i64, migrations: &[Migration]) -> Result<Vec<Migration>> {
    let mut steps = Vec::new();
    let mut version = from;
    while version < to {
        let step = migrations
            .iter()
            .filter(|m| m.from == version && m.to > version && m.to <= to)
            .max_by_key(|m| m.to)
            .with_context(|| {
                format!(
                    "A migration from {} to {} was required but not found",
                    version, to
                )
            })?;
        steps.push(*step);
        version = step.to;
    }
    Ok(steps)
}

async fn prepare_schema(pool: &SqlitePool, version: i64, migrations: &[Migration]) -> Result<()> {
    let current = user_version(pool).await?;

    if current == version {
        info!("Database schema is at version {}.", version);
        return Ok(());
    }

    if current > version {
        bail!(
            "Cannot downgrade database from version {} to {}",
            current,
            version
        );
    }

    if current == 0 {
        create_tables(pool, version).await?;
        info!("Created database schema at version {}.", version);
        return Ok(());
    }

    for step in migration_path(current, version, migrations)? {
        let mut tx = pool.begin().await.context("Failed to begin migration")?;
        sqlx::query(step.sql)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to migrate from {} to {}", step.from, step.to))?;
        let bump = format!("PRAGMA user_version = {}", step.to);
        sqlx::query(&bump)
            .execute(&mut *tx)
            .await
            .context("Failed to record schema version")?;
        tx.commit().await.context("Failed to commit migration")?;
        info!("Migrated database from version {} to {}.", step.from, step.to);
    }

    Ok(())
}

async fn create_tables(pool: &SqlitePool, version: i64) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin schema creation")?;
    for (introduced_in, sql) in TABLES {
        if *introduced_in <= version {
            sqlx::query(*sql)
                .execute(&mut *tx)
                .await
                .context("Failed to create table")?;
        }
    }
    let bump = format!("PRAGMA user_version = {}", version);
    sqlx::query(&bump)
        .execute(&mut *tx)
        .await
        .context("Failed to record schema version")?;
    tx.commit().await.context("Failed to commit schema creation")?;
    Ok(())
}

async fn user_version(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await
        .context("Failed to read schema version")
}

/// SQLite will not create missing directories for a file database.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}
