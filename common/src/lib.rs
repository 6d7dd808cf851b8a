// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Pattern every task deadline is stored with (`dd/MM/yyyy`).
pub const DEADLINE_FORMAT: &str = "%d/%m/%Y";

/// Represents a diary entry as stored in `diary_table`.
///
/// An `id` of `0` means the entry has not been persisted yet; the store
/// assigns the real identifier on first insert.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct DiaryEntity {
    pub id: i64,
    pub title: String,
    pub content: String,
    // Creation timestamp, kept as the opaque string the caller supplied.
    pub date: String,
}

impl DiaryEntity {
    pub fn new(title: impl Into<String>, content: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            date: date.into(),
        }
    }
}

/// Represents a task as stored in `tasks_table`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TaskEntity {
    pub id: i64,
    pub title: String,
    // Stored as `dd/MM/yyyy`, see `DEADLINE_FORMAT`.
    pub deadline: String,
    #[sqlx(rename = "isCompleted")]
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
}

impl TaskEntity {
    pub fn new(title: impl Into<String>, deadline: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            deadline: deadline.into(),
            is_completed: false,
        }
    }
}

/// A favourite quote as stored in `quotes_table`.
///
/// The numeric `id` is internal; callers address favourites by the
/// `(quote, author)` pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct QuoteEntity {
    pub id: i64,
    pub quote: String,
    pub author: String,
    // When the quote was favourited, not when it was written.
    pub date: String,
}

/// The task shape handed to the UI layer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub deadline: String,
    pub is_completed: bool,
}

impl Task {
    /// Parses the deadline with `DEADLINE_FORMAT`. Returns `None` when the
    /// stored string does not follow the pattern.
    pub fn deadline_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.deadline, DEADLINE_FORMAT).ok()
    }

    /// A task is expired when its deadline is strictly before `today`.
    /// Unparseable deadlines never count as expired.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.deadline_date().is_some_and(|deadline| deadline < today)
    }
}

impl From<TaskEntity> for Task {
    fn from(entity: TaskEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            deadline: entity.deadline,
            is_completed: entity.is_completed,
        }
    }
}

impl From<Task> for TaskEntity {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            deadline: task.deadline,
            is_completed: task.is_completed,
        }
    }
}

/// One element of the remote quote service's JSON array.
/// The service uses single-letter keys: `q` is the text, `a` the author.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ZenQuote {
    #[serde(rename = "q")]
    pub quote: String,
    #[serde(rename = "a")]
    pub author: String,
}

/// State of the "quote of the moment" shown on the home screen.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub enum QuoteState {
    #[default]
    Idle,
    Loading,
    Loaded { quote: String, author: String },
    Failed(String),
}

impl QuoteState {
    pub fn is_loading(&self) -> bool {
        matches!(self, QuoteState::Loading)
    }

    /// The loaded quote and its author, if any.
    pub fn quote(&self) -> Option<(&str, &str)> {
        match self {
            QuoteState::Loaded { quote, author } => Some((quote.as_str(), author.as_str())),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            QuoteState::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }
}
