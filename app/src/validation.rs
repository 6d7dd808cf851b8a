// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::NaiveDate;
use common::DEADLINE_FORMAT;
use thiserror::Error;

/// Input rejected before anything reaches a repository. The messages are
/// shown to the user as short-lived notifications.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please provide a title for the diary!")]
    EmptyDiaryTitle,

    #[error("Task title cannot be empty!")]
    EmptyTaskTitle,

    #[error("Deadline date format is wrong or is empty!")]
    InvalidDeadline,
}

pub fn validate_diary(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyDiaryTitle);
    }
    Ok(())
}

/// Title must not be blank and the deadline must be a real `dd/MM/yyyy` date.
pub fn validate_task(title: &str, deadline: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTaskTitle);
    }
    if NaiveDate::parse_from_str(deadline.trim(), DEADLINE_FORMAT).is_err() {
        return Err(ValidationError::InvalidDeadline);
    }
    Ok(())
}
