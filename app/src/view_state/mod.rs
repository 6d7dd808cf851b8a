// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! UI-facing state holders, one per record kind.

mod diaries;
mod quotes;
mod tasks;

pub use diaries::DiariesViewState;
pub use quotes::QuotesViewState;
pub use tasks::TasksViewState;

use thiserror::Error;

use crate::live::LiveQueryError;
use crate::validation::ValidationError;

/// Why a user action did not go through.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),

    #[error(transparent)]
    Query(#[from] LiveQueryError),
}
