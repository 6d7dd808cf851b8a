// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use common::DiaryEntity;

use super::ActionError;
use crate::live::{LiveQuery, Subscription};
use crate::repository::DiaryRepository;
use crate::validation::validate_diary;

pub struct DiariesViewState {
    repository: DiaryRepository,
    diaries: LiveQuery<Vec<DiaryEntity>>,
}

impl DiariesViewState {
    pub fn new(repository: DiaryRepository) -> Self {
        let diaries = repository.get_all_diaries();
        Self {
            repository,
            diaries,
        }
    }

    /// Latest diary snapshot, newest first.
    pub fn diaries(&self) -> Vec<DiaryEntity> {
        self.diaries.latest().unwrap_or_default()
    }

    pub fn subscribe(&self) -> Subscription<Vec<DiaryEntity>> {
        self.diaries.subscribe()
    }

    /// Live view of one diary for the detail screen.
    pub fn get_diary_by_id(&self, id: i64) -> LiveQuery<Option<DiaryEntity>> {
        self.repository.get_diary_by_id(id)
    }

    /// `date` is the creation timestamp chosen by the caller.
    pub async fn add_diary(&self, title: &str, content: &str, date: &str) -> Result<i64, ActionError> {
        validate_diary(title)?;
        let id = self
            .repository
            .add_diary(&DiaryEntity::new(title, content, date))
            .await?;
        Ok(id)
    }

    pub async fn update_diary(&self, diary: &DiaryEntity) -> Result<(), ActionError> {
        self.repository.update_diary(diary).await?;
        Ok(())
    }

    /// Replaces only the content, as the detail screen's save button does.
    pub async fn save_content(&self, diary: &DiaryEntity, content: &str) -> Result<(), ActionError> {
        let updated = DiaryEntity {
            content: content.to_string(),
            ..diary.clone()
        };
        self.update_diary(&updated).await
    }

    pub async fn remove_diary(&self, diary: &DiaryEntity) -> Result<(), ActionError> {
        self.repository.remove_diary(diary).await?;
        Ok(())
    }
}
