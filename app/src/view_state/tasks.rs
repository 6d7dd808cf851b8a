// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use common::{Task, TaskEntity};
use tracing::debug;

use super::ActionError;
use crate::clock::Clock;
use crate::live::{LiveQuery, Subscription};
use crate::repository::TaskRepository;
use crate::validation::validate_task;

/// Holds the live task list and the expiration filter.
pub struct TasksViewState {
    repository: TaskRepository,
    clock: Arc<dyn Clock>,
    tasks: LiveQuery<Vec<Task>>,
}

impl TasksViewState {
    pub fn new(repository: TaskRepository, clock: Arc<dyn Clock>) -> Self {
        let tasks = repository
            .all_tasks()
            .map(|entities| entities.iter().cloned().map(Task::from).collect::<Vec<_>>());
        Self {
            repository,
            clock,
            tasks,
        }
    }

    /// Latest task snapshot, empty until the first query lands.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.latest().unwrap_or_default()
    }

    pub fn subscribe(&self) -> Subscription<Vec<Task>> {
        self.tasks.subscribe()
    }

    /// Tasks whose deadline is strictly before today, taken from the latest
    /// snapshot. Completed tasks are included; deadlines that do not parse
    /// are skipped.
    pub fn get_expired_tasks(&self) -> Vec<Task> {
        let today = self.clock.today();
        self.tasks()
            .into_iter()
            .filter(|task| task.is_expired(today))
            .collect()
    }

    pub async fn add_task(&self, title: &str, deadline: &str) -> Result<i64, ActionError> {
        validate_task(title, deadline)?;
        let id = self
            .repository
            .insert_task(&TaskEntity::new(title, deadline.trim()))
            .await?;
        Ok(id)
    }

    pub async fn mark_task_as_completed(&self, task: &Task) -> Result<(), ActionError> {
        self.set_completed(task, true).await
    }

    pub async fn unmark_task_as_completed(&self, task: &Task) -> Result<(), ActionError> {
        self.set_completed(task, false).await
    }

    async fn set_completed(&self, task: &Task, is_completed: bool) -> Result<(), ActionError> {
        let entity = TaskEntity {
            is_completed,
            ..TaskEntity::from(task.clone())
        };
        debug!("Updating task in database: {:?}", entity);
        self.repository.update_task(&entity).await?;
        Ok(())
    }

    pub async fn delete_task(&self, task: &Task) -> Result<(), ActionError> {
        self.repository
            .delete_task(&TaskEntity::from(task.clone()))
            .await?;
        Ok(())
    }

    /// Clears all tasks and all diaries.
    pub async fn reset(&self) -> Result<(), ActionError> {
        self.repository.reset_database().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::dao::TaskDao;
    use crate::database::{Store, MIGRATIONS, SCHEMA_VERSION};
    use crate::validation::ValidationError;

    async fn setup_view_state(clock: FixedClock) -> (TasksViewState, TaskRepository) {
        let store = Store::open_in_memory(SCHEMA_VERSION, MIGRATIONS).await.unwrap();
        let repository = TaskRepository::new(TaskDao::new(store));
        let state = TasksViewState::new(repository.clone(), Arc::new(clock));
        (state, repository)
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_expired_filter() {
        let (state, repository) = setup_view_state(FixedClock::on(2025, 1, 1).unwrap()).await;
        let mut sub = state.subscribe();

        // Stored straight through the repository: the invalid month would
        // never pass input validation.
        for (title, deadline) in [
            ("Past", "01/01/2020"),
            ("Future", "01/01/2999"),
            ("Broken", "31/13/2024"),
            ("Today", "01/01/2025"),
        ] {
            repository
                .insert_task(&TaskEntity::new(title, deadline))
                .await
                .unwrap();
        }
        sub.wait_for(|t| t.len() == 4).await.unwrap();

        assert_eq!(titles(&state.get_expired_tasks()), vec!["Past"]);
        // The unparseable task is still listed.
        assert_eq!(state.tasks().len(), 4);
    }

    #[tokio::test]
    async fn test_completed_tasks_stay_expired() {
        let (state, _repository) = setup_view_state(FixedClock::on(2025, 1, 1).unwrap()).await;
        let mut sub = state.subscribe();

        state.add_task("Pay rent", "01/01/2020").await.unwrap();
        let tasks = sub.wait_for(|t| t.len() == 1).await.unwrap();
        assert_eq!(titles(&state.get_expired_tasks()), vec!["Pay rent"]);

        state.mark_task_as_completed(&tasks[0]).await.unwrap();
        sub.wait_for(|t| t.first().is_some_and(|t| t.is_completed)).await.unwrap();

        let expired = state.get_expired_tasks();
        assert_eq!(expired.len(), 1);
        assert!(expired[0].is_completed);
    }

    #[tokio::test]
    async fn test_toggle_and_delete() {
        let (state, _repository) = setup_view_state(FixedClock::on(2025, 1, 1).unwrap()).await;
        let mut sub = state.subscribe();

        state.add_task("Call mum", "05/05/2030").await.unwrap();
        let task = sub.wait_for(|t| t.len() == 1).await.unwrap().remove(0);
        assert!(!task.is_completed);

        state.mark_task_as_completed(&task).await.unwrap();
        let task = sub.wait_for(|t| t.first().is_some_and(|t| t.is_completed)).await.unwrap().remove(0);

        state.unmark_task_as_completed(&task).await.unwrap();
        let task = sub.wait_for(|t| t.first().is_some_and(|t| !t.is_completed)).await.unwrap().remove(0);

        state.delete_task(&task).await.unwrap();
        assert!(sub.wait_for(|t| t.is_empty()).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_storage() {
        let (state, _repository) = setup_view_state(FixedClock::on(2025, 1, 1).unwrap()).await;

        let err = state.add_task("  ", "01/01/2020").await.unwrap_err();
        assert!(matches!(err, ActionError::Invalid(ValidationError::EmptyTaskTitle)));

        let err = state.add_task("Pay rent", "").await.unwrap_err();
        assert!(matches!(err, ActionError::Invalid(ValidationError::InvalidDeadline)));

        let tasks = state.subscribe().first().await.unwrap();
        assert!(tasks.is_empty());
    }
}
