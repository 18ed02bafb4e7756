use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::agenda::{Task, TaskPriority, TaskStatus};
use crate::stats::calendar::{TaskBucket, ViewerClock};

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,
    #[serde(default)]
    pub linked_conversation: Option<String>,
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    pub linked_conversation: Option<String>,
}

fn required_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// Tasks in `bucket`, soonest due first.
    pub async fn list(&self, bucket: TaskBucket, clock: &ViewerClock) -> Vec<Task> {
        let mut out: Vec<Task> = self
            .tasks
            .read()
            .await
            .iter()
            .filter(|t| bucket.contains(t, clock))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.due_date.cmp(&b.due_date));
        out
    }

    pub async fn create(&self, new: NewTask) -> Result<Task, AppError> {
        let task = Task {
            id: Uuid::new_v4(),
            title: required_title(&new.title)?,
            description: new.description,
            due_date: new.due_date,
            priority: new.priority,
            status: TaskStatus::Pending,
            linked_conversation: new.linked_conversation,
            created_at: Utc::now(),
        };
        self.tasks.write().await.push(task.clone());
        info!(task_id = %task.id, "Task created");
        Ok(task)
    }

    pub async fn update(&self, id: Uuid, patch: TaskPatch) -> Result<Task, AppError> {
        let title = patch.title.as_deref().map(required_title).transpose()?;
        let mut tasks = self.tasks.write().await;
        let task = find_mut(&mut tasks, id)?;
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(linked) = patch.linked_conversation {
            task.linked_conversation = Some(linked).filter(|l| !l.trim().is_empty());
        }
        Ok(task.clone())
    }

    /// Completing a completed task is a no-op; a cancelled task stays cancelled.
    pub async fn complete(&self, id: Uuid) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().await;
        let task = find_mut(&mut tasks, id)?;
        match task.status {
            TaskStatus::Cancelled => Err(AppError::InvalidTransition(
                "a cancelled task cannot be completed".to_string(),
            )),
            _ => {
                task.status = TaskStatus::Completed;
                Ok(task.clone())
            }
        }
    }

    pub async fn delete(&self, id: Uuid, confirmed: bool) -> Result<(), AppError> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(format!(
                "deleting task {id} requires confirm=true"
            )));
        }
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(not_found(id));
        }
        info!(task_id = %id, "Task deleted");
        Ok(())
    }
}

fn find_mut(tasks: &mut [Task], id: Uuid) -> Result<&mut Task, AppError> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| not_found(id))
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Task {id} not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset};

    fn new_task(title: &str, due_in: Duration) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            due_date: Utc::now() + due_in,
            priority: TaskPriority::High,
            linked_conversation: None,
        }
    }

    fn utc_clock() -> ViewerClock {
        ViewerClock::new(Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap()))
    }

    #[tokio::test]
    async fn test_title_is_trimmed_and_required() {
        let store = TaskStore::new();
        let task = store.create(new_task("  Send proposal  ", Duration::days(1))).await.unwrap();
        assert_eq!(task.title, "Send proposal");
        assert_eq!(task.status, TaskStatus::Pending);

        assert!(matches!(
            store.create(new_task("   ", Duration::days(1))).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            store
                .update(
                    task.id,
                    TaskPatch {
                        title: Some(String::new()),
                        ..Default::default()
                    }
                )
                .await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_moves_out_of_overdue() {
        let store = TaskStore::new();
        let clock = utc_clock();
        let late = store.create(new_task("Late", Duration::hours(-5))).await.unwrap();
        store.create(new_task("Later", Duration::days(40))).await.unwrap();

        assert_eq!(store.list(TaskBucket::Overdue, &clock).await.len(), 1);
        store.complete(late.id).await.unwrap();
        assert!(store.list(TaskBucket::Overdue, &clock).await.is_empty());
        assert_eq!(store.list(TaskBucket::All, &clock).await.len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_task_cannot_complete() {
        let store = TaskStore::new();
        let task = store.create(new_task("Drop", Duration::days(1))).await.unwrap();
        store
            .update(
                task.id,
                TaskPatch {
                    status: Some(TaskStatus::Cancelled),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(matches!(
            store.complete(task.id).await,
            Err(AppError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_needs_confirmation() {
        let store = TaskStore::new();
        let task = store.create(new_task("Keep", Duration::days(1))).await.unwrap();
        assert!(matches!(
            store.delete(task.id, false).await,
            Err(AppError::ConfirmationRequired(_))
        ));
        store.delete(task.id, true).await.unwrap();
        assert!(matches!(
            store.delete(task.id, true).await,
            Err(AppError::NotFound(_))
        ));
    }
}
