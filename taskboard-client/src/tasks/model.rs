use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type TaskId = i64;

/// Wire pattern for every date exchanged with the backend.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Completed];

    pub fn label(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Value used in form options and the wire format.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(value: &str) -> Option<TaskStatus> {
        match value {
            "TODO" => Some(TaskStatus::Todo),
            "IN_PROGRESS" => Some(TaskStatus::InProgress),
            "COMPLETED" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn badge_class(self) -> &'static str {
        match self {
            TaskStatus::Todo => "task-card__status--todo",
            TaskStatus::InProgress => "task-card__status--in-progress",
            TaskStatus::Completed => "task-card__status--completed",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Create/update payload. Server-assigned fields (id, timestamps) are
/// deliberately absent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_date: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct StatusRequest {
    pub status: TaskStatus,
}

/// Validation error body the backend returns on a 4xx.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_the_wire_names() {
        for status in TaskStatus::ALL.iter().copied() {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("DONE"), None);
    }

    #[test]
    fn task_deserializes_from_backend_json() {
        let json = r#"{
            "id": 7,
            "title": "Write report",
            "description": null,
            "status": "IN_PROGRESS",
            "dueDate": "2026-09-01T09:00",
            "createdAt": "2026-08-20T10:15",
            "updatedAt": "2026-08-21T16:40"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, 7);
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, "2026-09-01T09:00");
    }

    #[test]
    fn request_serializes_with_camel_case_names() {
        let request = TaskRequest {
            title: "Write report".to_string(),
            description: String::new(),
            status: TaskStatus::Todo,
            due_date: "2026-09-01T09:00".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["dueDate"], "2026-09-01T09:00");
        assert_eq!(json["status"], "TODO");
        assert!(json.get("id").is_none());
    }
}
