use std::time::Duration;

use anyhow::Error;
use serde::de::DeserializeOwned;
use yew::callback::Callback;
use yew::format::{Json, Nothing, Text};
use yew::services::fetch::{FetchService, FetchTask, Request, Response};
use yew::services::timeout::{TimeoutService, TimeoutTask};

use super::model::{ErrorBody, StatusRequest, Task, TaskId, TaskRequest, TaskStatus};
use super::util::log_error_to_js;

const API_URL: &str = "/api/tasks";

/// Upper bound on waiting for any single call. The backend can be slow, so
/// this is minutes rather than seconds.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("no response received from server")]
    Network,
    #[error("request timed out")]
    Timeout,
    #[error("not found")]
    NotFound,
    #[error("request rejected by server")]
    Validation {
        message: Option<String>,
        errors: Option<std::collections::BTreeMap<String, String>>,
    },
    #[error("server responded with status {0}")]
    Http(u16),
}

impl ApiError {
    /// Single human-readable banner line for a failed user action, e.g.
    /// `action = "create"`. Prefers the server message, then joined field
    /// errors, then a generic string keyed by status.
    pub fn banner_message(&self, action: &str) -> String {
        match self {
            ApiError::Validation {
                message: Some(message),
                ..
            } => format!("Failed to {} task: {}", action, message),
            ApiError::Validation {
                errors: Some(errors),
                ..
            } => {
                let joined = errors.values().cloned().collect::<Vec<_>>().join(", ");
                format!("Validation errors: {}", joined)
            }
            ApiError::Validation { .. } => {
                format!("Failed to {} task. Please try again.", action)
            }
            ApiError::NotFound => "Task not found. It may have already been deleted.".to_string(),
            ApiError::Timeout => {
                "The request timed out. The backend might be unavailable.".to_string()
            }
            ApiError::Network => {
                format!("Failed to {} task. Please try again later.", action)
            }
            ApiError::Http(status) => format!("Failed to {} task: {}", action, status),
        }
    }
}

/// In-flight call guard. Dropping it aborts the fetch and cancels the
/// timeout, so whichever side completes first wins and the other never
/// reports.
pub struct PendingRequest {
    _fetch: FetchTask,
    _timeout: TimeoutTask,
}

fn classify<T: DeserializeOwned>(response: Response<Text>) -> Result<T, ApiError> {
    let (meta, body) = response.into_parts();

    match meta.status.as_u16() {
        200..=299 => {
            let text = body.map_err(|_| ApiError::Network)?;
            serde_json::from_str(&text).map_err(|_| ApiError::Network)
        }
        404 => Err(ApiError::NotFound),
        // yew reports a rejected fetch promise as a synthetic 408.
        408 => Err(ApiError::Network),
        400..=499 => {
            let parsed: ErrorBody = body
                .ok()
                .and_then(|text| serde_json::from_str(&text).ok())
                .unwrap_or_default();
            Err(ApiError::Validation {
                message: parsed.message,
                errors: parsed.errors,
            })
        }
        500..=599 => Err(ApiError::Http(meta.status.as_u16())),
        _ => Err(ApiError::Network),
    }
}

/// Variant of [`classify`] for calls whose success carries no body (delete
/// returns 204).
fn classify_empty(response: Response<Text>) -> Result<(), ApiError> {
    let (meta, _body) = response.into_parts();

    match meta.status.as_u16() {
        200..=299 => Ok(()),
        404 => Err(ApiError::NotFound),
        408 => Err(ApiError::Network),
        400..=499 => Err(ApiError::Validation {
            message: None,
            errors: None,
        }),
        500..=599 => Err(ApiError::Http(meta.status.as_u16())),
        _ => Err(ApiError::Network),
    }
}

pub struct TaskService;

impl TaskService {
    pub fn list_tasks(callback: Callback<Result<Vec<Task>, ApiError>>) -> Result<PendingRequest, Error> {
        let request = Request::get(API_URL).body(Nothing)?;
        Self::start(request, callback, classify)
    }

    pub fn get_task(
        id: TaskId,
        callback: Callback<Result<Task, ApiError>>,
    ) -> Result<PendingRequest, Error> {
        let request = Request::get(format!("{}/{}", API_URL, id)).body(Nothing)?;
        Self::start(request, callback, classify)
    }

    pub fn create_task(
        task: &TaskRequest,
        callback: Callback<Result<Task, ApiError>>,
    ) -> Result<PendingRequest, Error> {
        let request = Request::post(API_URL)
            .header("Content-Type", "application/json")
            .body(Json(task))?;
        Self::start(request, callback, classify)
    }

    pub fn update_task(
        id: TaskId,
        task: &TaskRequest,
        callback: Callback<Result<Task, ApiError>>,
    ) -> Result<PendingRequest, Error> {
        let request = Request::put(format!("{}/{}", API_URL, id))
            .header("Content-Type", "application/json")
            .body(Json(task))?;
        Self::start(request, callback, classify)
    }

    pub fn update_task_status(
        id: TaskId,
        status: TaskStatus,
        callback: Callback<Result<Task, ApiError>>,
    ) -> Result<PendingRequest, Error> {
        let body = StatusRequest { status };
        let request = Request::patch(format!("{}/{}/status", API_URL, id))
            .header("Content-Type", "application/json")
            .body(Json(&body))?;
        Self::start(request, callback, classify)
    }

    pub fn delete_task(
        id: TaskId,
        callback: Callback<Result<(), ApiError>>,
    ) -> Result<PendingRequest, Error> {
        let request = Request::delete(format!("{}/{}", API_URL, id)).body(Nothing)?;
        Self::start(request, callback, classify_empty)
    }

    fn start<IN, T>(
        request: Request<IN>,
        callback: Callback<Result<T, ApiError>>,
        classifier: fn(Response<Text>) -> Result<T, ApiError>,
    ) -> Result<PendingRequest, Error>
    where
        IN: Into<Text>,
        T: 'static,
    {
        let fetch_callback = {
            let callback = callback.clone();
            Callback::from(move |response: Response<Text>| {
                let result = classifier(response);
                if let Err(e) = &result {
                    log_error_to_js(e);
                }
                callback.emit(result);
            })
        };

        let fetch = FetchService::fetch(request, fetch_callback)?;
        let timeout = TimeoutService::spawn(
            REQUEST_TIMEOUT,
            Callback::from(move |_| {
                log_error_to_js(&ApiError::Timeout);
                callback.emit(Err(ApiError::Timeout));
            }),
        );

        Ok(PendingRequest {
            _fetch: fetch,
            _timeout: timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> Response<Text> {
        Response::builder()
            .status(status)
            .body(Ok(body.to_string()))
            .unwrap()
    }

    #[test]
    fn success_bodies_deserialize() {
        let tasks: Vec<Task> = classify(response(200, "[]")).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn not_found_is_distinguished() {
        let result: Result<Task, ApiError> = classify(response(404, ""));
        assert_eq!(result.unwrap_err(), ApiError::NotFound);

        assert_eq!(classify_empty(response(404, "")).unwrap_err(), ApiError::NotFound);
    }

    #[test]
    fn validation_errors_carry_field_messages() {
        let body = r#"{"errors": {"title": "Title is required"}}"#;
        let result: Result<Task, ApiError> = classify(response(400, body));

        match result.unwrap_err() {
            ApiError::Validation { errors, .. } => {
                assert_eq!(
                    errors.unwrap().get("title").map(String::as_str),
                    Some("Title is required")
                );
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn server_failures_keep_their_status() {
        let result: Result<Task, ApiError> = classify(response(502, ""));
        assert_eq!(result.unwrap_err(), ApiError::Http(502));
    }

    #[test]
    fn banner_prefers_server_message_then_joined_errors() {
        let with_message = ApiError::Validation {
            message: Some("Due date must be in the future".to_string()),
            errors: None,
        };
        assert_eq!(
            with_message.banner_message("create"),
            "Failed to create task: Due date must be in the future"
        );

        let mut errors = std::collections::BTreeMap::new();
        errors.insert("dueDate".to_string(), "must not be blank".to_string());
        errors.insert("title".to_string(), "too long".to_string());
        let with_fields = ApiError::Validation {
            message: None,
            errors: Some(errors),
        };
        assert_eq!(
            with_fields.banner_message("update"),
            "Validation errors: must not be blank, too long"
        );

        assert_eq!(
            ApiError::Http(500).banner_message("update"),
            "Failed to update task: 500"
        );
    }
}
