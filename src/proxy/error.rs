use std::io::Cursor;

use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket::Request;
use serde::Serialize;

/// Body returned to the browser when forwarding to the backend fails.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ProxyError {
    #[error("backend request timed out")]
    Timeout,
    #[error("backend connection reset")]
    ConnectionReset,
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("forwarding failed: {0}")]
    Transport(String),
}

impl ProxyError {
    pub fn status(&self) -> Status {
        match self {
            ProxyError::Timeout | ProxyError::ConnectionReset => Status::GatewayTimeout,
            ProxyError::Unreachable(_) | ProxyError::Transport(_) => Status::InternalServerError,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            ProxyError::Timeout | ProxyError::ConnectionReset => ErrorBody {
                error: "Connection to the backend timed out. Please try again later.".to_string(),
                code: "BACKEND_TIMEOUT".to_string(),
            },
            ProxyError::Unreachable(_) | ProxyError::Transport(_) => ErrorBody {
                error: "An error occurred while connecting to the backend.".to_string(),
                code: "BACKEND_ERROR".to_string(),
            },
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> ProxyError {
        if e.is_timeout() {
            ProxyError::Timeout
        } else if is_connection_reset(&e) {
            ProxyError::ConnectionReset
        } else if e.is_connect() {
            ProxyError::Unreachable(e.to_string())
        } else {
            ProxyError::Transport(e.to_string())
        }
    }
}

/// Walks the error source chain looking for a reset socket, which the
/// original frontend treated the same as a backend timeout.
fn is_connection_reset(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionReset {
                return true;
            }
        }
        source = inner.source();
    }
    false
}

impl<'r> Responder<'r, 'static> for ProxyError {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_vec(&self.body()).map_err(|e| {
            error!("Failed to serialize proxy error body: {}", e);
            Status::InternalServerError
        })?;

        Response::build()
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_maps_to_504_with_timeout_message() {
        let error = ProxyError::Timeout;

        assert_eq!(error.status(), Status::GatewayTimeout);
        assert_eq!(error.body().code, "BACKEND_TIMEOUT");
        assert!(error.body().error.contains("timed out"));
    }

    #[test]
    fn connection_reset_takes_the_timeout_path() {
        let error = ProxyError::ConnectionReset;

        assert_eq!(error.status(), Status::GatewayTimeout);
        assert_eq!(error.body().code, "BACKEND_TIMEOUT");
    }

    #[test]
    fn other_failures_map_to_500_with_generic_body() {
        let error = ProxyError::Unreachable("connection refused".to_string());

        assert_eq!(error.status(), Status::InternalServerError);
        assert_eq!(error.body().code, "BACKEND_ERROR");
    }
}
