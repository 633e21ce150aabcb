use std::io::Cursor;
use std::path::{Path, PathBuf};

use reqwest::Method;
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder, Response};
use rocket::Request;

use super::error::ProxyError;

/// Shared outbound state for the `/api` routes: one pooled client with the
/// configured timeout, plus the backend base URL.
pub struct ProxyState {
    client: reqwest::Client,
    backend_base: String,
}

impl ProxyState {
    pub fn new(backend_base: String, timeout: std::time::Duration) -> Result<ProxyState, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(ProxyState {
            client,
            backend_base,
        })
    }
}

/// A backend response relayed verbatim: upstream status, content type and
/// body bytes, nothing rewritten.
pub struct ProxyResponse {
    status: u16,
    content_type: Option<ContentType>,
    body: Vec<u8>,
}

impl<'r> Responder<'r, 'static> for ProxyResponse {
    fn respond_to(self, _request: &'r Request<'_>) -> response::Result<'static> {
        let mut builder = Response::build();
        builder.status(Status::new(self.status));

        if let Some(content_type) = self.content_type {
            builder.header(content_type);
        }

        builder.sized_body(self.body.len(), Cursor::new(self.body));
        builder.ok()
    }
}

/// Joins the stripped path and original query string onto the backend base
/// URL. The `/api` prefix never reaches here: the routes are mounted under
/// `/api`, so `path` is already the backend-relative remainder.
pub fn backend_url(base: &str, path: &Path, query: Option<&str>) -> String {
    let path = path.to_string_lossy();

    match query {
        Some(query) => format!("{}/{}?{}", base, path, query),
        None => format!("{}/{}", base, path),
    }
}

pub async fn forward(
    state: &ProxyState,
    method: Method,
    path: PathBuf,
    query: Option<String>,
    content_type: Option<ContentType>,
    body: Option<Vec<u8>>,
) -> Result<ProxyResponse, ProxyError> {
    let url = backend_url(&state.backend_base, &path, query.as_deref());
    info!(
        "Proxying request: {} /api/{} -> {}",
        method,
        path.display(),
        url
    );

    let mut request = state.client.request(method.clone(), &url);

    if let Some(content_type) = &content_type {
        request = request.header(reqwest::header::CONTENT_TYPE, content_type.to_string());
    }

    if let Some(body) = body {
        request = request.body(body);
    }

    let response = request.send().await.map_err(|e| {
        let error = ProxyError::from(e);
        error!("Proxy error: {} /api/{}: {}", method, path.display(), error);
        error
    })?;

    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(ContentType::parse_flexible);

    // The upstream response is buffered in full before anything is written
    // back to the browser, so a failure here still gets a clean error
    // response instead of a half-written stream.
    let body = response.bytes().await.map_err(ProxyError::from)?;

    info!("Proxy response: {} /api/{} -> {}", method, path.display(), status);

    Ok(ProxyResponse {
        status,
        content_type,
        body: body.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn backend_url_strips_nothing_and_keeps_query() {
        let path = PathBuf::from("tasks/3/status");

        assert_eq!(
            backend_url("http://localhost:8080", &path, None),
            "http://localhost:8080/tasks/3/status"
        );
        assert_eq!(
            backend_url("http://localhost:8080", &path, Some("verbose=true")),
            "http://localhost:8080/tasks/3/status?verbose=true"
        );
    }

    #[tokio::test]
    async fn unreachable_backend_surfaces_a_proxy_error() {
        // Port 1 is never bound in the test environment, so the connection
        // is refused immediately rather than timing out.
        let state = ProxyState::new(
            "http://127.0.0.1:1".to_string(),
            std::time::Duration::from_secs(5),
        )
        .unwrap();

        let result = forward(
            &state,
            Method::GET,
            PathBuf::from("tasks"),
            None,
            None,
            None,
        )
        .await;

        match result {
            Err(error) => assert_eq!(error.status(), rocket::http::Status::InternalServerError),
            Ok(_) => panic!("expected the forward to fail"),
        }
    }
}
