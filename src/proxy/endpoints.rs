use std::path::PathBuf;

use reqwest::Method;
use rocket::data::{Data, ToByteUnit};
use rocket::http::ContentType;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;

use super::error::ProxyError;
use super::forward::{forward, ProxyResponse, ProxyState};

/// Request bodies above this size are truncated by Rocket; the task API
/// exchanges small JSON documents, so this is generous.
const MAX_BODY_SIZE_KIB: usize = 512;

/// Raw query string of the incoming request, forwarded untouched. Rocket's
/// typed query parsing would otherwise reorder and re-encode it.
pub struct RawQuery(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RawQuery {
    type Error = std::convert::Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(RawQuery(
            request.uri().query().map(|q| q.as_str().to_string()),
        ))
    }
}

async fn read_body(data: Data<'_>) -> Result<Vec<u8>, ProxyError> {
    data.open(MAX_BODY_SIZE_KIB.kibibytes())
        .into_bytes()
        .await
        .map(|bytes| bytes.into_inner())
        .map_err(|e| ProxyError::Transport(e.to_string()))
}

#[get("/<path..>")]
pub async fn proxy_get(
    path: PathBuf,
    query: RawQuery,
    state: &State<ProxyState>,
) -> Result<ProxyResponse, ProxyError> {
    forward(state, Method::GET, path, query.0, None, None).await
}

#[post("/<path..>", data = "<body>")]
pub async fn proxy_post(
    path: PathBuf,
    query: RawQuery,
    content_type: Option<&ContentType>,
    body: Data<'_>,
    state: &State<ProxyState>,
) -> Result<ProxyResponse, ProxyError> {
    let body = read_body(body).await?;
    forward(
        state,
        Method::POST,
        path,
        query.0,
        content_type.cloned(),
        Some(body),
    )
    .await
}

#[put("/<path..>", data = "<body>")]
pub async fn proxy_put(
    path: PathBuf,
    query: RawQuery,
    content_type: Option<&ContentType>,
    body: Data<'_>,
    state: &State<ProxyState>,
) -> Result<ProxyResponse, ProxyError> {
    let body = read_body(body).await?;
    forward(
        state,
        Method::PUT,
        path,
        query.0,
        content_type.cloned(),
        Some(body),
    )
    .await
}

#[patch("/<path..>", data = "<body>")]
pub async fn proxy_patch(
    path: PathBuf,
    query: RawQuery,
    content_type: Option<&ContentType>,
    body: Data<'_>,
    state: &State<ProxyState>,
) -> Result<ProxyResponse, ProxyError> {
    let body = read_body(body).await?;
    forward(
        state,
        Method::PATCH,
        path,
        query.0,
        content_type.cloned(),
        Some(body),
    )
    .await
}

#[delete("/<path..>")]
pub async fn proxy_delete(
    path: PathBuf,
    query: RawQuery,
    state: &State<ProxyState>,
) -> Result<ProxyResponse, ProxyError> {
    forward(state, Method::DELETE, path, query.0, None, None).await
}
