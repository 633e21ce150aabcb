use std::path::Path;

use rocket::fairing::AdHoc;
use rocket::fs::NamedFile;
use rocket::http::Header;
use rocket::response::Redirect;
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;

use crate::config::Environment;

#[get("/")]
pub fn home() -> Redirect {
    Redirect::to("/tasks")
}

// Kept off the API namespace: /tasks is also the backend resource path, so
// the navigable page lives at /task-management.
#[get("/tasks")]
pub fn tasks() -> Redirect {
    Redirect::to("/task-management")
}

#[get("/task-management")]
pub async fn task_management() -> Option<NamedFile> {
    NamedFile::open(Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/web/index.html")))
        .await
        .ok()
}

#[derive(Serialize)]
pub struct ErrorPage {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

#[catch(404)]
pub fn not_found(request: &Request) -> Json<ErrorPage> {
    Json(ErrorPage {
        message: "Not Found".to_string(),
        detail: detail_for(request, format!("No route for {}", request.uri())),
    })
}

#[catch(500)]
pub fn internal_server_error(request: &Request) -> Json<ErrorPage> {
    Json(ErrorPage {
        message: "An error occurred".to_string(),
        detail: detail_for(request, format!("Unhandled failure serving {}", request.uri())),
    })
}

/// Error detail is only exposed in development mode.
fn detail_for(request: &Request, detail: String) -> Option<String> {
    let development = request
        .rocket()
        .state::<crate::config::AppConfig>()
        .map(|config| config.environment.is_development())
        .unwrap_or(false);

    development.then_some(detail)
}

/// In development the bundle changes on every rebuild, so the browser is
/// told not to cache anything.
pub fn cache_control_fairing(environment: Environment) -> AdHoc {
    AdHoc::on_response("Cache Control", move |_request, response| {
        Box::pin(async move {
            if environment.is_development() {
                response.set_header(Header::new(
                    "Cache-Control",
                    "no-cache, max-age=0, must-revalidate, no-store",
                ));
            }
        })
    })
}
