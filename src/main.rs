#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

mod config;
mod lifecycle;
mod proxy;
mod views;

use std::error::Error;
use std::time::Duration;

use rocket::fairing::AdHoc;
use rocket::fs::FileServer;
use rocket::{Build, Rocket};

use config::AppConfig;
use proxy::endpoints;
use proxy::forward::ProxyState;

fn build_rocket(config: AppConfig) -> Result<Rocket<Build>, Box<dyn Error + Send + Sync>> {
    let proxy_state = ProxyState::new(
        config.backend_base(),
        Duration::from_secs(config.proxy_timeout_secs),
    )?;
    let lifecycle = lifecycle::Lifecycle::new();
    let grace = Duration::from_secs(config.shutdown_grace_secs);
    let environment = config.environment;
    let port = config.port;

    // Rocket's builtin ctrl-c handling is turned off so the lifecycle task
    // can flip readiness and wait out the grace period first.
    let figment = rocket::Config::figment()
        .merge(("port", port))
        .merge(("shutdown.ctrlc", false));

    Ok(rocket::custom(figment)
        .manage(config)
        .manage(proxy_state)
        .manage(lifecycle.clone())
        .mount(
            "/api",
            routes![
                endpoints::proxy_get,
                endpoints::proxy_post,
                endpoints::proxy_put,
                endpoints::proxy_patch,
                endpoints::proxy_delete,
            ],
        )
        .mount(
            "/",
            routes![
                views::home,
                views::tasks,
                views::task_management,
                lifecycle::health,
                lifecycle::readiness,
            ],
        )
        .mount(
            "/",
            FileServer::from(concat!(env!("CARGO_MANIFEST_DIR"), "/web")).rank(15),
        )
        .register(
            "/",
            catchers![views::not_found, views::internal_server_error],
        )
        .attach(views::cache_control_fairing(environment))
        .attach(AdHoc::on_liftoff("Graceful Shutdown", move |rocket| {
            Box::pin(async move {
                info!("Application started: http://localhost:{}", port);
                let shutdown = rocket.shutdown();
                tokio::spawn(lifecycle::watch_for_shutdown(lifecycle, shutdown, grace));
            })
        })))
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::from_env();

    build_rocket(config)?.launch().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::Status;
    use rocket::local::blocking::Client;

    fn test_client(config: AppConfig) -> Client {
        Client::tracked(build_rocket(config).expect("valid rocket")).expect("valid client")
    }

    #[test]
    fn root_redirects_to_the_task_page() {
        let client = test_client(AppConfig::default());

        let response = client.get("/").dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/tasks"));

        let response = client.get("/tasks").dispatch();
        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(
            response.headers().get_one("Location"),
            Some("/task-management")
        );
    }

    #[test]
    fn task_management_serves_the_shell() {
        let client = test_client(AppConfig::default());

        let response = client.get("/task-management").dispatch();
        assert_eq!(response.status(), Status::Ok);

        let body = response.into_string().expect("body");
        assert!(body.contains("Task Management"));
    }

    #[test]
    fn health_reports_up_before_shutdown() {
        let client = test_client(AppConfig::default());

        let response = client.get("/health/readiness").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert!(response.into_string().expect("body").contains("UP"));
    }

    #[test]
    fn unreachable_backend_yields_500_with_error_code() {
        let config = AppConfig {
            backend_host: "127.0.0.1".to_string(),
            // Nothing listens on port 1, so the proxy leg is refused.
            backend_port: 1,
            ..AppConfig::default()
        };
        let client = test_client(config);

        let response = client.get("/api/tasks").dispatch();
        assert_eq!(response.status(), Status::InternalServerError);

        let body = response.into_string().expect("body");
        assert!(body.contains("\"code\""));
        assert!(body.contains("connecting to the backend"));
    }

    #[test]
    fn development_responses_disable_caching() {
        let client = test_client(AppConfig::default());

        let response = client.get("/task-management").dispatch();
        assert_eq!(
            response.headers().get_one("Cache-Control"),
            Some("no-cache, max-age=0, must-revalidate, no-store")
        );
    }
}
