use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Shutdown, State};
use serde::Serialize;

/// Process lifecycle state shared with the health-check handlers. The flag
/// is written once, on shutdown, and only ever moves from `false` to
/// `true`, so relaxed atomics are enough.
pub struct Lifecycle {
    shutting_down: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Arc<Lifecycle> {
        Arc::new(Lifecycle {
            shutting_down: AtomicBool::new(false),
        })
    }

    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::Relaxed);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Relaxed)
    }
}

#[derive(Serialize)]
pub struct HealthStatus {
    status: &'static str,
}

fn health_response(lifecycle: &Lifecycle) -> (Status, Json<HealthStatus>) {
    if lifecycle.is_shutting_down() {
        (Status::ServiceUnavailable, Json(HealthStatus { status: "DOWN" }))
    } else {
        (Status::Ok, Json(HealthStatus { status: "UP" }))
    }
}

#[get("/health")]
pub fn health(lifecycle: &State<Arc<Lifecycle>>) -> (Status, Json<HealthStatus>) {
    health_response(lifecycle)
}

/// Readiness probe: reports DOWN as soon as shutdown begins so the load
/// balancer stops routing new traffic while in-flight requests drain.
#[get("/health/readiness")]
pub fn readiness(lifecycle: &State<Arc<Lifecycle>>) -> (Status, Json<HealthStatus>) {
    health_response(lifecycle)
}

/// Waits for SIGINT/SIGTERM, flips readiness to DOWN, then asks Rocket to
/// stop after the grace delay. Rocket's own ctrl-c handling is disabled in
/// the figment so this task owns the signal path.
pub async fn watch_for_shutdown(lifecycle: Arc<Lifecycle>, shutdown: Shutdown, grace: Duration) {
    let signal_name = wait_for_signal().await;

    warn!(
        "Caught {}, gracefully shutting down. Setting readiness to DOWN",
        signal_name
    );
    lifecycle.begin_shutdown();

    tokio::time::sleep(grace).await;
    info!("Shutting down application");
    shutdown.notify();
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "SIGINT"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readiness_flips_once_shutdown_begins() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_shutting_down());

        let (status, body) = health_response(&lifecycle);
        assert_eq!(status, Status::Ok);
        assert_eq!(body.status, "UP");

        lifecycle.begin_shutdown();
        let (status, body) = health_response(&lifecycle);
        assert_eq!(status, Status::ServiceUnavailable);
        assert_eq!(body.status, "DOWN");
    }
}
