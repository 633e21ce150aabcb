use std::env;

/// Runtime environment, controls error verbosity and cache headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_str(value: &str) -> Environment {
        match value {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub backend_host: String,
    pub backend_port: u16,
    pub environment: Environment,
    pub proxy_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

pub const DEFAULT_PORT: u16 = 3100;
pub const DEFAULT_BACKEND_PORT: u16 = 8080;
pub const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 4;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> AppConfig {
        AppConfig {
            port: env_or("PORT", DEFAULT_PORT),
            backend_host: env::var("BACKEND_HOST").unwrap_or_else(|_| "localhost".to_string()),
            backend_port: env_or("BACKEND_PORT", DEFAULT_BACKEND_PORT),
            environment: Environment::from_str(
                env::var("APP_ENV")
                    .unwrap_or_else(|_| "development".to_string())
                    .as_str(),
            ),
            proxy_timeout_secs: env_or("PROXY_TIMEOUT_SECS", DEFAULT_PROXY_TIMEOUT_SECS),
            shutdown_grace_secs: env_or("SHUTDOWN_GRACE_SECS", DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }

    /// Base URL of the backend task API, without a trailing slash.
    pub fn backend_base(&self) -> String {
        format!("http://{}:{}", self.backend_host, self.backend_port)
    }
}

impl Default for AppConfig {
    fn default() -> AppConfig {
        AppConfig {
            port: DEFAULT_PORT,
            backend_host: "localhost".to_string(),
            backend_port: DEFAULT_BACKEND_PORT,
            environment: Environment::Development,
            proxy_timeout_secs: DEFAULT_PROXY_TIMEOUT_SECS,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_base_joins_host_and_port() {
        let config = AppConfig {
            backend_host: "tasks.internal".to_string(),
            backend_port: 9090,
            ..AppConfig::default()
        };

        assert_eq!(config.backend_base(), "http://tasks.internal:9090");
    }

    #[test]
    fn unknown_environment_falls_back_to_development() {
        assert_eq!(Environment::from_str("staging"), Environment::Development);
        assert_eq!(Environment::from_str("production"), Environment::Production);
    }
}
