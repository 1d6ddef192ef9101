use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::intake::UploadPolicy;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    /// Whether fault details may be shown to the operator.
    pub fn exposes_fault_details(self) -> bool {
        matches!(self, Self::Development)
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub uploads: UploadPolicy,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let mut uploads = UploadPolicy::default();
        if let Ok(raw) = env::var("UPLOAD_MAX_MB") {
            uploads.max_size_mb = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|mb| *mb > 0)
                .ok_or(ConfigError::InvalidUploadLimit)?;
        }
        if let Ok(raw) = env::var("UPLOAD_PENDING_TTL_SECS") {
            uploads.pending_ttl_secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidPendingTtl)?;
        }
        if let Ok(raw) = env::var("UPLOAD_ALLOWED_EXTENSIONS") {
            let extensions: Vec<String> = raw
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
            if extensions.is_empty() {
                return Err(ConfigError::EmptyExtensionAllowlist);
            }
            uploads.allowed_extensions = extensions;
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            uploads,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUploadLimit,
    InvalidPendingTtl,
    EmptyExtensionAllowlist,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUploadLimit => {
                write!(f, "UPLOAD_MAX_MB must be a positive whole number of megabytes")
            }
            ConfigError::InvalidPendingTtl => {
                write!(f, "UPLOAD_PENDING_TTL_SECS must be a positive number of seconds")
            }
            ConfigError::EmptyExtensionAllowlist => {
                write!(f, "UPLOAD_ALLOWED_EXTENSIONS must list at least one extension")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("UPLOAD_MAX_MB");
        env::remove_var("UPLOAD_ALLOWED_EXTENSIONS");
        env::remove_var("UPLOAD_PENDING_TTL_SECS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.uploads.max_size_mb, 10);
        assert_eq!(config.uploads.allowed_extensions, vec!["pdf", "jpg", "jpeg", "png"]);
        assert_eq!(config.uploads.pending_ttl_secs, 900);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn upload_overrides_are_normalized() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("UPLOAD_MAX_MB", "25");
        env::set_var("UPLOAD_ALLOWED_EXTENSIONS", " .PDF, tiff ,");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.uploads.max_size_mb, 25);
        assert_eq!(config.uploads.allowed_extensions, vec!["pdf", "tiff"]);
        reset_env();
    }

    #[test]
    fn rejects_zero_upload_limit() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("UPLOAD_MAX_MB", "0");
        let err = AppConfig::load().expect_err("zero limit rejected");
        assert!(matches!(err, ConfigError::InvalidUploadLimit));
        reset_env();
    }

    #[test]
    fn pending_ttl_override_must_be_positive() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("UPLOAD_PENDING_TTL_SECS", "120");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.uploads.pending_ttl_secs, 120);

        env::set_var("UPLOAD_PENDING_TTL_SECS", "0");
        let err = AppConfig::load().expect_err("zero ttl rejected");
        assert!(matches!(err, ConfigError::InvalidPendingTtl));
        reset_env();
    }

    #[test]
    fn production_hides_fault_details() {
        assert!(AppEnvironment::from_str("dev").exposes_fault_details());
        assert!(!AppEnvironment::from_str("production").exposes_fault_details());
        assert!(!AppEnvironment::from_str("ci").exposes_fault_details());
    }
}
