use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::loan::{CollaboratorTimeouts, EligibilityConfig};

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
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub eligibility: EligibilityConfig,
    pub timeouts: CollaboratorTimeouts,
    pub documents: DocumentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "4000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = EligibilityConfig::default();
        let eligibility = EligibilityConfig {
            minimum_credit_score: env_number(
                "LOAN_MIN_CREDIT_SCORE",
                defaults.minimum_credit_score,
            )?,
            maximum_credit_score: env_number(
                "LOAN_MAX_CREDIT_SCORE",
                defaults.maximum_credit_score,
            )?,
            clamp_credit_score: env_flag(
                "LOAN_CLAMP_CREDIT_SCORE",
                defaults.clamp_credit_score,
            )?,
            ..defaults
        };
        if eligibility.maximum_credit_score == 0
            || eligibility.minimum_credit_score > eligibility.maximum_credit_score
        {
            return Err(ConfigError::InvalidScoreRange {
                min: eligibility.minimum_credit_score,
                max: eligibility.maximum_credit_score,
            });
        }

        let default_timeouts = CollaboratorTimeouts::default();
        let timeouts = CollaboratorTimeouts {
            extraction: Duration::from_secs(env_number(
                "LOAN_OCR_TIMEOUT_SECS",
                default_timeouts.extraction.as_secs(),
            )?),
            store: Duration::from_secs(env_number(
                "LOAN_STORE_TIMEOUT_SECS",
                default_timeouts.store.as_secs(),
            )?),
        };

        let documents = DocumentConfig {
            upload_dir: PathBuf::from(
                env::var("LOAN_UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            ),
            bucket: env::var("LOAN_DOCUMENT_BUCKET")
                .unwrap_or_else(|_| "salary-slips".to_string()),
            lender_name: env::var("LOAN_LENDER_NAME")
                .unwrap_or_else(|_| "Team Potato".to_string()),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            eligibility,
            timeouts,
            documents,
        })
    }
}

fn env_number<T: FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { variable }),
        Err(_) => Ok(default),
    }
}

fn env_flag(variable: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(variable) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue { variable }),
        },
        Err(_) => Ok(default),
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

/// Where accepted salary documents are archived and who signs sanction letters.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    pub upload_dir: PathBuf,
    pub bucket: String,
    pub lender_name: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { variable: &'static str },
    InvalidScoreRange { min: u16, max: u16 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { variable } => {
                write!(f, "{variable} must hold a valid non-negative value")
            }
            ConfigError::InvalidScoreRange { min, max } => write!(
                f,
                "credit score bounds are inconsistent (minimum {min}, maximum {max})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidValue { .. }
            | ConfigError::InvalidScoreRange { .. } => None,
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
        for variable in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "LOAN_MIN_CREDIT_SCORE",
            "LOAN_MAX_CREDIT_SCORE",
            "LOAN_CLAMP_CREDIT_SCORE",
            "LOAN_OCR_TIMEOUT_SECS",
            "LOAN_STORE_TIMEOUT_SECS",
            "LOAN_UPLOAD_DIR",
            "LOAN_DOCUMENT_BUCKET",
            "LOAN_LENDER_NAME",
        ] {
            env::remove_var(variable);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.eligibility.minimum_credit_score, 700);
        assert_eq!(config.eligibility.maximum_credit_score, 900);
        assert!(!config.eligibility.clamp_credit_score);
        assert_eq!(config.timeouts.extraction, Duration::from_secs(30));
        assert_eq!(config.timeouts.store, Duration::from_secs(3));
        assert_eq!(config.documents.bucket, "salary-slips");
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 4000));
        reset_env();
    }

    #[test]
    fn reads_eligibility_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LOAN_MIN_CREDIT_SCORE", "650");
        env::set_var("LOAN_CLAMP_CREDIT_SCORE", "true");
        env::set_var("LOAN_OCR_TIMEOUT_SECS", "5");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.eligibility.minimum_credit_score, 650);
        assert!(config.eligibility.clamp_credit_score);
        assert_eq!(config.timeouts.extraction, Duration::from_secs(5));
        reset_env();
    }

    #[test]
    fn rejects_inverted_score_bounds() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LOAN_MIN_CREDIT_SCORE", "950");
        match AppConfig::load() {
            Err(ConfigError::InvalidScoreRange { min: 950, max: 900 }) => {}
            other => panic!("expected invalid score range, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_malformed_numbers() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LOAN_STORE_TIMEOUT_SECS", "soon");
        match AppConfig::load() {
            Err(ConfigError::InvalidValue {
                variable: "LOAN_STORE_TIMEOUT_SECS",
            }) => {}
            other => panic!("expected invalid number, got {other:?}"),
        }
        reset_env();
    }
}
