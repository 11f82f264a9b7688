//! Service configuration loaded from environment variables.
//!
//! The configuration is read once at startup into an immutable snapshot and
//! injected into [`crate::state::AppState`]; nothing reads the environment
//! after initialization.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (read-write)
//! - `EHR_API_URL` - GraphQL endpoint of the identity/EHR platform
//! - `EHR_API_KEY` - API key for the identity/EHR platform
//! - `INTAKE_FORM_URL` - Forms-intake submission endpoint
//! - `INTAKE_FORM_ID` - Reference id of the initial intake form
//!
//! ## Optional
//! - `READ_DATABASE_URL` - Read-only connection string (defaults to `DATABASE_URL`)
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 3000)
//! - `EHR_DIETITIAN_ID` - Provider id attached to created clients
//! - `EHR_SKIPPED_EMAIL` - Whether client creation skips the email requirement
//! - `EHR_DONT_SEND_WELCOME` - Suppress the platform welcome email
//! - `INTAKE_QUESTION_MAP` - Path to a JSON object mapping answer keys to
//!   question numbers (unmapped keys fall back to the `q99_` placeholder)
//! - `OFFERINGS_CACHE_TTL_SECS` - Enables the offerings cache when set
//! - `DISABLE_AUTH` - Accept requests without forwarded identity headers
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Failed to load question map {0}: {1}")]
    QuestionMap(PathBuf, String),
}

/// Immutable application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Read-write `PostgreSQL` connection URL (contains password)
    pub write_database_url: SecretString,
    /// Read-only `PostgreSQL` connection URL (contains password)
    pub read_database_url: SecretString,
    /// Identity/EHR platform configuration
    pub ehr: EhrConfig,
    /// Forms-intake platform configuration
    pub intake: IntakeConfig,
    /// TTL for the offerings cache; `None` leaves the cache hook disabled
    pub offerings_cache_ttl: Option<Duration>,
    /// Accept requests without forwarded identity headers (local development)
    pub disable_auth: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Identity/EHR platform configuration.
#[derive(Debug, Clone)]
pub struct EhrConfig {
    /// GraphQL endpoint (single POST endpoint)
    pub api_url: String,
    /// API key, sent as `Authorization: Basic <key>`
    pub api_key: SecretString,
    /// Provider id attached to every created client
    pub dietitian_id: Option<String>,
    /// Whether client creation skips the email requirement
    pub skipped_email: Option<bool>,
    /// Suppress the platform welcome email on client creation
    pub dont_send_welcome: Option<bool>,
}

/// Forms-intake platform configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Submission endpoint for intake form answers
    pub form_url: String,
    /// Reference id of the initial intake form
    pub form_id: String,
    /// Answer-key to question-number mapping; unmapped keys get `q99_`
    pub question_numbers: HashMap<String, u32>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("API_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("API_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_PORT".to_string(), e.to_string()))?;

        let write_database_url = get_required_secret("DATABASE_URL")?;
        // A dedicated replica URL is optional; reads fall back to the primary
        let read_database_url = get_optional_env("READ_DATABASE_URL")
            .map_or_else(|| write_database_url.clone(), SecretString::from);

        let ehr = EhrConfig::from_env()?;
        let intake = IntakeConfig::from_env()?;

        let offerings_cache_ttl = match get_optional_env("OFFERINGS_CACHE_TTL_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar("OFFERINGS_CACHE_TTL_SECS".to_string(), e.to_string())
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let disable_auth = get_optional_env("DISABLE_AUTH").as_deref() == Some("true");
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            host,
            port,
            write_database_url,
            read_database_url,
            ehr,
            intake,
            offerings_cache_ttl,
            disable_auth,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EhrConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: get_required_env("EHR_API_URL")?,
            api_key: get_required_secret("EHR_API_KEY")?,
            dietitian_id: get_optional_env("EHR_DIETITIAN_ID"),
            skipped_email: get_optional_env("EHR_SKIPPED_EMAIL").map(|v| v == "true"),
            dont_send_welcome: get_optional_env("EHR_DONT_SEND_WELCOME").map(|v| v == "true"),
        })
    }
}

impl IntakeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let question_numbers = match get_optional_env("INTAKE_QUESTION_MAP") {
            Some(raw) => {
                let path = PathBuf::from(raw);
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| ConfigError::QuestionMap(path.clone(), e.to_string()))?;
                parse_question_map(&contents)
                    .map_err(|e| ConfigError::QuestionMap(path, e))?
            }
            None => HashMap::new(),
        };

        Ok(Self {
            form_url: get_required_env("INTAKE_FORM_URL")?,
            form_id: get_required_env("INTAKE_FORM_ID")?,
            question_numbers,
        })
    }
}

/// Parse a question-number mapping from a JSON object of `key -> number`.
fn parse_question_map(contents: &str) -> Result<HashMap<String, u32>, String> {
    serde_json::from_str::<HashMap<String, u32>>(contents).map_err(|e| e.to_string())
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_question_map_valid() {
        let map = parse_question_map(r#"{"weight": 12, "height": 13}"#).expect("valid map");
        assert_eq!(map.get("weight"), Some(&12));
        assert_eq!(map.get("height"), Some(&13));
    }

    #[test]
    fn test_parse_question_map_empty_object() {
        let map = parse_question_map("{}").expect("valid map");
        assert!(map.is_empty());
    }

    #[test]
    fn test_parse_question_map_rejects_non_numeric() {
        assert!(parse_question_map(r#"{"weight": "twelve"}"#).is_err());
        assert!(parse_question_map("[1, 2]").is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "127.0.0.1".parse().expect("valid ip"),
            port: 3000,
            write_database_url: SecretString::from("postgres://localhost/test"),
            read_database_url: SecretString::from("postgres://localhost/test"),
            ehr: EhrConfig {
                api_url: "https://ehr.example/graphql".to_string(),
                api_key: SecretString::from("key"),
                dietitian_id: None,
                skipped_email: None,
                dont_send_welcome: None,
            },
            intake: IntakeConfig {
                form_url: "https://intake.example/forms".to_string(),
                form_id: "form-1".to_string(),
                question_numbers: HashMap::new(),
            },
            offerings_cache_ttl: None,
            disable_auth: false,
            sentry_dsn: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let ehr = EhrConfig {
            api_url: "https://ehr.example/graphql".to_string(),
            api_key: SecretString::from("super-secret-api-key"),
            dietitian_id: Some("123".to_string()),
            skipped_email: None,
            dont_send_welcome: None,
        };

        let debug_output = format!("{ehr:?}");
        assert!(debug_output.contains("ehr.example"));
        assert!(!debug_output.contains("super-secret-api-key"));
    }
}
