use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Minimum length of the token signing secret, in bytes.
const MIN_SECRET_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
    pub allowed_origins: AllowedOrigins,

    // Session tokens
    pub jwt_secret: String,
    pub token_ttl: Duration,

    // Uploads
    pub upload_dir: PathBuf,
    pub max_upload_size: usize,
}

/// Origins accepted by the CORS layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// `*`: any origin, without credentials
    Any,
    /// Explicit list of origins
    List(Vec<String>),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Database
            database_path: PathBuf::from(env_or_default(
                "DATABASE_PATH",
                "./data/social_feed.sqlite",
            )),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
            allowed_origins: parse_allowed_origins(&env_or_default(
                "ALLOWED_ORIGINS",
                "http://localhost:3000",
            )),

            // Session tokens
            jwt_secret: required_env("JWT_SECRET")?,
            token_ttl: Duration::from_secs(parse_env_u64("TOKEN_TTL_HOURS", 72)? * 3600),

            // Uploads
            upload_dir: PathBuf::from(env_or_default("UPLOAD_DIR", "./uploads")),
            max_upload_size: parse_env_usize("MAX_UPLOAD_SIZE", 5 * 1024 * 1024)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                name: "JWT_SECRET".to_string(),
                message: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }
        if self.token_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "TOKEN_TTL_HOURS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_upload_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "MAX_UPLOAD_SIZE".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.allowed_origins == AllowedOrigins::List(Vec::new()) {
            return Err(ConfigError::InvalidValue {
                name: "ALLOWED_ORIGINS".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_allowed_origins(value: &str) -> AllowedOrigins {
    if value.trim() == "*" {
        return AllowedOrigins::Any;
    }
    AllowedOrigins::List(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_allowed_origins() {
        assert_eq!(parse_allowed_origins("*"), AllowedOrigins::Any);
        assert_eq!(parse_allowed_origins(" * "), AllowedOrigins::Any);
        assert_eq!(
            parse_allowed_origins("http://localhost:3000, https://feed.example.com"),
            AllowedOrigins::List(vec![
                "http://localhost:3000".to_string(),
                "https://feed.example.com".to_string(),
            ])
        );
        assert_eq!(parse_allowed_origins(" , "), AllowedOrigins::List(Vec::new()));
    }

    #[test]
    fn test_parse_defaults() {
        assert_eq!(parse_env_u16("NONEXISTENT_VAR", 8080).unwrap(), 8080);
        assert_eq!(parse_env_usize("NONEXISTENT_VAR", 42).unwrap(), 42);
    }

    #[test]
    #[serial]
    fn test_missing_secret() {
        std::env::remove_var("JWT_SECRET");
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::MissingEnvVar(name)) if name == "JWT_SECRET"
        ));
    }

    #[test]
    #[serial]
    fn test_validate_rejects_short_secret() {
        std::env::set_var("JWT_SECRET", "short");
        let config = Config::from_env().unwrap();
        assert!(config.validate().is_err());

        std::env::set_var("JWT_SECRET", "a-long-enough-test-secret");
        let config = Config::from_env().unwrap();
        assert!(config.validate().is_ok());
        std::env::remove_var("JWT_SECRET");
    }
}
