use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Secret used when no ACCESS_SECRET is configured in development
pub const DEVELOPMENT_SECRET: &str = "yoga-master-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    /// Emails that are granted the admin role when they sign up
    pub bootstrap_admins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ACCESS_SECRET must be set in {0:?}")]
    MissingSecret(Environment),

    #[error("DATABASE_URL must be set to use the Postgres document store")]
    MissingDatabaseUrl,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("ACCESS_SECRET").or_else(|_| env::var("JWT_SECRET")) {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_BOOTSTRAP_ADMINS") {
            self.security.bootstrap_admins = split_list(&v);
        }

        self
    }

    /// Checks the settings that cannot be defaulted outside development
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::MissingSecret(self.environment));
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.database.url.as_deref().ok_or(ConfigError::MissingDatabaseUrl)
    }

    pub fn is_bootstrap_admin(&self, email: &str) -> bool {
        self.security
            .bootstrap_admins
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email.trim()))
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
                slow_query_threshold_ms: 100,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
                jwt_secret: DEVELOPMENT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                bootstrap_admins: vec![],
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
                slow_query_threshold_ms: 500,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.yoga-master.app".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bootstrap_admins: vec![],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
                slow_query_threshold_ms: 1000,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://yoga-master.app".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                bootstrap_admins: vec![],
            },
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.jwt_secret, DEVELOPMENT_SECRET);
        assert_eq!(config.security.cors_origins, vec!["*"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config_requires_secret() {
        let config = AppConfig::production();
        assert!(!config.database.enable_query_logging);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSecret(Environment::Production))
        ));
    }

    #[test]
    fn bootstrap_admins_match_case_insensitively() {
        let mut config = AppConfig::development();
        config.security.bootstrap_admins = split_list(" root@yoga.io , ,ops@yoga.io");
        assert_eq!(config.security.bootstrap_admins.len(), 2);
        assert!(config.is_bootstrap_admin("Root@Yoga.io"));
        assert!(!config.is_bootstrap_admin("student@yoga.io"));
    }

    #[test]
    fn database_url_is_required_for_postgres() {
        let config = AppConfig::staging();
        assert!(matches!(config.database_url(), Err(ConfigError::MissingDatabaseUrl)));
    }
}
