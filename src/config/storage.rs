//! Storage configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Which SurveyRepository implementation backs the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local; everything is lost on restart
    #[default]
    Memory,
    /// SQLite file through sqlx
    Sqlite,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// SQLite connection URL, used when `backend = sqlite`
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum pooled connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend != StorageBackend::Sqlite {
            return Ok(());
        }
        if self.database_url.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__DATABASE_URL"));
        }
        if !self.database_url.starts_with("sqlite:") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections == 0 || self.max_connections > 100 {
            return Err(ValidationError::InvalidPoolSize);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://feedback.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.backend, StorageBackend::Memory);
        assert_eq!(config.database_url, "sqlite://feedback.db");
        assert_eq!(config.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_deserialization() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"backend": "sqlite", "database_url": "sqlite://data/survey.db"}"#)
                .unwrap();
        assert_eq!(config.backend, StorageBackend::Sqlite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sqlite_backend_checks_url_and_pool() {
        let mut config = StorageConfig {
            backend: StorageBackend::Sqlite,
            database_url: "postgres://localhost/survey".to_string(),
            max_connections: 5,
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidDatabaseUrl));

        config.database_url = "sqlite://survey.db".to_string();
        config.max_connections = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPoolSize));

        // The memory backend ignores the SQLite settings.
        config.backend = StorageBackend::Memory;
        assert!(config.validate().is_ok());
    }
}
