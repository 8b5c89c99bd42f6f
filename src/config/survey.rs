//! Survey and audit configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Survey dialogue settings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SurveyConfig {
    /// Fixed seed for message selection; random when unset
    pub message_seed: Option<u64>,
}

/// Audit log settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// JSON-lines file the audit events are appended to
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl AuditConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("AUDIT__LOG_PATH"));
        }
        Ok(())
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            log_path: default_log_path(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_log_path() -> PathBuf {
    PathBuf::from("feedback_log.jsonl")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert!(SurveyConfig::default().message_seed.is_none());
        let audit = AuditConfig::default();
        assert!(audit.enabled);
        assert_eq!(audit.log_path, PathBuf::from("feedback_log.jsonl"));
    }

    #[test]
    fn test_audit_deserialization() {
        let audit: AuditConfig = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert!(!audit.enabled);
        assert_eq!(audit.log_path, PathBuf::from("feedback_log.jsonl"));
    }

    #[test]
    fn test_enabled_audit_needs_path() {
        let audit = AuditConfig {
            enabled: true,
            log_path: PathBuf::new(),
        };
        assert!(audit.validate().is_err());

        let disabled = AuditConfig {
            enabled: false,
            log_path: PathBuf::new(),
        };
        assert!(disabled.validate().is_ok());
    }
}
