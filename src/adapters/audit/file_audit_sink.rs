//! File-based Audit Sink Adapter
//!
//! Appends one JSON object per line to a log file.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::ports::{AuditError, AuditEvent, AuditSink};

/// JSON-lines audit log
#[derive(Debug)]
pub struct FileAuditSink {
    path: PathBuf,
    /// Serializes appends so lines from concurrent turns never interleave.
    write_lock: Mutex<()>,
}

impl FileAuditSink {
    /// Create a sink appending to `path`; the file is created on first write
    ///
    /// # Example
    /// ```ignore
    /// let sink = FileAuditSink::new("feedback_log.jsonl");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for FileAuditSink {
    async fn record(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{SessionId, Timestamp};
    use serde_json::Value;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn recovery(session: &str, message: &str) -> AuditEvent {
        AuditEvent::RecoveryRecommended {
            timestamp: Timestamp::now(),
            session_id: SessionId::new(session).unwrap(),
            message: message.to_string(),
        }
    }

    async fn read_lines(path: &Path) -> Vec<Value> {
        tokio::fs::read_to_string(path)
            .await
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn appends_one_json_object_per_line() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileAuditSink::new(temp_dir.path().join("feedback_log.jsonl"));

        sink.record(&recovery("a", "Call back")).await.unwrap();
        sink.record(&recovery("b", "Offer refund")).await.unwrap();

        let lines = read_lines(sink.path()).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "recovery_recommended");
        assert_eq!(lines[0]["session_id"], "a");
        assert_eq!(lines[1]["message"], "Offer refund");
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileAuditSink::new(temp_dir.path().join("logs/nested/audit.jsonl"));

        sink.record(&recovery("a", "x")).await.unwrap();

        assert_eq!(read_lines(sink.path()).await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_records_do_not_interleave() {
        let temp_dir = TempDir::new().unwrap();
        let sink = Arc::new(FileAuditSink::new(temp_dir.path().join("audit.jsonl")));

        let tasks: Vec<_> = (0..20)
            .map(|i| {
                let sink = sink.clone();
                tokio::spawn(async move {
                    sink.record(&recovery(&format!("s-{}", i), &"long message ".repeat(50)))
                        .await
                        .unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(read_lines(sink.path()).await.len(), 20);
    }

    #[tokio::test]
    async fn unwritable_path_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be opened for appending.
        let sink = FileAuditSink::new(temp_dir.path());

        let result = sink.record(&recovery("a", "x")).await;

        assert!(matches!(result, Err(AuditError::Io(_))));
    }
}
