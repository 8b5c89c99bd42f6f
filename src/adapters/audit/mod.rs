//! Audit Adapters
//!
//! - **FileAuditSink** - JSON-lines file, one event per line
//! - **NoOpAuditSink** - Discards everything (audit disabled)

mod file_audit_sink;

pub use file_audit_sink::FileAuditSink;

use async_trait::async_trait;

use crate::ports::{AuditError, AuditEvent, AuditSink};

/// Sink used when auditing is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpAuditSink;

#[async_trait]
impl AuditSink for NoOpAuditSink {
    async fn record(&self, _event: &AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }
}
