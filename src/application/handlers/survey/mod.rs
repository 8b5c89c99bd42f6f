//! Survey command handlers.

mod close_session;
mod process_turn;
mod session_locks;

pub use close_session::{CloseSessionError, CloseSessionHandler};
pub use process_turn::{
    ProcessTurnCommand, ProcessTurnHandler, TurnResponse, TurnStatus, APOLOGY_MESSAGE,
};
pub use session_locks::SessionLocks;

use std::sync::Arc;

use crate::ports::{AuditEvent, AuditSink};

/// Records an audit event in the background. Failures are logged and dropped.
pub(crate) fn dispatch_audit(audit: &Arc<dyn AuditSink>, event: AuditEvent) {
    let audit = Arc::clone(audit);
    tokio::spawn(async move {
        if let Err(err) = audit.record(&event).await {
            tracing::warn!(
                session_id = %event.session_id(),
                event = event.kind(),
                error = %err,
                "Failed to record audit event"
            );
        }
    });
}
