//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `audit` - Audit event sinks (JSON-lines file, no-op)
//! - `http` - axum router for the survey API
//! - `inference` - Ollama provider, mock provider and the resilient analyzer
//! - `storage` - Session and interaction storage (in-memory, SQLite)

pub mod audit;
pub mod http;
pub mod inference;
pub mod storage;
