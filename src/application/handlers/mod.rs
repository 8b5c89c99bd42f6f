//! Application handlers.
//!
//! Command handlers that orchestrate domain operations over the ports.

pub mod survey;

pub use survey::{
    CloseSessionError, CloseSessionHandler, ProcessTurnCommand, ProcessTurnHandler, SessionLocks,
    TurnResponse, TurnStatus,
};
