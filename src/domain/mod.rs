//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine trait)
//! - `survey` - Survey steps, NPS scoring, sentiment values, the dialogue state machine and sessions

pub mod foundation;
pub mod survey;
