//! Survey Engine - Conversational post-interaction survey
//!
//! This crate runs an NPS → follow-up → CSAT survey as a deterministic dialogue
//! state machine, classifying each user utterance by sentiment through a
//! resilient wrapper around a remote text-inference backend.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
