//! Survey domain - steps, scores, sentiment, dialogue decisions and sessions.
//!
//! Everything here is pure: no I/O, no clocks beyond timestamps, and
//! randomness only through an injected `rand::Rng`.

mod dialogue;
mod score;
mod sentiment;
mod session;
mod step;
mod summary;

pub use dialogue::{decide, MessagePool, Transition};
pub use score::{extract_nps_score, NpsCategory, NpsScore};
pub use sentiment::{SentimentLabel, SentimentResult};
pub use session::{needs_recovery, Interaction, PendingInteraction, SurveySession};
pub use step::SurveyStep;
pub use summary::{SessionSummary, FALLBACK_PAIN_POINT};
