//! Survey steps - the states of the dialogue.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// Where a survey session currently is in the conversation.
///
/// The flow is `NpsAsk` → one of the three follow-ups → `CsatAsk` → `Closing`.
/// `Closing` is terminal for the dialogue itself; the orchestrator restarts a
/// closed session back to `NpsAsk` when a new message arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SurveyStep {
    /// Waiting for a 0-10 likelihood-to-recommend score.
    #[default]
    NpsAsk,
    /// Detractor follow-up: what went wrong.
    DeepDive,
    /// Passive follow-up: what would make it better.
    Reasoning,
    /// Promoter follow-up: what they liked most.
    FavoriteFeature,
    /// Waiting for the chat satisfaction rating.
    CsatAsk,
    /// Survey finished.
    Closing,
}

impl SurveyStep {
    /// All steps, in flow order.
    pub const ALL: [SurveyStep; 6] = [
        SurveyStep::NpsAsk,
        SurveyStep::DeepDive,
        SurveyStep::Reasoning,
        SurveyStep::FavoriteFeature,
        SurveyStep::CsatAsk,
        SurveyStep::Closing,
    ];

    /// Wire name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NpsAsk => "NPS_ASK",
            Self::DeepDive => "DEEP_DIVE",
            Self::Reasoning => "REASONING",
            Self::FavoriteFeature => "FAVORITE_FEATURE",
            Self::CsatAsk => "CSAT_ASK",
            Self::Closing => "CLOSING",
        }
    }

    /// Returns true for the three score-dependent follow-up questions.
    pub fn is_follow_up(&self) -> bool {
        matches!(self, Self::DeepDive | Self::Reasoning | Self::FavoriteFeature)
    }
}

impl StateMachine for SurveyStep {
    fn valid_transitions(&self) -> Vec<Self> {
        use SurveyStep::*;
        match self {
            NpsAsk => vec![NpsAsk, DeepDive, Reasoning, FavoriteFeature],
            DeepDive | Reasoning | FavoriteFeature => vec![CsatAsk],
            CsatAsk => vec![Closing],
            // Self-loop for stray input, plus the restart edge.
            Closing => vec![Closing, NpsAsk],
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, SurveyStep::Closing)
    }
}

impl fmt::Display for SurveyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_step_is_nps_ask() {
        assert_eq!(SurveyStep::default(), SurveyStep::NpsAsk);
    }

    #[test]
    fn serializes_to_screaming_snake_case() {
        for step in SurveyStep::ALL {
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(json, format!("\"{}\"", step.as_str()));
        }
    }

    #[test]
    fn deserializes_from_wire_names() {
        let step: SurveyStep = serde_json::from_str("\"FAVORITE_FEATURE\"").unwrap();
        assert_eq!(step, SurveyStep::FavoriteFeature);
    }

    #[test]
    fn only_closing_is_terminal() {
        for step in SurveyStep::ALL {
            assert_eq!(step.is_terminal(), step == SurveyStep::Closing);
        }
    }

    #[test]
    fn closing_can_restart() {
        assert!(SurveyStep::Closing.can_transition_to(&SurveyStep::NpsAsk));
        assert!(!SurveyStep::Closing.can_transition_to(&SurveyStep::CsatAsk));
    }

    #[test]
    fn csat_only_leads_to_closing() {
        assert_eq!(SurveyStep::CsatAsk.valid_transitions(), vec![SurveyStep::Closing]);
        assert!(SurveyStep::CsatAsk.transition_to(SurveyStep::NpsAsk).is_err());
    }

    #[test]
    fn follow_ups_all_lead_to_csat() {
        for step in SurveyStep::ALL.iter().filter(|s| s.is_follow_up()) {
            assert_eq!(step.valid_transitions(), vec![SurveyStep::CsatAsk]);
        }
    }
}
