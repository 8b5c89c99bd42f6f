//! State machine trait for lifecycle enums.
//!
//! Gives the survey step enum a uniform way to describe its legal edges and
//! to validate a proposed move before it is persisted.

use super::ValidationError;

/// Trait for enums that represent state machines.
///
/// Implementors list their outgoing edges; validated transitions come for free.
///
/// ```ignore
/// let next = SurveyStep::CsatAsk.transition_to(SurveyStep::Closing)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug {
    /// Returns true if transition from self to target is valid.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Performs transition with validation, returning error if invalid.
    fn transition_to(&self, target: Self) -> Result<Self, ValidationError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(ValidationError::invalid_format(
                "state_transition",
                format!("Cannot transition from {:?} to {:?}", self, target),
            ))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Off,
        On,
        Burnt,
    }

    impl StateMachine for Light {
        fn valid_transitions(&self) -> Vec<Self> {
            match self {
                Light::Off => vec![Light::On],
                Light::On => vec![Light::Off, Light::Burnt],
                Light::Burnt => vec![],
            }
        }
    }

    #[test]
    fn default_can_transition_to_uses_valid_transitions() {
        assert!(Light::Off.can_transition_to(&Light::On));
        assert!(!Light::Off.can_transition_to(&Light::Burnt));
    }

    #[test]
    fn transition_to_reports_both_ends_on_failure() {
        let err = Light::Burnt.transition_to(Light::On).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("Burnt"));
        assert!(text.contains("On"));
    }

    #[test]
    fn default_is_terminal_means_no_edges() {
        assert!(Light::Burnt.is_terminal());
        assert!(!Light::On.is_terminal());
    }
}
