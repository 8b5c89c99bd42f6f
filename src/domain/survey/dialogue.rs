//! Dialogue state machine.
//!
//! Pure decision function over (current step, user text, sentiment) that picks
//! the next step and the bot's reply. Randomness is injected so callers can
//! seed it for reproducible conversations.

use rand::Rng;

use super::score::{extract_nps_score, NpsCategory, NpsScore};
use super::sentiment::SentimentResult;
use super::step::SurveyStep;

/// A fixed set of interchangeable phrasings for one transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagePool {
    NpsRetry,
    DeepDive,
    Reasoning,
    FavoriteFeature,
    CsatFrustrated,
    CsatNeutral,
    Closing,
    AlreadyComplete,
}

impl MessagePool {
    /// Candidate messages; every pool has at least three.
    pub fn candidates(&self) -> &'static [&'static str] {
        match self {
            Self::NpsRetry => &[
                "I didn't catch that number. On a scale of 0-10, how likely are you to recommend us?",
                "Could you please provide a number between 0 and 10? How likely are you to recommend us?",
                "Sorry, I need a score from 0 to 10. How likely are you to recommend us?",
            ],
            Self::DeepDive => &[
                "I'm sorry to hear that. Could you tell us what specifically went wrong?",
                "That's disappointing. What was the main issue you faced?",
                "We aim to do better. Can you share more details about what happened?",
            ],
            Self::Reasoning => &[
                "Thank you. What is one thing we could do to improve?",
                "Got it. Any specific suggestions for us?",
                "Thanks for the score. How can we make your experience 10/10?",
            ],
            Self::FavoriteFeature => &[
                "That's wonderful! What did you enjoy the most?",
                "Glad to hear it! What was the highlight for you?",
                "Fantastic! What feature did you like best?",
            ],
            Self::CsatFrustrated => &[
                "I understand your frustration and have flagged this for our team. To wrap up, how would you rate this chat experience (1-5)?",
                "I'm sorry for the trouble. I've noted your issues. How would you rate this support chat (1-5)?",
                "Your feedback is important. Before you go, please rate this chat (1-5).",
            ],
            Self::CsatNeutral => &[
                "Thanks for sharing! How would you rate this chat experience (1-5)?",
                "Appreciate the feedback! How satisfied were you with this chat (1-5)?",
                "One last question: How would you rate this conversation (1-5)?",
            ],
            Self::Closing => &[
                "Thank you for your feedback! Have a great day.",
                "All done! Thanks for your time.",
                "Survey complete. We appreciate your input!",
            ],
            Self::AlreadyComplete => &[
                "The survey is complete. Thank you!",
                "You've already finished the survey. Thanks again!",
                "This survey is closed. We appreciate your time!",
            ],
        }
    }

    /// Uniform pick from the pool.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &'static str {
        let candidates = self.candidates();
        candidates[rng.gen_range(0..candidates.len())]
    }
}

/// Outcome of one dialogue decision.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: SurveyStep,
    pub next: SurveyStep,
    pub pool: MessagePool,
    pub message: &'static str,
    /// Set only when this turn answered the NPS question.
    pub nps_score: Option<NpsScore>,
}

/// Decides the next step and the reply for one user turn.
///
/// | current            | condition          | next               |
/// |--------------------|--------------------|--------------------|
/// | NPS_ASK            | score 0-6          | DEEP_DIVE          |
/// | NPS_ASK            | score 7-8          | REASONING          |
/// | NPS_ASK            | score 9-10         | FAVORITE_FEATURE   |
/// | NPS_ASK            | no score           | NPS_ASK            |
/// | follow-up          | any                | CSAT_ASK           |
/// | CSAT_ASK           | any                | CLOSING            |
/// | CLOSING            | any                | CLOSING            |
pub fn decide<R: Rng + ?Sized>(
    current: SurveyStep,
    user_input: &str,
    sentiment: &SentimentResult,
    rng: &mut R,
) -> Transition {
    let (next, pool, nps_score) = match current {
        SurveyStep::NpsAsk => match extract_nps_score(user_input) {
            Some(score) => {
                let (next, pool) = match score.category() {
                    NpsCategory::Detractor => (SurveyStep::DeepDive, MessagePool::DeepDive),
                    NpsCategory::Passive => (SurveyStep::Reasoning, MessagePool::Reasoning),
                    NpsCategory::Promoter => {
                        (SurveyStep::FavoriteFeature, MessagePool::FavoriteFeature)
                    }
                };
                (next, pool, Some(score))
            }
            None => (SurveyStep::NpsAsk, MessagePool::NpsRetry, None),
        },
        SurveyStep::DeepDive | SurveyStep::Reasoning | SurveyStep::FavoriteFeature => {
            let pool = if sentiment.is_frustrated() {
                MessagePool::CsatFrustrated
            } else {
                MessagePool::CsatNeutral
            };
            (SurveyStep::CsatAsk, pool, None)
        }
        SurveyStep::CsatAsk => (SurveyStep::Closing, MessagePool::Closing, None),
        SurveyStep::Closing => (SurveyStep::Closing, MessagePool::AlreadyComplete, None),
    };

    Transition {
        from: current,
        next,
        pool,
        message: pool.pick(rng),
        nps_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::StateMachine;
    use crate::domain::survey::sentiment::SentimentLabel;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn frustrated() -> SentimentResult {
        SentimentResult::new(-0.8, SentimentLabel::Frustrated, vec!["wait".into()]).unwrap()
    }

    #[test]
    fn every_pool_has_at_least_three_candidates() {
        for pool in [
            MessagePool::NpsRetry,
            MessagePool::DeepDive,
            MessagePool::Reasoning,
            MessagePool::FavoriteFeature,
            MessagePool::CsatFrustrated,
            MessagePool::CsatNeutral,
            MessagePool::Closing,
            MessagePool::AlreadyComplete,
        ] {
            assert!(pool.candidates().len() >= 3, "{:?} has too few messages", pool);
        }
    }

    #[test]
    fn same_seed_gives_same_message() {
        let neutral = SentimentResult::neutral();
        let a = decide(SurveyStep::CsatAsk, "5", &neutral, &mut StdRng::seed_from_u64(99));
        let b = decide(SurveyStep::CsatAsk, "5", &neutral, &mut StdRng::seed_from_u64(99));
        assert_eq!(a.message, b.message);
    }

    #[test]
    fn message_always_comes_from_selected_pool() {
        let mut rng = rng();
        for _ in 0..50 {
            let t = decide(SurveyStep::NpsAsk, "hmm", &SentimentResult::neutral(), &mut rng);
            assert!(t.pool.candidates().contains(&t.message));
        }
    }

    #[test]
    fn detractor_scores_go_to_deep_dive() {
        for text in ["0", "I'd say 3", "6 at most"] {
            let t = decide(SurveyStep::NpsAsk, text, &SentimentResult::neutral(), &mut rng());
            assert_eq!(t.next, SurveyStep::DeepDive, "input {:?}", text);
        }
    }

    #[test]
    fn passive_scores_go_to_reasoning() {
        let t = decide(SurveyStep::NpsAsk, "7", &SentimentResult::neutral(), &mut rng());
        assert_eq!(t.next, SurveyStep::Reasoning);
        assert_eq!(t.nps_score.map(|s| s.value()), Some(7));
    }

    #[test]
    fn promoter_scores_go_to_favorite_feature() {
        let t = decide(SurveyStep::NpsAsk, "I give it a 10", &SentimentResult::neutral(), &mut rng());
        assert_eq!(t.next, SurveyStep::FavoriteFeature);
        assert_eq!(t.nps_score.map(|s| s.value()), Some(10));
    }

    #[test]
    fn missing_score_reprompts_without_advancing() {
        let t = decide(SurveyStep::NpsAsk, "it was ok I guess", &SentimentResult::neutral(), &mut rng());
        assert_eq!(t.next, SurveyStep::NpsAsk);
        assert_eq!(t.pool, MessagePool::NpsRetry);
        assert!(t.nps_score.is_none());
    }

    #[test]
    fn frustration_changes_csat_phrasing() {
        let t = decide(SurveyStep::DeepDive, "Nobody answered for an hour", &frustrated(), &mut rng());
        assert_eq!(t.next, SurveyStep::CsatAsk);
        assert_eq!(t.pool, MessagePool::CsatFrustrated);

        let t = decide(SurveyStep::Reasoning, "Faster replies", &SentimentResult::neutral(), &mut rng());
        assert_eq!(t.next, SurveyStep::CsatAsk);
        assert_eq!(t.pool, MessagePool::CsatNeutral);
    }

    #[test]
    fn follow_up_never_records_a_score() {
        let t = decide(SurveyStep::FavoriteFeature, "the 5 minute setup", &SentimentResult::neutral(), &mut rng());
        assert!(t.nps_score.is_none());
    }

    #[test]
    fn closing_stays_closed() {
        let t = decide(SurveyStep::Closing, "Hello?", &SentimentResult::neutral(), &mut rng());
        assert_eq!(t.next, SurveyStep::Closing);
        assert_eq!(t.pool, MessagePool::AlreadyComplete);
    }

    #[test]
    fn every_decision_is_a_legal_edge() {
        let mut rng = rng();
        for step in SurveyStep::ALL {
            for text in ["", "5", "10", "terrible", "42"] {
                for sentiment in [SentimentResult::neutral(), frustrated()] {
                    let t = decide(step, text, &sentiment, &mut rng);
                    assert!(step.can_transition_to(&t.next), "{:?} -> {:?}", step, t.next);
                }
            }
        }
    }

    proptest! {
        #[test]
        fn csat_always_closes(input in ".*", seed in any::<u64>(), frustrated_label in any::<bool>()) {
            let sentiment = if frustrated_label { frustrated() } else { SentimentResult::neutral() };
            let t = decide(SurveyStep::CsatAsk, &input, &sentiment, &mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(t.next, SurveyStep::Closing);
        }

        #[test]
        fn nps_routing_matches_buckets(score in 0u8..=10) {
            let t = decide(SurveyStep::NpsAsk, &score.to_string(), &SentimentResult::neutral(), &mut rng());
            let expected = match score {
                0..=6 => SurveyStep::DeepDive,
                7..=8 => SurveyStep::Reasoning,
                _ => SurveyStep::FavoriteFeature,
            };
            prop_assert_eq!(t.next, expected);
        }
    }
}
