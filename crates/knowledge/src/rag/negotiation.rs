//! Two-turn fallback negotiation.
//!
//! When retrieval cannot answer a question the engine offers to answer from
//! the model's own knowledge and remembers the question. The next turn either
//! accepts the offer or is handled as a fresh query.

/// Phrases that count as accepting the offer (matched case-insensitively).
const AGREEMENT_PHRASES: &[&str] = &["yes", "sure", "okay", "go ahead", "please do", "alright"];

/// Per-session negotiation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NegotiationState {
    #[default]
    Idle,

    /// An offer is pending for `pending_question`.
    AwaitingPermission { pending_question: String },
}

impl NegotiationState {
    pub fn is_awaiting_permission(&self) -> bool {
        matches!(self, Self::AwaitingPermission { .. })
    }

    pub fn pending_question(&self) -> Option<&str> {
        match self {
            Self::AwaitingPermission { pending_question } => Some(pending_question),
            Self::Idle => None,
        }
    }
}

/// What a turn will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPlan {
    /// Answer the stored question from model knowledge, skipping retrieval.
    FromModelKnowledge { question: String },

    /// Answer `query` from retrieved context.
    Retrieve { query: String },
}

/// Whether the user's reply accepts the pending offer.
pub fn user_agrees(input: &str) -> bool {
    let lower = input.to_lowercase();
    AGREEMENT_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Decide what to do with `input` given the current state.
pub fn plan(state: &NegotiationState, input: &str) -> TurnPlan {
    match state {
        NegotiationState::AwaitingPermission { pending_question } if user_agrees(input) => {
            TurnPlan::FromModelKnowledge {
                question: pending_question.clone(),
            }
        }
        _ => TurnPlan::Retrieve {
            query: input.to_string(),
        },
    }
}

/// State after a turn has run.
///
/// A retrieval turn arms the offer when the answer was not found in context;
/// every other outcome leaves the session idle.
pub fn settle(plan: TurnPlan, not_found: bool) -> NegotiationState {
    match plan {
        TurnPlan::Retrieve { query } if not_found => NegotiationState::AwaitingPermission {
            pending_question: query,
        },
        _ => NegotiationState::Idle,
    }
}
