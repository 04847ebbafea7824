//! Retrieval-augmented answering.
//!
//! One [`AnsweringEngine`] per conversation composes retrieved context into
//! the `qa.article` prompt and negotiates a fallback to model knowledge when
//! the context has no answer.

pub mod context;
pub mod engine;
pub mod negotiation;
pub mod session;
pub mod verdict;

pub use engine::{AnsweringEngine, EngineSettings};
pub use negotiation::{plan, settle, user_agrees, NegotiationState, TurnPlan};
pub use session::SessionRegistry;
