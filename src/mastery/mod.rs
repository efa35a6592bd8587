//! Adaptive learning-rate tracking: every quiz, question, content view, and
//! assignment moves a learner's overall and per-subject mastery rate on a
//! 1-100 scale, with a bounded rolling history of recent interactions.

mod engine;
mod profile;
mod rate_change;
mod store;

pub use engine::MasteryEngine;
pub use profile::{
    clamp_rate, InteractionInput, InteractionRecord, LearnerProfile, DEFAULT_RATE, HISTORY_LIMIT,
    MAX_RATE, MIN_RATE,
};
pub use rate_change::compute_rate_change;
pub use store::{FileProfileStore, LearnerProfileStore, MemoryProfileStore};
