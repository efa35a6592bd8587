use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use crate::store::StoreError;

use super::profile::{clamp_rate, InteractionInput, InteractionRecord, LearnerProfile, DEFAULT_RATE};
use super::rate_change::compute_rate_change;

const SUMMARY_LIMIT: usize = 10;

/// Orchestrates the rate calculator against persisted learner profiles.
///
/// Writes for the same learner are serialized through a keyed async mutex,
/// so two concurrent interactions cannot drop each other's update. Reads
/// take no lock.
pub struct MasteryEngine<S> {
    store: S,
    write_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl<S: super::store::LearnerProfileStore> MasteryEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Tolerant read: a missing or unreadable profile yields a fresh default
    /// (overall rate 50, no subjects, empty history). Nothing is persisted
    /// until the first interaction is recorded.
    pub async fn get_profile(&self, learner_id: &str) -> LearnerProfile {
        match self.store.load(learner_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => LearnerProfile::fresh(learner_id),
            Err(err) => {
                tracing::warn!(learner_id, error = %err, "profile load failed, using defaults");
                LearnerProfile::fresh(learner_id)
            }
        }
    }

    /// Applies one interaction: computes the delta, moves the overall rate
    /// and the subject rate (lazily initialized to 50), appends the enriched
    /// record to the bounded history, and overwrites the stored profile.
    ///
    /// A store write failure is logged and propagated; the update is lost.
    pub async fn record_interaction(
        &self,
        learner_id: &str,
        input: InteractionInput,
    ) -> Result<LearnerProfile, StoreError> {
        let lock = self.write_lock(learner_id);
        let _guard = lock.lock().await;

        let mut profile = self.get_profile(learner_id).await;
        let delta = compute_rate_change(&input);

        profile.overall_rate = clamp_rate(profile.overall_rate + delta);
        if let Some(subject) = input.subject.as_deref() {
            let rate = profile
                .subject_rates
                .entry(subject.to_string())
                .or_insert(DEFAULT_RATE);
            *rate = clamp_rate(*rate + delta);
        }

        let now = Utc::now();
        profile
            .history
            .push(InteractionRecord::from_input(input, now, delta));
        profile.truncate_history();
        profile.last_updated = now;

        if let Err(err) = self.store.save(learner_id, &profile).await {
            tracing::error!(learner_id, error = %err, "failed to persist learner profile");
            return Err(err);
        }

        Ok(profile)
    }

    /// Short human-readable lines for the learner's most recent interactions
    /// in one subject (exact match, newest last, at most ten). Never fails:
    /// an unloadable profile reads as an empty history.
    pub async fn summarize_subject_history(&self, learner_id: &str, subject: &str) -> Vec<String> {
        let profile = self.get_profile(learner_id).await;
        let matching: Vec<&InteractionRecord> = profile
            .history
            .iter()
            .filter(|record| record.subject.as_deref() == Some(subject))
            .collect();

        let start = matching.len().saturating_sub(SUMMARY_LIMIT);
        matching[start..]
            .iter()
            .map(|record| describe_interaction(record))
            .collect()
    }

    fn write_lock(&self, learner_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.write_locks.lock();
        Arc::clone(
            locks
                .entry(learner_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }
}

fn describe_interaction(record: &InteractionRecord) -> String {
    let subject = record.subject.as_deref().unwrap_or("general study");
    match record.kind.as_str() {
        "quiz" => format!("Scored {}% on {subject} quiz", format_score(record.score)),
        "doubt" => format!("Asked about {subject}"),
        "content_view" => format!("Studied {subject}"),
        "assignment" => format!(
            "Completed {subject} assignment ({}%)",
            format_score(record.score)
        ),
        _ => format!("Interacted with {subject}"),
    }
}

fn format_score(score: Option<f64>) -> String {
    let value = score.unwrap_or(0.0);
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_covers_every_kind() {
        let record = |kind: &str, score: Option<f64>| InteractionRecord {
            kind: kind.to_string(),
            subject: Some("Math".into()),
            score,
            difficulty: None,
            time_spent: None,
            timestamp: Utc::now(),
            rate_change: 0.0,
        };

        assert_eq!(
            describe_interaction(&record("quiz", Some(90.0))),
            "Scored 90% on Math quiz"
        );
        assert_eq!(describe_interaction(&record("doubt", None)), "Asked about Math");
        assert_eq!(
            describe_interaction(&record("content_view", None)),
            "Studied Math"
        );
        assert_eq!(
            describe_interaction(&record("assignment", Some(87.5))),
            "Completed Math assignment (87.5%)"
        );
        assert_eq!(
            describe_interaction(&record("made_up", None)),
            "Interacted with Math"
        );
    }
}
