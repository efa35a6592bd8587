use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RATE: f64 = 50.0;
pub const MIN_RATE: f64 = 1.0;
pub const MAX_RATE: f64 = 100.0;
pub const HISTORY_LIMIT: usize = 50;

/// One learning interaction as supplied by a caller. `timestamp` and
/// `rate_change` are assigned by the engine, never by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionInput {
    /// Matched against quiz / doubt / content_view / assignment; any other
    /// value is a no-op for the rate but still lands in the history.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub rate_change: f64,
}

impl InteractionRecord {
    pub fn from_input(input: InteractionInput, timestamp: DateTime<Utc>, rate_change: f64) -> Self {
        Self {
            kind: input.kind,
            subject: input.subject,
            score: input.score,
            difficulty: input.difficulty,
            time_spent: input.time_spent,
            timestamp,
            rate_change,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerProfile {
    pub learner_id: String,
    pub overall_rate: f64,
    pub subject_rates: BTreeMap<String, f64>,
    pub history: Vec<InteractionRecord>,
    pub last_updated: DateTime<Utc>,
}

impl LearnerProfile {
    pub fn fresh(learner_id: &str) -> Self {
        Self {
            learner_id: learner_id.to_string(),
            overall_rate: DEFAULT_RATE,
            subject_rates: BTreeMap::new(),
            history: Vec::new(),
            last_updated: Utc::now(),
        }
    }

    /// Drops the oldest entries until at most `HISTORY_LIMIT` remain.
    pub fn truncate_history(&mut self) {
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

pub fn clamp_rate(value: f64) -> f64 {
    value.clamp(MIN_RATE, MAX_RATE)
}
