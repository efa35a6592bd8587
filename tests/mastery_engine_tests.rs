use std::sync::Arc;

use proptest::prelude::*;

use intellilearn_backend::mastery::{
    compute_rate_change, InteractionInput, LearnerProfile, LearnerProfileStore, MasteryEngine,
    MemoryProfileStore, HISTORY_LIMIT,
};
use intellilearn_backend::store::StoreError;

fn interaction(kind: &str, subject: Option<&str>) -> InteractionInput {
    InteractionInput {
        kind: kind.to_string(),
        subject: subject.map(str::to_string),
        score: None,
        difficulty: None,
        time_spent: None,
    }
}

fn quiz(subject: &str, score: f64) -> InteractionInput {
    InteractionInput {
        score: Some(score),
        ..interaction("quiz", Some(subject))
    }
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[tokio::test]
async fn end_to_end_scenario() {
    let engine = MasteryEngine::new(MemoryProfileStore::new());

    let profile = engine
        .record_interaction("u1", quiz("Math", 90.0))
        .await
        .unwrap();
    assert_close(profile.overall_rate, 52.0);
    assert_close(profile.subject_rates["Math"], 52.0);

    let profile = engine
        .record_interaction("u1", interaction("doubt", Some("Math")))
        .await
        .unwrap();
    assert_close(profile.overall_rate, 51.0);
    assert_close(profile.subject_rates["Math"], 51.0);

    let hard_assignment = InteractionInput {
        score: Some(100.0),
        difficulty: Some("hard".to_string()),
        ..interaction("assignment", Some("Math"))
    };
    let profile = engine
        .record_interaction("u1", hard_assignment)
        .await
        .unwrap();
    assert_close(profile.overall_rate, 54.47);
    assert_close(profile.subject_rates["Math"], 54.47);
    assert_eq!(profile.history.len(), 3);
}

#[tokio::test]
async fn first_subject_interaction_initializes_to_fifty() {
    let engine = MasteryEngine::new(MemoryProfileStore::new());

    let profile = engine
        .record_interaction("u1", quiz("Physics", 100.0))
        .await
        .unwrap();

    // 50 + 3.0, not 0 + 3.0.
    assert_close(profile.subject_rates["Physics"], 53.0);
}

#[tokio::test]
async fn subjectless_interaction_only_moves_overall_rate() {
    let engine = MasteryEngine::new(MemoryProfileStore::new());

    let profile = engine
        .record_interaction("u1", interaction("content_view", None))
        .await
        .unwrap();

    assert_close(profile.overall_rate, 50.5);
    assert!(profile.subject_rates.is_empty());
}

#[tokio::test]
async fn history_keeps_only_most_recent_fifty() {
    let engine = MasteryEngine::new(MemoryProfileStore::new());

    let mut last = None;
    for i in 0..55 {
        let mut input = interaction("content_view", Some("Math"));
        input.score = Some(i as f64);
        let profile = engine.record_interaction("u1", input).await.unwrap();
        let expected = std::cmp::min(i + 1, HISTORY_LIMIT);
        assert_eq!(profile.history.len(), expected);
        last = Some(profile);
    }

    let profile = last.unwrap();
    assert_eq!(profile.history.len(), HISTORY_LIMIT);
    // The five oldest entries were evicted from the front.
    assert_eq!(profile.history[0].score, Some(5.0));
    assert_eq!(profile.history[49].score, Some(54.0));
}

#[tokio::test]
async fn get_profile_never_persists_defaults() {
    let store = Arc::new(MemoryProfileStore::new());
    let engine = MasteryEngine::new(Arc::clone(&store));

    let first = engine.get_profile("ghost").await;
    let second = engine.get_profile("ghost").await;

    assert_close(first.overall_rate, 50.0);
    assert_close(second.overall_rate, 50.0);
    assert!(first.subject_rates.is_empty());
    assert!(first.history.is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn overall_rate_clamps_at_floor() {
    let engine = MasteryEngine::new(MemoryProfileStore::new());

    for _ in 0..20 {
        engine
            .record_interaction("u1", quiz("Math", 0.0))
            .await
            .unwrap();
    }

    let profile = engine.get_profile("u1").await;
    assert_close(profile.overall_rate, 1.0);
    assert_close(profile.subject_rates["Math"], 1.0);
}

#[tokio::test]
async fn unknown_kind_is_recorded_with_zero_delta() {
    let engine = MasteryEngine::new(MemoryProfileStore::new());

    let profile = engine
        .record_interaction("u1", interaction("made_up", Some("Math")))
        .await
        .unwrap();

    assert_close(profile.overall_rate, 50.0);
    assert_close(profile.subject_rates["Math"], 50.0);
    assert_eq!(profile.history.len(), 1);
    assert_eq!(profile.history[0].kind, "made_up");
    assert_close(profile.history[0].rate_change, 0.0);
}

#[tokio::test]
async fn summaries_filter_by_subject_and_cap_at_ten() {
    let engine = MasteryEngine::new(MemoryProfileStore::new());

    for _ in 0..12 {
        engine
            .record_interaction("u1", interaction("doubt", Some("Math")))
            .await
            .unwrap();
    }
    engine
        .record_interaction("u1", quiz("Science", 80.0))
        .await
        .unwrap();

    let math = engine.summarize_subject_history("u1", "Math").await;
    assert_eq!(math.len(), 10);
    assert!(math.iter().all(|line| line == "Asked about Math"));

    let science = engine.summarize_subject_history("u1", "Science").await;
    assert_eq!(science, vec!["Scored 80% on Science quiz".to_string()]);

    let history = engine.summarize_subject_history("u1", "History").await;
    assert!(history.is_empty());

    // Unknown learners read as empty, not as an error.
    let nobody = engine.summarize_subject_history("nobody", "Math").await;
    assert!(nobody.is_empty());
}

struct FailingStore;

impl LearnerProfileStore for FailingStore {
    async fn load(&self, _learner_id: &str) -> Result<Option<LearnerProfile>, StoreError> {
        Ok(None)
    }

    async fn save(&self, _learner_id: &str, _profile: &LearnerProfile) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}

#[tokio::test]
async fn store_write_failure_propagates() {
    let engine = MasteryEngine::new(FailingStore);

    let result = engine.record_interaction("u1", quiz("Math", 90.0)).await;
    assert!(result.is_err());

    // Reads still fall back to defaults.
    let profile = engine.get_profile("u1").await;
    assert_close(profile.overall_rate, 50.0);
}

fn arb_interaction() -> impl Strategy<Value = InteractionInput> {
    let kind = prop_oneof![
        Just("quiz".to_string()),
        Just("doubt".to_string()),
        Just("content_view".to_string()),
        Just("assignment".to_string()),
        Just("mystery".to_string()),
    ];
    let subject = proptest::option::of(prop_oneof![
        Just("Math".to_string()),
        Just("Science".to_string()),
        Just("History".to_string()),
    ]);
    let score = proptest::option::of((0u32..=1000u32).prop_map(|v| v as f64 / 10.0));
    let difficulty = proptest::option::of(prop_oneof![
        Just("easy".to_string()),
        Just("medium".to_string()),
        Just("hard".to_string()),
        Just("weird".to_string()),
    ]);
    let time_spent = proptest::option::of((0u32..=240u32).prop_map(f64::from));

    (kind, subject, score, difficulty, time_spent).prop_map(
        |(kind, subject, score, difficulty, time_spent)| InteractionInput {
            kind,
            subject,
            score,
            difficulty,
            time_spent,
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_for_any_interaction_sequence(
        inputs in prop::collection::vec(arb_interaction(), 1..120)
    ) {
        let runtime = tokio::runtime::Runtime::new().expect("runtime");
        runtime.block_on(async {
            let engine = MasteryEngine::new(MemoryProfileStore::new());

            for (i, input) in inputs.into_iter().enumerate() {
                let expected_delta = compute_rate_change(&input);
                let profile = engine
                    .record_interaction("prop-learner", input)
                    .await
                    .expect("record interaction");

                assert!((1.0..=100.0).contains(&profile.overall_rate));
                for rate in profile.subject_rates.values() {
                    assert!((1.0..=100.0).contains(rate));
                }
                assert_eq!(profile.history.len(), std::cmp::min(i + 1, HISTORY_LIMIT));

                let last = profile.history.last().expect("history entry");
                assert_eq!(last.rate_change, expected_delta);
            }
        });
    }
}
