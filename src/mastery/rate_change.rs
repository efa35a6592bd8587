use super::profile::InteractionInput;

const QUIZ_PASS_BAR: f64 = 70.0;
const QUIZ_SCALE: f64 = 10.0;
const ASSIGNMENT_PASS_BAR: f64 = 60.0;
const ASSIGNMENT_SCALE: f64 = 15.0;
const DOUBT_PENALTY: f64 = -1.0;
const CONTENT_VIEW_BONUS: f64 = 0.5;
const EXPECTED_MINUTES: f64 = 30.0;
const MAX_TIME_RATIO: f64 = 2.0;

/// Maps one interaction to a signed rate delta, rounded to two decimals.
///
/// Quizzes center on a 70% pass bar (+3 at 100%, -7 at 0%), assignments on
/// 60%. A missing score on either counts as 0. Asking a question nudges the
/// rate down, viewing content nudges it up, and unrecognized kinds are
/// neutral. Never fails: malformed optional fields degrade to neutral
/// multipliers.
pub fn compute_rate_change(input: &InteractionInput) -> f64 {
    let base = match input.kind.as_str() {
        "quiz" => (input.score.unwrap_or(0.0) - QUIZ_PASS_BAR) / QUIZ_SCALE,
        "doubt" => DOUBT_PENALTY,
        "content_view" => CONTENT_VIEW_BONUS,
        "assignment" => (input.score.unwrap_or(0.0) - ASSIGNMENT_PASS_BAR) / ASSIGNMENT_SCALE,
        _ => 0.0,
    };

    let scaled = base * difficulty_multiplier(input.difficulty.as_deref())
        * time_multiplier(input.time_spent);

    round2(scaled)
}

fn difficulty_multiplier(difficulty: Option<&str>) -> f64 {
    match difficulty {
        Some("easy") => 0.8,
        Some("hard") => 1.3,
        // "medium" and unrecognized labels scale neutrally.
        Some(_) => 1.0,
        None => 1.0,
    }
}

fn time_multiplier(time_spent: Option<f64>) -> f64 {
    match time_spent {
        Some(minutes) => {
            let ratio = (minutes / EXPECTED_MINUTES).min(MAX_TIME_RATIO);
            0.5 + ratio * 0.5
        }
        None => 1.0,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(kind: &str) -> InteractionInput {
        InteractionInput {
            kind: kind.to_string(),
            subject: None,
            score: None,
            difficulty: None,
            time_spent: None,
        }
    }

    fn quiz(score: f64) -> InteractionInput {
        InteractionInput {
            score: Some(score),
            ..interaction("quiz")
        }
    }

    #[test]
    fn quiz_boundary_values() {
        assert_eq!(compute_rate_change(&quiz(100.0)), 3.0);
        assert_eq!(compute_rate_change(&quiz(70.0)), 0.0);
        assert_eq!(compute_rate_change(&quiz(0.0)), -7.0);
    }

    #[test]
    fn assignment_boundary_values() {
        let mut input = interaction("assignment");
        input.score = Some(100.0);
        assert_eq!(compute_rate_change(&input), 2.67);
        input.score = Some(60.0);
        assert_eq!(compute_rate_change(&input), 0.0);
    }

    #[test]
    fn missing_score_counts_as_zero() {
        assert_eq!(compute_rate_change(&interaction("quiz")), -7.0);
        assert_eq!(compute_rate_change(&interaction("assignment")), -4.0);
    }

    #[test]
    fn fixed_kinds() {
        assert_eq!(compute_rate_change(&interaction("doubt")), -1.0);
        assert_eq!(compute_rate_change(&interaction("content_view")), 0.5);
    }

    #[test]
    fn unknown_kind_is_neutral() {
        let mut input = interaction("made_up");
        input.score = Some(100.0);
        input.difficulty = Some("hard".into());
        input.time_spent = Some(60.0);
        assert_eq!(compute_rate_change(&input), 0.0);
    }

    #[test]
    fn difficulty_scaling() {
        let mut input = quiz(100.0);
        input.difficulty = Some("hard".into());
        assert_eq!(compute_rate_change(&input), 3.9);

        input.difficulty = Some("easy".into());
        assert_eq!(compute_rate_change(&input), 2.4);

        input.difficulty = Some("brutal".into());
        assert_eq!(compute_rate_change(&input), 3.0);
    }

    #[test]
    fn time_scaling_boundaries() {
        let mut input = interaction("content_view");
        input.time_spent = Some(60.0);
        assert_eq!(compute_rate_change(&input), 0.75);

        input.time_spent = Some(0.0);
        assert_eq!(compute_rate_change(&input), 0.25);

        // Ratio caps at 2.0, so more time never exceeds the 1.5x multiplier.
        input.time_spent = Some(600.0);
        assert_eq!(compute_rate_change(&input), 0.75);
    }

    #[test]
    fn difficulty_applies_before_time() {
        let mut input = quiz(100.0);
        input.difficulty = Some("hard".into());
        input.time_spent = Some(60.0);
        // 3.0 * 1.3 * 1.5
        assert_eq!(compute_rate_change(&input), 5.85);
    }

    #[test]
    fn deterministic() {
        let mut input = quiz(87.0);
        input.difficulty = Some("medium".into());
        input.time_spent = Some(17.5);
        assert_eq!(compute_rate_change(&input), compute_rate_change(&input));
    }
}
