use super::domain::Answer;

const LIKERT_MIN: f64 = 1.0;
const LIKERT_MAX: f64 = 5.0;

/// Map one answer onto [0, 1]. Skipped or empty answers contribute nothing.
pub fn normalize(answer: &Answer) -> f64 {
    if answer.skipped {
        return 0.0;
    }
    if let Some(value) = answer.likert_value {
        let clamped = f64::from(value).clamp(LIKERT_MIN, LIKERT_MAX);
        return (clamped - LIKERT_MIN) / (LIKERT_MAX - LIKERT_MIN);
    }
    match answer.raw_score {
        Some(score) if score.is_nan() => 0.0,
        Some(score) => score.clamp(0.0, 1.0),
        None => 0.0,
    }
}
