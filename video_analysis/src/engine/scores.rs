use common::models::{RecordingRole, ScoreSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Teachers are modeled as a stronger prior than students.
const TEACHER_BASE: f64 = 85.0;
const STUDENT_BASE: f64 = 75.0;

/// Derives the three sub-scores and the aggregate for one recording from a
/// single perturbation draw. Pure function of (role, seed), so callers that
/// pin the seed get reproducible scores.
pub fn synthesize(role: RecordingRole, seed: u64) -> ScoreSet {
    let base = match role {
        RecordingRole::Teacher => TEACHER_BASE,
        RecordingRole::Student => STUDENT_BASE,
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let variation: f64 = rng.gen_range(-10.0..=10.0);

    let technique = clamp_score(base + variation);
    let rhythm = clamp_score(base + variation * 0.8);
    let expression = clamp_score(base + variation * 1.2);
    ScoreSet::from_parts(technique, rhythm, expression)
}

fn clamp_score(raw: f64) -> u8 {
    (raw.round() as i64).clamp(60, 100) as u8
}
