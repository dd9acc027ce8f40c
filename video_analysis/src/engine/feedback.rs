use common::models::{Feedback, RecordingRole};

/// Turns the generated narrative into structured feedback.
///
/// The current policy selects a fixed set of role-appropriate phrases;
/// `narrative` and `seed` are part of the contract so an extraction-based
/// implementation can slot in without changing callers. Such a replacement
/// must fall back to these templates on an empty or unusable narrative —
/// downstream rendering assumes all three lists are non-empty.
pub fn parse(_narrative: &str, role: RecordingRole, _seed: u64) -> Feedback {
    match role {
        RecordingRole::Student => Feedback {
            strengths: phrases(&[
                "Good posture and alignment",
                "Clear movement execution",
                "Appropriate energy level",
            ]),
            improvements: phrases(&[
                "Focus on smoother transitions",
                "Enhance musical interpretation",
                "Increase movement precision",
            ]),
            recommendations: phrases(&[
                "Practice basic positions daily",
                "Work with metronome for timing",
                "Record practice sessions for self-review",
            ]),
        },
        RecordingRole::Teacher => Feedback {
            strengths: phrases(&[
                "Confident demonstration of core technique",
                "Clear movement execution",
                "Consistent energy throughout the piece",
            ]),
            improvements: phrases(&[
                "Slow down key transitions for clarity",
                "Call out counts alongside the music",
                "Isolate difficult passages when demonstrating",
            ]),
            recommendations: phrases(&[
                "Demonstrate at both full and reduced tempo",
                "Cue common student mistakes explicitly",
                "Record demonstrations as reference material",
            ]),
        },
    }
}

fn phrases(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}
