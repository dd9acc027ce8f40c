use crate::engine::EngineError;
use common::models::{
    AnalysisRecord, ComparisonReport, DanceStyle, GapDimension, ScoreSet,
};

// A sub-score gap above this reads as a significant difference.
const SIGNIFICANT_GAP: i16 = 10;
// An overall gap above this triggers the intensified-practice items.
const INTENSIFY_GAP: i16 = 20;

/// Compares a completed student recording against a completed teacher
/// reference. Gaps are `teacher − student` and keep their sign; a student
/// outperforming the teacher yields negative gaps, which the thresholds
/// read as-is. Never mutates its inputs.
pub fn compare(
    student: &AnalysisRecord,
    teacher: &AnalysisRecord,
) -> Result<ComparisonReport, EngineError> {
    let student_scores = completed_scores(student)?;
    let teacher_scores = completed_scores(teacher)?;

    let overall_gap = teacher_scores.overall as i16 - student_scores.overall as i16;
    let technique_gap = teacher_scores.technique as i16 - student_scores.technique as i16;
    let rhythm_gap = teacher_scores.rhythm as i16 - student_scores.rhythm as i16;
    let expression_gap = teacher_scores.expression as i16 - student_scores.expression as i16;

    let style = DanceStyle::from_tag(student.style.as_deref());
    let primary_focus = dominant_dimension(technique_gap, rhythm_gap, expression_gap);

    Ok(ComparisonReport {
        student_id: student.id,
        teacher_id: teacher.id,
        overall_gap,
        technique_gap,
        rhythm_gap,
        expression_gap,
        key_differences: key_differences(technique_gap, rhythm_gap, expression_gap),
        specific_improvements: specific_improvements(style, overall_gap),
        practice_recommendations: practice_recommendations(style),
        progress_focus: progress_focus(primary_focus),
        primary_focus,
    })
}

pub(crate) fn completed_scores(record: &AnalysisRecord) -> Result<ScoreSet, EngineError> {
    if !record.is_completed() {
        return Err(EngineError::IncompleteRecord(record.id));
    }
    record.scores.ok_or(EngineError::IncompleteRecord(record.id))
}

/// The dimension with the strictly largest gap, checked in the fixed
/// technique, rhythm, expression order. A tie at the top yields `None`.
fn dominant_dimension(technique: i16, rhythm: i16, expression: i16) -> Option<GapDimension> {
    if technique > rhythm && technique > expression {
        Some(GapDimension::Technique)
    } else if rhythm > technique && rhythm > expression {
        Some(GapDimension::Rhythm)
    } else if expression > technique && expression > rhythm {
        Some(GapDimension::Expression)
    } else {
        None
    }
}

fn key_differences(technique_gap: i16, rhythm_gap: i16, expression_gap: i16) -> Vec<String> {
    let mut differences = Vec::new();

    if technique_gap > SIGNIFICANT_GAP {
        differences.push("Significant technique gap in posture and form execution".to_string());
    }
    if rhythm_gap > SIGNIFICANT_GAP {
        differences.push("Timing and rhythm synchronization needs improvement".to_string());
    }
    if expression_gap > SIGNIFICANT_GAP {
        differences
            .push("Emotional expression and artistic interpretation can be enhanced".to_string());
    }

    differences.push("Teacher demonstrates more refined movement quality".to_string());
    differences.push("Student shows good foundation but needs refinement".to_string());

    differences
}

fn specific_improvements(style: DanceStyle, overall_gap: i16) -> Vec<String> {
    let mut improvements: Vec<String> = match style {
        DanceStyle::Bharatanatyam => [
            "Focus on precise aramandi (half-sitting position)",
            "Improve hasta mudras (hand gestures) clarity",
            "Work on facial expressions (abhinaya)",
            "Strengthen leg positions and stability",
        ],
        DanceStyle::Kathak => [
            "Practice chakkars (spins) with better balance",
            "Improve tatkaar (footwork) precision",
            "Work on bhava (emotional expression)",
            "Enhance rhythm coordination with tabla",
        ],
        DanceStyle::Generic => [
            "Focus on core technique fundamentals",
            "Improve movement flow and transitions",
            "Work on musical interpretation",
            "Enhance performance presence",
        ],
    }
    .iter()
    .map(|item| item.to_string())
    .collect();

    if overall_gap > INTENSIFY_GAP {
        improvements.push("Consider additional practice sessions".to_string());
        improvements.push("Focus on basic positions before complex movements".to_string());
    }

    improvements
}

fn practice_recommendations(style: DanceStyle) -> Vec<String> {
    let recommendations = match style {
        DanceStyle::Bharatanatyam => [
            "Daily practice of basic adavus (steps)",
            "Mirror work for posture correction",
            "Strengthen leg muscles with specific exercises",
            "Practice mudras with storytelling",
            "Work with live music for better rhythm",
        ],
        DanceStyle::Kathak => [
            "Practice tatkaar daily for 15-20 minutes",
            "Work on balance exercises for chakkars",
            "Study different gharana styles",
            "Practice with tabla accompaniment",
            "Focus on bhava through storytelling",
        ],
        DanceStyle::Generic => [
            "Daily technique practice sessions",
            "Video recording for self-assessment",
            "Work with qualified instructor",
            "Focus on flexibility and strength",
            "Regular performance practice",
        ],
    };
    recommendations.iter().map(|item| item.to_string()).collect()
}

fn progress_focus(primary_focus: Option<GapDimension>) -> Vec<String> {
    let mut focus = Vec::new();

    if let Some(dimension) = primary_focus {
        focus.push(
            match dimension {
                GapDimension::Technique => "Technique is the primary focus area",
                GapDimension::Rhythm => "Rhythm and timing need immediate attention",
                GapDimension::Expression => "Artistic expression requires development",
            }
            .to_string(),
        );
    }

    focus.push("Consistent practice will show improvement".to_string());
    focus.push("Focus on one area at a time for better results".to_string());

    focus
}
