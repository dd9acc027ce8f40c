use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordingRole {
    Teacher,
    Student,
}

/// Lifecycle of a recording analysis. `Failed` is terminal and keeps the
/// reason instead of leaving the record stuck in `Analyzing`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    Submitted,
    Analyzing,
    Completed,
    Failed { reason: String },
}

/// Recognized dance styles for content lookup. Free-form style tags that
/// match no variant fall back to `Generic`; adding a style is a new variant
/// plus its content arms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DanceStyle {
    Bharatanatyam,
    Kathak,
    Generic,
}

impl DanceStyle {
    /// Exact string match; anything unrecognized (including empty or unset)
    /// is `Generic`.
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag {
            Some("bharatanatyam") => DanceStyle::Bharatanatyam,
            Some("kathak") => DanceStyle::Kathak,
            _ => DanceStyle::Generic,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GapDimension {
    Technique,
    Rhythm,
    Expression,
}

impl fmt::Display for GapDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapDimension::Technique => write!(f, "technique"),
            GapDimension::Rhythm => write!(f, "rhythm"),
            GapDimension::Expression => write!(f, "expression"),
        }
    }
}

/// Per-dimension scores in [0, 100]. `overall` is always the rounded mean
/// of the other three; `from_parts` is the only way to build one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ScoreSet {
    pub technique: u8,
    pub rhythm: u8,
    pub expression: u8,
    pub overall: u8,
}

impl ScoreSet {
    pub fn from_parts(technique: u8, rhythm: u8, expression: u8) -> Self {
        let overall =
            ((technique as u32 + rhythm as u32 + expression as u32) as f64 / 3.0).round() as u8;
        ScoreSet {
            technique,
            rhythm,
            expression,
            overall,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Feedback {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub recommendations: Vec<String>,
}

/// The "video uploaded" event the engine consumes: the storage URL is
/// already resolved by the upload collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Submission {
    pub user_id: String,
    pub title: String,
    pub video_url: String,
    pub role: RecordingRole,
    pub student_name: Option<String>,
    pub style: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub video_url: String,
    pub role: RecordingRole,
    pub student_name: Option<String>,
    pub style: Option<String>,
    pub notes: Option<String>,
    pub status: RecordingStatus,
    pub narrative: Option<String>,
    pub scores: Option<ScoreSet>,
    pub feedback: Option<Feedback>,
    pub created_at: DateTime<Utc>,
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl AnalysisRecord {
    pub fn new(submission: Submission) -> Self {
        AnalysisRecord {
            id: Uuid::new_v4(),
            user_id: submission.user_id,
            title: submission.title,
            video_url: submission.video_url,
            role: submission.role,
            student_name: submission.student_name,
            style: submission.style,
            notes: submission.notes,
            status: RecordingStatus::Submitted,
            narrative: None,
            scores: None,
            feedback: None,
            created_at: Utc::now(),
            analyzed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == RecordingStatus::Completed
    }
}

/// Derived comparison of one student recording against a teacher reference.
/// Gaps are `teacher − student` and keep their sign; `primary_focus` is set
/// only when one dimension gap is strictly larger than both others.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ComparisonReport {
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub overall_gap: i16,
    pub technique_gap: i16,
    pub rhythm_gap: i16,
    pub expression_gap: i16,
    pub key_differences: Vec<String>,
    pub specific_improvements: Vec<String>,
    pub practice_recommendations: Vec<String>,
    pub progress_focus: Vec<String>,
    pub primary_focus: Option<GapDimension>,
}
