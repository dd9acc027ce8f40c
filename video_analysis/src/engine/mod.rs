pub mod feedback;
pub mod gap;
pub mod scores;

use crate::generation::{GenerationError, TextGenerator};
use crate::store::{RecordStore, StoreError};
use askama::Template;
use chrono::Utc;
use common::models::{
    AnalysisRecord, ComparisonReport, RecordingRole, RecordingStatus, ScoreSet, Submission,
};
use log::{debug, info, warn};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

const ANALYSIS_MAX_TOKENS: u32 = 1000;
const COMPARISON_MAX_TOKENS: u32 = 1200;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("text generation failed: {0}")]
    ExternalCallFailed(#[from] GenerationError),
    #[error("recording {0} has not completed analysis")]
    IncompleteRecord(Uuid),
    #[error("student recordings require a student name")]
    InvalidRole,
    #[error("recording {0} not found")]
    UnknownRecording(Uuid),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::UnknownRecording(id),
        }
    }
}

/// A comparison outcome: the deterministic report plus the generated prose
/// that accompanies it. Only the report is reproducible across runs.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub report: ComparisonReport,
    pub narrative: String,
}

#[derive(Template)]
#[template(path = "analysis_prompt.txt")]
struct AnalysisPrompt<'a> {
    subject: String,
    style: &'a str,
    focus: &'static str,
    notes: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "comparison_prompt.txt")]
struct ComparisonPrompt<'a> {
    style: &'a str,
    student_name: Option<&'a str>,
    student: ScoreSet,
    teacher: ScoreSet,
}

/// Orchestrates one recording's lifecycle from submission to a completed
/// (or failed) analysis record, and drives comparisons between completed
/// records. The external text-generation call is the single suspension
/// point; no lock is held across it.
pub struct AnalysisPipeline<G> {
    generator: G,
    store: Arc<RecordStore>,
}

impl<G: TextGenerator> AnalysisPipeline<G> {
    pub fn new(generator: G, store: Arc<RecordStore>) -> Self {
        AnalysisPipeline { generator, store }
    }

    /// Analyzes one submission with a fresh perturbation seed.
    pub async fn run(&self, submission: Submission) -> Result<AnalysisRecord, EngineError> {
        self.run_seeded(submission, rand::random()).await
    }

    /// Seed-explicit entry point; scores are a pure function of
    /// (role, seed), so pinning the seed makes a run reproducible.
    pub async fn run_seeded(
        &self,
        submission: Submission,
        seed: u64,
    ) -> Result<AnalysisRecord, EngineError> {
        if submission.role == RecordingRole::Student
            && submission
                .student_name
                .as_deref()
                .is_none_or(|name| name.trim().is_empty())
        {
            return Err(EngineError::InvalidRole);
        }

        let mut record = AnalysisRecord::new(submission);
        record.status = RecordingStatus::Analyzing;
        self.store.create(record.clone()).await;
        debug!("analyzing recording {}", record.id);

        let prompt = analysis_prompt(&record);
        let narrative = match self.generator.generate(&prompt, ANALYSIS_MAX_TOKENS).await {
            Ok(text) => text,
            Err(err) => {
                warn!("analysis of recording {} failed: {err}", record.id);
                record.status = RecordingStatus::Failed {
                    reason: err.to_string(),
                };
                self.store.update(record).await?;
                return Err(err.into());
            }
        };

        record.scores = Some(scores::synthesize(record.role, seed));
        record.feedback = Some(feedback::parse(&narrative, record.role, seed));
        record.narrative = Some(narrative);
        record.analyzed_at = Some(Utc::now());
        record.status = RecordingStatus::Completed;
        self.store.update(record.clone()).await?;

        info!("completed analysis for recording {}", record.id);
        Ok(record)
    }

    /// Looks both recordings up, computes the gap report, and generates the
    /// accompanying comparison narrative. Recomputed fresh on every call.
    pub async fn compare(
        &self,
        student_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<Comparison, EngineError> {
        let student = self
            .store
            .get(student_id)
            .await
            .ok_or(EngineError::UnknownRecording(student_id))?;
        let teacher = self
            .store
            .get(teacher_id)
            .await
            .ok_or(EngineError::UnknownRecording(teacher_id))?;

        let report = gap::compare(&student, &teacher)?;

        let student_scores = gap::completed_scores(&student)?;
        let teacher_scores = gap::completed_scores(&teacher)?;
        let prompt = comparison_prompt(&student, student_scores, teacher_scores);
        let narrative = self
            .generator
            .generate(&prompt, COMPARISON_MAX_TOKENS)
            .await?;

        Ok(Comparison { report, narrative })
    }
}

fn analysis_prompt(record: &AnalysisRecord) -> String {
    let subject = match record.role {
        RecordingRole::Teacher => "dance teacher demonstration".to_string(),
        RecordingRole::Student => format!(
            "student dance performance by {}",
            record.student_name.as_deref().unwrap_or("the student")
        ),
    };
    let focus = match record.role {
        RecordingRole::Teacher => "Analyze teaching effectiveness and demonstration quality.",
        RecordingRole::Student => "Focus on constructive feedback for student development.",
    };
    AnalysisPrompt {
        subject,
        style: record.style.as_deref().unwrap_or("general dance"),
        focus,
        notes: record.notes.as_deref().filter(|notes| !notes.is_empty()),
    }
    .render()
    .unwrap()
}

fn comparison_prompt(student: &AnalysisRecord, student_scores: ScoreSet, teacher_scores: ScoreSet) -> String {
    ComparisonPrompt {
        style: student.style.as_deref().unwrap_or("general dance"),
        student_name: student.student_name.as_deref(),
        student: student_scores,
        teacher: teacher_scores,
    }
    .render()
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Feedback;

    struct CannedGenerator(&'static str);

    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str, _max_tokens: u32) -> Result<String, GenerationError> {
            Err(GenerationError::MalformedResponse)
        }
    }

    fn student_submission(style: Option<&str>) -> Submission {
        Submission {
            user_id: "user-1".to_string(),
            title: "practice.mp4".to_string(),
            video_url: "https://storage.example/practice.mp4".to_string(),
            role: RecordingRole::Student,
            student_name: Some("Maya".to_string()),
            style: style.map(|tag| tag.to_string()),
            notes: Some("second week of practice".to_string()),
        }
    }

    fn completed_record(
        role: RecordingRole,
        style: Option<&str>,
        technique: u8,
        rhythm: u8,
        expression: u8,
    ) -> AnalysisRecord {
        let mut record = AnalysisRecord::new(Submission {
            user_id: "user-1".to_string(),
            title: "clip.mp4".to_string(),
            video_url: "https://storage.example/clip.mp4".to_string(),
            role,
            student_name: (role == RecordingRole::Student).then(|| "Maya".to_string()),
            style: style.map(|tag| tag.to_string()),
            notes: None,
        });
        record.status = RecordingStatus::Completed;
        record.scores = Some(ScoreSet::from_parts(technique, rhythm, expression));
        record.narrative = Some("narrative".to_string());
        record.feedback = Some(Feedback {
            strengths: vec!["s".to_string()],
            improvements: vec!["i".to_string()],
            recommendations: vec!["r".to_string()],
        });
        record.analyzed_at = Some(Utc::now());
        record
    }

    #[tokio::test]
    async fn run_completes_the_record() {
        let store = Arc::new(RecordStore::new());
        let pipeline =
            AnalysisPipeline::new(CannedGenerator("a thoughtful analysis"), store.clone());

        let record = pipeline
            .run_seeded(student_submission(Some("kathak")), 7)
            .await
            .unwrap();

        assert_eq!(record.status, RecordingStatus::Completed);
        assert_eq!(record.narrative.as_deref(), Some("a thoughtful analysis"));
        assert!(record.analyzed_at.is_some());

        let scores = record.scores.unwrap();
        assert_eq!(scores, scores::synthesize(RecordingRole::Student, 7));

        let feedback = record.feedback.as_ref().unwrap();
        assert!(!feedback.strengths.is_empty());
        assert!(!feedback.improvements.is_empty());
        assert!(!feedback.recommendations.is_empty());

        // The stored copy matches what the caller got back.
        assert_eq!(store.get(record.id).await, Some(record));
    }

    #[tokio::test]
    async fn failed_generation_marks_the_record_failed() {
        let store = Arc::new(RecordStore::new());
        let pipeline = AnalysisPipeline::new(FailingGenerator, store.clone());

        let result = pipeline.run_seeded(student_submission(None), 7).await;
        assert!(matches!(result, Err(EngineError::ExternalCallFailed(_))));

        // No partially-scored completed record exists.
        let listed = store.list().await;
        assert_eq!(listed.len(), 1);
        assert!(matches!(
            listed[0].status,
            RecordingStatus::Failed { ref reason } if !reason.is_empty()
        ));
        assert!(listed[0].scores.is_none());
        assert!(listed[0].feedback.is_none());
        assert!(listed[0].analyzed_at.is_none());
    }

    #[tokio::test]
    async fn student_without_name_is_rejected_before_any_record_exists() {
        let store = Arc::new(RecordStore::new());
        let pipeline = AnalysisPipeline::new(CannedGenerator("text"), store.clone());

        let mut submission = student_submission(None);
        submission.student_name = Some("   ".to_string());
        let result = pipeline.run_seeded(submission, 7).await;
        assert!(matches!(result, Err(EngineError::InvalidRole)));

        let mut submission = student_submission(None);
        submission.student_name = None;
        let result = pipeline.run_seeded(submission, 7).await;
        assert!(matches!(result, Err(EngineError::InvalidRole)));

        assert!(store.list().await.is_empty());
    }

    #[tokio::test]
    async fn teacher_submission_needs_no_student_name() {
        let store = Arc::new(RecordStore::new());
        let pipeline = AnalysisPipeline::new(CannedGenerator("text"), store.clone());

        let record = pipeline
            .run_seeded(
                Submission {
                    user_id: "user-1".to_string(),
                    title: "demo.mp4".to_string(),
                    video_url: "https://storage.example/demo.mp4".to_string(),
                    role: RecordingRole::Teacher,
                    student_name: None,
                    style: None,
                    notes: None,
                },
                7,
            )
            .await
            .unwrap();
        assert!(record.is_completed());
    }

    #[tokio::test]
    async fn compare_returns_report_and_narrative() {
        let store = Arc::new(RecordStore::new());
        let pipeline = AnalysisPipeline::new(CannedGenerator("a detailed comparison"), store.clone());

        let student = completed_record(RecordingRole::Student, Some("kathak"), 70, 65, 72);
        let teacher = completed_record(RecordingRole::Teacher, Some("kathak"), 92, 90, 88);
        store.create(student.clone()).await;
        store.create(teacher.clone()).await;

        let comparison = pipeline.compare(student.id, teacher.id).await.unwrap();
        assert_eq!(comparison.narrative, "a detailed comparison");
        assert_eq!(comparison.report.overall_gap, 21);
        assert_eq!(comparison.report.practice_recommendations.len(), 5);
        assert_eq!(
            comparison.report.practice_recommendations[0],
            "Practice tatkaar daily for 15-20 minutes"
        );

        // Gap arithmetic is reproducible across calls.
        let again = pipeline.compare(student.id, teacher.id).await.unwrap();
        assert_eq!(comparison.report, again.report);
    }

    #[tokio::test]
    async fn compare_rejects_records_still_analyzing() {
        let store = Arc::new(RecordStore::new());
        let pipeline = AnalysisPipeline::new(CannedGenerator("text"), store.clone());

        let mut student = completed_record(RecordingRole::Student, None, 70, 70, 70);
        student.status = RecordingStatus::Analyzing;
        let teacher = completed_record(RecordingRole::Teacher, None, 90, 90, 90);
        store.create(student.clone()).await;
        store.create(teacher.clone()).await;

        let result = pipeline.compare(student.id, teacher.id).await;
        assert!(matches!(result, Err(EngineError::IncompleteRecord(id)) if id == student.id));
    }

    #[tokio::test]
    async fn compare_rejects_unknown_recordings() {
        let store = Arc::new(RecordStore::new());
        let pipeline = AnalysisPipeline::new(CannedGenerator("text"), store.clone());

        let teacher = completed_record(RecordingRole::Teacher, None, 90, 90, 90);
        store.create(teacher.clone()).await;

        let missing = Uuid::new_v4();
        let result = pipeline.compare(missing, teacher.id).await;
        assert!(matches!(result, Err(EngineError::UnknownRecording(id)) if id == missing));
    }

    #[test]
    fn analysis_prompt_embeds_role_style_and_notes() {
        let record = AnalysisRecord::new(student_submission(Some("kathak")));
        let prompt = analysis_prompt(&record);
        assert!(prompt.contains("student dance performance by Maya"));
        assert!(prompt.contains("kathak style"));
        assert!(prompt.contains("Additional context: second week of practice"));
        assert!(prompt.contains("constructive feedback for student development"));

        let teacher = AnalysisRecord::new(Submission {
            user_id: "user-1".to_string(),
            title: "demo.mp4".to_string(),
            video_url: "https://storage.example/demo.mp4".to_string(),
            role: RecordingRole::Teacher,
            student_name: None,
            style: None,
            notes: None,
        });
        let prompt = analysis_prompt(&teacher);
        assert!(prompt.contains("dance teacher demonstration"));
        assert!(prompt.contains("general dance style"));
        assert!(!prompt.contains("Additional context"));
    }

    #[test]
    fn comparison_prompt_embeds_both_score_sets() {
        let student = completed_record(RecordingRole::Student, Some("kathak"), 70, 65, 72);
        let prompt = comparison_prompt(
            &student,
            student.scores.unwrap(),
            ScoreSet::from_parts(92, 90, 88),
        );
        assert!(prompt.contains("student's kathak dance performance"));
        assert!(prompt.contains("- Name: Maya"));
        assert!(prompt.contains("- Technique Score: 70%"));
        assert!(prompt.contains("- Technique Score: 92%"));
        assert!(prompt.contains("- Overall Score: 69%"));
        assert!(prompt.contains("- Overall Score: 90%"));
    }
}
