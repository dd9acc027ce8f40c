use crate::AppState;
use crate::engine::EngineError;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::models::{AnalysisRecord, ComparisonReport, RecordingRole, Submission};
use log::error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EngineErrorBody {
    pub code: u16,
    pub message: String,
}

type EngineErrorResponse = (StatusCode, Json<EngineErrorBody>);

fn err_to_response(err: EngineError) -> EngineErrorResponse {
    let (status, message) = match &err {
        // Upstream details go to the log, not the client.
        EngineError::ExternalCallFailed(_) => {
            (StatusCode::BAD_GATEWAY, "text generation failed".to_string())
        }
        EngineError::IncompleteRecord(_) | EngineError::InvalidRole => {
            (StatusCode::UNPROCESSABLE_ENTITY, err.to_string())
        }
        EngineError::UnknownRecording(_) => (StatusCode::NOT_FOUND, err.to_string()),
    };
    (
        status,
        Json(EngineErrorBody {
            code: status.as_u16(),
            message,
        }),
    )
}

#[utoipa::path(post, path = "/api/v1/analyze", request_body = Submission, responses((status = OK, body = AnalysisRecord), (status = UNPROCESSABLE_ENTITY), (status = BAD_GATEWAY)), description = "Analyze an uploaded recording")]
#[axum::debug_handler]
pub async fn analyze(
    state: State<AppState>,
    body: Json<Submission>,
) -> Result<Json<AnalysisRecord>, EngineErrorResponse> {
    let record = state.pipeline.run(body.0).await.map_err(|err| {
        error!("error while handling analyze request: {err}");
        err_to_response(err)
    })?;
    Ok(Json(record))
}

#[utoipa::path(get, path = "/api/v1/recordings/{id}", params(("id" = Uuid, Path, description = "Recording id")), responses((status = OK, body = AnalysisRecord), (status = NOT_FOUND)), description = "Fetch one recording analysis")]
pub async fn get_recording(
    state: State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AnalysisRecord>, EngineErrorResponse> {
    state
        .store
        .get(id)
        .await
        .map(Json)
        .ok_or_else(|| err_to_response(EngineError::UnknownRecording(id)))
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ListQuery {
    /// Restrict to one owner's recordings.
    pub user_id: Option<String>,
    /// Restrict to teacher demos or student performances.
    pub role: Option<RecordingRole>,
}

#[utoipa::path(get, path = "/api/v1/recordings", params(ListQuery), responses((status = OK, body = [AnalysisRecord])), description = "List recordings, newest first")]
pub async fn list_recordings(
    state: State<AppState>,
    query: Query<ListQuery>,
) -> Json<Vec<AnalysisRecord>> {
    let records = state
        .store
        .list()
        .await
        .into_iter()
        .filter(|record| {
            query
                .user_id
                .as_deref()
                .is_none_or(|user_id| record.user_id == user_id)
        })
        .filter(|record| query.role.is_none_or(|role| record.role == role))
        .collect();
    Json(records)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CompareRequest {
    pub student_id: Uuid,
    pub teacher_id: Uuid,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompareResponse {
    pub report: ComparisonReport,
    pub narrative: String,
}

#[utoipa::path(post, path = "/api/v1/compare", request_body = CompareRequest, responses((status = OK, body = CompareResponse), (status = NOT_FOUND), (status = UNPROCESSABLE_ENTITY), (status = BAD_GATEWAY)), description = "Compare a student recording against a teacher reference")]
pub async fn compare(
    state: State<AppState>,
    body: Json<CompareRequest>,
) -> Result<Json<CompareResponse>, EngineErrorResponse> {
    let comparison = state
        .pipeline
        .compare(body.student_id, body.teacher_id)
        .await
        .map_err(|err| {
            error!("error while handling compare request: {err}");
            err_to_response(err)
        })?;
    Ok(Json(CompareResponse {
        report: comparison.report,
        narrative: comparison.narrative,
    }))
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// Restrict to one owner's recordings.
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_recordings: usize,
    /// Rounded mean of overall scores; incomplete recordings count as zero,
    /// an empty collection yields zero.
    pub average_overall_score: u8,
    /// Recordings submitted within the last seven days.
    pub recent_analyses: usize,
    /// Distinct student names across the collection.
    pub students_helped: usize,
}

#[utoipa::path(get, path = "/api/v1/stats", params(StatsQuery), responses((status = OK, body = StatsResponse)), description = "Dashboard summary of the recording collection")]
pub async fn stats(state: State<AppState>, query: Query<StatsQuery>) -> Json<StatsResponse> {
    let records: Vec<AnalysisRecord> = state
        .store
        .list()
        .await
        .into_iter()
        .filter(|record| {
            query
                .user_id
                .as_deref()
                .is_none_or(|user_id| record.user_id == user_id)
        })
        .collect();

    let total_recordings = records.len();
    let average_overall_score = if total_recordings > 0 {
        let sum: u32 = records
            .iter()
            .map(|record| record.scores.map_or(0, |scores| scores.overall as u32))
            .sum();
        (sum as f64 / total_recordings as f64).round() as u8
    } else {
        0
    };
    let week_ago = Utc::now() - Duration::days(7);
    let recent_analyses = records
        .iter()
        .filter(|record| record.created_at > week_ago)
        .count();
    let students_helped = records
        .iter()
        .filter_map(|record| record.student_name.as_deref())
        .filter(|name| !name.is_empty())
        .collect::<HashSet<_>>()
        .len();

    Json(StatsResponse {
        total_recordings,
        average_overall_score,
        recent_analyses,
        students_helped,
    })
}
