use crate::config::SchedulerConfig;
use crate::constraints::ConstraintChecker;
use crate::data::{ReferenceSnapshot, ScheduleEntry, SubjectId, TeacherId, entries_to_assignment};
use crate::error::SchedulerError;
use crate::jobs::{JobStatus, SchedulerService};
use crate::ranker::{TeacherRanker, TeacherRanking};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub snapshot: ReferenceSnapshot,
    /// Overrides the configured search budget.
    pub deadline_secs: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub job_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestRequest {
    pub snapshot: ReferenceSnapshot,
    pub subject_id: SubjectId,
    pub candidate_teachers: Vec<TeacherId>,
    #[serde(default)]
    pub current_entries: Vec<ScheduleEntry>,
}

type ApiError = (StatusCode, String);

fn api_error(e: SchedulerError) -> ApiError {
    let status = match e {
        SchedulerError::UnknownSubject(_) => StatusCode::NOT_FOUND,
        SchedulerError::NoFeasibleSolution(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SchedulerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

async fn generate_handler(
    State(service): State<Arc<SchedulerService>>,
    Json(request): Json<GenerateRequest>,
) -> (StatusCode, Json<GenerateResponse>) {
    let budget = request.deadline_secs.map(Duration::from_secs);
    let job_id = service.submit(request.snapshot, budget);
    (StatusCode::ACCEPTED, Json(GenerateResponse { job_id }))
}

async fn list_handler(State(service): State<Arc<SchedulerService>>) -> Json<Vec<Uuid>> {
    Json(service.list_jobs())
}

async fn status_handler(
    State(service): State<Arc<SchedulerService>>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobStatus>, ApiError> {
    service
        .status(&job_id)
        .map(Json)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown job: {job_id}")))
}

async fn suggest_handler(Json(request): Json<SuggestRequest>) -> Result<Json<Vec<TeacherRanking>>, ApiError> {
    if !request.snapshot.subjects.iter().any(|s| s.id == request.subject_id) {
        return Err(api_error(SchedulerError::UnknownSubject(request.subject_id)));
    }
    let checker = ConstraintChecker::from_snapshot(&request.snapshot);
    let current = entries_to_assignment(&request.current_entries);
    let ranked = TeacherRanker::new(&checker).rank_for_subject(
        request.subject_id,
        &request.candidate_teachers,
        &current,
    );
    Ok(Json(ranked))
}

pub fn router(service: Arc<SchedulerService>) -> Router {
    Router::new()
        .route("/v1/schedules", post(generate_handler).get(list_handler))
        .route("/v1/schedules/:job_id", get(status_handler))
        .route("/v1/teacher-suggestions", post(suggest_handler))
        .with_state(service)
}

pub async fn run_server(config: &SchedulerConfig, service: Arc<SchedulerService>) -> std::io::Result<()> {
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
