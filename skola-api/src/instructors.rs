use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use skola_course::{Instructor, InstructorDraft, InstructorPatch, INSTRUCTOR_ENTITY};
use skola_shared::{EventEnvelope, RawEnvelope, COURSE_TOPIC};

use crate::error::{ApiError, BadRequestBody};
use crate::state::AppState;

// Instructors ride on the course service and its topic.
const SERVICE: &str = "skola-course";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateInstructorRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(flatten)]
    pub patch: InstructorPatch,
}

#[derive(Debug, Deserialize)]
pub struct DeleteInstructorRequest {
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Serialize)]
pub struct ListInstructorsResponse {
    pub data: Vec<Instructor>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/instructors", get(list_instructors))
        .route("/instructor/{id}", get(get_instructor))
        .route(
            "/instructor",
            post(create_instructor)
                .put(update_instructor)
                .delete(delete_instructor),
        )
}

async fn list_instructors(
    State(state): State<AppState>,
) -> Result<Json<ListInstructorsResponse>, ApiError> {
    let data = state.instructors.list().await.map_err(ApiError::internal)?;
    Ok(Json(ListInstructorsResponse { data }))
}

async fn get_instructor(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Instructor>, ApiError> {
    let instructor = state
        .instructors
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Instructor not found".to_string()))?;

    Ok(Json(instructor))
}

async fn create_instructor(
    State(state): State<AppState>,
    WithRejection(Json(draft), _): WithRejection<Json<InstructorDraft>, BadRequestBody>,
) -> Result<(StatusCode, Json<InstructorDraft>), ApiError> {
    let envelope = EventEnvelope::created(SERVICE, INSTRUCTOR_ENTITY, &draft);
    state
        .producer
        .publish(COURSE_TOPIC, INSTRUCTOR_ENTITY, &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(draft)))
}

async fn update_instructor(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateInstructorRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.id <= 0 {
        return Err(ApiError::BadRequest(
            "Instructor ID is required for updating".to_string(),
        ));
    }

    let envelope = EventEnvelope::updated(SERVICE, INSTRUCTOR_ENTITY, req.id, &req.patch);
    state
        .producer
        .publish(COURSE_TOPIC, &req.id.to_string(), &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "message": "Instructor updated successfully",
        "instructor": req.patch,
    })))
}

async fn delete_instructor(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<DeleteInstructorRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.id <= 0 {
        return Err(ApiError::BadRequest(
            "Instructor ID is required for deleting".to_string(),
        ));
    }

    let envelope = RawEnvelope::deleted(SERVICE, INSTRUCTOR_ENTITY, req.id);
    state
        .producer
        .publish(COURSE_TOPIC, &req.id.to_string(), &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "message": "Instructor deleted successfully",
        "id": req.id,
    })))
}
