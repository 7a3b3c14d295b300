use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use skola_path::{CoursePath, CoursePathDraft, CoursePathPatch, ENTITY};
use skola_shared::{EventEnvelope, RawEnvelope, COURSE_PATH_TOPIC};

use crate::error::{ApiError, BadRequestBody};
use crate::state::AppState;

const SERVICE: &str = "skola-path";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateCoursePathRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(flatten)]
    pub patch: CoursePathPatch,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCoursePathRequest {
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteCoursePathsRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListCoursePathsResponse {
    pub data: Vec<CoursePath>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/coursepaths",
            get(list_course_paths).delete(delete_course_paths),
        )
        .route("/coursepath/{id}", get(get_course_path))
        .route(
            "/coursepath",
            post(create_course_path)
                .put(update_course_path)
                .delete(delete_course_path),
        )
}

async fn list_course_paths(
    State(state): State<AppState>,
) -> Result<Json<ListCoursePathsResponse>, ApiError> {
    let data = state.paths.list().await.map_err(ApiError::internal)?;
    Ok(Json(ListCoursePathsResponse { data }))
}

async fn get_course_path(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CoursePath>, ApiError> {
    let path = state
        .paths
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Course path not found".to_string()))?;

    Ok(Json(path))
}

async fn create_course_path(
    State(state): State<AppState>,
    WithRejection(Json(draft), _): WithRejection<Json<CoursePathDraft>, BadRequestBody>,
) -> Result<(StatusCode, Json<CoursePathDraft>), ApiError> {
    let envelope = EventEnvelope::created(SERVICE, ENTITY, &draft);
    state
        .producer
        .publish(COURSE_PATH_TOPIC, ENTITY, &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(draft)))
}

async fn update_course_path(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateCoursePathRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.id <= 0 {
        return Err(ApiError::BadRequest(
            "Course Path ID is required for updating".to_string(),
        ));
    }

    let envelope = EventEnvelope::updated(SERVICE, ENTITY, req.id, &req.patch);
    state
        .producer
        .publish(COURSE_PATH_TOPIC, &req.id.to_string(), &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "message": "Course path updated successfully",
        "course_path": req.patch,
    })))
}

async fn delete_course_path(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<DeleteCoursePathRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.id <= 0 {
        return Err(ApiError::BadRequest(
            "Course Path ID is required for deleting".to_string(),
        ));
    }

    let envelope = RawEnvelope::deleted(SERVICE, ENTITY, req.id);
    state
        .producer
        .publish(COURSE_PATH_TOPIC, &req.id.to_string(), &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "message": "Course path deleted successfully",
        "id": req.id,
    })))
}

async fn delete_course_paths(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<BulkDeleteCoursePathsRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.ids.iter().any(|id| *id <= 0) {
        return Err(ApiError::BadRequest(
            "Course Path ID is required for deleting".to_string(),
        ));
    }

    for id in &req.ids {
        let envelope = RawEnvelope::deleted(SERVICE, ENTITY, *id);
        state
            .producer
            .publish(COURSE_PATH_TOPIC, &id.to_string(), &envelope.to_bytes()?)
            .await
            .map_err(ApiError::internal)?;
    }

    Ok(Json(json!({
        "message": "Course paths deleted successfully",
        "ids": req.ids,
    })))
}
