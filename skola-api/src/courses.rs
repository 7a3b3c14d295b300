use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use skola_course::{Course, CourseDraft, CoursePatch, COURSE_ENTITY};
use skola_shared::{EventEnvelope, RawEnvelope, COURSE_TOPIC};

use crate::error::{ApiError, BadRequestBody};
use crate::state::AppState;

const SERVICE: &str = "skola-course";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateCourseRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(flatten)]
    pub patch: CoursePatch,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCourseRequest {
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteCoursesRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListCoursesResponse {
    pub data: Vec<Course>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).delete(delete_courses))
        .route("/course/{id}", get(get_course))
        .route(
            "/course",
            post(create_course).put(update_course).delete(delete_course),
        )
}

/// Root courses only; each carries its direct sub-courses.
async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<ListCoursesResponse>, ApiError> {
    let data = state.courses.list().await.map_err(ApiError::internal)?;
    Ok(Json(ListCoursesResponse { data }))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Course>, ApiError> {
    let course = state
        .courses
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))?;

    Ok(Json(course))
}

async fn create_course(
    State(state): State<AppState>,
    WithRejection(Json(draft), _): WithRejection<Json<CourseDraft>, BadRequestBody>,
) -> Result<(StatusCode, Json<CourseDraft>), ApiError> {
    let envelope = EventEnvelope::created(SERVICE, COURSE_ENTITY, &draft);
    state
        .producer
        .publish(COURSE_TOPIC, COURSE_ENTITY, &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(draft)))
}

async fn update_course(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateCourseRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.id <= 0 {
        return Err(ApiError::BadRequest(
            "Course ID is required for updating".to_string(),
        ));
    }

    let envelope = EventEnvelope::updated(SERVICE, COURSE_ENTITY, req.id, &req.patch);
    state
        .producer
        .publish(COURSE_TOPIC, &req.id.to_string(), &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "message": "Course updated successfully",
        "course": req.patch,
    })))
}

async fn delete_course(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<DeleteCourseRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.id <= 0 {
        return Err(ApiError::BadRequest(
            "Course ID is required for deleting".to_string(),
        ));
    }

    let envelope = RawEnvelope::deleted(SERVICE, COURSE_ENTITY, req.id);
    state
        .producer
        .publish(COURSE_TOPIC, &req.id.to_string(), &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "message": "Course deleted successfully",
        "id": req.id,
    })))
}

async fn delete_courses(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<BulkDeleteCoursesRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.ids.iter().any(|id| *id <= 0) {
        return Err(ApiError::BadRequest(
            "Course ID is required for deleting".to_string(),
        ));
    }

    for id in &req.ids {
        let envelope = RawEnvelope::deleted(SERVICE, COURSE_ENTITY, *id);
        state
            .producer
            .publish(COURSE_TOPIC, &id.to_string(), &envelope.to_bytes()?)
            .await
            .map_err(ApiError::internal)?;
    }

    Ok(Json(json!({
        "message": "Courses deleted successfully",
        "ids": req.ids,
    })))
}
