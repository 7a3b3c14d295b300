use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use skola_class::{Class, ClassDraft, ClassPatch, ENTITY};
use skola_shared::{EventEnvelope, RawEnvelope, CLASS_TOPIC};

use crate::error::{ApiError, BadRequestBody};
use crate::state::AppState;

const SERVICE: &str = "skola-class";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateClassRequest {
    #[serde(default)]
    pub id: i64,
    #[serde(flatten)]
    pub patch: ClassPatch,
}

#[derive(Debug, Deserialize)]
pub struct DeleteClassRequest {
    #[serde(default)]
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteClassesRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListClassesResponse {
    pub data: Vec<Class>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/classes", get(list_classes).delete(delete_classes))
        .route("/class/{id}", get(get_class))
        .route(
            "/class",
            post(create_class).put(update_class).delete(delete_class),
        )
}

async fn list_classes(
    State(state): State<AppState>,
) -> Result<Json<ListClassesResponse>, ApiError> {
    let data = state.classes.list().await.map_err(ApiError::internal)?;
    Ok(Json(ListClassesResponse { data }))
}

async fn get_class(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Class>, ApiError> {
    let class = state
        .classes
        .get(id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Class not found".to_string()))?;

    Ok(Json(class))
}

/// 201 means the event is on the topic, not that the row exists yet.
async fn create_class(
    State(state): State<AppState>,
    WithRejection(Json(draft), _): WithRejection<Json<ClassDraft>, BadRequestBody>,
) -> Result<(StatusCode, Json<ClassDraft>), ApiError> {
    let envelope = EventEnvelope::created(SERVICE, ENTITY, &draft);
    state
        .producer
        .publish(CLASS_TOPIC, ENTITY, &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok((StatusCode::CREATED, Json(draft)))
}

async fn update_class(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateClassRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.id <= 0 {
        return Err(ApiError::BadRequest(
            "Class ID is required for updating".to_string(),
        ));
    }

    let envelope = EventEnvelope::updated(SERVICE, ENTITY, req.id, &req.patch);
    state
        .producer
        .publish(CLASS_TOPIC, &req.id.to_string(), &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "message": "Class updated successfully",
        "class": req.patch,
    })))
}

async fn delete_class(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<DeleteClassRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.id <= 0 {
        return Err(ApiError::BadRequest(
            "Class ID is required for deleting".to_string(),
        ));
    }

    let envelope = RawEnvelope::deleted(SERVICE, ENTITY, req.id);
    state
        .producer
        .publish(CLASS_TOPIC, &req.id.to_string(), &envelope.to_bytes()?)
        .await
        .map_err(ApiError::internal)?;

    Ok(Json(json!({
        "message": "Class deleted successfully",
        "id": req.id,
    })))
}

/// One deleted event per id; nothing is published unless every id is positive.
async fn delete_classes(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<BulkDeleteClassesRequest>, BadRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if req.ids.iter().any(|id| *id <= 0) {
        return Err(ApiError::BadRequest(
            "Class ID is required for deleting".to_string(),
        ));
    }

    for id in &req.ids {
        let envelope = RawEnvelope::deleted(SERVICE, ENTITY, *id);
        state
            .producer
            .publish(CLASS_TOPIC, &id.to_string(), &envelope.to_bytes()?)
            .await
            .map_err(ApiError::internal)?;
    }

    Ok(Json(json!({
        "message": "Classes deleted successfully",
        "ids": req.ids,
    })))
}
