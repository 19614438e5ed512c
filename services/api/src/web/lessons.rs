//! services/api/src/web/lessons.rs
//!
//! Handlers for browsing, searching and updating lessons.

use crate::error::{ApiError, ErrorResponse};
use crate::web::{rest::MessageResponse, state::AppState};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use lesson_booking_core::{Lesson, LessonPatch};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// A lesson document as returned to clients: `_id` plus every stored field.
#[derive(Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct LessonBody(pub Lesson);

/// The fields to change on a lesson; keys not present are left untouched.
#[derive(Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct LessonUpdateRequest(pub Map<String, Value>);

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Words or a fragment of a subject or location.
    pub q: Option<String>,
}

fn to_bodies(lessons: Vec<Lesson>) -> Json<Vec<LessonBody>> {
    Json(lessons.into_iter().map(LessonBody).collect())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /lessons - List every lesson
#[utoipa::path(
    get,
    path = "/lessons",
    tag = "lessons",
    responses(
        (status = 200, description = "Every lesson, unpaginated", body = [LessonBody]),
        (status = 503, description = "Database unavailable", body = ErrorResponse)
    )
)]
pub async fn list_lessons_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LessonBody>>, ApiError> {
    let lessons = state.lessons.list_all().await?;
    Ok(to_bodies(lessons))
}

/// GET /lessons/search - Full-text search with a substring fallback
#[utoipa::path(
    get,
    path = "/lessons/search",
    tag = "lessons",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching lessons", body = [LessonBody]),
        (status = 400, description = "Search query is missing", body = ErrorResponse),
        (status = 404, description = "No lessons found", body = ErrorResponse)
    )
)]
pub async fn search_lessons_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<LessonBody>>, ApiError> {
    let lessons = state.lessons.search(params.q.as_deref()).await?;
    Ok(to_bodies(lessons))
}

/// PUT /lessons/{id} - Merge fields into a lesson
#[utoipa::path(
    put,
    path = "/lessons/{id}",
    tag = "lessons",
    params(("id" = String, Path, description = "24-character hex lesson identifier")),
    request_body = LessonUpdateRequest,
    responses(
        (status = 200, description = "Lesson updated", body = MessageResponse),
        (status = 400, description = "Invalid id or empty update", body = ErrorResponse),
        (status = 404, description = "Lesson not found or no fields changed", body = ErrorResponse)
    )
)]
pub async fn update_lesson_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<LessonUpdateRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(LessonUpdateRequest(fields)) = payload?;
    state.lessons.update(&id, LessonPatch::new(fields)).await?;
    Ok(Json(MessageResponse::new("Lesson updated successfully")))
}
