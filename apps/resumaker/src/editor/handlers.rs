//! Axum route handlers for the editing session and the stored resume records.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::editor::state::{
    EditState, EducationPatch, ExperiencePatch, PersonalInfoPatch, ThemePatch,
};
use crate::editor::EditorSession;
use crate::errors::AppError;
use crate::models::resume::{LayoutType, ResumeData, ResumeRecord, ResumeTemplate};
use crate::state::AppState;
use crate::sync::SaveStatus;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeView {
    #[serde(flatten)]
    pub state: EditState,
    pub save_status: SaveStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub save_status: SaveStatus,
    pub profile_synced: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user_id: String,
    pub profile_synced: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedEntry {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    pub summary: String,
}

#[derive(Debug, Deserialize)]
pub struct ListRequest {
    pub items: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SkillRequest {
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub layout_type: String,
}

#[derive(Debug, Deserialize)]
pub struct RecordUpdateRequest {
    #[serde(default)]
    pub content: Map<String, Value>,
    pub title: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

async fn active_session(state: &AppState) -> Result<Arc<EditorSession>, AppError> {
    state
        .sessions
        .current()
        .await
        .ok_or(AppError::Unauthorized)
}

async fn view(session: &EditorSession) -> Json<ResumeView> {
    Json(ResumeView {
        state: session.snapshot().await,
        save_status: session.save_status(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/session
pub async fn handle_start_session(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.sessions.start().await?;
    Ok(Json(SessionResponse {
        user_id: session.user().id.clone(),
        profile_synced: session.is_profile_synced(),
    }))
}

/// DELETE /api/v1/session
pub async fn handle_end_session(State(state): State<AppState>) -> StatusCode {
    state.sessions.end().await;
    StatusCode::NO_CONTENT
}

// ────────────────────────────────────────────────────────────────────────────
// Edit state
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    Ok(view(&session).await)
}

/// GET /api/v1/resume/status
pub async fn handle_get_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    let session = active_session(&state).await?;
    Ok(Json(StatusResponse {
        save_status: session.save_status(),
        profile_synced: session.is_profile_synced(),
    }))
}

/// PUT /api/v1/resume/data
pub async fn handle_replace_data(
    State(state): State<AppState>,
    Json(data): Json<ResumeData>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.replace_resume_data(data)).await;
    Ok(view(&session).await)
}

/// PATCH /api/v1/resume/personal
pub async fn handle_patch_personal(
    State(state): State<AppState>,
    Json(patch): Json<PersonalInfoPatch>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.apply_personal(patch)).await;
    Ok(view(&session).await)
}

/// PUT /api/v1/resume/summary
pub async fn handle_put_summary(
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.set_summary(req.summary)).await;
    Ok(view(&session).await)
}

/// POST /api/v1/resume/experience
pub async fn handle_add_experience(
    State(state): State<AppState>,
    Json(patch): Json<ExperiencePatch>,
) -> Result<(StatusCode, Json<CreatedEntry>), AppError> {
    let session = active_session(&state).await?;
    let id = session.edit(|s| s.add_experience(patch)).await;
    Ok((StatusCode::CREATED, Json(CreatedEntry { id })))
}

/// PATCH /api/v1/resume/experience/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ExperiencePatch>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.update_experience(&id, patch)).await?;
    Ok(view(&session).await)
}

/// DELETE /api/v1/resume/experience/:id
pub async fn handle_remove_experience(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.remove_experience(&id)).await?;
    Ok(view(&session).await)
}

/// POST /api/v1/resume/education
pub async fn handle_add_education(
    State(state): State<AppState>,
    Json(patch): Json<EducationPatch>,
) -> Result<(StatusCode, Json<CreatedEntry>), AppError> {
    let session = active_session(&state).await?;
    let id = session.edit(|s| s.add_education(patch)).await;
    Ok((StatusCode::CREATED, Json(CreatedEntry { id })))
}

/// PATCH /api/v1/resume/education/:id
pub async fn handle_update_education(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<EducationPatch>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.update_education(&id, patch)).await?;
    Ok(view(&session).await)
}

/// DELETE /api/v1/resume/education/:id
pub async fn handle_remove_education(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.remove_education(&id)).await?;
    Ok(view(&session).await)
}

/// PUT /api/v1/resume/skills
pub async fn handle_put_skills(
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.set_skills(req.items)).await;
    Ok(view(&session).await)
}

/// POST /api/v1/resume/skills
/// Appends an empty skill for inline editing.
pub async fn handle_add_skill(
    State(state): State<AppState>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.add_skill()).await;
    Ok(view(&session).await)
}

/// PATCH /api/v1/resume/skills/:index
pub async fn handle_set_skill(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Json(req): Json<SkillRequest>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.set_skill(index, req.value)).await?;
    Ok(view(&session).await)
}

/// DELETE /api/v1/resume/skills/:index
pub async fn handle_remove_skill(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.remove_skill(index)).await?;
    Ok(view(&session).await)
}

/// PUT /api/v1/resume/languages
pub async fn handle_put_languages(
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.set_languages(req.items)).await;
    Ok(view(&session).await)
}

/// PUT /api/v1/resume/hobbies
pub async fn handle_put_hobbies(
    State(state): State<AppState>,
    Json(req): Json<ListRequest>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.set_hobbies(req.items)).await;
    Ok(view(&session).await)
}

/// PATCH /api/v1/resume/theme
pub async fn handle_patch_theme(
    State(state): State<AppState>,
    Json(patch): Json<ThemePatch>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.apply_theme(patch)).await;
    Ok(view(&session).await)
}

/// PUT /api/v1/resume/layout
pub async fn handle_put_layout(
    State(state): State<AppState>,
    Json(req): Json<LayoutRequest>,
) -> Result<Json<ResumeView>, AppError> {
    let layout = LayoutType::parse(&req.layout_type).ok_or_else(|| {
        AppError::Validation(format!("Unknown layout '{}'", req.layout_type))
    })?;
    let session = active_session(&state).await?;
    session.edit(|s| s.set_layout(layout)).await;
    Ok(view(&session).await)
}

/// PATCH /api/v1/resume/visibility
pub async fn handle_patch_visibility(
    State(state): State<AppState>,
    Json(flags): Json<HashMap<String, bool>>,
) -> Result<Json<ResumeView>, AppError> {
    let session = active_session(&state).await?;
    session.edit(|s| s.apply_visibility(&flags)).await?;
    Ok(view(&session).await)
}

// ────────────────────────────────────────────────────────────────────────────
// Stored records
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resumes
pub async fn handle_list_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeRecord>>, AppError> {
    let session = active_session(&state).await?;
    Ok(Json(session.store().get_resumes().await?))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeRecord>, AppError> {
    let session = active_session(&state).await?;
    let record = session
        .store()
        .get_resume_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(record))
}

/// PATCH /api/v1/resumes/:id
pub async fn handle_update_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RecordUpdateRequest>,
) -> Result<Json<ResumeRecord>, AppError> {
    let session = active_session(&state).await?;
    let record = session
        .store()
        .update_resume(id, req.content, req.title.as_deref())
        .await?;
    Ok(Json(record))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_record(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let session = active_session(&state).await?;
    session.store().delete_resume(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<ResumeTemplate>>, AppError> {
    let session = active_session(&state).await?;
    Ok(Json(session.store().get_resume_templates().await?))
}
