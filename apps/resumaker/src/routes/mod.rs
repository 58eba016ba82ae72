pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::editor::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route(
            "/api/v1/session",
            post(handlers::handle_start_session).delete(handlers::handle_end_session),
        )
        // Edit API
        .route("/api/v1/resume", get(handlers::handle_get_resume))
        .route("/api/v1/resume/status", get(handlers::handle_get_status))
        .route("/api/v1/resume/data", put(handlers::handle_replace_data))
        .route(
            "/api/v1/resume/personal",
            patch(handlers::handle_patch_personal),
        )
        .route("/api/v1/resume/summary", put(handlers::handle_put_summary))
        .route(
            "/api/v1/resume/experience",
            post(handlers::handle_add_experience),
        )
        .route(
            "/api/v1/resume/experience/:id",
            patch(handlers::handle_update_experience).delete(handlers::handle_remove_experience),
        )
        .route(
            "/api/v1/resume/education",
            post(handlers::handle_add_education),
        )
        .route(
            "/api/v1/resume/education/:id",
            patch(handlers::handle_update_education).delete(handlers::handle_remove_education),
        )
        .route(
            "/api/v1/resume/skills",
            put(handlers::handle_put_skills).post(handlers::handle_add_skill),
        )
        .route(
            "/api/v1/resume/skills/:index",
            patch(handlers::handle_set_skill).delete(handlers::handle_remove_skill),
        )
        .route(
            "/api/v1/resume/languages",
            put(handlers::handle_put_languages),
        )
        .route("/api/v1/resume/hobbies", put(handlers::handle_put_hobbies))
        .route("/api/v1/resume/theme", patch(handlers::handle_patch_theme))
        .route("/api/v1/resume/layout", put(handlers::handle_put_layout))
        .route(
            "/api/v1/resume/visibility",
            patch(handlers::handle_patch_visibility),
        )
        // Stored records
        .route("/api/v1/resumes", get(handlers::handle_list_records))
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get_record)
                .patch(handlers::handle_update_record)
                .delete(handlers::handle_delete_record),
        )
        .route("/api/v1/templates", get(handlers::handle_list_templates))
        .with_state(state)
}
