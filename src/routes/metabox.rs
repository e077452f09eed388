use axum::{
    extract::{Path, State},
    http::StatusCode,
    Form, Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    models::{auth::AuthenticatedUser, breaking_news::MetaboxForm},
    services::activation::{ActivationService, SaveOutcome, SkipReason},
    AppState,
};

/// GET /admin/posts/{id}/breaking-news: metabox contents for a post the
/// user may edit.
pub async fn get_metabox(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let post = state
        .posts
        .get_post(post_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?
        .ok_or((StatusCode::NOT_FOUND, Json(json!({ "error": "Post not found" }))))?;

    if !user.role.can_edit_post(user.user_id, &post) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Sorry, you are not allowed to edit this post" })),
        ));
    }

    let view = ActivationService::metabox_view(
        state.options.as_ref(),
        &state.nonces,
        state.config.site_timezone,
        &user,
        post_id,
        Utc::now(),
    )
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?;

    Ok(Json(json!(view)))
}

/// POST /admin/posts/{id}/breaking-news: metabox save.
pub async fn save_metabox(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(post_id): Path<i64>,
    Form(form): Form<MetaboxForm>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let outcome = ActivationService::save_metabox(
        state.options.as_ref(),
        state.posts.as_ref(),
        &state.nonces,
        state.config.site_timezone,
        &user,
        post_id,
        &form,
        Utc::now(),
    )
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?;

    match outcome {
        SaveOutcome::Committed(record) => Ok(Json(json!({
            "status": "committed",
            "breaking_news": record,
        }))),
        SaveOutcome::Discarded => Ok(Json(json!({ "status": "discarded" }))),
        SaveOutcome::Skipped(reason @ (SkipReason::InvalidNonce | SkipReason::Forbidden)) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": reason.as_str() })),
        )),
        SaveOutcome::Skipped(SkipReason::PostNotFound) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Post not found" })),
        )),
        SaveOutcome::Skipped(reason) => Ok(Json(json!({
            "status": "skipped",
            "reason": reason,
        }))),
    }
}
