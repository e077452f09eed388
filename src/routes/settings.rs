use axum::{extract::State, http::StatusCode, Form, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    models::{
        auth::AuthenticatedUser,
        breaking_news::{RenderContext, SettingsForm},
    },
    services::{display_options::DisplayOptionsService, render::RenderService},
    AppState,
};

fn require_manage_options(user: &AuthenticatedUser) -> Result<(), (StatusCode, Json<Value>)> {
    if user.role.can_manage_options() {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Sorry, you are not allowed to manage these options" })),
        ))
    }
}

/// GET /admin/settings: administrators only. Also returns the active
/// banner as it looks in the admin (linking to the post editor).
pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_manage_options(&user)?;

    let options = DisplayOptionsService::get(state.options.as_ref())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?;

    let banner = RenderService::current_banner(
        state.options.as_ref(),
        state.posts.as_ref(),
        &state.config.site_url,
        RenderContext::Admin,
        Utc::now(),
    )
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?;

    let active = banner.map(|b| {
        let html = b.to_html();
        json!({ "banner": b, "html": html })
    });

    Ok(Json(json!({
        "options": options,
        "active_breaking_news": active,
        "settings_url": state.config.settings_url(),
    })))
}

/// POST /admin/settings: administrators only. Invalid colors keep their
/// previous value and are reported under `errors`.
pub async fn update_settings(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Form(body): Form<SettingsForm>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    require_manage_options(&user)?;

    let (options, errors) = DisplayOptionsService::update(state.options.as_ref(), &body)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?;

    Ok(Json(json!({
        "options": options,
        "errors": errors,
        "settings_url": state.config.settings_url(),
    })))
}
