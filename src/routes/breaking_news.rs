use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    models::breaking_news::RenderContext,
    services::render::RenderService,
    AppState,
};

/// GET /breaking-news: public endpoint, returns the current banner or null.
pub async fn get_breaking_news(
    State(state): State<AppState>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let banner = RenderService::current_banner(
        state.options.as_ref(),
        state.posts.as_ref(),
        &state.config.site_url,
        RenderContext::Public,
        Utc::now(),
    )
    .await
    .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))))?;

    match banner {
        Some(b) => {
            let html = b.to_html();
            let mut body = serde_json::to_value(b).unwrap_or_else(|_| json!({}));
            body["html"] = json!(html);
            Ok(Json(body))
        }
        None => Ok(Json(json!(null))),
    }
}

/// GET /breaking-news/banner: the HTML fragment to inject at the top of
/// every page, or 204 when there is nothing to show. Storage failures are a
/// 500, same as the JSON endpoint.
pub async fn get_banner_fragment(State(state): State<AppState>) -> Response {
    let banner = RenderService::current_banner(
        state.options.as_ref(),
        state.posts.as_ref(),
        &state.config.site_url,
        RenderContext::Public,
        Utc::now(),
    )
    .await;

    match banner {
        Ok(Some(b)) => (
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            b.to_html(),
        )
            .into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Banner render failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}
