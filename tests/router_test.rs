use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use breaking_news_api::{
    build_router,
    config::Config,
    db::{options, MemoryOptionStore, MemoryPostRepository, OptionStore, StoreError},
    middleware::auth::issue_access_token,
    models::{
        breaking_news::{BreakingNewsRecord, RECORD_OPTION_KEY},
        post::{Post, PostKind, PostStatus},
        user::UserRole,
    },
    AppState,
};

const SECRET: &str = "router-test-secret";

struct TestApp {
    router: Router,
    options: Arc<MemoryOptionStore>,
    posts: Arc<MemoryPostRepository>,
}

fn test_config() -> Config {
    Config {
        database_url: String::new(),
        jwt_secret: SECRET.into(),
        nonce_secret: SECRET.into(),
        host: "127.0.0.1".into(),
        port: 0,
        site_url: "https://news.test".into(),
        site_timezone: chrono_tz::UTC,
    }
}

fn post(id: i64, status: PostStatus) -> Post {
    Post {
        id,
        title: format!("Story {id}"),
        slug: format!("story-{id}"),
        status,
        kind: PostKind::Post,
        author_id: Uuid::nil(),
    }
}

fn app() -> TestApp {
    let options = Arc::new(MemoryOptionStore::new());
    let posts = Arc::new(MemoryPostRepository::new());
    posts.insert(post(1, PostStatus::Publish));
    posts.insert(post(2, PostStatus::Publish));
    posts.insert(post(3, PostStatus::Draft));

    let state = AppState::new(options.clone(), posts.clone(), Arc::new(test_config()));
    TestApp {
        router: build_router(state),
        options,
        posts,
    }
}

fn bearer(role: UserRole, user_id: Uuid) -> String {
    format!("Bearer {}", issue_access_token(user_id, role, SECRET, 600).unwrap())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn get_json(router: &Router, uri: &str, auth: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::get(uri);
    if let Some(auth) = auth {
        req = req.header(header::AUTHORIZATION, auth);
    }
    let (status, body) = send(router, req.body(Body::empty()).unwrap()).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post_form(router: &Router, uri: &str, auth: &str, form: &str) -> (StatusCode, Value) {
    let req = Request::post(uri)
        .header(header::AUTHORIZATION, auth)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    let (status, body) = send(router, req).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn nonce_for(router: &Router, post_id: i64, auth: &str) -> String {
    let (status, view) = get_json(router, &format!("/admin/posts/{post_id}/breaking-news"), Some(auth)).await;
    assert_eq!(status, StatusCode::OK);
    view["nonce"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn nothing_is_shown_on_a_fresh_site() {
    let app = app();
    let (status, body) = get_json(&app.router, "/breaking-news", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);

    let req = Request::get("/breaking-news/banner").body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn activating_a_post_puts_it_on_the_banner() {
    let app = app();
    let editor = bearer(UserRole::Editor, Uuid::new_v4());
    let nonce = nonce_for(&app.router, 1, &editor).await;

    let (status, body) = post_form(
        &app.router,
        "/admin/posts/1/breaking-news",
        &editor,
        &format!("nonce={nonce}&is_active=yes&custom_title=Road+closed"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "committed");

    let (_, banner) = get_json(&app.router, "/breaking-news", None).await;
    assert_eq!(banner["title"], "Road closed");
    assert_eq!(banner["link"], "https://news.test/story-1/");
    assert_eq!(banner["background"], "#1e73be");
    assert_eq!(banner["color"], "#ffffff");

    let req = Request::get("/breaking-news/banner").body(Body::empty()).unwrap();
    let (status, html) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(html).unwrap();
    assert!(html.contains("Road closed"));
    assert!(html.contains("position:fixed"));
}

#[tokio::test]
async fn non_holder_save_without_claim_is_silently_discarded() {
    let app = app();
    let editor = bearer(UserRole::Editor, Uuid::new_v4());

    let nonce = nonce_for(&app.router, 1, &editor).await;
    post_form(&app.router, "/admin/posts/1/breaking-news", &editor, &format!("nonce={nonce}&is_active=yes")).await;

    let nonce = nonce_for(&app.router, 2, &editor).await;
    let (status, body) = post_form(
        &app.router,
        "/admin/posts/2/breaking-news",
        &editor,
        &format!("nonce={nonce}&custom_title=Other"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "discarded" }));

    let (_, banner) = get_json(&app.router, "/breaking-news", None).await;
    assert_eq!(banner["post_id"], 1);
}

#[tokio::test]
async fn save_without_valid_nonce_is_forbidden_and_changes_nothing() {
    let app = app();
    let editor = bearer(UserRole::Editor, Uuid::new_v4());

    let (status, _) = post_form(&app.router, "/admin/posts/1/breaking-news", &editor, "nonce=bogus&is_active=yes").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stored: BreakingNewsRecord = options::load(app.options.as_ref(), RECORD_OPTION_KEY).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn admin_endpoints_require_a_token() {
    let app = app();
    let (status, _) = get_json(&app.router, "/admin/settings", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_json(&app.router, "/admin/posts/1/breaking-news", Some("Bearer nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn settings_are_administrator_only_and_keep_previous_color_on_error() {
    let app = app();
    let admin = bearer(UserRole::Administrator, Uuid::new_v4());
    let editor = bearer(UserRole::Editor, Uuid::new_v4());

    let (status, _) = get_json(&app.router, "/admin/settings", Some(&editor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = post_form(&app.router, "/admin/settings", &admin, "title=Breaking&background=%23aa0000&color=%23000000").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["errors"], json!([]));

    let (_, body) = post_form(&app.router, "/admin/settings", &admin, "title=Breaking&background=red&color=%23111111").await;
    assert_eq!(body["options"]["background"], "#aa0000");
    assert_eq!(body["options"]["color"], "#111111");
    assert_eq!(body["errors"][0]["message"], "Insert a valid color for Background");

    let (status, body) = get_json(&app.router, "/admin/settings", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["options"]["background"], "#aa0000");
    assert_eq!(body["settings_url"], "https://news.test/admin/settings");
    assert_eq!(body["active_breaking_news"], Value::Null);
}

#[tokio::test]
async fn settings_page_shows_admin_banner_with_edit_link() {
    let app = app();
    let admin = bearer(UserRole::Administrator, Uuid::new_v4());
    let nonce = nonce_for(&app.router, 2, &admin).await;
    post_form(&app.router, "/admin/posts/2/breaking-news", &admin, &format!("nonce={nonce}&is_active=yes")).await;

    let (_, body) = get_json(&app.router, "/admin/settings", Some(&admin)).await;
    let banner = &body["active_breaking_news"]["banner"];
    assert_eq!(banner["title"], "Story 2");
    assert_eq!(banner["link"], "https://news.test/admin/posts/2/edit");
    assert!(body["active_breaking_news"]["html"].as_str().unwrap().contains("width:95%"));
}

#[tokio::test]
async fn lapsed_record_is_cleared_on_page_view() {
    let app = app();
    let record = BreakingNewsRecord {
        post_id: Some(1),
        is_active: true,
        custom_title: String::new(),
        is_expirable: true,
        expiry: Some(Utc::now() - Duration::minutes(5)),
    };
    options::save(app.options.as_ref(), RECORD_OPTION_KEY, &record).await.unwrap();

    let (_, body) = get_json(&app.router, "/breaking-news", None).await;
    assert_eq!(body, Value::Null);
    let stored: BreakingNewsRecord = options::load(app.options.as_ref(), RECORD_OPTION_KEY).await.unwrap();
    assert!(stored.is_empty());
}

#[tokio::test]
async fn draft_or_deleted_posts_are_not_shown() {
    let app = app();
    let editor = bearer(UserRole::Editor, Uuid::new_v4());
    let nonce = nonce_for(&app.router, 3, &editor).await;
    let (_, body) = post_form(&app.router, "/admin/posts/3/breaking-news", &editor, &format!("nonce={nonce}&is_active=yes")).await;
    assert_eq!(body["status"], "committed");

    let (_, banner) = get_json(&app.router, "/breaking-news", None).await;
    assert_eq!(banner, Value::Null);

    let nonce = nonce_for(&app.router, 1, &editor).await;
    post_form(&app.router, "/admin/posts/1/breaking-news", &editor, &format!("nonce={nonce}&is_active=yes")).await;
    app.posts.remove(1);
    let (_, banner) = get_json(&app.router, "/breaking-news", None).await;
    assert_eq!(banner, Value::Null);
}

#[tokio::test]
async fn metabox_for_missing_post_is_not_found() {
    let app = app();
    let editor = bearer(UserRole::Editor, Uuid::new_v4());
    let (status, _) = get_json(&app.router, "/admin/posts/404/breaking-news", Some(&editor)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

struct UnreachableOptionStore;

#[async_trait]
impl OptionStore for UnreachableOptionStore {
    async fn get(&self, _key: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Invalid("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: Value) -> Result<(), StoreError> {
        Err(StoreError::Invalid("connection refused".into()))
    }

    async fn compare_and_set(&self, _key: &str, _expected: &Value, _value: Value) -> Result<bool, StoreError> {
        Err(StoreError::Invalid("connection refused".into()))
    }
}

#[tokio::test]
async fn storage_failure_is_a_server_error_on_both_public_endpoints() {
    let state = AppState::new(
        Arc::new(UnreachableOptionStore),
        Arc::new(MemoryPostRepository::new()),
        Arc::new(test_config()),
    );
    let router = build_router(state);

    let (status, body) = get_json(&router, "/breaking-news", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    let req = Request::get("/breaking-news/banner").body(Body::empty()).unwrap();
    let (status, _) = send(&router, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn authors_and_contributors_only_reach_their_own_posts() {
    let app = app();
    let author_id = Uuid::new_v4();
    let author = bearer(UserRole::Author, author_id);
    app.posts.insert(Post { author_id, ..post(10, PostStatus::Publish) });

    let (status, _) = get_json(&app.router, "/admin/posts/1/breaking-news", Some(&author)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // The nonce is valid for this user, so only the capability check stands in the way.
    let nonce = nonce_for(&app.router, 10, &author).await;
    let (status, _) = post_form(&app.router, "/admin/posts/1/breaking-news", &author, &format!("nonce={nonce}&is_active=yes")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let stored: BreakingNewsRecord = options::load(app.options.as_ref(), RECORD_OPTION_KEY).await.unwrap();
    assert!(stored.is_empty());

    let (_, body) = post_form(&app.router, "/admin/posts/10/breaking-news", &author, &format!("nonce={nonce}&is_active=yes")).await;
    assert_eq!(body["status"], "committed");
    assert_eq!(body["breaking_news"]["post_id"], 10);

    let contributor_id = Uuid::new_v4();
    let contributor = bearer(UserRole::Contributor, contributor_id);
    app.posts.insert(Post { author_id: contributor_id, ..post(11, PostStatus::Draft) });
    app.posts.insert(Post { author_id: contributor_id, ..post(12, PostStatus::Publish) });

    let (status, _) = get_json(&app.router, "/admin/posts/11/breaking-news", Some(&contributor)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = get_json(&app.router, "/admin/posts/12/breaking-news", Some(&contributor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn holder_can_take_itself_off_the_banner() {
    let app = app();
    let editor = bearer(UserRole::Editor, Uuid::new_v4());
    let nonce = nonce_for(&app.router, 1, &editor).await;
    post_form(&app.router, "/admin/posts/1/breaking-news", &editor, &format!("nonce={nonce}&is_active=yes&custom_title=Live")).await;

    let (status, body) = post_form(&app.router, "/admin/posts/1/breaking-news", &editor, &format!("nonce={nonce}&custom_title=Live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "committed");
    assert_eq!(body["breaking_news"]["is_active"], false);
    assert_eq!(body["breaking_news"]["post_id"], 1);

    let (_, banner) = get_json(&app.router, "/breaking-news", None).await;
    assert_eq!(banner, Value::Null);
    let req = Request::get("/breaking-news/banner").body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
