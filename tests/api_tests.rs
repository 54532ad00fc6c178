use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use comicshelf::clients::{ComicSource, UpstreamError};
use comicshelf::config::Config;
use comicshelf::models::{ComicPage, ComicRecord, Thumbnail};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const PASSWORD: &str = "Excelsior1!";

/// Page at offset `o` holds comic ids `1000 + o .. 1000 + o + 12`.
struct FakeSource {
    fail: bool,
}

#[async_trait]
impl ComicSource for FakeSource {
    async fn fetch_page(&self, offset: u32) -> Result<ComicPage, UpstreamError> {
        if self.fail {
            return Err(UpstreamError::Status {
                status: 503,
                body: "maintenance".to_string(),
            });
        }

        let start = 1000 + i64::from(offset);
        let records = (start..start + 12)
            .map(|id| ComicRecord {
                id,
                title: format!("Fantastic Four #{id}"),
                description: String::new(),
                page_count: 32,
                price: 2.99,
                thumbnail: Thumbnail {
                    path: format!("http://i.annihil.us/u/prod/marvel/{id}"),
                    extension: "jpg".to_string(),
                },
            })
            .collect();

        Ok(ComicPage::new(offset, records))
    }
}

async fn spawn_app_with(source: FakeSource) -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = comicshelf::api::create_app_state_with_source(config, Arc::new(source), None)
        .await
        .expect("Failed to create app state");
    comicshelf::api::router(state)
}

async fn spawn_app() -> Router {
    spawn_app_with(FakeSource { fail: false }).await
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, set_cookie, json)
}

async fn register_and_login(app: &Router, username: &str) -> String {
    let email = format!("{username}@baxter.building");
    let (status, _, _) = send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "identification": format!("ID-{username}"),
            "password": PASSWORD,
            "confirm_password": PASSWORD,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, cookie, body) = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], username);

    cookie.expect("login sets a session cookie")
}

fn comic_ids(body: &Value) -> Vec<i64> {
    body["comics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = spawn_app().await;

    for uri in ["/catalog", "/load_more_comics/12", "/favorites", "/me", "/cache"] {
        let (status, _, body) = send(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["error"], "Authentication required");
    }

    let (status, _, _) = send(&app, "POST", "/add_favorite/1001", None, Some(json!({"title": "x"}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_validation_and_login_failure() {
    let app = spawn_app().await;
    register_and_login(&app, "reed").await;

    let (status, _, body) = send(
        &app,
        "POST",
        "/register",
        None,
        Some(json!({
            "username": "reed",
            "email": "reed@baxter.building",
            "identification": "ID-other",
            "password": "weak",
            "confirm_password": "weak",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(body["errors"]["username"].is_string());
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["password"].is_string());
    assert!(body["errors"].get("identification").is_none());

    let (status, cookie, body) = send(
        &app,
        "POST",
        "/login",
        None,
        Some(json!({ "email": "reed@baxter.building", "password": "Wrong1!pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
    assert!(cookie.is_none());
}

#[tokio::test]
async fn test_catalog_favorites_and_logout_flow() {
    let app = spawn_app().await;
    let cookie = register_and_login(&app, "sue").await;
    let cookie = Some(cookie.as_str());

    let (status, _, body) = send(&app, "GET", "/me", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "sue");

    let (status, _, body) = send(&app, "GET", "/catalog", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comic_ids(&body), (1000..1012).collect::<Vec<_>>());
    assert_eq!(body["comics"][0]["pageCount"], 32);
    assert_eq!(body["comics"][0]["thumbnail"]["extension"], "jpg");
    assert_eq!(body["favorites"], json!([]));
    assert_eq!(body["favorite_ids"], json!([]));

    let favorite = json!({
        "title": "Fantastic Four #1001",
        "pageCount": 32,
        "price": 2.99,
        "thumbnail_path": "http://i.annihil.us/u/prod/marvel/1001",
        "thumbnail_extension": "jpg",
        "description": ""
    });
    let (status, _, body) = send(&app, "POST", "/add_favorite/1001", cookie, Some(favorite.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["message"].is_string());

    let (status, _, _) = send(&app, "POST", "/add_favorite/1001", cookie, Some(favorite)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, body) = send(&app, "GET", "/load_more_comics/0", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    let ids = comic_ids(&body);
    assert_eq!(ids.len(), 11);
    assert!(!ids.contains(&1001));
    assert_eq!(body["favorite_ids"], json!([1001]));

    let (status, _, body) = send(&app, "GET", "/load_more_comics/12", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comic_ids(&body), (1012..1024).collect::<Vec<_>>());

    let (status, _, body) = send(&app, "GET", "/favorites", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["comic_id"], 1001);
    assert_eq!(body[0]["pageCount"], 32);

    let (status, _, _) = send(&app, "POST", "/remove_favorite/1001", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, body) = send(&app, "POST", "/remove_favorite/1001", cookie, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _, body) = send(&app, "GET", "/load_more_comics/not-a-number", cookie, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _, body) = send(&app, "GET", "/cache", cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["capacity"], 3);
    assert!(!body["pages"].as_array().unwrap().is_empty());

    let (status, _, _) = send(&app, "GET", "/logout", cookie, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, "GET", "/catalog", cookie, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_favorites_are_per_user() {
    let app = spawn_app().await;
    let johnny = register_and_login(&app, "johnny").await;
    let ben = register_and_login(&app, "ben").await;

    let (status, _, _) = send(
        &app,
        "POST",
        "/add_favorite/1003",
        Some(&johnny),
        Some(json!({ "title": "Fantastic Four #1003" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, _, body) = send(&app, "GET", "/load_more_comics/0", Some(&ben), None).await;
    assert!(comic_ids(&body).contains(&1003));
    assert_eq!(body["favorite_ids"], json!([]));
}

#[tokio::test]
async fn test_upstream_failure_returns_error_body() {
    let app = spawn_app_with(FakeSource { fail: true }).await;
    let cookie = register_and_login(&app, "victor").await;

    let (status, _, body) = send(&app, "GET", "/catalog", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("503"));

    let (status, _, body) = send(&app, "GET", "/load_more_comics/12", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].is_string());

    // Favorites do not depend on the comic API.
    let (status, _, _) = send(&app, "GET", "/favorites", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_random_comics_is_public() {
    let app = spawn_app().await;

    let (status, _, body) = send(&app, "GET", "/get_random_comics", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let comics = body.as_array().unwrap();
    assert_eq!(comics.len(), 12);
    let first = &comics[0];
    assert!(first["title"].is_string());
    assert!(
        first["thumbnail"]
            .as_str()
            .unwrap()
            .ends_with("/portrait_uncanny.jpg")
    );
}
