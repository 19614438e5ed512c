//! End-to-end tests of the HTTP surface against the in-memory store.

use api_lib::{config::Config, web, web::state::AppState};
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use lesson_booking_core::{memory::InMemoryStore, LessonService, OrderService};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const MATH_ID: &str = "65a1f0c2e4b0a1b2c3d4e5f1";
const ART_ID: &str = "65a1f0c2e4b0a1b2c3d4e5f2";

struct TestApp {
    router: Router,
    store: Arc<InMemoryStore>,
    images: TempDir,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl TestResponse {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|e| panic!("response body is not JSON: {e}"))
    }
}

fn test_app(vars: &[(&str, &str)]) -> TestApp {
    let images = TempDir::new().unwrap();
    let mut env: HashMap<String, String> = HashMap::from([
        ("DATABASE_URL".to_string(), "mongodb://unused".to_string()),
        (
            "IMAGES_PATH".to_string(),
            images.path().to_string_lossy().into_owned(),
        ),
        ("APP_ENV".to_string(), "test".to_string()),
    ]);
    for (k, v) in vars {
        env.insert(k.to_string(), v.to_string());
    }
    let config = Arc::new(Config::from_lookup(|name| env.get(name).cloned()).unwrap());

    let store = Arc::new(InMemoryStore::with_lessons([
        json!({ "_id": MATH_ID, "subject": "Math", "location": "London", "price": 100, "spaces": 5 }),
        json!({ "_id": ART_ID, "subject": "Art", "location": "Oxford", "price": 80, "spaces": 5 }),
    ]));
    let state = Arc::new(AppState::new(
        config,
        LessonService::new(store.clone()),
        OrderService::new(store.clone()),
    ));

    TestApp {
        router: web::router(state),
        store,
        images,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }

    async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None).await
    }
}

//=========================================================================================
// Metadata
//=========================================================================================

#[tokio::test]
async fn root_describes_the_api() {
    let app = test_app(&[]);
    let res = app.get("/").await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["message"], "Welcome to the Lesson Management API");
    assert_eq!(body["status"], "operational");
    assert_eq!(body["endpoints"]["orders"], "/order");
}

#[tokio::test]
async fn health_reports_non_decreasing_uptime() {
    let app = test_app(&[]);

    let first = app.get("/health").await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let second = app.get("/health").await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    let (first, second) = (first.json(), second.json());
    assert_eq!(first["status"], "healthy");
    assert_eq!(first["environment"], "test");
    assert!(first["timestamp"].as_str().unwrap().ends_with('Z'));
    assert!(second["uptime"].as_f64().unwrap() >= first["uptime"].as_f64().unwrap());
}

#[tokio::test]
async fn health_does_not_depend_on_the_database() {
    let app = test_app(&[]);
    app.store.set_unavailable(true);
    assert_eq!(app.get("/health").await.status, StatusCode::OK);
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = test_app(&[]);
    let res = app.get("/lessons").await;

    assert_eq!(res.headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(res.headers[header::X_FRAME_OPTIONS], "SAMEORIGIN");
    assert!(res.headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
}

//=========================================================================================
// Lessons
//=========================================================================================

#[tokio::test]
async fn lists_every_lesson() {
    let app = test_app(&[]);
    let res = app.get("/lessons").await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    let lessons = body.as_array().unwrap();
    assert_eq!(lessons.len(), 2);
    assert_eq!(lessons[0]["_id"], MATH_ID);
    assert_eq!(lessons[0]["subject"], "Math");
}

#[tokio::test]
async fn search_without_query_is_rejected() {
    let app = test_app(&[]);

    for uri in ["/lessons/search", "/lessons/search?q="] {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(res.json(), json!({ "error": "Search query is required." }));
    }
}

#[tokio::test]
async fn search_matches_whole_words_and_fragments() {
    let app = test_app(&[]);

    let whole = app.get("/lessons/search?q=Math").await;
    assert_eq!(whole.status, StatusCode::OK);
    assert_eq!(whole.json()[0]["_id"], MATH_ID);
    assert_eq!(app.store.substring_searches(), 0);

    let fragment = app.get("/lessons/search?q=mat").await;
    assert_eq!(fragment.status, StatusCode::OK);
    assert_eq!(fragment.json()[0]["_id"], MATH_ID);
    assert_eq!(app.store.substring_searches(), 1);
}

#[tokio::test]
async fn search_without_results_is_not_found() {
    let app = test_app(&[]);
    let res = app.get("/lessons/search?q=nonexistent-token-xyz").await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json(), json!({ "error": "No lessons found." }));
}

#[tokio::test]
async fn update_merges_fields_into_one_lesson() {
    let app = test_app(&[]);
    let res = app
        .send(
            Method::PUT,
            &format!("/lessons/{MATH_ID}"),
            Some(json!({ "spaces": 4 })),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json(), json!({ "message": "Lesson updated successfully" }));

    let math = app.store.lesson(MATH_ID).unwrap();
    assert_eq!(math.fields["spaces"], json!(4));
    assert_eq!(math.fields["price"], json!(100));
    assert_eq!(app.store.lesson(ART_ID).unwrap().fields["spaces"], json!(5));
}

#[tokio::test]
async fn update_rejects_bad_ids_and_empty_bodies() {
    let app = test_app(&[]);
    let before = app.store.lessons();

    let bad_id = app
        .send(Method::PUT, "/lessons/not-an-id", Some(json!({ "spaces": 1 })))
        .await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.json()["error"], "Invalid lesson ID.");

    let empty = app
        .send(Method::PUT, &format!("/lessons/{MATH_ID}"), Some(json!({})))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
    assert_eq!(empty.json()["error"], "No data provided for update.");

    let not_an_object = app
        .send(Method::PUT, &format!("/lessons/{MATH_ID}"), Some(json!([1, 2])))
        .await;
    assert_eq!(not_an_object.status, StatusCode::BAD_REQUEST);
    assert!(not_an_object.json()["error"].is_string());

    assert_eq!(app.store.lessons(), before);
}

#[tokio::test]
async fn update_of_unknown_lesson_is_not_found() {
    let app = test_app(&[]);
    let res = app
        .send(
            Method::PUT,
            "/lessons/65a1f0c2e4b0a1b2c3d4e5ff",
            Some(json!({ "spaces": 1 })),
        )
        .await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["error"], "Lesson not found or no fields changed.");
}

//=========================================================================================
// Orders
//=========================================================================================

#[tokio::test]
async fn placed_order_appears_in_listing() {
    let app = test_app(&[]);
    let created = app
        .send(
            Method::POST,
            "/order",
            Some(json!({
                "orderInfo": { "name": "Ada", "phone": "07123456789" },
                "lessonId": [MATH_ID, ART_ID]
            })),
        )
        .await;

    assert_eq!(created.status, StatusCode::CREATED);
    let created = created.json();
    assert_eq!(created["message"], "Order placed successfully");
    let inserted_id = created["insertedId"].as_str().unwrap().to_string();

    let listing = app.get("/order").await;
    assert_eq!(listing.status, StatusCode::OK);
    let listing = listing.json();
    assert_eq!(listing["count"], 1);
    assert_eq!(listing["orders"][0]["_id"], inserted_id.as_str());
    assert_eq!(listing["orders"][0]["orderInfo"]["name"], "Ada");
    assert_eq!(listing["orders"][0]["lessonId"], json!([MATH_ID, ART_ID]));
}

#[tokio::test]
async fn orders_with_invalid_lesson_ids_are_rejected() {
    let app = test_app(&[]);

    let invalid = app
        .send(
            Method::POST,
            "/order",
            Some(json!({ "orderInfo": {}, "lessonId": [MATH_ID, "not-an-id"] })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json()["error"], "One or more lesson IDs are invalid.");

    let empty = app
        .send(Method::POST, "/order", Some(json!({ "orderInfo": {}, "lessonId": [] })))
        .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let missing = app
        .send(Method::POST, "/order", Some(json!({ "orderInfo": {} })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    assert!(app.store.orders().is_empty());
}

//=========================================================================================
// Failure Rendering
//=========================================================================================

#[tokio::test]
async fn unreachable_database_is_service_unavailable() {
    let app = test_app(&[]);
    app.store.set_unavailable(true);

    for uri in ["/lessons", "/order", "/lessons/search?q=Math"] {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
        assert_eq!(res.json(), json!({ "error": "Database unavailable" }));
    }
}

#[tokio::test]
async fn clients_over_budget_are_rate_limited() {
    let app = test_app(&[("RATE_LIMIT_MAX_REQUESTS", "2")]);

    assert_eq!(app.get("/lessons").await.status, StatusCode::OK);
    assert_eq!(app.get("/lessons").await.status, StatusCode::OK);

    let limited = app.get("/lessons").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers.contains_key(header::RETRY_AFTER));
    assert_eq!(
        limited.json()["error"],
        "Too many requests, please try again later."
    );
}

//=========================================================================================
// Images
//=========================================================================================

#[tokio::test]
async fn serves_existing_images_with_open_cors() {
    let app = test_app(&[]);
    std::fs::write(app.images.path().join("math.png"), b"\x89PNG fake").unwrap();

    let res = app.get("/images/math.png").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers[header::CONTENT_TYPE], "image/png");
    assert_eq!(res.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(res.body, b"\x89PNG fake");
}

#[tokio::test]
async fn missing_or_escaping_images_are_not_found() {
    let app = test_app(&[]);
    std::fs::create_dir(app.images.path().join("nested")).unwrap();

    for uri in ["/images/missing.png", "/images/nested", "/images/..%2Fsecret.txt"] {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(res.json(), json!({ "error": "Image not found" }));
    }
}
