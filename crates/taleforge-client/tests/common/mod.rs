//! In-process fake of the story generation API.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use taleforge_client::HttpStoryService;
use tokio::net::TcpListener;

/// Session cookie the fake sets on story creation.
pub const SESSION_COOKIE: &str = "session_id=fake-session";

/// Scripted behavior and recorded traffic of the fake.
#[derive(Debug, Default)]
pub struct FakeApi {
    /// Response to the next creation request; `None` accepts with `job-1`.
    pub create_response: Option<(StatusCode, Value)>,
    /// Status responses, served in order; `processing` once exhausted.
    pub statuses: VecDeque<(StatusCode, Value)>,
    /// Story id served by the complete endpoint, with its body.
    pub story: Option<(String, Value)>,
    /// Themes received.
    pub themes: Vec<String>,
    /// Cookie headers received on status requests.
    pub status_cookies: Vec<Option<String>>,
    /// Job ids polled.
    pub polled_jobs: Vec<String>,
}

pub type SharedFake = Arc<Mutex<FakeApi>>;

/// Starts the fake on an ephemeral port and returns its base URL.
pub async fn spawn_fake_api(fake: FakeApi) -> (String, SharedFake) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shared = Arc::new(Mutex::new(fake));
    let app = Router::new()
        .route("/api/stories/create", post(create_story))
        .route("/api/jobs/{job_id}", get(job_status))
        .route("/api/stories/{story_id}/complete", get(complete_story))
        .with_state(Arc::clone(&shared));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api"), shared)
}

/// Client for `base_url` that bypasses any system proxy.
pub fn service_for(base_url: &str) -> HttpStoryService {
    let http = reqwest::Client::builder()
        .cookie_store(true)
        .no_proxy()
        .build()
        .unwrap();
    HttpStoryService::with_http_client(base_url, http)
}

/// A two-node story body with integer ids.
pub fn story_body() -> Value {
    json!({
        "id": 7,
        "title": "The Clockwork Heist",
        "root_node": {
            "id": 1, "content": "The vault hums.", "is_ending": false,
            "is_winning_ending": false,
            "options": [{"text": "Pick the lock", "node_id": 2}]
        },
        "all_nodes": {
            "1": {
                "id": 1, "content": "The vault hums.", "is_ending": false,
                "is_winning_ending": false,
                "options": [{"text": "Pick the lock", "node_id": 2}]
            },
            "2": {
                "id": 2, "content": "Gold everywhere.", "is_ending": true,
                "is_winning_ending": true, "options": []
            }
        }
    })
}

async fn create_story(State(fake): State<SharedFake>, Json(body): Json<Value>) -> Response {
    let mut fake = fake.lock().unwrap();
    fake.themes
        .push(body["theme"].as_str().unwrap_or_default().to_owned());
    match fake.create_response.take() {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (
            [(header::SET_COOKIE, format!("{SESSION_COOKIE}; Path=/"))],
            Json(json!({"job_id": "job-1"})),
        )
            .into_response(),
    }
}

async fn job_status(
    State(fake): State<SharedFake>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut fake = fake.lock().unwrap();
    fake.polled_jobs.push(job_id);
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    fake.status_cookies.push(cookie);
    let (status, body) = fake
        .statuses
        .pop_front()
        .unwrap_or((StatusCode::OK, json!({"status": "processing"})));
    (status, Json(body)).into_response()
}

async fn complete_story(State(fake): State<SharedFake>, Path(story_id): Path<String>) -> Response {
    let fake = fake.lock().unwrap();
    match &fake.story {
        Some((id, body)) if *id == story_id => Json(body.clone()).into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Story not found"})),
        )
            .into_response(),
    }
}
