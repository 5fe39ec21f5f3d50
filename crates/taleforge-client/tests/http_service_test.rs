//! Integration tests for `HttpStoryService` against an in-process fake API.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::json;
use taleforge_client::{ClientConfig, HttpStoryService};
use taleforge_core::clock::SystemClock;
use taleforge_core::error::ServiceError;
use taleforge_core::job::JobStatus;
use taleforge_core::service::StoryGenerationService;
use taleforge_session::application::config::SessionConfig;
use taleforge_session::application::controller::{PollOutcome, SessionController};
use taleforge_session::domain::phase::{FailureKind, SessionPhase};

use common::{FakeApi, SESSION_COOKIE, service_for, spawn_fake_api, story_body};

#[tokio::test]
async fn test_create_story_returns_job_ticket() {
    // Arrange
    let (base_url, fake) = spawn_fake_api(FakeApi::default()).await;
    let service = service_for(&base_url);

    // Act
    let ticket = service.create_story("pirates").await.unwrap();

    // Assert
    assert_eq!(ticket.job_id, "job-1");
    assert_eq!(fake.lock().unwrap().themes, vec!["pirates".to_owned()]);
}

#[tokio::test]
async fn test_session_cookie_is_sent_with_status_requests() {
    // Arrange
    let (base_url, fake) = spawn_fake_api(FakeApi::default()).await;
    let service = service_for(&base_url);
    service.create_story("pirates").await.unwrap();

    // Act
    let report = service.job_status("job-1").await.unwrap();

    // Assert
    assert_eq!(report.parsed_status(), JobStatus::Processing);
    let fake = fake.lock().unwrap();
    assert_eq!(fake.polled_jobs, vec!["job-1".to_owned()]);
    assert_eq!(fake.status_cookies, vec![Some(SESSION_COOKIE.to_owned())]);
}

#[tokio::test]
async fn test_job_status_with_integer_story_id() {
    let (base_url, _fake) = spawn_fake_api(FakeApi {
        statuses: [(
            StatusCode::OK,
            json!({"job_id": "job-1", "status": "COMPLETED", "story_id": 7}),
        )]
        .into(),
        ..FakeApi::default()
    })
    .await;
    let service = service_for(&base_url);

    let report = service.job_status("job-1").await.unwrap();

    assert_eq!(report.parsed_status(), JobStatus::Completed);
    assert_eq!(report.story_id.as_deref(), Some("7"));
}

#[tokio::test]
async fn test_rejection_carries_service_detail() {
    let (base_url, _fake) = spawn_fake_api(FakeApi {
        create_response: Some((
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"detail": "Failed to create story: quota exceeded"}),
        )),
        ..FakeApi::default()
    })
    .await;
    let service = service_for(&base_url);

    let error = service.create_story("pirates").await.unwrap_err();

    assert_eq!(
        error,
        ServiceError::Rejected {
            status: 500,
            detail: Some("Failed to create story: quota exceeded".to_owned()),
        }
    );
}

#[tokio::test]
async fn test_complete_story_downloads_and_converts_graph() {
    let (base_url, _fake) = spawn_fake_api(FakeApi {
        story: Some(("7".to_owned(), story_body())),
        ..FakeApi::default()
    })
    .await;
    let service = service_for(&base_url);

    let story = service.complete_story("7").await.unwrap();

    assert_eq!(story.title, "The Clockwork Heist");
    assert_eq!(story.root_node_id, "1");
    assert_eq!(story.node_count(), 2);
    assert_eq!(story.winning_ending_count(), 1);
}

#[tokio::test]
async fn test_unknown_story_is_rejected_with_404() {
    let (base_url, _fake) = spawn_fake_api(FakeApi::default()).await;
    let service = service_for(&base_url);

    let error = service.complete_story("nope").await.unwrap_err();

    assert_eq!(
        error,
        ServiceError::Rejected {
            status: 404,
            detail: Some("Story not found".to_owned()),
        }
    );
}

#[tokio::test]
async fn test_unparseable_body_is_decode_error() {
    let (base_url, _fake) = spawn_fake_api(FakeApi {
        statuses: [(StatusCode::OK, json!({"unexpected": true}))].into(),
        ..FakeApi::default()
    })
    .await;
    let service = service_for(&base_url);

    let error = service.job_status("job-1").await.unwrap_err();

    assert!(matches!(error, ServiceError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_transport_error() {
    // Arrange: bind then drop a listener so the port refuses connections.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let service = service_for(&format!("http://{addr}/api"));

    // Act
    let error = service.create_story("pirates").await.unwrap_err();

    // Assert
    assert!(matches!(error, ServiceError::Transport(_)));
}

#[test]
fn test_service_from_config_keeps_base_url() {
    let config = ClientConfig::new("http://localhost:8000/api/").unwrap();

    let service = HttpStoryService::new(&config).unwrap();

    assert_eq!(service.base_url(), "http://localhost:8000/api");
}

#[tokio::test]
async fn test_session_plays_story_served_over_http() {
    // Arrange
    let (base_url, fake) = spawn_fake_api(FakeApi {
        statuses: [
            (StatusCode::OK, json!({"status": "processing"})),
            (
                StatusCode::OK,
                json!({"status": "completed", "story_id": 7}),
            ),
        ]
        .into(),
        story: Some(("7".to_owned(), story_body())),
        ..FakeApi::default()
    })
    .await;
    let controller = SessionController::new(
        Arc::new(service_for(&base_url)),
        Arc::new(SystemClock),
        SessionConfig::manual(),
    );

    // Act
    let phase = controller.start("  heist  ").await.unwrap();
    let first = controller.poll_tick().await;
    let second = controller.poll_tick().await;

    // Assert
    assert_eq!(phase, SessionPhase::Polling);
    assert_eq!(first, PollOutcome::Pending);
    assert_eq!(second, PollOutcome::Playing);
    assert_eq!(controller.phase(), SessionPhase::Playing);
    assert_eq!(fake.lock().unwrap().themes, vec!["heist".to_owned()]);

    assert!(controller.select_option("2").unwrap());
    let view = controller.view();
    assert_eq!(view.current_node.unwrap().id, "2");
    assert_eq!(view.discovered_count, 2);
}

#[tokio::test]
async fn test_session_fails_with_job_error_over_http() {
    let (base_url, _fake) = spawn_fake_api(FakeApi {
        statuses: [(
            StatusCode::OK,
            json!({"status": "failed", "error": "Model unavailable"}),
        )]
        .into(),
        ..FakeApi::default()
    })
    .await;
    let controller = SessionController::new(
        Arc::new(service_for(&base_url)),
        Arc::new(SystemClock),
        SessionConfig::manual(),
    );

    controller.start("heist").await.unwrap();
    let outcome = controller.poll_tick().await;

    assert_eq!(outcome, PollOutcome::Failed);
    let view = controller.view();
    assert_eq!(view.error_kind, Some(FailureKind::GenerationFailed));
    assert_eq!(view.error_message.as_deref(), Some("Model unavailable"));
}
