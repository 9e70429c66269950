//! Integration tests for task submission and the dispatch pipeline
//! behind it.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestFixture;
use recap_core::BrokerError;

#[tokio::test]
async fn test_transcribe_submission_dispatches_work_order() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_project("Video").await;
    fixture.attach_video_origin(&id).await;

    let response = fixture
        .post(
            &format!("/api/v1/projects/{}/tasks", id),
            json!({ "kind": "transcribe" }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["kind"], "transcribe");
    assert_eq!(response.body["done"], false);
    let task_id = response.body["id"].as_str().unwrap().to_string();

    assert_eq!(fixture.broker.published_to("transcribe").await, vec![task_id]);
}

#[tokio::test]
async fn test_unknown_kind_fails_deserialization() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_project("Video").await;
    fixture.attach_video_origin(&id).await;

    let response = fixture
        .post(
            &format!("/api/v1/projects/{}/tasks", id),
            json!({ "kind": "explode" }),
        )
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_submission_without_origin_file_is_rejected() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_project("Empty").await;

    let response = fixture
        .post(
            &format!("/api/v1/projects/{}/tasks", id),
            json!({ "kind": "transcribe" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("no origin file"));
    assert!(fixture.broker.published().await.is_empty());
}

#[tokio::test]
async fn test_duplicate_transcribe_is_rejected_while_active() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_project("Video").await;
    fixture.attach_video_origin(&id).await;

    let first = fixture
        .post(
            &format!("/api/v1/projects/{}/tasks", id),
            json!({ "kind": "transcribe" }),
        )
        .await;
    assert_status!(first, StatusCode::CREATED);

    let second = fixture
        .post(
            &format!("/api/v1/projects/{}/tasks", id),
            json!({ "kind": "transcribe" }),
        )
        .await;
    assert_status!(second, StatusCode::CONFLICT);

    // The complementary extraction stage is still admissible.
    let frames = fixture
        .post(
            &format!("/api/v1/projects/{}/tasks", id),
            json!({ "kind": "frames_extract" }),
        )
        .await;
    assert_status!(frames, StatusCode::CREATED);
}

#[tokio::test]
async fn test_summarize_fanout_over_the_api() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_project("Video").await;
    fixture.attach_video_origin(&id).await;

    let response = fixture
        .post(
            &format!("/api/v1/projects/{}/tasks", id),
            json!({ "kind": "summarize", "prompt": "keep it short" }),
        )
        .await;
    assert_status!(response, StatusCode::CREATED);
    assert_eq!(response.body["kind"], "summarize");
    let parent_id = response.body["id"].as_str().unwrap().to_string();

    // Stage one dispatched, nothing else yet.
    let transcribes = fixture.broker.published_to("transcribe").await;
    assert_eq!(transcribes.len(), 1);
    assert!(fixture.broker.published_to("frames_extract").await.is_empty());
    assert!(fixture.broker.published_to("summarize").await.is_empty());

    // All three family rows are active.
    let active = fixture.get(&format!("/api/v1/projects/{}/tasks", id)).await;
    assert_status!(active, StatusCode::OK);
    assert_eq!(active.body.as_array().unwrap().len(), 3);

    // Worker finishes transcription: stage two goes out.
    fixture
        .orchestrator
        .handle_done(&transcribes[0])
        .await
        .unwrap();
    let frames = fixture.broker.published_to("frames_extract").await;
    assert_eq!(frames.len(), 1);

    // Worker finishes extraction: the parent itself goes out.
    fixture.orchestrator.handle_done(&frames[0]).await.unwrap();
    assert_eq!(
        fixture.broker.published_to("summarize").await,
        vec![parent_id.clone()]
    );

    // Parent done drains the active list.
    fixture.orchestrator.handle_done(&parent_id).await.unwrap();
    let active = fixture.get(&format!("/api/v1/projects/{}/tasks", id)).await;
    assert_eq!(active.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_dispatch_failure_maps_to_bad_gateway() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_project("Video").await;
    fixture.attach_video_origin(&id).await;

    fixture
        .broker
        .set_next_error(BrokerError::UnknownQueue("transcribe".to_string()))
        .await;

    let response = fixture
        .post(
            &format!("/api/v1/projects/{}/tasks", id),
            json!({ "kind": "transcribe" }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_task_routes_on_unknown_project_are_404() {
    let fixture = TestFixture::new().await;

    let create = fixture
        .post("/api/v1/projects/nope/tasks", json!({ "kind": "transcribe" }))
        .await;
    assert_status!(create, StatusCode::NOT_FOUND);

    let list = fixture.get("/api/v1/projects/nope/tasks").await;
    assert_status!(list, StatusCode::NOT_FOUND);
}
