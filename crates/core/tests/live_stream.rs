//! Live update stream integration tests.
//!
//! These tests run the multiplexer against real in-memory stores and the
//! in-memory cache, driving changes the way the orchestrator and the API
//! would, and asserting on the merged event sequence.

use std::sync::Arc;
use std::time::Duration;

use recap_core::{
    cache::keys,
    project::{FileCategory, FileRef},
    LiveConfig, LiveDeps, LiveEvent, LiveStream, MemoryStatusCache, NewProject, NewTask, Project,
    ProjectStore, SqliteProjectStore, SqliteTaskStore, StatusCache, Task, TaskKind, TaskStore,
};

const TTL: Duration = Duration::from_secs(60);

struct TestHarness {
    tasks: Arc<SqliteTaskStore>,
    projects: Arc<SqliteProjectStore>,
    cache: Arc<MemoryStatusCache>,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            tasks: Arc::new(SqliteTaskStore::in_memory().expect("task store")),
            projects: Arc::new(SqliteProjectStore::in_memory().expect("project store")),
            cache: Arc::new(MemoryStatusCache::new()),
        }
    }

    fn deps(&self) -> LiveDeps {
        LiveDeps {
            tasks: self.tasks.clone(),
            projects: self.projects.clone(),
            cache: self.cache.clone(),
        }
    }

    fn config() -> LiveConfig {
        LiveConfig {
            poll_interval_ms: 20,
            max_stream_secs: 3600,
            doc_ttl_secs: 60,
        }
    }

    fn open(&self, project_id: &str, user_id: &str) -> LiveStream {
        LiveStream::open(self.deps(), project_id, user_id, &Self::config())
    }

    fn create_project(&self, owner: &str) -> Project {
        let project = self
            .projects
            .create(NewProject {
                user_id: owner.to_string(),
                name: "demo".to_string(),
                description: String::new(),
            })
            .expect("project");
        self.projects
            .set_origin_file(
                &project.id,
                &FileRef {
                    id: "f1".to_string(),
                    name: "talk.mp4".to_string(),
                    category: FileCategory::Video,
                },
            )
            .expect("origin file");
        project
    }

    fn create_task(&self, project_id: &str, kind: TaskKind) -> Task {
        self.tasks
            .create(NewTask::new(project_id, "user-1", kind, None))
            .expect("task")
    }
}

async fn expect_event(stream: &mut LiveStream) -> LiveEvent {
    tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("timed out waiting for live event")
        .expect("stream ended unexpectedly")
}

async fn expect_quiet(stream: &mut LiveStream) {
    let outcome = tokio::time::timeout(Duration::from_millis(200), stream.next()).await;
    assert!(outcome.is_err(), "expected no event, got {:?}", outcome);
}

#[tokio::test]
async fn test_quiet_stream_emits_nothing_but_stays_live() {
    let h = TestHarness::new();
    let project = h.create_project("alice");

    let mut stream = h.open(&project.id, "alice");
    expect_quiet(&mut stream).await;

    // The stream is still serviceable after the quiet window.
    let task = h.create_task(&project.id, TaskKind::Transcribe);
    h.cache
        .set(&keys::task_progress(&task.id), "0.5", TTL)
        .await
        .unwrap();
    h.cache
        .set(&keys::project_tasks_changed(&project.id), "bump", TTL)
        .await
        .unwrap();

    match expect_event(&mut stream).await {
        LiveEvent::TaskProgress {
            task_id, progress, ..
        } => {
            assert_eq!(task_id, task.id);
            assert!((progress - 0.5).abs() < f64::EPSILON);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_task_progress_then_done_drops_tracking() {
    let h = TestHarness::new();
    let project = h.create_project("alice");
    let task = h.create_task(&project.id, TaskKind::Transcribe);

    let mut stream = h.open(&project.id, "alice");

    h.cache
        .set(&keys::task_progress(&task.id), "0.25", TTL)
        .await
        .unwrap();
    match expect_event(&mut stream).await {
        LiveEvent::TaskProgress { task_id, kind, .. } => {
            assert_eq!(task_id, task.id);
            assert_eq!(kind, TaskKind::Transcribe);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    // Unchanged progress is not re-emitted.
    expect_quiet(&mut stream).await;

    h.cache
        .set(&keys::task_done(&task.id), "1", TTL)
        .await
        .unwrap();
    match expect_event(&mut stream).await {
        LiveEvent::TaskDone { task_id, .. } => assert_eq!(task_id, task.id),
        other => panic!("unexpected event: {:?}", other),
    }

    // Done is terminal for tracking: further writes are ignored.
    h.cache
        .set(&keys::task_progress(&task.id), "0.9", TTL)
        .await
        .unwrap();
    expect_quiet(&mut stream).await;
}

#[tokio::test]
async fn test_task_error_is_terminal() {
    let h = TestHarness::new();
    let project = h.create_project("alice");
    let task = h.create_task(&project.id, TaskKind::FramesExtract);

    let mut stream = h.open(&project.id, "alice");

    h.cache
        .set(&keys::task_error(&task.id), "gpu fell over", TTL)
        .await
        .unwrap();
    match expect_event(&mut stream).await {
        LiveEvent::TaskError {
            task_id,
            kind,
            error,
        } => {
            assert_eq!(task_id, task.id);
            assert_eq!(kind, TaskKind::FramesExtract);
            assert_eq!(error, "gpu fell over");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    expect_quiet(&mut stream).await;
}

#[tokio::test]
async fn test_recompute_drops_rows_finished_without_visible_marker() {
    let h = TestHarness::new();
    let project = h.create_project("alice");
    let task = h.create_task(&project.id, TaskKind::Transcribe);

    let mut stream = h.open(&project.id, "alice");

    h.cache
        .set(&keys::task_progress(&task.id), "0.25", TTL)
        .await
        .unwrap();
    match expect_event(&mut stream).await {
        LiveEvent::TaskProgress { task_id, .. } => assert_eq!(task_id, task.id),
        other => panic!("unexpected event: {:?}", other),
    }

    // The row finishes but its done marker expires before any poll sees
    // it; only the task-set marker moves.
    h.tasks.mark_done(&task.id).unwrap();
    h.cache
        .set(&keys::project_tasks_changed(&project.id), "bump", TTL)
        .await
        .unwrap();
    expect_quiet(&mut stream).await;

    // The finished row left the tracked set: later progress writes for
    // it are ignored.
    h.cache
        .set(&keys::task_progress(&task.id), "0.9", TTL)
        .await
        .unwrap();
    expect_quiet(&mut stream).await;
}

#[tokio::test]
async fn test_project_update_suppresses_viewer_echo() {
    let h = TestHarness::new();
    let project = h.create_project("alice");

    let mut stream = h.open(&project.id, "alice");

    // The viewer's own edit produces no event for them.
    h.cache
        .set(&keys::project_changed(&project.id), "alice", TTL)
        .await
        .unwrap();
    expect_quiet(&mut stream).await;

    // Somebody else's edit does.
    h.projects
        .update(&project.id, "renamed", "new description")
        .unwrap();
    h.cache
        .set(&keys::project_changed(&project.id), "bob", TTL)
        .await
        .unwrap();
    match expect_event(&mut stream).await {
        LiveEvent::ProjectUpdated { project: snapshot } => {
            assert_eq!(snapshot.id, project.id);
            assert_eq!(snapshot.name, "renamed");
            assert!(snapshot.has_origin_file);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_doc_bytes_relay_between_participants() {
    let h = TestHarness::new();
    let project = h.create_project("alice");

    let mut alice = h.open(&project.id, "alice");
    let mut bob = h.open(&project.id, "bob");

    alice.publish_doc_bytes("alice-draft-1").await.unwrap();

    // Bob sees Alice's bytes; Alice does not see her own.
    match expect_event(&mut bob).await {
        LiveEvent::DocUpdate { user_id, data } => {
            assert_eq!(user_id, "alice");
            assert_eq!(data, "alice-draft-1");
        }
        other => panic!("unexpected event: {:?}", other),
    }
    expect_quiet(&mut alice).await;

    // A changed payload is relayed again, an unchanged one is not.
    alice.publish_doc_bytes("alice-draft-1").await.unwrap();
    expect_quiet(&mut bob).await;
    alice.publish_doc_bytes("alice-draft-2").await.unwrap();
    match expect_event(&mut bob).await {
        LiveEvent::DocUpdate { data, .. } => assert_eq!(data, "alice-draft-2"),
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_stream_expires_at_wall_clock_cutoff() {
    let h = TestHarness::new();
    let project = h.create_project("alice");

    let config = LiveConfig {
        poll_interval_ms: 20,
        max_stream_secs: 1,
        doc_ttl_secs: 60,
    };
    let mut stream = LiveStream::open(h.deps(), &project.id, "alice", &config);

    match tokio::time::timeout(Duration::from_secs(3), stream.next())
        .await
        .expect("no expiry within cutoff")
    {
        Some(LiveEvent::Expired) => {}
        other => panic!("unexpected event: {:?}", other),
    }

    // Every producer stops afterwards and the stream drains to its end.
    let end = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("stream did not terminate");
    assert!(end.is_none());
}

#[tokio::test]
async fn test_close_stops_producers() {
    let h = TestHarness::new();
    let project = h.create_project("alice");
    let task = h.create_task(&project.id, TaskKind::Transcribe);

    let mut stream = h.open(&project.id, "alice");
    stream.close();

    h.cache
        .set(&keys::task_progress(&task.id), "0.5", TTL)
        .await
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_millis(200), stream.next()).await;
    // Either the channel is already fully closed or nothing arrives.
    match outcome {
        Ok(None) | Err(_) => {}
        Ok(Some(event)) => panic!("event after close: {:?}", event),
    }
}
