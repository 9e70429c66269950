//! Polling producers feeding a live stream.
//!
//! Each producer keeps only a local last-observed map, so staleness stays
//! local and producers never share mutable state. An empty poll yields no
//! events rather than blocking, which keeps the fan-in loop live even
//! when one source is quiet.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::keys;
use crate::task::TaskKind;

use super::stream::LiveDeps;
use super::types::{LiveEvent, ProjectSnapshot};

/// A polling source of live events.
#[async_trait]
pub(super) trait Poller: Send {
    /// One poll pass. Returns every event observed since the last pass;
    /// empty when nothing changed.
    async fn poll(&mut self) -> Vec<LiveEvent>;
}

struct TrackedTask {
    kind: TaskKind,
    last_progress: Option<String>,
}

/// Tracks the project's non-done tasks and their progress/done/error
/// cache entries. The tracked set is recomputed whenever the project's
/// "task set changed" marker moves.
pub(super) struct TaskStatusPoller {
    deps: LiveDeps,
    project_id: String,
    last_marker: Option<String>,
    tracked: HashMap<String, TrackedTask>,
    primed: bool,
}

impl TaskStatusPoller {
    pub(super) fn new(deps: LiveDeps, project_id: &str) -> Self {
        Self {
            deps,
            project_id: project_id.to_string(),
            last_marker: None,
            tracked: HashMap::new(),
            primed: false,
        }
    }

    async fn refresh_tracked(&mut self) {
        match self.deps.tasks.get_by_project(&self.project_id) {
            Ok(tasks) => {
                // A row can finish while its done/error marker sits
                // expired; such ids leave the tracked set here.
                self.tracked
                    .retain(|id, _| tasks.iter().any(|t| t.id == *id && !t.done));
                for task in tasks.into_iter().filter(|t| !t.done) {
                    self.tracked.entry(task.id.clone()).or_insert(TrackedTask {
                        kind: task.kind,
                        last_progress: None,
                    });
                }
            }
            Err(e) => warn!(project_id = %self.project_id, "task poll failed: {}", e),
        }
    }

    async fn cache_get(&self, key: &str) -> Option<String> {
        match self.deps.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                // Missing information, not a failure.
                debug!("cache read failed for {}: {}", key, e);
                None
            }
        }
    }
}

#[async_trait]
impl Poller for TaskStatusPoller {
    async fn poll(&mut self) -> Vec<LiveEvent> {
        let marker = self
            .cache_get(&keys::project_tasks_changed(&self.project_id))
            .await;
        if !self.primed || marker != self.last_marker {
            self.last_marker = marker;
            self.primed = true;
            self.refresh_tracked().await;
        }

        let mut events = Vec::new();
        let mut finished = Vec::new();

        let ids: Vec<String> = self.tracked.keys().cloned().collect();
        for task_id in ids {
            let kind = self.tracked[&task_id].kind;

            if let Some(error) = self.cache_get(&keys::task_error(&task_id)).await {
                events.push(LiveEvent::TaskError {
                    task_id: task_id.clone(),
                    kind,
                    error,
                });
                finished.push(task_id);
                continue;
            }

            if self.cache_get(&keys::task_done(&task_id)).await.is_some() {
                events.push(LiveEvent::TaskDone {
                    task_id: task_id.clone(),
                    kind,
                });
                finished.push(task_id);
                continue;
            }

            if let Some(raw) = self.cache_get(&keys::task_progress(&task_id)).await {
                let Some(entry) = self.tracked.get_mut(&task_id) else {
                    continue;
                };
                if entry.last_progress.as_deref() != Some(raw.as_str()) {
                    if let Ok(progress) = raw.parse::<f64>() {
                        events.push(LiveEvent::TaskProgress {
                            task_id: task_id.clone(),
                            kind,
                            progress,
                        });
                    }
                    entry.last_progress = Some(raw);
                }
            }
        }

        for task_id in finished {
            self.tracked.remove(&task_id);
        }

        events
    }
}

/// Emits a project snapshot whenever the project-changed marker moves and
/// was written by someone other than the viewer (echo suppression).
pub(super) struct ProjectPoller {
    deps: LiveDeps,
    project_id: String,
    viewer_id: String,
    last_seen: Option<String>,
}

impl ProjectPoller {
    pub(super) fn new(deps: LiveDeps, project_id: &str, viewer_id: &str) -> Self {
        Self {
            deps,
            project_id: project_id.to_string(),
            viewer_id: viewer_id.to_string(),
            last_seen: None,
        }
    }
}

#[async_trait]
impl Poller for ProjectPoller {
    async fn poll(&mut self) -> Vec<LiveEvent> {
        let marker = match self.deps.cache.get(&keys::project_changed(&self.project_id)).await {
            Ok(Some(value)) => value,
            Ok(None) => return Vec::new(),
            Err(e) => {
                debug!("cache read failed: {}", e);
                return Vec::new();
            }
        };

        if self.last_seen.as_deref() == Some(marker.as_str()) {
            return Vec::new();
        }
        let editor = marker.clone();
        self.last_seen = Some(marker);

        if editor == self.viewer_id {
            // The viewer's own edit; they already know.
            return Vec::new();
        }

        match self.deps.projects.get(&self.project_id) {
            Ok(Some(project)) => vec![LiveEvent::ProjectUpdated {
                project: ProjectSnapshot::from(&project),
            }],
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(project_id = %self.project_id, "project re-read failed: {}", e);
                Vec::new()
            }
        }
    }
}

/// Relays live document bytes written by other participants, keyed per
/// writer so independent editors never clobber each other's updates.
pub(super) struct DocBytesPoller {
    deps: LiveDeps,
    project_id: String,
    viewer_id: String,
    last_by_writer: HashMap<String, String>,
}

impl DocBytesPoller {
    pub(super) fn new(deps: LiveDeps, project_id: &str, viewer_id: &str) -> Self {
        Self {
            deps,
            project_id: project_id.to_string(),
            viewer_id: viewer_id.to_string(),
            last_by_writer: HashMap::new(),
        }
    }
}

#[async_trait]
impl Poller for DocBytesPoller {
    async fn poll(&mut self) -> Vec<LiveEvent> {
        let prefix = keys::doc_bytes_prefix(&self.project_id);
        let keys = match self.deps.cache.keys(&prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                debug!("cache scan failed: {}", e);
                return Vec::new();
            }
        };

        let mut events = Vec::new();
        for key in keys {
            let Some(writer) = keys::doc_bytes_writer(&key, &prefix) else {
                continue;
            };
            if writer == self.viewer_id {
                continue;
            }
            let writer = writer.to_string();

            let Ok(Some(data)) = self.deps.cache.get(&key).await else {
                continue;
            };
            if self.last_by_writer.get(&writer) != Some(&data) {
                self.last_by_writer.insert(writer.clone(), data.clone());
                events.push(LiveEvent::DocUpdate {
                    user_id: writer,
                    data,
                });
            }
        }

        events
    }
}
