//! Pipeline orchestrator implementation.
//!
//! Task creation: admission checks, atomic fan-out, dispatch, cache
//! markers. Event ingestion: the three worker report streams (progress,
//! done, error) and the cascade that advances a summarize pipeline from
//! one stage to the next.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::broker::{WorkBroker, WorkOrder, WorkerEvent};
use crate::cache::{keys, StatusCache};
use crate::project::Project;
use crate::task::{NewTask, Task, TaskKind, TaskStore};

use super::admission::check_admission;
use super::config::OrchestratorConfig;
use super::types::{CreateTaskRequest, OrchestratorError};

/// The pipeline orchestrator.
///
/// Explicitly constructed with its collaborators; there is no ambient
/// global state. Cheap to share behind an `Arc`.
pub struct PipelineOrchestrator {
    config: OrchestratorConfig,
    tasks: Arc<dyn TaskStore>,
    cache: Arc<dyn StatusCache>,
    broker: Arc<dyn WorkBroker>,
}

impl PipelineOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        tasks: Arc<dyn TaskStore>,
        cache: Arc<dyn StatusCache>,
        broker: Arc<dyn WorkBroker>,
    ) -> Self {
        Self {
            config,
            tasks,
            cache,
            broker,
        }
    }

    /// Validate and create the task(s) for one submission.
    ///
    /// Returns the root task: the direct job for plain kinds, or the
    /// not-yet-dispatched parent for a summarize fan-out. All rows are
    /// committed before anything is published; a publish failure is
    /// surfaced but never rolls rows back.
    pub async fn create_task(
        &self,
        project: &Project,
        user_id: &str,
        request: CreateTaskRequest,
    ) -> Result<Task, OrchestratorError> {
        let active_kinds = self.active_marker_kinds(&project.id).await?;

        let has_unfinished = if request.kind == TaskKind::Summarize {
            self.tasks
                .get_by_project(&project.id)?
                .iter()
                .any(|t| !t.done)
        } else {
            false
        };

        check_admission(request.kind, project, &active_kinds, has_unfinished)?;

        let root = if request.kind == TaskKind::Summarize && !project.summarize_prereqs_met() {
            self.create_summarize_fanout(project, user_id, request.prompt)
                .await?
        } else {
            let task = self.tasks.create(NewTask::new(
                &project.id,
                user_id,
                request.kind,
                request.prompt,
            ))?;
            self.dispatch(&task).await?;
            task
        };

        // Other viewers' streams pick up the new active-task set from this.
        self.touch_project_tasks(&project.id).await?;

        info!(
            task_id = %root.id,
            project_id = %project.id,
            kind = %root.kind,
            "task created"
        );
        Ok(root)
    }

    /// Create a summarize parent plus one child per missing prerequisite,
    /// atomically, and dispatch only the first child. The stages run
    /// sequentially: `handle_done` dispatches the next gating sibling when
    /// one completes, and the parent once none remain.
    async fn create_summarize_fanout(
        &self,
        project: &Project,
        user_id: &str,
        prompt: Option<String>,
    ) -> Result<Task, OrchestratorError> {
        let mut children = Vec::new();
        if project.transcription_file.is_none() {
            children.push(NewTask::new(
                &project.id,
                user_id,
                TaskKind::Transcribe,
                prompt.clone(),
            ));
        }
        let is_video = project
            .origin_file
            .as_ref()
            .is_some_and(|f| f.category == crate::project::FileCategory::Video);
        if is_video && !project.frames_extracted {
            children.push(NewTask::new(
                &project.id,
                user_id,
                TaskKind::FramesExtract,
                prompt.clone(),
            ));
        }

        let parent = NewTask::new(&project.id, user_id, TaskKind::Summarize, prompt);
        let (parent, child_tasks) = self.tasks.create_family(parent, children)?;

        // Children + the parent's own summarize stage.
        self.tasks
            .add_subtask_count(&parent.id, child_tasks.len() as i64 + 1)?;

        debug!(
            parent_id = %parent.id,
            children = child_tasks.len(),
            "summarize fan-out created"
        );

        if let Some(first) = child_tasks.first() {
            self.dispatch(first).await?;
        }

        Ok(parent)
    }

    /// Publish a task to its kind's queue and write the active marker.
    async fn dispatch(&self, task: &Task) -> Result<(), OrchestratorError> {
        let ttl = self.config.status_ttl();

        self.broker
            .publish(task.kind.queue(), &WorkOrder::new(&task.id))
            .await?;

        self.cache
            .set(
                &keys::active_task(&task.project_id, task.kind),
                &task.id,
                ttl,
            )
            .await?;

        debug!(task_id = %task.id, queue = task.kind.queue(), "task dispatched");
        Ok(())
    }

    /// Worker progress report. Cache-only; out-of-order delivery may make
    /// the displayed value regress, which is acceptable.
    pub async fn handle_progress(
        &self,
        task_id: &str,
        progress: f64,
    ) -> Result<(), OrchestratorError> {
        self.cache
            .set(
                &keys::task_progress(task_id),
                &progress.to_string(),
                self.config.status_ttl(),
            )
            .await?;
        Ok(())
    }

    /// Worker failure report. An error in any stage aborts the whole
    /// family: every related row is marked done and every active marker
    /// released, so the project accepts fresh submissions again.
    pub async fn handle_error(
        &self,
        task_id: &str,
        message: &str,
    ) -> Result<(), OrchestratorError> {
        let task = self
            .tasks
            .get(task_id)?
            .ok_or_else(|| OrchestratorError::UnknownTask(task_id.to_string()))?;

        self.tasks.mark_done(&task.id)?;
        self.cache
            .delete(&keys::active_task(&task.project_id, task.kind))
            .await?;

        if let Some(parent_id) = &task.parent_id {
            for sibling in self.tasks.get_by_parent(parent_id)? {
                self.tasks.mark_done(&sibling.id)?;
                self.cache
                    .delete(&keys::active_task(&sibling.project_id, sibling.kind))
                    .await?;
            }
            self.tasks.mark_done(parent_id)?;
        }

        self.cache
            .set(
                &keys::task_error(task_id),
                message,
                self.config.status_ttl(),
            )
            .await?;

        warn!(task_id, error = message, "worker reported task failure");
        Ok(())
    }

    /// Worker completion report. Persists the done flag, releases the
    /// active marker, and advances the fan-out: the last remaining gating
    /// sibling is dispatched next, and once none remain the parent
    /// summarize task itself goes out.
    pub async fn handle_done(&self, task_id: &str) -> Result<(), OrchestratorError> {
        let task = self
            .tasks
            .get(task_id)?
            .ok_or_else(|| OrchestratorError::UnknownTask(task_id.to_string()))?;

        if task.done {
            debug!(task_id, "duplicate done report ignored");
            return Ok(());
        }

        self.tasks.mark_done(&task.id)?;
        self.cache
            .delete(&keys::active_task(&task.project_id, task.kind))
            .await?;

        if let Some(parent_id) = &task.parent_id {
            if task.kind.is_gating() {
                self.advance_family(&task, parent_id).await?;
            }
        }

        self.cache
            .set(&keys::task_done(task_id), "1", self.config.status_ttl())
            .await?;

        info!(task_id, kind = %task.kind, "task completed");
        Ok(())
    }

    async fn advance_family(
        &self,
        done_task: &Task,
        parent_id: &str,
    ) -> Result<(), OrchestratorError> {
        let pending: Vec<Task> = self
            .tasks
            .get_by_parent(parent_id)?
            .into_iter()
            .filter(|t| !t.done && t.kind.is_gating())
            .collect();

        match pending.as_slice() {
            [next] => {
                // The other extraction stage was waiting its turn.
                self.dispatch(next).await?;
                self.cache
                    .set(
                        &keys::task_progress(&next.id),
                        "0",
                        self.config.status_ttl(),
                    )
                    .await?;
            }
            [] => {
                let parent = self.tasks.get(parent_id)?.ok_or_else(|| {
                    OrchestratorError::MissingParent {
                        task_id: done_task.id.clone(),
                        parent_id: parent_id.to_string(),
                    }
                })?;
                self.dispatch(&parent).await?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Spawn the loop that drains typed worker events into the three
    /// handlers. Handler failures are logged, never fatal to the loop.
    pub fn spawn_ingest(
        self: &Arc<Self>,
        mut rx: mpsc::Receiver<WorkerEvent>,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            info!("worker event ingest loop started");
            while let Some(event) = rx.recv().await {
                let result = match &event {
                    WorkerEvent::Progress { task_id, progress } => {
                        orchestrator.handle_progress(task_id, *progress).await
                    }
                    WorkerEvent::Done { task_id } => orchestrator.handle_done(task_id).await,
                    WorkerEvent::Error { task_id, error } => {
                        orchestrator.handle_error(task_id, error).await
                    }
                };
                if let Err(e) = result {
                    warn!(task_id = event.task_id(), "failed to ingest worker event: {}", e);
                }
            }
            info!("worker event ingest loop stopped");
        })
    }

    /// Not-done tasks of a project, for the active-task listing.
    pub fn active_tasks(&self, project_id: &str) -> Result<Vec<Task>, OrchestratorError> {
        Ok(self
            .tasks
            .get_by_project(project_id)?
            .into_iter()
            .filter(|t| !t.done)
            .collect())
    }

    /// Bump the project's "task set changed" marker.
    async fn touch_project_tasks(&self, project_id: &str) -> Result<(), OrchestratorError> {
        self.cache
            .set(
                &keys::project_tasks_changed(project_id),
                &Uuid::new_v4().to_string(),
                self.config.status_ttl(),
            )
            .await?;
        Ok(())
    }

    /// Kinds with a live active-task marker for the project.
    async fn active_marker_kinds(
        &self,
        project_id: &str,
    ) -> Result<Vec<TaskKind>, OrchestratorError> {
        let prefix = keys::active_task_prefix(project_id);
        let keys = self.cache.keys(&prefix).await?;
        Ok(keys
            .iter()
            .filter_map(|k| keys::active_task_kind(k, &prefix))
            .collect())
    }
}
