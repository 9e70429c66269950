//! Per-connection live stream: fan-in of the polling producers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::cache::{keys, CacheError, StatusCache};
use crate::project::ProjectStore;
use crate::task::TaskStore;

use super::config::LiveConfig;
use super::producers::{DocBytesPoller, Poller, ProjectPoller, TaskStatusPoller};
use super::types::LiveEvent;

/// Capacity of the per-connection fan-in queue.
const QUEUE_CAPACITY: usize = 64;

/// Collaborators a live stream reads from.
#[derive(Clone)]
pub struct LiveDeps {
    pub tasks: Arc<dyn TaskStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub cache: Arc<dyn StatusCache>,
}

/// One client connection's ordered, cancellable event sequence.
///
/// Internally a set of spawned producer tasks funnel into one queue;
/// `next` simply drains it. Dropping (or closing) the stream cancels
/// every producer, so none outlives the connection.
pub struct LiveStream {
    rx: mpsc::Receiver<LiveEvent>,
    shutdown: broadcast::Sender<()>,
    workers: Vec<JoinHandle<()>>,
    cache: Arc<dyn StatusCache>,
    project_id: String,
    user_id: String,
    doc_ttl: Duration,
}

impl LiveStream {
    /// Open a stream for one viewer of one project.
    pub fn open(deps: LiveDeps, project_id: &str, user_id: &str, config: &LiveConfig) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
        let (shutdown, _) = broadcast::channel(1);
        let deadline = Instant::now() + config.max_stream();
        let interval = config.poll_interval();

        let mut workers = Vec::with_capacity(4);
        workers.push(spawn_poller(
            TaskStatusPoller::new(deps.clone(), project_id),
            tx.clone(),
            shutdown.subscribe(),
            interval,
            deadline,
        ));
        workers.push(spawn_poller(
            ProjectPoller::new(deps.clone(), project_id, user_id),
            tx.clone(),
            shutdown.subscribe(),
            interval,
            deadline,
        ));
        workers.push(spawn_poller(
            DocBytesPoller::new(deps.clone(), project_id, user_id),
            tx.clone(),
            shutdown.subscribe(),
            interval,
            deadline,
        ));
        workers.push(spawn_watchdog(tx, shutdown.clone(), deadline));

        info!(project_id, user_id, "live stream opened");

        Self {
            rx,
            shutdown,
            workers,
            cache: deps.cache,
            project_id: project_id.to_string(),
            user_id: user_id.to_string(),
            doc_ttl: config.doc_ttl(),
        }
    }

    /// Next event, or `None` once the stream has fully stopped.
    pub async fn next(&mut self) -> Option<LiveEvent> {
        self.rx.recv().await
    }

    /// Inbound relay target: record bytes this viewer pushed so other
    /// participants' streams pick them up.
    pub async fn publish_doc_bytes(&self, data: &str) -> Result<(), CacheError> {
        self.cache
            .set(
                &keys::doc_bytes(&self.project_id, &self.user_id),
                data,
                self.doc_ttl,
            )
            .await
    }

    /// Stop every producer. Idempotent; also runs on drop.
    pub fn close(&mut self) {
        let _ = self.shutdown.send(());
        for worker in &self.workers {
            worker.abort();
        }
        debug!(project_id = %self.project_id, "live stream closed");
    }
}

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drive one poller until shutdown or the wall-clock deadline.
fn spawn_poller<P: Poller + 'static>(
    mut poller: P,
    tx: mpsc::Sender<LiveEvent>,
    mut shutdown: broadcast::Receiver<()>,
    interval: Duration,
    deadline: Instant,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    for event in poller.poll().await {
                        if tx.send(event).await.is_err() {
                            // Consumer gone; nothing left to do.
                            return;
                        }
                    }
                }
            }
        }
    })
}

/// Emit the terminal expiry event at the deadline and stop the stream.
fn spawn_watchdog(
    tx: mpsc::Sender<LiveEvent>,
    shutdown: broadcast::Sender<()>,
    deadline: Instant,
) -> JoinHandle<()> {
    let mut shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown_rx.recv() => {}
            _ = tokio::time::sleep_until(deadline) => {
                debug!("live stream polling cutoff reached");
                let _ = tx.send(LiveEvent::Expired).await;
                let _ = shutdown.send(());
            }
        }
    })
}
