//! WebSocket transport for live project streams.
//!
//! One socket serves one viewer of one project. Outbound frames are the
//! stream's [`LiveEvent`]s as tagged JSON; inbound text frames are live
//! document bytes relayed to the other participants through the cache.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use recap_core::{LiveEvent, LiveStream};

use super::middleware::AuthUser;
use super::projects::{owned_project, ErrorResponse};
use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_EVENTS_SENT};
use crate::state::AppState;

fn event_label(event: &LiveEvent) -> &'static str {
    match event {
        LiveEvent::Connected => "connected",
        LiveEvent::TaskProgress { .. } => "task_progress",
        LiveEvent::TaskDone { .. } => "task_done",
        LiveEvent::TaskError { .. } => "task_error",
        LiveEvent::ProjectUpdated { .. } => "project_updated",
        LiveEvent::DocUpdate { .. } => "doc_update",
        LiveEvent::Expired => "expired",
    }
}

/// WebSocket upgrade handler. Ownership is checked before the upgrade so
/// an unknown or foreign project gets a plain 404 instead of a socket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    owned_project(&state, &id, &user_id)?;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, id, user_id)))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, project_id: String, user_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let mut stream = LiveStream::open(
        state.live_deps(),
        &project_id,
        &user_id,
        state.live_config(),
    );

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!(project_id = %project_id, user_id = %user_id, "WebSocket client connected");

    // The greeting goes out before any polled event.
    if send_event(&mut sender, &LiveEvent::Connected).await.is_err() {
        stream.close();
        WS_CONNECTIONS_ACTIVE.dec();
        return;
    }

    loop {
        tokio::select! {
            event = stream.next() => {
                match event {
                    Some(event) => {
                        // Expired is terminal for the stream: forward it,
                        // then let the client reconnect.
                        let last = matches!(event, LiveEvent::Expired);
                        if send_event(&mut sender, &event).await.is_err() {
                            debug!("WebSocket send failed, client disconnected");
                            break;
                        }
                        if last {
                            break;
                        }
                    }
                    None => {
                        debug!("live stream ended");
                        break;
                    }
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = stream.publish_doc_bytes(&text).await {
                            warn!(error = %e, "failed to relay document bytes");
                        }
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        let text = String::from_utf8_lossy(&bytes);
                        if let Err(e) = stream.publish_doc_bytes(&text).await {
                            warn!(error = %e, "failed to relay document bytes");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client requested close");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Ping/pong handled by axum, binary ignored.
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    stream.close();
    WS_CONNECTIONS_ACTIVE.dec();
    info!(project_id = %project_id, "WebSocket client disconnected");
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &LiveEvent,
) -> Result<(), ()> {
    WS_EVENTS_SENT.with_label_values(&[event_label(event)]).inc();
    match serde_json::to_string(event) {
        Ok(json) => sender
            .send(Message::Text(json.into()))
            .await
            .map_err(|_| ()),
        Err(e) => {
            error!("failed to serialize live event: {}", e);
            Ok(())
        }
    }
}
