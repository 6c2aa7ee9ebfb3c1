//! The inbound HTTP collaborator.
//!
//! Exposes the send endpoint, a health check, and the realtime hub's
//! WebSocket upgrade. The send endpoint hands the command off to the
//! dispatcher and replies `202 Accepted` without waiting on per-channel
//! results; per-channel failures are observable only through logs. A
//! malformed body or an unrecognized channel kind is rejected before any
//! notification is constructed.

use crate::channels::realtime::NotificationHub;
use crate::dispatch::{Dispatcher, SendNotificationCommand};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, trace, warn};

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct ApiState {
    pub dispatcher: Arc<Dispatcher>,
    pub hub: Arc<NotificationHub>,
}

/// Builds the router with all inbound routes.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/notifications/send", post(send_notification))
        .route("/health", get(health))
        .route("/hubs/notifications", get(hub_upgrade))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn send_notification(
    State(state): State<ApiState>,
    Json(command): Json<SendNotificationCommand>,
) -> impl IntoResponse {
    if let Err(e) = command.validate() {
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    // Fire and forget: the caller only ever sees "accepted" or a
    // request-level rejection.
    let dispatcher = state.dispatcher.clone();
    tokio::spawn(async move {
        if let Err(e) = dispatcher.dispatch(command).await {
            error!(error = %e, "dispatch rejected command");
        }
    });

    StatusCode::ACCEPTED.into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HubQuery {
    user_id: Option<String>,
    group: Option<String>,
}

/// Group a connecting client joins: an explicit non-blank `group`
/// parameter wins, otherwise `user-{userId}`.
fn join_group(query: &HubQuery) -> Option<String> {
    if let Some(group) = query
        .group
        .as_deref()
        .map(str::trim)
        .filter(|g| !g.is_empty())
    {
        return Some(group.to_string());
    }
    query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(|u| format!("user-{u}"))
}

async fn hub_upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<HubQuery>,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    let Some(group) = join_group(&query) else {
        return (
            StatusCode::BAD_REQUEST,
            "userId or group query parameter required",
        )
            .into_response();
    };
    ws.on_upgrade(move |socket| serve_subscriber(socket, state.hub, group))
        .into_response()
}

/// Forwards hub events for one group to a connected client as JSON text
/// frames until either side goes away.
async fn serve_subscriber(socket: WebSocket, hub: Arc<NotificationHub>, group: String) {
    let mut events = hub.subscribe(&group);
    debug!(group = %group, "realtime subscriber connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let Ok(json) = serde_json::to_string(&event) else { continue };
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(group = %group, missed, "realtime subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                // Inbound frames are not part of the hub contract.
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
    debug!(group = %group, "realtime subscriber disconnected");
}

/// The inbound HTTP server, bound ahead of time so the composition root
/// can report the local address before serving.
pub struct HttpServer {
    listener: TcpListener,
    state: ApiState,
    shutdown_rx: watch::Receiver<bool>,
}

impl HttpServer {
    pub fn new(listener: TcpListener, state: ApiState, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            listener,
            state,
            shutdown_rx,
        }
    }

    /// Returns a future that serves requests until a shutdown signal is
    /// received.
    pub fn run(mut self) -> impl Future<Output = ()> {
        let app = router(self.state);

        async move {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => {
                    trace!("HTTP server received shutdown signal.");
                }
                result = axum::serve(self.listener, app.into_make_service()) => {
                    if let Err(e) = result {
                        error!("HTTP server error: {}", e);
                    }
                }
            }
            trace!("HTTP server task finished.");
        }
    }
}
