use crate::state::AppState;
use a2a_relay::models::event::RunEvent;
use a2a_relay::models::run::RunInput;
use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{stream::StreamExt, Stream};
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

// Server-sent events carrying the relayed run events
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
            ],
            Body::from_stream(self),
        )
            .into_response()
    }
}

fn format_event(event: &RunEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(json) => Some(format!("data: {}\n\n", json)),
        Err(e) => {
            tracing::error!("Failed to encode {} event: {}", event.kind(), e);
            None
        }
    }
}

async fn handler(State(state): State<AppState>, Json(input): Json<RunInput>) -> SseResponse {
    // Create channel for streaming
    let (tx, rx) = mpsc::channel(100);
    let stream = ReceiverStream::new(rx);

    tracing::info!(thread_id = %input.thread_id, run_id = %input.run_id, "starting run");
    let mut events = state.relay.run(input);

    // Spawn task to handle streaming
    tokio::spawn(async move {
        loop {
            tokio::select! {
                response = timeout(Duration::from_millis(500), events.next()) => {
                    match response {
                        Ok(Some(Ok(event))) => {
                            let Some(frame) = format_event(&event) else {
                                continue;
                            };
                            if let Err(e) = tx.send(frame).await {
                                tracing::error!("Error sending event through channel: {}", e);
                                break;
                            }
                        }
                        Ok(Some(Err(e))) => {
                            // The RUN_ERROR event has already been forwarded
                            tracing::error!("Run failed: {}", e);
                            break;
                        }
                        Ok(None) => {
                            break;
                        }
                        Err(_) => { // Heartbeat, used to detect disconnected clients and stop forwarding.
                            if tx.is_closed() {
                                tracing::debug!("client disconnected, dropping run stream");
                                break;
                            }
                            continue;
                        }
                    }
                }
            }
        }
    });

    SseResponse::new(stream)
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/run", post(handler))
        .with_state(state)
}
