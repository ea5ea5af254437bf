use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| stream_ride_events(socket, state))
}

/// Pushes every accepted ride to the client as JSON until either side hangs up.
async fn stream_ride_events(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rides = state.ride_events_tx.subscribe();

    info!("ride event subscriber connected");

    let send_task = tokio::spawn(async move {
        loop {
            let ride = match rides.recv().await {
                Ok(ride) => ride,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "ride event subscriber lagging; events dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let json = match serde_json::to_string(&ride) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, ride_id = %ride.id, "failed to serialize ride event");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!("ride event subscriber disconnected");
}
