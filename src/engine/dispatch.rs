use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::ride::{RideStatus, SubmittedRide};
use crate::state::AppState;

pub async fn enqueue_ride(state: &AppState, ride: SubmittedRide) -> Result<(), AppError> {
    state
        .ride_tx
        .send(ride)
        .await
        .map_err(|err| AppError::Internal(format!("ride queue send failed: {err}")))?;

    state.metrics.rides_in_queue.inc();
    state.metrics.rides_submitted_total.inc();
    Ok(())
}

/// Consumes submitted rides, marks them accepted and fans them out to
/// live subscribers.
pub async fn run_dispatch_worker(state: Arc<AppState>, mut ride_rx: mpsc::Receiver<SubmittedRide>) {
    info!("dispatch worker started");

    while let Some(ride) = ride_rx.recv().await {
        state.metrics.rides_in_queue.dec();

        let accepted = match state.rides.get_mut(&ride.id) {
            Some(mut entry) => {
                entry.status = RideStatus::Accepted;
                entry.clone()
            }
            None => {
                warn!(ride_id = %ride.id, "submitted ride vanished before dispatch");
                continue;
            }
        };

        let _ = state.ride_events_tx.send(accepted.clone());

        info!(
            ride_id = %accepted.id,
            session_id = %accepted.session_id,
            vehicle = %accepted.payload.vehicle,
            total = accepted.payload.estimate.total,
            "ride accepted for dispatch"
        );
    }

    warn!("dispatch worker stopped: ride queue closed");
}
