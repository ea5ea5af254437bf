use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::fare::FareEstimate;
use crate::models::place::GeoPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideRequestPayload {
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
    pub vehicle: String,
    pub payment: String,
    pub estimate: FareEstimate,
    pub eta_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RideStatus {
    Pending,
    Accepted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedRide {
    pub id: Uuid,
    pub session_id: Uuid,
    pub payload: RideRequestPayload,
    pub status: RideStatus,
    pub submitted_at: DateTime<Utc>,
}
