use serde::{Deserialize, Serialize};

use crate::models::place::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    /// Geometry and totals came from the routing service.
    Routed,
    /// Great-circle estimate synthesized when the routing service failed.
    StraightLine,
}

/// A complete driving route. Partial results are never represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub distance_meters: f64,
    pub duration_sec: f64,
    pub polyline: Vec<GeoPoint>,
    pub source: RouteSource,
}

impl RouteResult {
    pub fn distance_km(&self) -> f64 {
        self.distance_meters / 1000.0
    }

    pub fn duration_min(&self) -> f64 {
        self.duration_sec / 60.0
    }

    pub fn eta_minutes(&self) -> u32 {
        self.duration_min().round().max(0.0) as u32
    }

    /// False when even the fallback could not produce finite totals.
    pub fn is_usable(&self) -> bool {
        self.distance_meters.is_finite() && self.duration_sec.is_finite()
    }
}
