use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareEstimate {
    pub vehicle_key: String,
    pub distance_km: f64,
    pub duration_min: f64,
    pub base_fare: f64,
    pub distance_fare: f64,
    pub time_fare: f64,
    pub total: f64,
}

impl FareEstimate {
    /// Whole-taka rendering used by rider-facing surfaces.
    pub fn display_total(&self) -> String {
        format!("৳ {:.0}", self.total)
    }
}
