use crate::models::fare::FareEstimate;
use crate::models::route::RouteResult;
use crate::models::vehicle::{VehicleClass, find_vehicle};

/// Prices a trip for a catalog vehicle. Returns `None` for unknown keys.
///
/// `total = base + per_km * km + per_min * min`, never below the base fare.
pub fn estimate(vehicle_key: &str, distance_km: f64, duration_min: f64) -> Option<FareEstimate> {
    let vehicle = find_vehicle(vehicle_key)?;
    Some(price(vehicle, distance_km, duration_min))
}

pub fn estimate_for_route(vehicle_key: &str, route: &RouteResult) -> Option<FareEstimate> {
    estimate(vehicle_key, route.distance_km(), route.duration_min())
}

fn price(vehicle: &VehicleClass, distance_km: f64, duration_min: f64) -> FareEstimate {
    let distance_fare = vehicle.per_km_rate * distance_km;
    let time_fare = vehicle.per_minute_rate * duration_min;
    let total = (vehicle.base_fare + distance_fare + time_fare).max(vehicle.base_fare);

    FareEstimate {
        vehicle_key: vehicle.key.to_string(),
        distance_km,
        duration_min,
        base_fare: vehicle.base_fare,
        distance_fare,
        time_fare,
        total,
    }
}
