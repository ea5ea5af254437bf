//! Catalog-based fare estimator.
//!
//! A self-contained sibling of the map flow: no geocoding, no routing, a
//! flat `base + per_km` model per vehicle type and great-circle distance
//! floored at one kilometre.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::haversine_km_raw;

const MIN_DISTANCE_KM: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandaloneVehicle {
    Bus,
    #[serde(rename = "CNG")]
    Cng,
    #[serde(rename = "Auto Rickshaw")]
    AutoRickshaw,
    Car,
    Bike,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlatPricing {
    pub base: f64,
    pub per_km: f64,
}

impl StandaloneVehicle {
    pub const ALL: [StandaloneVehicle; 5] = [
        StandaloneVehicle::Bus,
        StandaloneVehicle::Cng,
        StandaloneVehicle::AutoRickshaw,
        StandaloneVehicle::Car,
        StandaloneVehicle::Bike,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            StandaloneVehicle::Bus => "Bus",
            StandaloneVehicle::Cng => "CNG",
            StandaloneVehicle::AutoRickshaw => "Auto Rickshaw",
            StandaloneVehicle::Car => "Car",
            StandaloneVehicle::Bike => "Bike",
        }
    }

    pub const fn pricing(self) -> FlatPricing {
        match self {
            StandaloneVehicle::Bus => FlatPricing { base: 20.0, per_km: 5.0 },
            StandaloneVehicle::Cng => FlatPricing { base: 40.0, per_km: 18.0 },
            StandaloneVehicle::AutoRickshaw => FlatPricing { base: 30.0, per_km: 15.0 },
            StandaloneVehicle::Car => FlatPricing { base: 60.0, per_km: 22.0 },
            StandaloneVehicle::Bike => FlatPricing { base: 25.0, per_km: 12.0 },
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|vehicle| vehicle.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CatalogPlace {
    pub id: u32,
    pub location: &'static str,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

const fn place(id: u32, location: &'static str, lat: f64, lng: f64) -> CatalogPlace {
    CatalogPlace {
        id,
        location,
        lat: Some(lat),
        lng: Some(lng),
    }
}

pub const DHAKA_PLACES: &[CatalogPlace] = &[
    place(1, "Uttara", 23.8759, 90.3795),
    place(2, "Motijheel", 23.7330, 90.4172),
    place(3, "Dhanmondi", 23.7465, 90.3760),
    place(4, "Gulshan", 23.7925, 90.4078),
    place(5, "Mirpur", 23.8223, 90.3654),
    place(6, "Banani", 23.7940, 90.4043),
    place(7, "Mohakhali", 23.7781, 90.4057),
    place(8, "Farmgate", 23.7577, 90.3897),
    place(9, "Shyamoli", 23.7747, 90.3653),
    place(10, "Bashundhara R/A", 23.8193, 90.4526),
    place(11, "Rampura", 23.7612, 90.4203),
    place(12, "Khilgaon", 23.7516, 90.4266),
    place(13, "Jatrabari", 23.7104, 90.4345),
    place(14, "Kamalapur", 23.7320, 90.4260),
    place(15, "Paltan", 23.7361, 90.4126),
    place(16, "New Market", 23.7335, 90.3847),
];

#[derive(Debug, Error, PartialEq)]
pub enum EstimateError {
    #[error("Please select From, To, and Vehicle Type.")]
    MissingSelection,

    #[error("Departure and destination cannot be the same.")]
    SameEndpoints,

    #[error("unknown vehicle type: {0}")]
    UnknownVehicle(String),

    #[error("unknown place: {0}")]
    UnknownPlace(String),

    #[error("Selected locations are missing coordinates.")]
    MissingCoordinates,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StandaloneQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub vehicle_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandaloneEstimate {
    pub vehicle_type: StandaloneVehicle,
    pub distance_km: f64,
    pub base: f64,
    pub distance_fare: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct StandaloneEstimator {
    places: &'static [CatalogPlace],
}

impl Default for StandaloneEstimator {
    fn default() -> Self {
        Self::new(DHAKA_PLACES)
    }
}

impl StandaloneEstimator {
    pub const fn new(places: &'static [CatalogPlace]) -> Self {
        Self { places }
    }

    pub fn places(&self) -> &'static [CatalogPlace] {
        self.places
    }

    pub fn estimate(&self, query: &StandaloneQuery) -> Result<StandaloneEstimate, EstimateError> {
        let from = selected(&query.from).ok_or(EstimateError::MissingSelection)?;
        let to = selected(&query.to).ok_or(EstimateError::MissingSelection)?;
        let vehicle_name = selected(&query.vehicle_type).ok_or(EstimateError::MissingSelection)?;

        if from == to {
            return Err(EstimateError::SameEndpoints);
        }

        let vehicle = StandaloneVehicle::from_name(vehicle_name)
            .ok_or_else(|| EstimateError::UnknownVehicle(vehicle_name.to_string()))?;

        let (from_lat, from_lng) = self.coordinates(from)?;
        let (to_lat, to_lng) = self.coordinates(to)?;

        let distance_km = haversine_km_raw(from_lat, from_lng, to_lat, to_lng).max(MIN_DISTANCE_KM);
        let FlatPricing { base, per_km } = vehicle.pricing();
        let distance_fare = per_km * distance_km;

        Ok(StandaloneEstimate {
            vehicle_type: vehicle,
            distance_km: (distance_km * 100.0).round() / 100.0,
            base,
            distance_fare: distance_fare.round(),
            total: (base + distance_fare).round(),
        })
    }

    fn coordinates(&self, location: &str) -> Result<(f64, f64), EstimateError> {
        let place = self
            .places
            .iter()
            .find(|place| place.location == location)
            .ok_or_else(|| EstimateError::UnknownPlace(location.to_string()))?;

        match (place.lat, place.lng) {
            (Some(lat), Some(lng)) => Ok((lat, lng)),
            _ => Err(EstimateError::MissingCoordinates),
        }
    }
}

fn selected(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}
