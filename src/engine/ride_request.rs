use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::fare::estimate_for_route;
use crate::error::AppError;
use crate::geo::haversine_m;
use crate::geocoding::suggestions::SuggestionFeed;
use crate::models::fare::FareEstimate;
use crate::models::place::GeoPoint;
use crate::models::ride::RideRequestPayload;
use crate::models::route::RouteResult;
use crate::models::vehicle::{
    PaymentMethod, VehicleClass, default_payment, default_vehicle, find_payment, find_vehicle,
};

pub const ROUTE_FAILED_NOTICE: &str = "Failed to calculate route.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Pickup,
    Dropoff,
}

impl Endpoint {
    pub const fn default_label(self) -> &'static str {
        match self {
            Endpoint::Pickup => "Pickup",
            Endpoint::Dropoff => "Dropoff",
        }
    }
}

/// Derived from which data is present; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RideRequestState {
    NoPickup,
    HasPickup,
    HasPickupAndDropoff,
    RouteComputing,
    RouteReady,
}

/// Issued whenever both endpoints are known. A route computed for a ticket
/// is only accepted while the ticket's generation is still the pending one.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTicket {
    pub generation: u64,
    pub pickup: GeoPoint,
    pub dropoff: GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Applied,
    Stale,
    Unusable,
}

#[derive(Debug, Clone)]
pub struct RideRequest {
    id: Uuid,
    pickup: Option<GeoPoint>,
    dropoff: Option<GeoPoint>,
    vehicle: &'static VehicleClass,
    payment: &'static PaymentMethod,
    route: Option<RouteResult>,
    estimate: Option<FareEstimate>,
    route_generation: u64,
    pending_route: Option<u64>,
    notice: Option<String>,
    pickup_suggestions: SuggestionFeed,
    dropoff_suggestions: SuggestionFeed,
    submitted_ride: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RideRequestView {
    pub id: Uuid,
    pub state: RideRequestState,
    pub pickup: Option<GeoPoint>,
    pub dropoff: Option<GeoPoint>,
    pub vehicle: &'static str,
    pub payment: &'static str,
    pub route: Option<RouteResult>,
    pub estimate: Option<FareEstimate>,
    pub fare_display: Option<String>,
    pub distance_km: Option<f64>,
    pub eta_minutes: Option<u32>,
    pub can_submit: bool,
    pub submitted_ride: Option<Uuid>,
    pub notice: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RideRequest {
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            pickup: None,
            dropoff: None,
            vehicle: default_vehicle(),
            payment: default_payment(),
            route: None,
            estimate: None,
            route_generation: 0,
            pending_route: None,
            notice: None,
            pickup_suggestions: SuggestionFeed::default(),
            dropoff_suggestions: SuggestionFeed::default(),
            submitted_ride: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn submitted_ride(&self) -> Option<Uuid> {
        self.submitted_ride
    }

    pub fn pickup(&self) -> Option<&GeoPoint> {
        self.pickup.as_ref()
    }

    pub fn dropoff(&self) -> Option<&GeoPoint> {
        self.dropoff.as_ref()
    }

    pub fn route(&self) -> Option<&RouteResult> {
        self.route.as_ref()
    }

    pub fn estimate(&self) -> Option<&FareEstimate> {
        self.estimate.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn state(&self) -> RideRequestState {
        match (&self.pickup, &self.dropoff) {
            (None, _) => RideRequestState::NoPickup,
            (Some(_), None) => RideRequestState::HasPickup,
            (Some(_), Some(_)) if self.pending_route.is_some() => RideRequestState::RouteComputing,
            (Some(_), Some(_)) if self.route.is_some() => RideRequestState::RouteReady,
            (Some(_), Some(_)) => RideRequestState::HasPickupAndDropoff,
        }
    }

    /// Which endpoint an untargeted selection (a map click) should fill:
    /// pickup, then dropoff, then whichever existing endpoint is nearer.
    pub fn target_for(&self, point: &GeoPoint) -> Endpoint {
        match (&self.pickup, &self.dropoff) {
            (None, _) => Endpoint::Pickup,
            (Some(_), None) => Endpoint::Dropoff,
            (Some(pickup), Some(dropoff)) => {
                if haversine_m(pickup, point) < haversine_m(dropoff, point) {
                    Endpoint::Pickup
                } else {
                    Endpoint::Dropoff
                }
            }
        }
    }

    /// Replaces one endpoint. Any previous route and estimate are dropped;
    /// a ticket is returned when both endpoints are now known.
    pub fn set_endpoint(&mut self, endpoint: Endpoint, point: GeoPoint) -> Option<RouteTicket> {
        match endpoint {
            Endpoint::Pickup => self.pickup = Some(point),
            Endpoint::Dropoff => self.dropoff = Some(point),
        }
        self.suggestions_mut(endpoint).clear();

        self.route = None;
        self.estimate = None;
        self.route_generation += 1;
        self.touch();

        match (&self.pickup, &self.dropoff) {
            (Some(pickup), Some(dropoff)) => {
                self.pending_route = Some(self.route_generation);
                Some(RouteTicket {
                    generation: self.route_generation,
                    pickup: pickup.clone(),
                    dropoff: dropoff.clone(),
                })
            }
            _ => {
                self.pending_route = None;
                None
            }
        }
    }

    pub fn apply_route(&mut self, ticket: &RouteTicket, route: RouteResult) -> RouteOutcome {
        if self.pending_route != Some(ticket.generation) {
            return RouteOutcome::Stale;
        }

        self.pending_route = None;
        self.touch();

        if !route.is_usable() {
            self.route = None;
            self.estimate = None;
            self.notice = Some(ROUTE_FAILED_NOTICE.to_string());
            return RouteOutcome::Unusable;
        }

        self.estimate = estimate_for_route(self.vehicle.key, &route);
        self.route = Some(route);
        self.notice = None;
        RouteOutcome::Applied
    }

    /// Switches vehicle class and reprices the current route in place.
    pub fn set_vehicle(&mut self, key: &str) -> Result<(), AppError> {
        let vehicle =
            find_vehicle(key).ok_or_else(|| AppError::BadRequest(format!("unknown vehicle: {key}")))?;

        self.vehicle = vehicle;
        self.estimate = self
            .route
            .as_ref()
            .and_then(|route| estimate_for_route(vehicle.key, route));
        self.touch();
        Ok(())
    }

    pub fn set_payment(&mut self, key: &str) -> Result<(), AppError> {
        self.payment = find_payment(key)
            .ok_or_else(|| AppError::BadRequest(format!("unknown payment method: {key}")))?;
        self.touch();
        Ok(())
    }

    pub fn set_notice(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
        self.touch();
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
        self.touch();
    }

    pub fn suggestions(&self, endpoint: Endpoint) -> &SuggestionFeed {
        match endpoint {
            Endpoint::Pickup => &self.pickup_suggestions,
            Endpoint::Dropoff => &self.dropoff_suggestions,
        }
    }

    pub fn suggestions_mut(&mut self, endpoint: Endpoint) -> &mut SuggestionFeed {
        match endpoint {
            Endpoint::Pickup => &mut self.pickup_suggestions,
            Endpoint::Dropoff => &mut self.dropoff_suggestions,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.submission().is_ok()
    }

    /// Builds the hand-off payload. Every part must be present, no route
    /// computation may be outstanding and the session must not have been
    /// handed off already.
    pub fn submission(&self) -> Result<RideRequestPayload, AppError> {
        if let Some(ride_id) = self.submitted_ride {
            return Err(AppError::AlreadySubmitted(ride_id));
        }

        let pickup = self
            .pickup
            .as_ref()
            .ok_or_else(|| AppError::Incomplete("pickup is not set".to_string()))?;
        let dropoff = self
            .dropoff
            .as_ref()
            .ok_or_else(|| AppError::Incomplete("dropoff is not set".to_string()))?;

        if self.pending_route.is_some() {
            return Err(AppError::Incomplete("route is still being calculated".to_string()));
        }

        let route = self
            .route
            .as_ref()
            .ok_or_else(|| AppError::Incomplete("no route available".to_string()))?;
        let estimate = self
            .estimate
            .as_ref()
            .ok_or_else(|| AppError::Incomplete("no fare estimate available".to_string()))?;

        Ok(RideRequestPayload {
            pickup: pickup.clone(),
            dropoff: dropoff.clone(),
            vehicle: self.vehicle.key.to_string(),
            payment: self.payment.key.to_string(),
            estimate: estimate.clone(),
            eta_minutes: route.eta_minutes(),
        })
    }

    /// Builds the payload and records `ride_id` as this session's ride in
    /// one step, so a session yields at most one ride.
    pub fn claim_submission(&mut self, ride_id: Uuid) -> Result<RideRequestPayload, AppError> {
        let payload = self.submission()?;
        self.submitted_ride = Some(ride_id);
        self.touch();
        Ok(payload)
    }

    /// Undoes a claim whose hand-off failed.
    pub fn release_submission(&mut self, ride_id: Uuid) {
        if self.submitted_ride == Some(ride_id) {
            self.submitted_ride = None;
            self.touch();
        }
    }

    pub fn view(&self) -> RideRequestView {
        RideRequestView {
            id: self.id,
            state: self.state(),
            pickup: self.pickup.clone(),
            dropoff: self.dropoff.clone(),
            vehicle: self.vehicle.key,
            payment: self.payment.key,
            route: self.route.clone(),
            estimate: self.estimate.clone(),
            fare_display: self.estimate.as_ref().map(FareEstimate::display_total),
            distance_km: self.route.as_ref().map(RouteResult::distance_km),
            eta_minutes: self.route.as_ref().map(RouteResult::eta_minutes),
            can_submit: self.can_submit(),
            submitted_ride: self.submitted_ride,
            notice: self.notice.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{Endpoint, RideRequest, RideRequestState, RouteOutcome, ROUTE_FAILED_NOTICE};
    use crate::error::AppError;
    use crate::models::place::GeoPoint;
    use crate::models::route::{RouteResult, RouteSource};

    fn gulshan() -> GeoPoint {
        GeoPoint::labelled(23.8103, 90.4125, "Gulshan")
    }

    fn tejgaon() -> GeoPoint {
        GeoPoint::labelled(23.7939, 90.4043, "Tejgaon")
    }

    fn routed(distance_meters: f64, duration_sec: f64) -> RouteResult {
        RouteResult {
            distance_meters,
            duration_sec,
            polyline: vec![gulshan(), tejgaon()],
            source: RouteSource::Routed,
        }
    }

    #[test]
    fn states_follow_selection() {
        let mut request = RideRequest::new(Uuid::new_v4());
        assert_eq!(request.state(), RideRequestState::NoPickup);

        assert!(request.set_endpoint(Endpoint::Pickup, gulshan()).is_none());
        assert_eq!(request.state(), RideRequestState::HasPickup);

        let ticket = request.set_endpoint(Endpoint::Dropoff, tejgaon()).unwrap();
        assert_eq!(request.state(), RideRequestState::RouteComputing);

        assert_eq!(request.apply_route(&ticket, routed(2400.0, 480.0)), RouteOutcome::Applied);
        assert_eq!(request.state(), RideRequestState::RouteReady);
    }

    #[test]
    fn untargeted_selection_fills_pickup_then_dropoff_then_nearest() {
        let mut request = RideRequest::new(Uuid::new_v4());
        let click = GeoPoint::new(23.80, 90.41);

        assert_eq!(request.target_for(&click), Endpoint::Pickup);
        request.set_endpoint(Endpoint::Pickup, gulshan());
        assert_eq!(request.target_for(&click), Endpoint::Dropoff);
        request.set_endpoint(Endpoint::Dropoff, tejgaon());

        let near_pickup = GeoPoint::new(23.8110, 90.4130);
        let near_dropoff = GeoPoint::new(23.7930, 90.4040);
        assert_eq!(request.target_for(&near_pickup), Endpoint::Pickup);
        assert_eq!(request.target_for(&near_dropoff), Endpoint::Dropoff);
    }

    #[test]
    fn stale_route_does_not_overwrite_newer_pair() {
        let mut request = RideRequest::new(Uuid::new_v4());
        request.set_endpoint(Endpoint::Pickup, gulshan());
        let first = request.set_endpoint(Endpoint::Dropoff, tejgaon()).unwrap();
        let second = request
            .set_endpoint(Endpoint::Dropoff, GeoPoint::labelled(23.7330, 90.4172, "Motijheel"))
            .unwrap();

        assert_eq!(request.apply_route(&first, routed(2400.0, 480.0)), RouteOutcome::Stale);
        assert_eq!(request.state(), RideRequestState::RouteComputing);
        assert!(request.route().is_none());

        assert_eq!(request.apply_route(&second, routed(9100.0, 1500.0)), RouteOutcome::Applied);
        assert_eq!(request.route().unwrap().distance_meters, 9100.0);
    }

    #[test]
    fn vehicle_change_reprices_without_new_route() {
        let mut request = RideRequest::new(Uuid::new_v4());
        request.set_endpoint(Endpoint::Pickup, gulshan());
        let ticket = request.set_endpoint(Endpoint::Dropoff, tejgaon()).unwrap();
        request.apply_route(&ticket, routed(2400.0, 480.0));

        let car_total = request.estimate().unwrap().total;
        request.set_vehicle("premium").unwrap();
        let premium = request.estimate().unwrap();

        assert_eq!(premium.vehicle_key, "premium");
        assert!(premium.total > car_total);
        assert_eq!(request.state(), RideRequestState::RouteReady);
        assert_eq!(request.route().unwrap().distance_meters, 2400.0);
    }

    #[test]
    fn unknown_vehicle_and_payment_are_rejected() {
        let mut request = RideRequest::new(Uuid::new_v4());
        assert!(matches!(request.set_vehicle("hovercraft"), Err(AppError::BadRequest(_))));
        assert!(matches!(request.set_payment("cheque"), Err(AppError::BadRequest(_))));
        assert!(request.set_payment("bkash").is_ok());
    }

    #[test]
    fn unusable_route_records_notice() {
        let mut request = RideRequest::new(Uuid::new_v4());
        request.set_endpoint(Endpoint::Pickup, gulshan());
        let ticket = request.set_endpoint(Endpoint::Dropoff, tejgaon()).unwrap();

        let outcome = request.apply_route(&ticket, routed(f64::NAN, f64::NAN));

        assert_eq!(outcome, RouteOutcome::Unusable);
        assert_eq!(request.state(), RideRequestState::HasPickupAndDropoff);
        assert_eq!(request.notice(), Some(ROUTE_FAILED_NOTICE));
        assert!(!request.can_submit());

        request.dismiss_notice();
        assert!(request.notice().is_none());
    }

    #[test]
    fn submission_requires_a_complete_request() {
        let mut request = RideRequest::new(Uuid::new_v4());
        assert!(matches!(request.submission(), Err(AppError::Incomplete(_))));

        request.set_endpoint(Endpoint::Pickup, gulshan());
        let ticket = request.set_endpoint(Endpoint::Dropoff, tejgaon()).unwrap();
        assert!(!request.can_submit(), "route still computing");

        request.apply_route(&ticket, routed(2400.0, 480.0));
        let payload = request.submission().unwrap();

        assert_eq!(payload.vehicle, "car");
        assert_eq!(payload.payment, "cash");
        assert_eq!(payload.eta_minutes, 8);
        assert!((payload.estimate.total - 109.6).abs() < 1e-9);
    }

    #[test]
    fn identical_endpoints_are_still_routed() {
        let mut request = RideRequest::new(Uuid::new_v4());
        request.set_endpoint(Endpoint::Pickup, gulshan());
        let ticket = request.set_endpoint(Endpoint::Dropoff, gulshan());
        assert!(ticket.is_some());
    }

    #[test]
    fn session_yields_at_most_one_ride() {
        let mut request = RideRequest::new(Uuid::new_v4());
        request.set_endpoint(Endpoint::Pickup, gulshan());
        let ticket = request.set_endpoint(Endpoint::Dropoff, tejgaon()).unwrap();
        request.apply_route(&ticket, routed(2400.0, 480.0));

        let ride_id = Uuid::new_v4();
        assert!(request.claim_submission(ride_id).is_ok());
        assert_eq!(request.submitted_ride(), Some(ride_id));
        assert!(!request.can_submit());
        assert!(matches!(
            request.claim_submission(Uuid::new_v4()),
            Err(AppError::AlreadySubmitted(id)) if id == ride_id
        ));
    }

    #[test]
    fn released_claim_can_be_retried() {
        let mut request = RideRequest::new(Uuid::new_v4());
        request.set_endpoint(Endpoint::Pickup, gulshan());
        let ticket = request.set_endpoint(Endpoint::Dropoff, tejgaon()).unwrap();
        request.apply_route(&ticket, routed(2400.0, 480.0));

        let first = Uuid::new_v4();
        request.claim_submission(first).unwrap();
        request.release_submission(Uuid::new_v4());
        assert!(!request.can_submit(), "only the claiming ride may release");

        request.release_submission(first);
        assert!(request.can_submit());
    }
}
