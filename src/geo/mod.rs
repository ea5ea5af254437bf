use crate::models::place::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_km_raw(a.lat, a.lng, b.lat, b.lng)
}

pub fn haversine_m(a: &GeoPoint, b: &GeoPoint) -> f64 {
    haversine_km(a, b) * 1000.0
}

pub fn haversine_km_raw(lat_a: f64, lng_a: f64, lat_b: f64, lng_b: f64) -> f64 {
    let lat1 = lat_a.to_radians();
    let lat2 = lat_b.to_radians();
    let delta_lat = (lat_b - lat_a).to_radians();
    let delta_lng = (lng_b - lng_a).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    // Rounding can push h a hair past 1.0 for antipodal points.
    let central_angle = 2.0 * haversine.min(1.0).sqrt().asin();

    EARTH_RADIUS_KM * central_angle
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, haversine_m};
    use crate::models::place::GeoPoint;

    #[test]
    fn zero_distance_for_same_point() {
        let p = GeoPoint::new(23.8103, 90.4125);
        let distance = haversine_km(&p, &p);
        assert!(distance < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let pairs = [
            (GeoPoint::new(23.8103, 90.4125), GeoPoint::new(23.7939, 90.4043)),
            (GeoPoint::new(51.5074, -0.1278), GeoPoint::new(48.8566, 2.3522)),
            (GeoPoint::new(-33.8688, 151.2093), GeoPoint::new(40.7128, -74.0060)),
            (GeoPoint::new(0.0, 179.9), GeoPoint::new(0.0, -179.9)),
        ];

        for (a, b) in pairs {
            let forward = haversine_km(&a, &b);
            let backward = haversine_km(&b, &a);
            assert!((forward - backward).abs() < 1e-9, "{a:?} <-> {b:?}");
        }
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let london = GeoPoint::new(51.5074, -0.1278);
        let paris = GeoPoint::new(48.8566, 2.3522);
        let distance = haversine_km(&london, &paris);
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn short_dhaka_hop_is_about_two_km() {
        let gulshan = GeoPoint::new(23.8103, 90.4125);
        let tejgaon = GeoPoint::new(23.7939, 90.4043);
        let meters = haversine_m(&gulshan, &tejgaon);
        assert!((meters - 2005.0).abs() < 20.0, "got {meters}");
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(0.0, 180.0);
        let distance = haversine_km(&a, &b);
        assert!(distance.is_finite());
        assert!((distance - 20_015.0).abs() < 5.0);
    }
}
