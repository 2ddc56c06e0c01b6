/// Mean Earth radius in kilometers, per spec.md §4.1.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Great-circle distance between two WGS-84 points, in kilometers.
///
/// Returns exactly `0.0` for identical inputs and is symmetric to within
/// floating-point rounding (spec.md §4.1, tested by S7). This is the crate's
/// public `earth_distance`; it also serves as the A* heuristic and as the
/// lower bound every stored edge cost must respect.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if lat1 == lat2 && lon1 == lon2 {
        return 0.0;
    }

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let dlat = lat2_rad - lat1_rad;
    let dlon = (lon2 - lon1).to_radians();

    let a =
        (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Approximate kilometers per degree of latitude, used by the k-d tree's
/// axis-aligned pruning bound (spec.md §4.3).
pub fn km_per_degree_lat() -> f64 {
    111.32
}

/// Approximate kilometers per degree of longitude at the given latitude.
pub fn km_per_degree_lon(lat_deg: f64) -> f64 {
    111.32 * lat_deg.to_radians().cos().abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_for_identical_points() {
        assert_eq!(earth_distance(52.23, 21.01, 52.23, 21.01), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = earth_distance(52.23024, 21.01062, 52.16125, 21.21147);
        let b = earth_distance(52.16125, 21.21147, 52.23024, 21.01062);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn spot_values_from_spec_s7() {
        let d1 = earth_distance(52.23024, 21.01062, 52.23852, 21.0446);
        assert!((d1 - 2.49049).abs() < 1e-5, "got {d1}");

        let d2 = earth_distance(52.23024, 21.01062, 52.16125, 21.21147);
        assert!((d2 - 15.692483).abs() < 1e-5, "got {d2}");
    }

    #[test]
    fn strictly_positive_otherwise() {
        assert!(earth_distance(0.0, 0.0, 0.0, 1.0) > 0.0);
    }
}
