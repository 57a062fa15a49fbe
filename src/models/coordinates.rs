use crate::constants::EARTH_RADIUS_KM;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    /// Elevation in meters.
    pub ele: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64, ele: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                lat
            ));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                lng
            ));
        }
        Ok(Coordinates { lat, lng, ele })
    }

    /// Great-circle distance to another coordinate, in kilometers.
    ///
    /// Spherical law of cosines rather than haversine: the cosine sum is
    /// clamped so near-identical points yield exactly 0.0 instead of an
    /// `acos` domain error when rounding pushes it past 1.0.
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlng = (self.lng - other.lng).to_radians();

        let x = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlng.cos();
        if x < 1.0 {
            EARTH_RADIUS_KM * x.acos()
        } else {
            0.0
        }
    }

    /// Great-circle midpoint between two coordinates, for placing leg
    /// labels on rendered flights. Elevation is averaged.
    pub fn midpoint(&self, other: &Coordinates) -> Coordinates {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let lng1 = self.lng.to_radians();
        let dlng = (other.lng - self.lng).to_radians();

        let bx = lat2.cos() * dlng.cos();
        let by = lat2.cos() * dlng.sin();
        let lat = (lat1.sin() + lat2.sin())
            .atan2(((lat1.cos() + bx).powi(2) + by * by).sqrt());
        let lng = lng1 + by.atan2(lat1.cos() + bx);

        Coordinates {
            lat: lat.to_degrees(),
            lng: normalize_lng(lng.to_degrees()),
            ele: (self.ele + other.ele) / 2.0,
        }
    }

    /// Coordinate reached by travelling `distance_km` along `bearing_deg`
    /// (clockwise from north). Visualization helper, not used by the
    /// optimizer.
    pub fn destination(&self, bearing_deg: f64, distance_km: f64) -> Coordinates {
        let lat1 = self.lat.to_radians();
        let lng1 = self.lng.to_radians();
        let bearing = bearing_deg.to_radians();
        let angular = distance_km / EARTH_RADIUS_KM;

        let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
        let lng2 = lng1
            + (bearing.sin() * angular.sin() * lat1.cos())
                .atan2(angular.cos() - lat1.sin() * lat2.sin());

        Coordinates {
            lat: lat2.to_degrees(),
            lng: normalize_lng(lng2.to_degrees()),
            ele: self.ele,
        }
    }
}

fn normalize_lng(lng: f64) -> f64 {
    let mut lng = lng;
    while lng > 180.0 {
        lng -= 360.0;
    }
    while lng < -180.0 {
        lng += 360.0;
    }
    lng
}
