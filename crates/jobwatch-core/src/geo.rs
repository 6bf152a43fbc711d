//! Distance and travel-time estimates from a home location.

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0088;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Rough driving time at a constant average speed. `None` for unknown
/// distance or a non-positive speed.
pub fn travel_time_minutes(distance_km: Option<f64>, speed_kmh: f64) -> Option<u32> {
    let distance_km = distance_km?;
    if speed_kmh <= 0.0 {
        return None;
    }
    Some((distance_km / speed_kmh * 60.0).round().max(0.0) as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceBand {
    Near,
    Mid,
    Far,
    Unknown,
}

impl DistanceBand {
    pub fn classify(distance_km: Option<f64>, near_km: u32, mid_km: u32) -> Self {
        match distance_km {
            None => DistanceBand::Unknown,
            Some(d) if d <= f64::from(near_km) => DistanceBand::Near,
            Some(d) if d <= f64::from(mid_km) => DistanceBand::Mid,
            Some(_) => DistanceBand::Far,
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            DistanceBand::Near => "band-near",
            DistanceBand::Mid => "band-mid",
            DistanceBand::Far => "band-far",
            DistanceBand::Unknown => "band-unknown",
        }
    }
}
