//! Ride fare estimation.
//!
//! `fare = max(minimum, base + per_km * distance + per_minute * duration)`.
//! Distance is the great-circle distance between pickup and dropoff and the
//! duration assumes a constant average speed. There is no surge or zoning.

use crate::config::FareConfig;
use crate::models::Location;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Breakdown returned to clients and stored on the ride
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FareEstimate {
    pub distance_km: Decimal,
    pub duration_min: i32,
    pub base: Decimal,
    pub distance_charge: Decimal,
    pub time_charge: Decimal,
    pub fare: Decimal,
}

/// Great-circle distance in kilometres
pub fn haversine_km(from: Location, to: Location) -> f64 {
    let (lat1, lat2) = (from.latitude.to_radians(), to.latitude.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Linear fare calculator
#[derive(Debug, Clone)]
pub struct FareCalculator {
    config: FareConfig,
}

impl FareCalculator {
    pub fn new(config: FareConfig) -> Self {
        Self { config }
    }

    /// Travel time in whole minutes, at least one
    pub fn duration_min(&self, distance_km: f64) -> i32 {
        let minutes = (distance_km / self.config.average_speed_kmh * 60.0).ceil();
        (minutes as i32).max(1)
    }

    /// Fare for an explicit distance and duration
    pub fn fare(&self, distance_km: Decimal, duration_min: i32) -> FareEstimate {
        let distance_charge = (self.config.per_km * distance_km).round_dp(2);
        let time_charge = (self.config.per_minute * Decimal::from(duration_min)).round_dp(2);
        let fare = (self.config.base + distance_charge + time_charge).max(self.config.minimum);

        FareEstimate {
            distance_km,
            duration_min,
            base: self.config.base,
            distance_charge,
            time_charge,
            fare: fare.round_dp(2),
        }
    }

    /// Fare between two points
    pub fn estimate(&self, pickup: Location, dropoff: Location) -> FareEstimate {
        let km = haversine_km(pickup, dropoff);
        let distance_km = Decimal::from_f64(km).unwrap_or_default().round_dp(2);
        self.fare(distance_km, self.duration_min(km))
    }
}
