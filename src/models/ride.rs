use super::account::{AccountKind, Location};
use super::lifecycle::{parse_or, Action, Status};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Ride request status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    Requested,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl Status for RideStatus {
    const ENTITY: &'static str = "ride";

    fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Accepted => "accepted",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "requested" => Some(RideStatus::Requested),
            "accepted" => Some(RideStatus::Accepted),
            "in_progress" => Some(RideStatus::InProgress),
            "completed" => Some(RideStatus::Completed),
            "cancelled" => Some(RideStatus::Cancelled),
            _ => None,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }
}

/// Endpoint-triggered ride transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideAction {
    /// Driver claims a requested ride
    Accept,
    Start,
    Complete,
    CancelByCustomer,
    CancelByDriver,
}

impl Action for RideAction {
    type State = RideStatus;

    fn name(&self) -> &'static str {
        match self {
            RideAction::Accept => "accept",
            RideAction::Start => "start",
            RideAction::Complete => "complete",
            RideAction::CancelByCustomer | RideAction::CancelByDriver => "cancel",
        }
    }

    fn from_states(&self) -> &'static [RideStatus] {
        use RideStatus::*;
        match self {
            RideAction::Accept => &[Requested],
            RideAction::Start => &[Accepted],
            RideAction::Complete => &[InProgress],
            RideAction::CancelByCustomer => &[Requested, Accepted],
            RideAction::CancelByDriver => &[Accepted],
        }
    }

    fn target(&self) -> RideStatus {
        match self {
            RideAction::Accept => RideStatus::Accepted,
            RideAction::Start => RideStatus::InProgress,
            RideAction::Complete => RideStatus::Completed,
            RideAction::CancelByCustomer | RideAction::CancelByDriver => RideStatus::Cancelled,
        }
    }

    fn actor(&self) -> AccountKind {
        match self {
            RideAction::CancelByCustomer => AccountKind::Customer,
            _ => AccountKind::Driver,
        }
    }
}

/// A pickup or dropoff point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
}

impl Waypoint {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Ride request
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Ride {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub pickup_latitude: f64,
    pub pickup_longitude: f64,
    pub pickup_address: String,
    pub dropoff_latitude: f64,
    pub dropoff_longitude: f64,
    pub dropoff_address: String,
    pub distance_km: Decimal,
    pub duration_min: i32,
    pub fare: Decimal,
    pub status: String, // Stored as TEXT, use RideStatus for type safety
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Ride {
    pub fn status_enum(&self) -> RideStatus {
        parse_or(&self.status, RideStatus::Requested)
    }

    /// Whether `kind`/`id` is a party to this ride
    pub fn involves(&self, kind: AccountKind, id: Uuid) -> bool {
        match kind {
            AccountKind::Customer => self.customer_id == id,
            AccountKind::Driver => self.driver_id == Some(id),
            _ => false,
        }
    }
}

/// Payload for estimating or requesting a ride
#[derive(Debug, Clone, Deserialize)]
pub struct RideQuote {
    pub pickup: Waypoint,
    pub dropoff: Waypoint,
}

impl RideQuote {
    pub fn validate(&self) -> Result<(), String> {
        self.pickup.location().validate()?;
        self.dropoff.location().validate()?;
        if self.pickup.location() == self.dropoff.location() {
            return Err("Pickup and dropoff must differ".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut status = RideStatus::Requested;
        for action in [RideAction::Accept, RideAction::Start, RideAction::Complete] {
            status = action.apply(status).unwrap();
        }
        assert_eq!(status, RideStatus::Completed);
    }

    #[test]
    fn test_double_accept_rejected() {
        let status = RideAction::Accept.apply(RideStatus::Requested).unwrap();
        let err = RideAction::Accept.apply(status).unwrap_err();
        assert_eq!(err.from, "accepted");
    }

    #[test]
    fn test_cancel_rules() {
        assert!(RideAction::CancelByCustomer.apply(RideStatus::Requested).is_ok());
        assert!(RideAction::CancelByCustomer.apply(RideStatus::Accepted).is_ok());
        assert!(RideAction::CancelByCustomer.apply(RideStatus::InProgress).is_err());
        assert!(RideAction::CancelByDriver.apply(RideStatus::Requested).is_err());
        assert!(RideAction::CancelByDriver.apply(RideStatus::Accepted).is_ok());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(RideStatus::InProgress.as_str(), "in_progress");
        assert_eq!(RideStatus::parse("in_progress"), Some(RideStatus::InProgress));
        assert_eq!(
            serde_json::to_string(&RideStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn test_quote_validation() {
        let point = |lat, lng| Waypoint { latitude: lat, longitude: lng, address: String::new() };
        let quote = RideQuote { pickup: point(40.0, -74.0), dropoff: point(40.1, -74.1) };
        assert!(quote.validate().is_ok());

        let same = RideQuote { pickup: point(40.0, -74.0), dropoff: point(40.0, -74.0) };
        assert!(same.validate().is_err());

        let bad = RideQuote { pickup: point(100.0, 0.0), dropoff: point(40.0, -74.0) };
        assert!(bad.validate().is_err());
    }
}
