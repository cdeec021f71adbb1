use super::account::AccountKind;
use super::lifecycle::{parse_or, Action, Status};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Reservation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Completed,
    Rejected,
    Cancelled,
}

impl Status for ReservationStatus {
    const ENTITY: &'static str = "reservation";

    fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Completed => "completed",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "completed" => Some(ReservationStatus::Completed),
            "rejected" => Some(ReservationStatus::Rejected),
            "cancelled" => Some(ReservationStatus::Cancelled),
            _ => None,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReservationStatus::Completed | ReservationStatus::Rejected | ReservationStatus::Cancelled
        )
    }
}

/// Endpoint-triggered reservation transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationAction {
    Confirm,
    Reject,
    Complete,
    Cancel,
}

impl ReservationAction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "confirm" => Some(ReservationAction::Confirm),
            "reject" => Some(ReservationAction::Reject),
            "complete" => Some(ReservationAction::Complete),
            "cancel" => Some(ReservationAction::Cancel),
            _ => None,
        }
    }
}

impl Action for ReservationAction {
    type State = ReservationStatus;

    fn name(&self) -> &'static str {
        match self {
            ReservationAction::Confirm => "confirm",
            ReservationAction::Reject => "reject",
            ReservationAction::Complete => "complete",
            ReservationAction::Cancel => "cancel",
        }
    }

    fn from_states(&self) -> &'static [ReservationStatus] {
        use ReservationStatus::*;
        match self {
            ReservationAction::Confirm | ReservationAction::Reject => &[Pending],
            ReservationAction::Complete => &[Confirmed],
            ReservationAction::Cancel => &[Pending, Confirmed],
        }
    }

    fn target(&self) -> ReservationStatus {
        match self {
            ReservationAction::Confirm => ReservationStatus::Confirmed,
            ReservationAction::Reject => ReservationStatus::Rejected,
            ReservationAction::Complete => ReservationStatus::Completed,
            ReservationAction::Cancel => ReservationStatus::Cancelled,
        }
    }

    fn actor(&self) -> AccountKind {
        match self {
            ReservationAction::Cancel => AccountKind::Customer,
            _ => AccountKind::Restaurant,
        }
    }
}

/// Table reservation
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub party_size: i32,
    pub reserved_for: NaiveDateTime,
    pub note: Option<String>,
    pub status: String, // Stored as TEXT, use ReservationStatus for type safety
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Reservation {
    pub fn status_enum(&self) -> ReservationStatus {
        parse_or(&self.status, ReservationStatus::Pending)
    }
}

/// Payload for booking a table
#[derive(Debug, Clone, Deserialize)]
pub struct NewReservation {
    pub restaurant_id: Uuid,
    pub party_size: i32,
    pub reserved_for: NaiveDateTime,
    pub note: Option<String>,
}

impl NewReservation {
    pub fn validate(&self, now: NaiveDateTime) -> Result<(), String> {
        if !(1..=50).contains(&self.party_size) {
            return Err("Party size must be between 1 and 50".to_string());
        }
        if self.reserved_for <= now {
            return Err("Reservation time must be in the future".to_string());
        }
        Ok(())
    }
}
