use super::account::AccountKind;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// What was rated: a delivered order or a completed ride
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    Order,
    Ride,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Order => "order",
            SubjectKind::Ride => "ride",
        }
    }

    /// Account kinds that can be rated for this subject
    pub fn allowed_targets(&self) -> &'static [AccountKind] {
        match self {
            SubjectKind::Order => &[AccountKind::Restaurant, AccountKind::Rider],
            SubjectKind::Ride => &[AccountKind::Driver],
        }
    }
}

/// A customer's score for a restaurant, rider or driver
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub subject_kind: String,
    pub subject_id: Uuid,
    pub target_kind: String,
    pub target_id: Uuid,
    pub score: i32,
    pub comment: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Payload for rating
#[derive(Debug, Clone, Deserialize)]
pub struct NewRating {
    pub subject_kind: SubjectKind,
    pub subject_id: Uuid,
    pub target_kind: AccountKind,
    pub score: i32,
    pub comment: Option<String>,
}

impl NewRating {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.score) {
            return Err("Score must be between 1 and 5".to_string());
        }
        if !self.subject_kind.allowed_targets().contains(&self.target_kind) {
            return Err(format!(
                "A {} cannot be rated for a {}",
                self.target_kind,
                self.subject_kind.as_str()
            ));
        }
        if self.comment.as_deref().map_or(false, |c| c.chars().count() > 1000) {
            return Err("Comment must be at most 1000 characters".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rating(subject_kind: SubjectKind, target_kind: AccountKind, score: i32) -> NewRating {
        NewRating {
            subject_kind,
            subject_id: Uuid::new_v4(),
            target_kind,
            score,
            comment: None,
        }
    }

    #[test]
    fn test_score_bounds() {
        assert!(rating(SubjectKind::Ride, AccountKind::Driver, 5).validate().is_ok());
        assert!(rating(SubjectKind::Ride, AccountKind::Driver, 0).validate().is_err());
        assert!(rating(SubjectKind::Ride, AccountKind::Driver, 6).validate().is_err());
    }

    #[test]
    fn test_target_must_match_subject() {
        assert!(rating(SubjectKind::Order, AccountKind::Restaurant, 4).validate().is_ok());
        assert!(rating(SubjectKind::Order, AccountKind::Rider, 4).validate().is_ok());
        assert!(rating(SubjectKind::Order, AccountKind::Driver, 4).validate().is_err());
        assert!(rating(SubjectKind::Ride, AccountKind::Restaurant, 4).validate().is_err());
    }
}
