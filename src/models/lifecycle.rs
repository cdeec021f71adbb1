//! Status machines shared by reservations, orders and rides.
//!
//! Every record moves forward through its statuses. An action names the
//! statuses it may start from and the status it lands on; repositories
//! persist an action as a single conditional `UPDATE ... WHERE status = ANY(..)`
//! so two concurrent claimants can never both win.

use super::account::AccountKind;
use std::fmt;
use thiserror::Error;

/// A record status that can be stored as TEXT.
pub trait Status: Copy + Eq + fmt::Debug + Sized + 'static {
    /// Record name used in error messages, e.g. `"order"`.
    const ENTITY: &'static str;

    fn as_str(&self) -> &'static str;

    fn parse(s: &str) -> Option<Self>;

    /// No further action can be applied.
    fn is_terminal(&self) -> bool;
}

/// An endpoint-triggered move between statuses.
pub trait Action: Copy + fmt::Debug + 'static {
    type State: Status;

    fn name(&self) -> &'static str;

    /// Statuses this action may be applied to.
    fn from_states(&self) -> &'static [Self::State];

    fn target(&self) -> Self::State;

    /// The actor kind allowed to perform the action.
    fn actor(&self) -> AccountKind;

    /// Apply the action to `current`, returning the next status.
    fn apply(&self, current: Self::State) -> Result<Self::State, TransitionError> {
        if self.from_states().contains(&current) {
            Ok(self.target())
        } else {
            Err(TransitionError {
                entity: <Self::State as Status>::ENTITY,
                action: self.name(),
                from: current.as_str(),
            })
        }
    }

    /// `from_states` as strings, ready to bind as a TEXT[] parameter.
    fn from_state_strs(&self) -> Vec<String> {
        self.from_states()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect()
    }
}

/// An action was attempted from a status that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} {entity} while it is {from}")]
pub struct TransitionError {
    pub entity: &'static str,
    pub action: &'static str,
    pub from: &'static str,
}

/// Parse a stored status, falling back to `default` for unknown values.
pub fn parse_or<S: Status>(s: &str, default: S) -> S {
    S::parse(s).unwrap_or(default)
}
