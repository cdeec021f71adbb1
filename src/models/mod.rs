//! Domain models for the Feastride backend.
//!
//! Database-backed records for accounts and marketplace entities, plus the
//! status machines that drive reservations, orders and rides.

pub mod account;
pub mod lifecycle;
pub mod menu;
pub mod notification;
pub mod order;
pub mod otp;
pub mod rating;
pub mod reservation;
pub mod ride;

// Re-export all models for convenient access
pub use account::{
    Account, AccountKind, Credentials, Customer, Driver, Location, NewCustomer, NewDriver,
    NewRestaurant, NewRider, Registration, Restaurant, Rider,
};
pub use lifecycle::{Action, Status, TransitionError};
pub use menu::{MenuItem, MenuItemUpdate, NewMenuItem, NewOffer, Offer};
pub use notification::Notification;
pub use order::{NewOrder, Order, OrderAction, OrderItem, OrderLine, OrderStatus, OrderTotals};
pub use otp::OtpChallenge;
pub use rating::{NewRating, Rating, SubjectKind};
pub use reservation::{NewReservation, Reservation, ReservationAction, ReservationStatus};
pub use ride::{Ride, RideAction, RideQuote, RideStatus, Waypoint};
