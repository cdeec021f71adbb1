//! Credentials, one-time passwords and session tokens.

pub mod otp;
pub mod password;
pub mod session;

pub use password::{hash_password, verify_password};
pub use session::{SessionClaims, SessionCodec, TokenError};
