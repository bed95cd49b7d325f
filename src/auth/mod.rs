//! Session tokens, password hashing and the session gate.

pub mod password;
pub mod session;
pub mod token;

pub use password::PasswordHasher;
pub use session::AuthUser;
pub use token::{SessionClaims, TokenService};
