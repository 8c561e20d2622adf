//! Authentication module for the community server
//!
//! Password hashing, token issue and verification, the login and
//! registration handlers, and the gate that protects routes requiring login.

pub mod gate;
pub mod handlers;
pub mod password;
mod service;
mod token;

pub use gate::require_auth;
pub use password::PasswordHasher;
pub use service::{AuthService, USER_NOT_FOUND};
pub use token::{AuthenticatedUser, Claims, TokenService};
