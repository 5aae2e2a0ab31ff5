//! Authentication module for the marketplace server
//!
//! Credential hashing, session token issuance and verification, and the
//! request extractor that turns a bearer token into a typed identity.

mod extractor;
pub mod handlers;
mod password;
mod service;
mod token;

pub use password::PasswordHasher;
pub use service::{AuthService, AuthenticatedUser};
pub use token::{Claims, SessionClaims, TokenManager};
