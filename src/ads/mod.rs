//! Ad module for the marketplace server
//!
//! Ad CRUD with ownership checks on every mutation, plus the HTTP handlers
//! that expose it.

pub mod handlers;
mod service;

pub use service::{AdDraft, AdService};
