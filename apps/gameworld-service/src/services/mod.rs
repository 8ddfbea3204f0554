//! Request handlers.
//!
//! [`GameWorldService`] carries the celestial object RPCs; the message
//! types and their shape validation live in [`requests`].

pub mod gameworld_service;
pub mod requests;

pub use gameworld_service::{GameWorldService, ServingStatus};
