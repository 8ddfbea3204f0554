//! # GameWorld Service
//!
//! Request handling for the celestial object catalogue.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GameWorld Service                                │
//! │                                                                         │
//! │  ┌────────────────┐  ┌──────────────────────────┐  ┌────────────────┐  │
//! │  │ ConfigWatcher  │  │    GameWorldService      │  │  gameworld-db  │  │
//! │  │                │  │                          │  │                │  │
//! │  │ • file + env   │─►│ • GetObjectTypes         │─►│ ObjectRepo-    │  │
//! │  │ • reload       │  │ • Get/List/Create/Update │  │ sitory         │  │
//! │  │ • subscribe    │  │ • Delete (soft/hard)     │  │                │  │
//! │  └────────────────┘  │ • SearchRegion/Hierarchy │  └────────────────┘  │
//! │                      │ • Object properties      │                      │
//! │                      │ • HealthCheck            │                      │
//! │                      └──────────────────────────┘                      │
//! │                                                                         │
//! │  Errors: ValidationError / DbError → ServiceError → tonic::Status       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Environment variables use the `GAMEWORLD_` prefix and
//! `__` between sections, e.g. `GAMEWORLD_DATABASE__HOST`.

pub mod config;
pub mod error;
pub mod services;
pub mod telemetry;

// Re-exports
pub use config::{ConfigWatcher, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use services::GameWorldService;
