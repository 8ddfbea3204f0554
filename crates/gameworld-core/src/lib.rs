//! # gameworld-core: Pure Domain Logic for GameWorld
//!
//! Entity definitions and validation rules for the celestial object
//! catalogue. Everything in here is deterministic and free of I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GameWorld Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 GameWorldService (request handler)              │   │
//! │  │   GetCelestialObject, ListCelestialObjects, Create, Update ...  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ gameworld-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────────────┐  ┌──────────────┐  ┌──────────────────┐  │   │
//! │  │   │      types      │  │  validation  │  │      error       │  │   │
//! │  │   │ CelestialObject │  │ object rules │  │ ValidationError  │  │   │
//! │  │   │ ObjectProperties│  │ property     │  │ CoreError        │  │   │
//! │  │   │ Coordinates     │  │ rules        │  │                  │  │   │
//! │  │   └─────────────────┘  └──────────────┘  └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  gameworld-db (Database Layer)                  │   │
//! │  │          Connection pool, transactions, repository              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (CelestialObject, ObjectProperties, TypeInfo)
//! - [`error`] - Domain error types
//! - [`validation`] - Write-path validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use gameworld_core::{CelestialObject, CelestialObjectType};
//! use gameworld_core::validation::validate_object;
//!
//! let planet = CelestialObject::new("Kepler-22b", CelestialObjectType::Planet)
//!     .with_parent("kepler-22")
//!     .with_property("mass_solar_masses", "0.0001");
//!
//! assert!(validate_object(&planet).is_ok());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum length of an object name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// Coordinate bound on each axis (distance units, parsecs in the game).
pub const MAX_COORDINATE: f64 = 1e6;

/// Property key carrying the optimistic-concurrency version.
pub const VERSION_PROPERTY: &str = "version";

/// Version a freshly inserted row gets from the store default.
pub const INITIAL_VERSION: i32 = 1;

/// Numeric physical properties that are also stored in dedicated columns.
///
/// Each must parse as a non-negative number when present.
pub const PHYSICAL_PROPERTIES: [&str; 3] =
    ["mass_solar_masses", "radius_solar_radii", "temperature_kelvin"];
