//! # gameworld-db: Database Layer for GameWorld
//!
//! Connection pooling, transactional execution and the celestial object
//! repository on top of PostgreSQL.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        GameWorld Data Flow                              │
//! │                                                                         │
//! │  GameWorldService (list_celestial_objects)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   gameworld-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────────┐  │   │
//! │  │   │  Repository   │   │   Database    │   │  ConnectionPool  │  │   │
//! │  │   │               │──►│  (executor)   │──►│                  │  │   │
//! │  │   │ ObjectRepo-   │   │ execute_query │   │ acquire/release  │  │   │
//! │  │   │ sitory        │   │ execute_trans │   │ bounded, Notify  │  │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   Migrations (embedded): 001_initial_schema, 002_object_types   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`connection`] - Connector / connection traits and the PostgreSQL driver
//! - [`pool`] - Bounded connection pool
//! - [`database`] - Connection parameters and the transactional executor
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Celestial object repository
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gameworld_db::{CelestialObjectRepository, Database, DbConfig};
//!
//! let config: DbConfig = "host=localhost port=5432 dbname=gameworld user=game password=pw".parse()?;
//! let db = Database::connect(&config).await?;
//! db.run_migrations().await?;
//!
//! let stars = db.objects().find_by_type(CelestialObjectType::Star).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod connection;
pub mod database;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use connection::{Connector, PgConnector, PgStoreConnection, StoreConnection};
pub use database::{Database, DbConfig};
pub use error::{DbError, DbResult};
pub use pool::{ConnectionPool, PoolOptions, PoolStatus, PooledConnection};
pub use repository::{CelestialObjectRepository, ObjectRepository, UpdateOutcome};
