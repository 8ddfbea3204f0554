//! # Repository Module
//!
//! Typed access to the celestial object catalogue.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  GameWorldService                                                       │
//! │       │                                                                 │
//! │       │  Arc<dyn CelestialObjectRepository>                             │
//! │       ▼                                                                 │
//! │  ObjectRepository (PostgreSQL)          in-memory fakes (tests)         │
//! │  ├── get_by_id / list / count                                           │
//! │  ├── create / update / remove / purge                                   │
//! │  ├── find_by_type / find_by_parent / get_parent                         │
//! │  ├── find_in_region / get_hierarchy                                     │
//! │  └── get_properties / update_properties / type catalogue                │
//! │       │                                                                 │
//! │       │  parameterized SQL via Database::execute_*                      │
//! │       ▼                                                                 │
//! │  PostgreSQL                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method excludes logically deleted rows. Reads run as a single
//! query scope, writes as a single transaction.

use async_trait::async_trait;
use gameworld_core::{
    CelestialObject, CelestialObjectType, Coordinates, HierarchyNode, ObjectFilter,
    ObjectProperties, PropertyField, TypeInfo,
};

use crate::error::DbResult;

pub mod celestial_object;
pub(crate) mod rows;

pub use celestial_object::ObjectRepository;

/// Result of a conditional update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The row matched the expected version; carries the stored entity with
    /// its new version.
    Updated(CelestialObject),
    /// No live row with that id.
    NotFound,
    /// The live row has a different version.
    VersionConflict { current: i32 },
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }
}

/// Operations the request handler needs from storage.
#[async_trait]
pub trait CelestialObjectRepository: Send + Sync {
    async fn get_by_id(&self, id: &str) -> DbResult<Option<CelestialObject>>;

    /// All matching objects ordered by name.
    async fn list(&self, filter: &ObjectFilter) -> DbResult<Vec<CelestialObject>>;

    /// One page of [`list`](Self::list).
    async fn list_page(
        &self,
        filter: &ObjectFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<CelestialObject>>;

    async fn count(&self, filter: &ObjectFilter) -> DbResult<i64>;

    /// Validates, assigns an id when absent, inserts and returns the stored row.
    async fn create(&self, object: &CelestialObject) -> DbResult<CelestialObject>;

    /// Conditional update gated on the `version` property (default 1).
    async fn update(&self, object: &CelestialObject) -> DbResult<UpdateOutcome>;

    /// Logical delete. False when there was no live row.
    async fn remove(&self, id: &str) -> DbResult<bool>;

    /// Physical delete of the object and its extended properties.
    async fn purge(&self, id: &str) -> DbResult<bool>;

    async fn find_by_type(&self, object_type: CelestialObjectType) -> DbResult<Vec<CelestialObject>>;

    async fn find_by_parent(&self, parent_id: &str) -> DbResult<Vec<CelestialObject>>;

    async fn get_children(&self, parent_id: &str) -> DbResult<Vec<CelestialObject>> {
        self.find_by_parent(parent_id).await
    }

    async fn get_parent(&self, child_id: &str) -> DbResult<Option<CelestialObject>>;

    /// Objects whose global coordinates lie within `radius`, nearest first.
    async fn find_in_region(&self, center: Coordinates, radius: f64) -> DbResult<Vec<CelestialObject>>;

    /// The root and its live descendants, ordered by level then name.
    async fn get_hierarchy(&self, root_id: &str) -> DbResult<Vec<HierarchyNode>>;

    async fn get_properties(&self, object_id: &str) -> DbResult<Option<ObjectProperties>>;

    /// Upserts only the masked fields. False when the object is not live.
    async fn update_properties(
        &self,
        object_id: &str,
        properties: &ObjectProperties,
        mask: &[PropertyField],
    ) -> DbResult<bool>;

    async fn get_object_types(&self, parent_type: Option<CelestialObjectType>) -> DbResult<Vec<TypeInfo>>;

    async fn get_available_properties(&self, object_type: CelestialObjectType) -> DbResult<Vec<String>>;
}
