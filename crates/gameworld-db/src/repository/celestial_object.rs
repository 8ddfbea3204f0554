//! # Celestial Object Repository
//!
//! PostgreSQL implementation of [`CelestialObjectRepository`].
//!
//! ## Optimistic Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Client A reads Sol (version 3)      Client B reads Sol (version 3)     │
//! │       │                                   │                             │
//! │       ▼                                   │                             │
//! │  UPDATE ... WHERE version = 3             │                             │
//! │  → row matched, version becomes 4         │                             │
//! │                                           ▼                             │
//! │                              UPDATE ... WHERE version = 3               │
//! │                              → 0 rows                                   │
//! │                              → SELECT version → 4                       │
//! │                              → VersionConflict { current: 4 }           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Region Search
//! Distance is computed in SQL from the three global coordinate columns;
//! objects without a complete global position never match.

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use gameworld_core::validation::{parse_version, validate_object, validate_properties, validate_region};
use gameworld_core::{
    CelestialObject, CelestialObjectType, Coordinates, HierarchyNode, ObjectFilter,
    ObjectProperties, PropertyField, TypeInfo, ValidationError, INITIAL_VERSION, VERSION_PROPERTY,
};

use super::rows::{object_columns, HierarchyRow, ObjectParams, ObjectRow, PropertiesRow, TypeRow};
use super::{CelestialObjectRepository, UpdateOutcome};
use crate::database::Database;
use crate::error::DbResult;

// =============================================================================
// SQL
// =============================================================================

const SELECT_BY_ID: &str = concat!(
    "SELECT ",
    object_columns!(),
    " FROM celestial_objects WHERE id = $1 AND NOT is_deleted"
);

const SELECT_BY_TYPE: &str = concat!(
    "SELECT ",
    object_columns!(),
    " FROM celestial_objects WHERE type = $1 AND NOT is_deleted ORDER BY name"
);

const SELECT_BY_PARENT: &str = concat!(
    "SELECT ",
    object_columns!(),
    " FROM celestial_objects WHERE parent_id = $1 AND NOT is_deleted ORDER BY name"
);

const SELECT_PARENT: &str = concat!(
    "SELECT ",
    object_columns!(),
    " FROM celestial_objects WHERE NOT is_deleted AND id = (",
    "SELECT parent_id FROM celestial_objects WHERE id = $1 AND NOT is_deleted)"
);

const SELECT_IN_REGION: &str = concat!(
    "SELECT * FROM (SELECT ",
    object_columns!(),
    ", sqrt(power(coord_x - $1, 2) + power(coord_y - $2, 2) + power(coord_z - $3, 2)) AS distance",
    " FROM celestial_objects WHERE NOT is_deleted",
    " AND coord_x IS NOT NULL AND coord_y IS NOT NULL AND coord_z IS NOT NULL) o",
    " WHERE distance <= $4 ORDER BY distance, name"
);

const SELECT_HIERARCHY: &str = concat!(
    "WITH RECURSIVE hierarchy AS (",
    " SELECT o.*, 1 AS level, ARRAY[o.id] AS path",
    " FROM celestial_objects o WHERE o.id = $1 AND NOT o.is_deleted",
    " UNION ALL",
    " SELECT c.*, h.level + 1, h.path || c.id",
    " FROM celestial_objects c JOIN hierarchy h ON c.parent_id = h.id",
    " WHERE NOT c.is_deleted AND NOT c.id = ANY(h.path)",
    ") SELECT ",
    object_columns!(),
    ", level FROM hierarchy ORDER BY level, name"
);

const INSERT_OBJECT: &str = concat!(
    "INSERT INTO celestial_objects (",
    "id, parent_id, type, subtype, name, designation, ",
    "coord_x, coord_y, coord_z, local_x, local_y, local_z, ",
    "mass_solar_masses, radius_solar_radii, temperature_kelvin, ",
    "properties, discovered, discovery_date",
    ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16::jsonb, $17, $18)",
    " RETURNING ",
    object_columns!()
);

const UPDATE_OBJECT: &str = concat!(
    "UPDATE celestial_objects SET ",
    "parent_id = $2, type = $3, subtype = $4, name = $5, designation = $6, ",
    "coord_x = $7, coord_y = $8, coord_z = $9, local_x = $10, local_y = $11, local_z = $12, ",
    "mass_solar_masses = $13, radius_solar_radii = $14, temperature_kelvin = $15, ",
    "properties = $16::jsonb, discovered = $17, discovery_date = $18, ",
    "updated_at = now(), version = version + 1",
    " WHERE id = $1 AND version = $19 AND NOT is_deleted",
    " RETURNING ",
    object_columns!()
);

const SELECT_VERSION: &str =
    "SELECT version FROM celestial_objects WHERE id = $1 AND NOT is_deleted";

const SOFT_DELETE: &str = "UPDATE celestial_objects SET is_deleted = TRUE, updated_at = now() \
     WHERE id = $1 AND NOT is_deleted";

const SELECT_PROPERTIES: &str = "SELECT p.object_id, p.proper_motion_ra, p.proper_motion_dec, \
     p.radial_velocity, p.parallax, p.metallicity, p.age_years, \
     p.properties::text AS properties, p.discovery_info \
     FROM celestial_object_properties p \
     JOIN celestial_objects o ON o.id = p.object_id \
     WHERE p.object_id = $1 AND NOT o.is_deleted";

const UPSERT_PROPERTIES: &str = "INSERT INTO celestial_object_properties AS t (\
     object_id, proper_motion_ra, proper_motion_dec, radial_velocity, parallax, \
     metallicity, age_years, properties, discovery_info, updated_at) \
     SELECT $1, $2, $3, $4, $5, $6, $7, $8::jsonb, $9, now() \
     WHERE EXISTS (SELECT 1 FROM celestial_objects WHERE id = $1 AND NOT is_deleted) \
     ON CONFLICT (object_id) DO UPDATE SET \
     proper_motion_ra = COALESCE(EXCLUDED.proper_motion_ra, t.proper_motion_ra), \
     proper_motion_dec = COALESCE(EXCLUDED.proper_motion_dec, t.proper_motion_dec), \
     radial_velocity = COALESCE(EXCLUDED.radial_velocity, t.radial_velocity), \
     parallax = COALESCE(EXCLUDED.parallax, t.parallax), \
     metallicity = COALESCE(EXCLUDED.metallicity, t.metallicity), \
     age_years = COALESCE(EXCLUDED.age_years, t.age_years), \
     properties = COALESCE(EXCLUDED.properties, t.properties), \
     discovery_info = COALESCE(EXCLUDED.discovery_info, t.discovery_info), \
     updated_at = now() \
     RETURNING object_id";

const SELECT_TYPES: &str = "SELECT type, subtype, \
     properties->>'description' AS description, \
     properties->>'parent_type' AS parent_type \
     FROM celestial_object_types \
     WHERE $1::text IS NULL OR properties->>'parent_type' = $1 \
     ORDER BY type, subtype";

const SELECT_AVAILABLE_PROPERTIES: &str = "SELECT DISTINCT p.name \
     FROM celestial_object_types t, \
     jsonb_array_elements_text(COALESCE(t.properties->'available_properties', '[]'::jsonb)) AS p(name) \
     WHERE t.type = $1 \
     ORDER BY p.name";

// =============================================================================
// Query Helpers
// =============================================================================

/// Binds `$1..$18` of INSERT_OBJECT / UPDATE_OBJECT.
fn bind_object<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &ObjectParams,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    query
        .bind(params.id.clone())
        .bind(params.parent_id.clone())
        .bind(params.object_type.clone())
        .bind(params.subtype.clone())
        .bind(params.name.clone())
        .bind(params.designation.clone())
        .bind(params.global[0])
        .bind(params.global[1])
        .bind(params.global[2])
        .bind(params.local[0])
        .bind(params.local[1])
        .bind(params.local[2])
        .bind(params.physical[0])
        .bind(params.physical[1])
        .bind(params.physical[2])
        .bind(params.properties.clone())
        .bind(params.discovered)
        .bind(params.discovery_date)
}

/// Appends the WHERE clause for `filter`. Every value is a bind parameter.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &ObjectFilter) {
    builder.push(" WHERE NOT is_deleted");

    if !filter.types.is_empty() {
        let names: Vec<String> = filter.types.iter().map(|t| t.as_str().to_string()).collect();
        builder.push(" AND type = ANY(");
        builder.push_bind(names);
        builder.push(")");
    }

    if let Some(parent) = filter.parent_id.as_deref().filter(|p| !p.is_empty()) {
        builder.push(" AND parent_id = ");
        builder.push_bind(parent.to_string());
    }

    if let Some(pattern) = filter.name_pattern.as_deref().filter(|p| !p.is_empty()) {
        builder.push(" AND name ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(pattern)));
    }
}

fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn select_filtered<'a>(filter: &ObjectFilter) -> QueryBuilder<'a, Postgres> {
    let mut builder = QueryBuilder::new(concat!("SELECT ", object_columns!(), " FROM celestial_objects"));
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY name, id");
    builder
}

fn rows_to_objects(rows: Vec<ObjectRow>) -> Vec<CelestialObject> {
    rows.into_iter().map(ObjectRow::into_object).collect()
}

async fn fetch_objects(db: &Database, sql: &'static str, arg: String) -> DbResult<Vec<CelestialObject>> {
    let rows = db
        .execute_query(move |conn| {
            Box::pin(async move {
                let rows: Vec<ObjectRow> = sqlx::query_as(sql).bind(arg).fetch_all(&mut **conn).await?;
                Ok(rows)
            })
        })
        .await?;
    Ok(rows_to_objects(rows))
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for celestial objects.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.objects();
///
/// let sol = repo.create(&CelestialObject::new("Sol", CelestialObjectType::Star)).await?;
/// let earth = CelestialObject::new("Earth", CelestialObjectType::Planet).with_parent(&sol.id);
/// repo.create(&earth).await?;
///
/// let nearby = repo.find_in_region(Coordinates::default(), 10.0).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ObjectRepository {
    db: Database,
}

impl ObjectRepository {
    pub fn new(db: Database) -> Self {
        ObjectRepository { db }
    }

    fn expected_version(object: &CelestialObject) -> DbResult<i32> {
        match object.properties.get(VERSION_PROPERTY) {
            Some(raw) => Ok(parse_version(raw)?),
            None => Ok(INITIAL_VERSION),
        }
    }
}

#[async_trait]
impl CelestialObjectRepository for ObjectRepository {
    async fn get_by_id(&self, id: &str) -> DbResult<Option<CelestialObject>> {
        debug!(id = %id, "Fetching celestial object");
        let id = id.to_string();
        let row = self
            .db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let row: Option<ObjectRow> = sqlx::query_as(SELECT_BY_ID)
                        .bind(id)
                        .fetch_optional(&mut **conn)
                        .await?;
                    Ok(row)
                })
            })
            .await?;
        Ok(row.map(ObjectRow::into_object))
    }

    async fn list(&self, filter: &ObjectFilter) -> DbResult<Vec<CelestialObject>> {
        debug!(?filter, "Listing celestial objects");
        let filter = filter.clone();
        let rows = self
            .db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let mut builder = select_filtered(&filter);
                    let rows: Vec<ObjectRow> = builder.build_query_as::<ObjectRow>().fetch_all(&mut **conn).await?;
                    Ok(rows)
                })
            })
            .await?;
        Ok(rows_to_objects(rows))
    }

    async fn list_page(
        &self,
        filter: &ObjectFilter,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<CelestialObject>> {
        debug!(?filter, limit, offset, "Listing celestial object page");
        let filter = filter.clone();
        let rows = self
            .db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let mut builder = select_filtered(&filter);
                    builder.push(" LIMIT ");
                    builder.push_bind(limit.max(0));
                    builder.push(" OFFSET ");
                    builder.push_bind(offset.max(0));
                    let rows: Vec<ObjectRow> = builder.build_query_as::<ObjectRow>().fetch_all(&mut **conn).await?;
                    Ok(rows)
                })
            })
            .await?;
        Ok(rows_to_objects(rows))
    }

    async fn count(&self, filter: &ObjectFilter) -> DbResult<i64> {
        let filter = filter.clone();
        self.db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM celestial_objects");
                    push_filter(&mut builder, &filter);
                    let total: i64 = builder.build_query_scalar::<i64>().fetch_one(&mut **conn).await?;
                    Ok(total)
                })
            })
            .await
    }

    async fn create(&self, object: &CelestialObject) -> DbResult<CelestialObject> {
        validate_object(object)?;

        let mut params = ObjectParams::from_object(object)?;
        if params.id.is_empty() {
            params.id = Uuid::new_v4().to_string();
        }
        debug!(id = %params.id, object_type = %params.object_type, "Creating celestial object");

        let row = self
            .db
            .execute_transaction(move |conn| {
                Box::pin(async move {
                    let row: ObjectRow = bind_object(sqlx::query_as(INSERT_OBJECT), &params)
                        .fetch_one(&mut **conn)
                        .await?;
                    Ok(row)
                })
            })
            .await?;

        let created = row.into_object();
        info!(id = %created.id, name = %created.name, "Created celestial object");
        Ok(created)
    }

    async fn update(&self, object: &CelestialObject) -> DbResult<UpdateOutcome> {
        if object.id.trim().is_empty() {
            return Err(ValidationError::required("id").into());
        }
        validate_object(object)?;

        let expected = Self::expected_version(object)?;
        let params = ObjectParams::from_object(object)?;
        let id = params.id.clone();

        let outcome = self
            .db
            .execute_transaction(move |conn| {
                Box::pin(async move {
                    let updated: Option<ObjectRow> =
                        bind_object(sqlx::query_as(UPDATE_OBJECT), &params)
                            .bind(expected)
                            .fetch_optional(&mut **conn)
                            .await?;
                    if let Some(row) = updated {
                        return Ok(UpdateOutcome::Updated(row.into_object()));
                    }

                    let current: Option<i32> = sqlx::query_scalar(SELECT_VERSION)
                        .bind(params.id)
                        .fetch_optional(&mut **conn)
                        .await?;
                    Ok(match current {
                        Some(current) => UpdateOutcome::VersionConflict { current },
                        None => UpdateOutcome::NotFound,
                    })
                })
            })
            .await?;

        match &outcome {
            UpdateOutcome::Updated(obj) => {
                info!(id = %id, version = ?obj.version(), "Updated celestial object")
            }
            UpdateOutcome::NotFound => debug!(id = %id, "Update matched no live object"),
            UpdateOutcome::VersionConflict { current } => {
                info!(id = %id, expected, current, "Update rejected: version conflict")
            }
        }
        Ok(outcome)
    }

    async fn remove(&self, id: &str) -> DbResult<bool> {
        let owned = id.to_string();
        let affected = self
            .db
            .execute_transaction(move |conn| {
                Box::pin(async move {
                    let result = sqlx::query(SOFT_DELETE).bind(owned).execute(&mut **conn).await?;
                    Ok(result.rows_affected())
                })
            })
            .await?;

        if affected > 0 {
            info!(id = %id, "Removed celestial object");
        }
        Ok(affected > 0)
    }

    async fn purge(&self, id: &str) -> DbResult<bool> {
        let owned = id.to_string();
        let affected = self
            .db
            .execute_transaction(move |conn| {
                Box::pin(async move {
                    sqlx::query("DELETE FROM celestial_object_properties WHERE object_id = $1")
                        .bind(owned.clone())
                        .execute(&mut **conn)
                        .await?;
                    let result = sqlx::query("DELETE FROM celestial_objects WHERE id = $1")
                        .bind(owned)
                        .execute(&mut **conn)
                        .await?;
                    Ok(result.rows_affected())
                })
            })
            .await?;

        if affected > 0 {
            info!(id = %id, "Purged celestial object");
        }
        Ok(affected > 0)
    }

    async fn find_by_type(&self, object_type: CelestialObjectType) -> DbResult<Vec<CelestialObject>> {
        fetch_objects(&self.db, SELECT_BY_TYPE, object_type.as_str().to_string()).await
    }

    async fn find_by_parent(&self, parent_id: &str) -> DbResult<Vec<CelestialObject>> {
        fetch_objects(&self.db, SELECT_BY_PARENT, parent_id.to_string()).await
    }

    async fn get_parent(&self, child_id: &str) -> DbResult<Option<CelestialObject>> {
        let mut found = fetch_objects(&self.db, SELECT_PARENT, child_id.to_string()).await?;
        Ok(found.pop())
    }

    async fn find_in_region(&self, center: Coordinates, radius: f64) -> DbResult<Vec<CelestialObject>> {
        validate_region(&center, radius)?;
        debug!(x = center.x, y = center.y, z = center.z, radius, "Region search");

        let rows = self
            .db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let rows: Vec<ObjectRow> = sqlx::query_as(SELECT_IN_REGION)
                        .bind(center.x)
                        .bind(center.y)
                        .bind(center.z)
                        .bind(radius)
                        .fetch_all(&mut **conn)
                        .await?;
                    Ok(rows)
                })
            })
            .await?;
        Ok(rows_to_objects(rows))
    }

    async fn get_hierarchy(&self, root_id: &str) -> DbResult<Vec<HierarchyNode>> {
        let root = root_id.to_string();
        let rows = self
            .db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let rows: Vec<HierarchyRow> = sqlx::query_as(SELECT_HIERARCHY)
                        .bind(root)
                        .fetch_all(&mut **conn)
                        .await?;
                    Ok(rows)
                })
            })
            .await?;
        debug!(root = %root_id, nodes = rows.len(), "Loaded hierarchy");
        Ok(rows.into_iter().map(HierarchyRow::into_node).collect())
    }

    async fn get_properties(&self, object_id: &str) -> DbResult<Option<ObjectProperties>> {
        let id = object_id.to_string();
        let row = self
            .db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let row: Option<PropertiesRow> = sqlx::query_as(SELECT_PROPERTIES)
                        .bind(id)
                        .fetch_optional(&mut **conn)
                        .await?;
                    Ok(row)
                })
            })
            .await?;
        Ok(row.map(PropertiesRow::into_properties))
    }

    async fn update_properties(
        &self,
        object_id: &str,
        properties: &ObjectProperties,
        mask: &[PropertyField],
    ) -> DbResult<bool> {
        if object_id.trim().is_empty() {
            return Err(ValidationError::required("object_id").into());
        }
        if mask.is_empty() {
            return Err(ValidationError::required("update_mask").into());
        }
        validate_properties(properties)?;

        let masked = |field: PropertyField| mask.contains(&field);
        let pick = |field: PropertyField, value: Option<f64>| if masked(field) { value } else { None };

        let extra = match (&properties.extra, masked(PropertyField::Extra)) {
            (Some(map), true) => Some(serde_json::to_string(map)?),
            _ => None,
        };
        let values = (
            pick(PropertyField::ProperMotionRa, properties.proper_motion_ra),
            pick(PropertyField::ProperMotionDec, properties.proper_motion_dec),
            pick(PropertyField::RadialVelocity, properties.radial_velocity),
            pick(PropertyField::Parallax, properties.parallax),
            pick(PropertyField::Metallicity, properties.metallicity),
            pick(PropertyField::AgeYears, properties.age_years),
        );
        let discovery_info = properties
            .discovery_info
            .clone()
            .filter(|_| masked(PropertyField::DiscoveryInfo));
        let id = object_id.to_string();

        let written = self
            .db
            .execute_transaction(move |conn| {
                Box::pin(async move {
                    let row: Option<String> = sqlx::query_scalar(UPSERT_PROPERTIES)
                        .bind(id)
                        .bind(values.0)
                        .bind(values.1)
                        .bind(values.2)
                        .bind(values.3)
                        .bind(values.4)
                        .bind(values.5)
                        .bind(extra)
                        .bind(discovery_info)
                        .fetch_optional(&mut **conn)
                        .await?;
                    Ok(row.is_some())
                })
            })
            .await?;

        if written {
            info!(id = %object_id, fields = mask.len(), "Updated extended properties");
        }
        Ok(written)
    }

    async fn get_object_types(&self, parent_type: Option<CelestialObjectType>) -> DbResult<Vec<TypeInfo>> {
        let parent = parent_type.map(|t| t.as_str().to_string());
        let rows = self
            .db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let rows: Vec<TypeRow> = sqlx::query_as(SELECT_TYPES)
                        .bind(parent)
                        .fetch_all(&mut **conn)
                        .await?;
                    Ok(rows)
                })
            })
            .await?;
        Ok(rows.into_iter().map(TypeRow::into_type_info).collect())
    }

    async fn get_available_properties(&self, object_type: CelestialObjectType) -> DbResult<Vec<String>> {
        let name = object_type.as_str().to_string();
        self.db
            .execute_query(move |conn| {
                Box::pin(async move {
                    let names: Vec<String> = sqlx::query_scalar(SELECT_AVAILABLE_PROPERTIES)
                        .bind(name)
                        .fetch_all(&mut **conn)
                        .await?;
                    Ok(names)
                })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("Sol"), "Sol");
    }

    #[test]
    fn test_filter_sql_is_parameterized() {
        let filter = ObjectFilter {
            types: vec![CelestialObjectType::Star],
            parent_id: Some("milky-way'; DROP TABLE celestial_objects; --".to_string()),
            name_pattern: Some("sol".to_string()),
        };
        let builder = select_filtered(&filter);
        let sql = builder.sql();
        assert!(sql.contains("type = ANY($1)"));
        assert!(sql.contains("parent_id = $2"));
        assert!(sql.contains("name ILIKE $3"));
        assert!(!sql.contains("DROP TABLE"));
        assert!(sql.ends_with("ORDER BY name, id"));
    }

    #[test]
    fn test_empty_filter_only_hides_deleted() {
        let builder = select_filtered(&ObjectFilter::default());
        assert!(builder.sql().contains("WHERE NOT is_deleted ORDER BY"));
    }

    #[test]
    fn test_expected_version_defaults() {
        let obj = CelestialObject::new("Sol", CelestialObjectType::Star);
        assert_eq!(ObjectRepository::expected_version(&obj).unwrap(), INITIAL_VERSION);

        let obj = obj.with_property("version", "5");
        assert_eq!(ObjectRepository::expected_version(&obj).unwrap(), 5);

        let obj = CelestialObject::new("Sol", CelestialObjectType::Star).with_property("version", "five");
        assert!(matches!(
            ObjectRepository::expected_version(&obj),
            Err(DbError::Validation(_))
        ));
    }

    #[test]
    fn test_statement_shapes() {
        assert!(SELECT_BY_ID.contains("properties::text AS properties"));
        assert!(UPDATE_OBJECT.contains("version = version + 1"));
        assert!(UPDATE_OBJECT.contains("$19"));
        assert!(SELECT_IN_REGION.contains("ORDER BY distance"));
        assert!(SELECT_HIERARCHY.contains("ORDER BY level, name"));
    }
}
