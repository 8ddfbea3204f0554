//! Row types and the mapping between rows and domain entities.
//!
//! ## Property Map Assembly (read path)
//! ```text
//!  physical columns ──► "mass_solar_masses" = "1.02"      (1) base
//!  properties JSONB ──► every key, strings verbatim      (2) overlay
//!  version column   ──► "version" = "7"                  (3) always wins
//! ```
//!
//! The write path stores every property except `version` in the JSONB blob
//! as strings, so the caller's exact text survives a round trip while the
//! physical columns stay queryable.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use gameworld_core::{
    CelestialObject, CelestialObjectType, Coordinates, HierarchyNode, ObjectProperties, TypeInfo,
    PHYSICAL_PROPERTIES, VERSION_PROPERTY,
};

use crate::error::DbResult;

/// Select list shared by every object query.
///
/// The JSONB blob is read as text so no JSON driver support is needed.
macro_rules! object_columns {
    () => {
        "id, parent_id, type, subtype, name, designation, \
         coord_x, coord_y, coord_z, local_x, local_y, local_z, \
         mass_solar_masses, radius_solar_radii, temperature_kelvin, \
         properties::text AS properties, discovered, discovery_date, \
         created_at, updated_at, version"
    };
}
pub(crate) use object_columns;

// =============================================================================
// Object Rows
// =============================================================================

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct ObjectRow {
    pub id: String,
    pub parent_id: Option<String>,
    #[sqlx(rename = "type")]
    pub object_type: String,
    pub subtype: Option<String>,
    pub name: String,
    pub designation: Option<String>,
    pub coord_x: Option<f64>,
    pub coord_y: Option<f64>,
    pub coord_z: Option<f64>,
    pub local_x: Option<f64>,
    pub local_y: Option<f64>,
    pub local_z: Option<f64>,
    pub mass_solar_masses: Option<f64>,
    pub radius_solar_radii: Option<f64>,
    pub temperature_kelvin: Option<f64>,
    pub properties: Option<String>,
    pub discovered: bool,
    pub discovery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct HierarchyRow {
    #[sqlx(flatten)]
    pub object: ObjectRow,
    pub level: i32,
}

fn point(x: Option<f64>, y: Option<f64>, z: Option<f64>) -> Option<Coordinates> {
    match (x, y, z) {
        (Some(x), Some(y), Some(z)) => Some(Coordinates::new(x, y, z)),
        _ => None,
    }
}

impl ObjectRow {
    pub fn into_object(self) -> CelestialObject {
        let mut properties = BTreeMap::new();

        let physical = [
            self.mass_solar_masses,
            self.radius_solar_radii,
            self.temperature_kelvin,
        ];
        for (key, value) in PHYSICAL_PROPERTIES.iter().zip(physical) {
            if let Some(v) = value {
                properties.insert(key.to_string(), v.to_string());
            }
        }

        if let Some(extra) = self
            .properties
            .as_deref()
            .and_then(|raw| flatten_json_properties(&self.id, raw))
        {
            properties.extend(extra);
        }

        properties.insert(VERSION_PROPERTY.to_string(), self.version.to_string());

        CelestialObject {
            global_coordinates: point(self.coord_x, self.coord_y, self.coord_z),
            local_coordinates: point(self.local_x, self.local_y, self.local_z),
            id: self.id,
            parent_id: self.parent_id,
            object_type: CelestialObjectType::from_stored(&self.object_type),
            subtype: self.subtype,
            name: self.name,
            designation: self.designation,
            properties,
            discovered: self.discovered,
            discovery_date: self.discovery_date,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        }
    }
}

impl HierarchyRow {
    pub fn into_node(self) -> HierarchyNode {
        HierarchyNode {
            level: self.level,
            object: self.object.into_object(),
        }
    }
}

/// Flattens a JSON object into a string map.
///
/// Strings are kept verbatim, booleans become `true` / `false`, nulls are
/// dropped and anything else is serialized. Unparseable blobs are logged
/// and yield `None`.
pub(crate) fn flatten_json_properties(owner: &str, raw: &str) -> Option<BTreeMap<String, String>> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!(id = %owner, error = %e, "Ignoring unparseable properties blob");
            return None;
        }
    };

    let Value::Object(map) = value else {
        warn!(id = %owner, "Ignoring properties blob that is not a JSON object");
        return None;
    };

    let flattened = map
        .into_iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s,
                Value::Bool(b) => b.to_string(),
                other => other.to_string(),
            };
            Some((key, text))
        })
        .collect();
    Some(flattened)
}

// =============================================================================
// Write Parameters
// =============================================================================

/// Owned column values for INSERT / UPDATE, derived from an entity.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ObjectParams {
    pub id: String,
    pub parent_id: Option<String>,
    pub object_type: String,
    pub subtype: Option<String>,
    pub name: String,
    pub designation: Option<String>,
    pub global: [Option<f64>; 3],
    pub local: [Option<f64>; 3],
    pub physical: [Option<f64>; 3],
    pub properties: Option<String>,
    pub discovered: bool,
    pub discovery_date: Option<DateTime<Utc>>,
}

fn axes(coords: Option<&Coordinates>) -> [Option<f64>; 3] {
    match coords {
        Some(c) => [Some(c.x), Some(c.y), Some(c.z)],
        None => [None, None, None],
    }
}

impl ObjectParams {
    /// Expects an entity that already passed validation.
    pub fn from_object(object: &CelestialObject) -> DbResult<Self> {
        let mut physical = [None; 3];
        for (slot, key) in physical.iter_mut().zip(PHYSICAL_PROPERTIES) {
            *slot = object
                .properties
                .get(key)
                .and_then(|v| v.trim().parse::<f64>().ok());
        }

        let blob: BTreeMap<&str, &str> = object
            .properties
            .iter()
            .filter(|(key, _)| key.as_str() != VERSION_PROPERTY)
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let properties = if blob.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&blob)?)
        };

        Ok(ObjectParams {
            id: object.id.trim().to_string(),
            parent_id: object
                .parent_id
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string),
            object_type: object.object_type.as_str().to_string(),
            subtype: object.subtype.clone(),
            name: object.name.trim().to_string(),
            designation: object.designation.clone(),
            global: axes(object.global_coordinates.as_ref()),
            local: axes(object.local_coordinates.as_ref()),
            physical,
            properties,
            discovered: object.discovered,
            discovery_date: object.discovery_date,
        })
    }
}

// =============================================================================
// Extended Properties
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PropertiesRow {
    pub object_id: String,
    pub proper_motion_ra: Option<f64>,
    pub proper_motion_dec: Option<f64>,
    pub radial_velocity: Option<f64>,
    pub parallax: Option<f64>,
    pub metallicity: Option<f64>,
    pub age_years: Option<f64>,
    pub properties: Option<String>,
    pub discovery_info: Option<String>,
}

impl PropertiesRow {
    pub fn into_properties(self) -> ObjectProperties {
        let extra = self
            .properties
            .as_deref()
            .and_then(|raw| flatten_json_properties(&self.object_id, raw));
        ObjectProperties {
            object_id: self.object_id,
            proper_motion_ra: self.proper_motion_ra,
            proper_motion_dec: self.proper_motion_dec,
            radial_velocity: self.radial_velocity,
            parallax: self.parallax,
            metallicity: self.metallicity,
            age_years: self.age_years,
            extra,
            discovery_info: self.discovery_info,
        }
    }
}

// =============================================================================
// Type Catalogue
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct TypeRow {
    #[sqlx(rename = "type")]
    pub object_type: String,
    pub subtype: String,
    pub description: Option<String>,
    pub parent_type: Option<String>,
}

impl TypeRow {
    pub fn into_type_info(self) -> TypeInfo {
        TypeInfo {
            object_type: CelestialObjectType::from_stored(&self.object_type),
            subtype: Some(self.subtype).filter(|s| !s.is_empty()),
            description: self.description,
            parent_type: self.parent_type.as_deref().and_then(|p| p.parse().ok()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ObjectRow {
        ObjectRow {
            id: "earth".to_string(),
            parent_id: Some("sol".to_string()),
            object_type: "PLANET".to_string(),
            subtype: None,
            name: "Earth".to_string(),
            designation: Some("Sol III".to_string()),
            coord_x: Some(1.0),
            coord_y: Some(0.0),
            coord_z: Some(0.0),
            local_x: Some(1.0),
            local_y: None,
            local_z: Some(0.0),
            mass_solar_masses: Some(3.0e-6),
            radius_solar_radii: None,
            temperature_kelvin: Some(288.0),
            properties: Some(r#"{"temperature_kelvin":"288.0","atmosphere":"N2/O2","habitable":true,"moons":1,"note":null}"#.to_string()),
            discovered: true,
            discovery_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            version: 4,
        }
    }

    #[test]
    fn test_row_maps_to_object() {
        let obj = row().into_object();
        assert_eq!(obj.object_type, CelestialObjectType::Planet);
        assert_eq!(obj.global_coordinates, Some(Coordinates::new(1.0, 0.0, 0.0)));
        // A partially null position is not a position.
        assert_eq!(obj.local_coordinates, None);
        assert_eq!(obj.version(), Some(4));
        assert!(obj.created_at.is_some());
    }

    #[test]
    fn test_property_map_layering() {
        let obj = row().into_object();
        let props = &obj.properties;

        // Column value, not overlaid by the blob.
        assert_eq!(props.get("mass_solar_masses").map(String::as_str), Some("0.000003"));
        // Blob text wins over the column rendering.
        assert_eq!(props.get("temperature_kelvin").map(String::as_str), Some("288.0"));
        assert_eq!(props.get("atmosphere").map(String::as_str), Some("N2/O2"));
        assert_eq!(props.get("habitable").map(String::as_str), Some("true"));
        assert_eq!(props.get("moons").map(String::as_str), Some("1"));
        assert!(!props.contains_key("note"));
        assert!(!props.contains_key("radius_solar_radii"));
        assert_eq!(props.get("version").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_version_column_beats_blob() {
        let mut r = row();
        r.properties = Some(r#"{"version":"99"}"#.to_string());
        assert_eq!(r.into_object().version(), Some(4));
    }

    #[test]
    fn test_bad_blob_degrades() {
        let mut r = row();
        r.properties = Some("{not json".to_string());
        let obj = r.into_object();
        assert_eq!(obj.properties.len(), 3); // mass, temperature, version

        assert!(flatten_json_properties("x", "[1,2]").is_none());
        assert!(flatten_json_properties("x", "{}").map_or(false, |m| m.is_empty()));
    }

    #[test]
    fn test_unknown_type_reads_as_unspecified() {
        let mut r = row();
        r.object_type = "NEUTRON_STAR".to_string();
        assert_eq!(r.into_object().object_type, CelestialObjectType::Unspecified);
    }

    #[test]
    fn test_params_from_object() {
        let obj = CelestialObject::new(" Earth ", CelestialObjectType::Planet)
            .with_parent("sol")
            .with_global_coordinates(Coordinates::new(1.0, 2.0, 3.0))
            .with_property("mass_solar_masses", "3e-6")
            .with_property("atmosphere", "N2/O2")
            .with_property("version", "2");

        let params = ObjectParams::from_object(&obj).unwrap();
        assert_eq!(params.name, "Earth");
        assert_eq!(params.object_type, "PLANET");
        assert_eq!(params.global, [Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(params.local, [None, None, None]);
        assert_eq!(params.physical, [Some(3e-6), None, None]);

        let blob: BTreeMap<String, String> =
            serde_json::from_str(params.properties.as_deref().unwrap()).unwrap();
        assert_eq!(blob.get("mass_solar_masses").map(String::as_str), Some("3e-6"));
        assert!(!blob.contains_key("version"));
    }

    #[test]
    fn test_params_without_properties() {
        let obj = CelestialObject::new("Sol", CelestialObjectType::Star).with_property("version", "1");
        let params = ObjectParams::from_object(&obj).unwrap();
        assert_eq!(params.properties, None);
        assert_eq!(params.parent_id, None);
    }

    #[test]
    fn test_type_row_mapping() {
        let info = TypeRow {
            object_type: "PLANET".to_string(),
            subtype: String::new(),
            description: Some("Body orbiting a star".to_string()),
            parent_type: Some("STAR".to_string()),
        }
        .into_type_info();
        assert_eq!(info.object_type, CelestialObjectType::Planet);
        assert_eq!(info.subtype, None);
        assert_eq!(info.parent_type, Some(CelestialObjectType::Star));
    }
}
