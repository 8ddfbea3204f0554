//! # Domain Types
//!
//! Entities of the celestial object catalogue.
//!
//! ## Hierarchy Forest
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GALAXY "Milky Way"                      (parent_id = None → a root)   │
//! │   └── STAR_SYSTEM_SINGLE "Sol System"                                  │
//! │        └── STAR "Sol"                                                  │
//! │             ├── PLANET "Earth"      (PLANET always has a parent)       │
//! │             │    └── SPACE_STATION "ISS"                               │
//! │             └── PLANET "Mars"                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Global coordinates place an object in the shared 3-D space used by
//! region search; local coordinates are relative to the parent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::VERSION_PROPERTY;

// =============================================================================
// Celestial Object Type
// =============================================================================

/// Closed set of object kinds known to the catalogue.
///
/// Stored as its SCREAMING_SNAKE_CASE name (the same spelling used by the
/// type-metadata table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CelestialObjectType {
    /// Sentinel: never valid on a write.
    #[default]
    Unspecified,
    GalaxyCluster,
    Galaxy,
    GalaxyArm,
    MolecularCloud,
    StarSystemMultiple,
    StarSystemBinary,
    StarSystemSingle,
    Star,
    BlackHoleStellar,
    BrownDwarf,
    Planet,
    DwarfPlanet,
    Planetoid,
    Asteroid,
    AsteroidBelt,
    Comet,
    KuiperBeltObject,
    OortCloudObject,
    DysonSphere,
    DysonSwarm,
    ArtificialHabitat,
    SpaceStation,
    StellarEngine,
    Wormhole,
    QuantumVacuumMine,
}

impl CelestialObjectType {
    /// Every concrete type, excluding the sentinel.
    pub const ALL: [CelestialObjectType; 25] = [
        CelestialObjectType::GalaxyCluster,
        CelestialObjectType::Galaxy,
        CelestialObjectType::GalaxyArm,
        CelestialObjectType::MolecularCloud,
        CelestialObjectType::StarSystemMultiple,
        CelestialObjectType::StarSystemBinary,
        CelestialObjectType::StarSystemSingle,
        CelestialObjectType::Star,
        CelestialObjectType::BlackHoleStellar,
        CelestialObjectType::BrownDwarf,
        CelestialObjectType::Planet,
        CelestialObjectType::DwarfPlanet,
        CelestialObjectType::Planetoid,
        CelestialObjectType::Asteroid,
        CelestialObjectType::AsteroidBelt,
        CelestialObjectType::Comet,
        CelestialObjectType::KuiperBeltObject,
        CelestialObjectType::OortCloudObject,
        CelestialObjectType::DysonSphere,
        CelestialObjectType::DysonSwarm,
        CelestialObjectType::ArtificialHabitat,
        CelestialObjectType::SpaceStation,
        CelestialObjectType::StellarEngine,
        CelestialObjectType::Wormhole,
        CelestialObjectType::QuantumVacuumMine,
    ];

    /// Canonical storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CelestialObjectType::Unspecified => "CELESTIAL_OBJECT_TYPE_UNSPECIFIED",
            CelestialObjectType::GalaxyCluster => "GALAXY_CLUSTER",
            CelestialObjectType::Galaxy => "GALAXY",
            CelestialObjectType::GalaxyArm => "GALAXY_ARM",
            CelestialObjectType::MolecularCloud => "MOLECULAR_CLOUD",
            CelestialObjectType::StarSystemMultiple => "STAR_SYSTEM_MULTIPLE",
            CelestialObjectType::StarSystemBinary => "STAR_SYSTEM_BINARY",
            CelestialObjectType::StarSystemSingle => "STAR_SYSTEM_SINGLE",
            CelestialObjectType::Star => "STAR",
            CelestialObjectType::BlackHoleStellar => "BLACK_HOLE_STELLAR",
            CelestialObjectType::BrownDwarf => "BROWN_DWARF",
            CelestialObjectType::Planet => "PLANET",
            CelestialObjectType::DwarfPlanet => "DWARF_PLANET",
            CelestialObjectType::Planetoid => "PLANETOID",
            CelestialObjectType::Asteroid => "ASTEROID",
            CelestialObjectType::AsteroidBelt => "ASTEROID_BELT",
            CelestialObjectType::Comet => "COMET",
            CelestialObjectType::KuiperBeltObject => "KUIPER_BELT_OBJECT",
            CelestialObjectType::OortCloudObject => "OORT_CLOUD_OBJECT",
            CelestialObjectType::DysonSphere => "DYSON_SPHERE",
            CelestialObjectType::DysonSwarm => "DYSON_SWARM",
            CelestialObjectType::ArtificialHabitat => "ARTIFICIAL_HABITAT",
            CelestialObjectType::SpaceStation => "SPACE_STATION",
            CelestialObjectType::StellarEngine => "STELLAR_ENGINE",
            CelestialObjectType::Wormhole => "WORMHOLE",
            CelestialObjectType::QuantumVacuumMine => "QUANTUM_VACUUM_MINE",
        }
    }

    /// Maps a stored name back to a type.
    ///
    /// Unknown names degrade to [`CelestialObjectType::Unspecified`] so that a
    /// row written by a newer schema is still readable.
    pub fn from_stored(name: &str) -> Self {
        name.parse().unwrap_or(CelestialObjectType::Unspecified)
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, CelestialObjectType::Unspecified)
    }
}

impl fmt::Display for CelestialObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CelestialObjectType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        if wanted == CelestialObjectType::Unspecified.as_str() {
            return Ok(CelestialObjectType::Unspecified);
        }
        CelestialObjectType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownObjectType(s.to_string()))
    }
}

// =============================================================================
// Coordinates
// =============================================================================

/// A point in 3-D space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinates {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Coordinates { x, y, z }
    }

    /// Euclidean distance to `other`.
    #[cfg(any(test, feature = "testing"))]
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// True when every axis is within `±bound`.
    pub fn within_bounds(&self, bound: f64) -> bool {
        self.is_finite() && self.x.abs() <= bound && self.y.abs() <= bound && self.z.abs() <= bound
    }
}

// =============================================================================
// Celestial Object
// =============================================================================

/// A node of the hierarchy forest.
///
/// `id` is empty until the repository assigns one on create. Physical
/// properties (`mass_solar_masses`, ...) and the optimistic-concurrency
/// `version` travel in `properties` as strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CelestialObject {
    pub id: String,
    pub parent_id: Option<String>,
    pub object_type: CelestialObjectType,
    pub subtype: Option<String>,
    pub name: String,
    pub designation: Option<String>,
    pub global_coordinates: Option<Coordinates>,
    pub local_coordinates: Option<Coordinates>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub discovered: bool,
    pub discovery_date: Option<DateTime<Utc>>,
    /// Set by the store.
    pub created_at: Option<DateTime<Utc>>,
    /// Set by the store.
    pub updated_at: Option<DateTime<Utc>>,
}

impl CelestialObject {
    /// Creates an unsaved object with just a name and a type.
    pub fn new(name: impl Into<String>, object_type: CelestialObjectType) -> Self {
        CelestialObject {
            name: name.into(),
            object_type,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_global_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.global_coordinates = Some(coordinates);
        self
    }

    pub fn with_local_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.local_coordinates = Some(coordinates);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// True once the repository has assigned (or the caller supplied) an id.
    pub fn has_id(&self) -> bool {
        !self.id.is_empty()
    }

    /// The `version` property, if present and numeric.
    pub fn version(&self) -> Option<i32> {
        self.properties
            .get(VERSION_PROPERTY)
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn set_version(&mut self, version: i32) {
        self.properties
            .insert(VERSION_PROPERTY.to_string(), version.to_string());
    }

    /// A physical property parsed as a number.
    pub fn numeric_property(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(|v| v.trim().parse().ok())
    }
}

/// An object together with its depth below a traversal root (root = 1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    pub level: i32,
    pub object: CelestialObject,
}

// =============================================================================
// Extended Properties
// =============================================================================

/// Extended astrophysical attributes, stored 1:1 next to an object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectProperties {
    pub object_id: String,
    /// Milliarcseconds per year.
    pub proper_motion_ra: Option<f64>,
    /// Milliarcseconds per year.
    pub proper_motion_dec: Option<f64>,
    /// Kilometres per second.
    pub radial_velocity: Option<f64>,
    /// Milliarcseconds.
    pub parallax: Option<f64>,
    /// [Fe/H] in dex.
    pub metallicity: Option<f64>,
    pub age_years: Option<f64>,
    pub extra: Option<BTreeMap<String, String>>,
    pub discovery_info: Option<String>,
}

/// The fields of [`ObjectProperties`] an update mask may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyField {
    ProperMotionRa,
    ProperMotionDec,
    RadialVelocity,
    Parallax,
    Metallicity,
    AgeYears,
    Extra,
    DiscoveryInfo,
}

impl PropertyField {
    pub const ALL: [PropertyField; 8] = [
        PropertyField::ProperMotionRa,
        PropertyField::ProperMotionDec,
        PropertyField::RadialVelocity,
        PropertyField::Parallax,
        PropertyField::Metallicity,
        PropertyField::AgeYears,
        PropertyField::Extra,
        PropertyField::DiscoveryInfo,
    ];

    /// Field name as it appears in update masks.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyField::ProperMotionRa => "proper_motion_ra",
            PropertyField::ProperMotionDec => "proper_motion_dec",
            PropertyField::RadialVelocity => "radial_velocity",
            PropertyField::Parallax => "parallax",
            PropertyField::Metallicity => "metallicity",
            PropertyField::AgeYears => "age_years",
            PropertyField::Extra => "properties",
            PropertyField::DiscoveryInfo => "discovery_info",
        }
    }
}

impl fmt::Display for PropertyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PropertyField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| CoreError::UnknownPropertyField(s.to_string()))
    }
}

// =============================================================================
// Type Catalogue
// =============================================================================

/// One entry of the type-metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub object_type: CelestialObjectType,
    pub subtype: Option<String>,
    pub description: Option<String>,
    pub parent_type: Option<CelestialObjectType>,
}

// =============================================================================
// List Filter
// =============================================================================

/// Restricts `list` results. Empty filter matches every live object.
///
/// Conditions combine with AND; `types` entries combine with OR.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectFilter {
    #[serde(default)]
    pub types: Vec<CelestialObjectType>,
    pub parent_id: Option<String>,
    /// Case-insensitive substring of the name.
    pub name_pattern: Option<String>,
}

impl ObjectFilter {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.parent_id.is_none()
            && self.name_pattern.as_deref().map_or(true, str::is_empty)
    }

    /// Applies the filter to an in-memory object.
    #[cfg(any(test, feature = "testing"))]
    pub fn matches(&self, object: &CelestialObject) -> bool {
        if !self.types.is_empty() && !self.types.contains(&object.object_type) {
            return false;
        }
        if let Some(parent) = &self.parent_id {
            if object.parent_id.as_ref() != Some(parent) {
                return false;
            }
        }
        match self.name_pattern.as_deref() {
            Some(pattern) if !pattern.is_empty() => object
                .name
                .to_lowercase()
                .contains(&pattern.to_lowercase()),
            _ => true,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_type_round_trips_through_name() {
        for ty in CelestialObjectType::ALL {
            assert_eq!(ty.as_str().parse::<CelestialObjectType>().unwrap(), ty);
        }
        assert_eq!(
            "space_station".parse::<CelestialObjectType>().unwrap(),
            CelestialObjectType::SpaceStation
        );
    }

    #[test]
    fn test_unknown_stored_type_degrades_to_unspecified() {
        assert_eq!(
            CelestialObjectType::from_stored("NEUTRON_STAR"),
            CelestialObjectType::Unspecified
        );
        assert!("NEUTRON_STAR".parse::<CelestialObjectType>().is_err());
    }

    #[test]
    fn test_object_type_serde_uses_storage_names() {
        let json = serde_json::to_string(&CelestialObjectType::BlackHoleStellar).unwrap();
        assert_eq!(json, "\"BLACK_HOLE_STELLAR\"");
    }

    #[test]
    fn test_distance() {
        let a = Coordinates::new(0.0, 0.0, 0.0);
        let b = Coordinates::new(3.0, 4.0, 12.0);
        assert!((a.distance_to(&b) - 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_bounds() {
        assert!(Coordinates::new(1e6, -1e6, 0.0).within_bounds(1e6));
        assert!(!Coordinates::new(1e6 + 1.0, 0.0, 0.0).within_bounds(1e6));
        assert!(!Coordinates::new(f64::NAN, 0.0, 0.0).within_bounds(1e6));
    }

    #[test]
    fn test_version_property() {
        let mut obj = CelestialObject::new("Sol", CelestialObjectType::Star);
        assert_eq!(obj.version(), None);
        obj.set_version(4);
        assert_eq!(obj.version(), Some(4));
        assert_eq!(obj.properties.get("version").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_property_field_names() {
        assert_eq!(
            "proper_motion_ra".parse::<PropertyField>().unwrap(),
            PropertyField::ProperMotionRa
        );
        assert_eq!("properties".parse::<PropertyField>().unwrap(), PropertyField::Extra);
        assert!("mass".parse::<PropertyField>().is_err());
    }

    #[test]
    fn test_filter_matches() {
        let earth = CelestialObject::new("Earth", CelestialObjectType::Planet).with_parent("sol");
        let sol = CelestialObject::new("Sol", CelestialObjectType::Star);

        let filter = ObjectFilter {
            types: vec![CelestialObjectType::Planet, CelestialObjectType::DwarfPlanet],
            ..Default::default()
        };
        assert!(filter.matches(&earth));
        assert!(!filter.matches(&sol));

        let filter = ObjectFilter {
            name_pattern: Some("ART".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&earth));

        let filter = ObjectFilter {
            parent_id: Some("sol".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&earth));
        assert!(!filter.matches(&sol));
        assert!(ObjectFilter::default().is_empty());
    }
}
