//! # Validation Module
//!
//! Write-path validation for celestial objects and their extended
//! properties.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request handler                                               │
//! │  ├── Required ids, page sizes, update masks                             │
//! │  └── Parent existence on create                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Repository (before any statement is sent)                     │
//! │  └── THIS MODULE: entity rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (PostgreSQL)                                         │
//! │  ├── NOT NULL constraints                                               │
//! │  ├── PRIMARY KEY / UNIQUE constraints                                   │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gameworld_core::{CelestialObject, CelestialObjectType};
//! use gameworld_core::validation::validate_object;
//!
//! let orphan = CelestialObject::new("Rogue", CelestialObjectType::Planet);
//! assert!(validate_object(&orphan).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{CelestialObject, Coordinates, ObjectProperties};
use crate::{CelestialObjectType, MAX_COORDINATE, MAX_NAME_LENGTH, PHYSICAL_PROPERTIES, VERSION_PROPERTY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Object Validators
// =============================================================================

/// Validates an object before create or update.
///
/// ## Rules
/// - name non-empty after trimming, at most 255 characters
/// - type is not UNSPECIFIED
/// - global and local coordinates within ±1e6 on each axis
/// - PLANET has a parent
/// - physical properties parse as non-negative finite numbers
/// - `version`, when present, parses as a non-negative integer
pub fn validate_object(object: &CelestialObject) -> ValidationResult<()> {
    validate_name(&object.name)?;

    if !object.object_type.is_specified() {
        return Err(ValidationError::required("type"));
    }

    if let Some(coords) = &object.global_coordinates {
        validate_coordinates("global_coordinates", coords)?;
    }
    if let Some(coords) = &object.local_coordinates {
        validate_coordinates("local_coordinates", coords)?;
    }

    if object.object_type == CelestialObjectType::Planet
        && object.parent_id.as_deref().map_or(true, |p| p.trim().is_empty())
    {
        return Err(ValidationError::Inconsistent {
            field: "parent_id".to_string(),
            reason: "a PLANET must have a parent".to_string(),
        });
    }

    for key in PHYSICAL_PROPERTIES {
        if let Some(raw) = object.properties.get(key) {
            validate_non_negative_number(key, raw)?;
        }
    }

    if let Some(raw) = object.properties.get(VERSION_PROPERTY) {
        parse_version(raw)?;
    }

    Ok(())
}

/// Validates an object name.
///
/// ```rust
/// use gameworld_core::validation::validate_name;
///
/// assert!(validate_name("Alpha Centauri").is_ok());
/// assert!(validate_name("   ").is_err());
/// ```
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

pub fn validate_coordinates(field: &str, coords: &Coordinates) -> ValidationResult<()> {
    if !coords.within_bounds(MAX_COORDINATE) {
        return Err(ValidationError::OutOfBounds {
            field: field.to_string(),
            bound: MAX_COORDINATE,
        });
    }
    Ok(())
}

/// Parses the `version` property.
///
/// Shared with the repository, which reads the expected version from the
/// same property.
pub fn parse_version(raw: &str) -> ValidationResult<i32> {
    let version: i32 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::invalid_format(VERSION_PROPERTY, "must be an integer"))?;
    if version < 0 {
        return Err(ValidationError::Negative {
            field: VERSION_PROPERTY.to_string(),
        });
    }
    Ok(version)
}

fn validate_non_negative_number(field: &str, raw: &str) -> ValidationResult<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::invalid_format(field, "must be a number"))?;
    if !value.is_finite() {
        return Err(ValidationError::invalid_format(field, "must be finite"));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(value)
}

// =============================================================================
// Extended Property Validators
// =============================================================================

/// Validates an extended-properties record.
///
/// Every set value must be finite. Parallax and age are physically
/// non-negative; proper motion, radial velocity and metallicity are signed.
pub fn validate_properties(props: &ObjectProperties) -> ValidationResult<()> {
    let signed = [
        ("proper_motion_ra", props.proper_motion_ra),
        ("proper_motion_dec", props.proper_motion_dec),
        ("radial_velocity", props.radial_velocity),
        ("metallicity", props.metallicity),
    ];
    for (field, value) in signed {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(ValidationError::invalid_format(field, "must be finite"));
            }
        }
    }

    let unsigned = [("parallax", props.parallax), ("age_years", props.age_years)];
    for (field, value) in unsigned {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(ValidationError::invalid_format(field, "must be finite"));
            }
            if v < 0.0 {
                return Err(ValidationError::Negative {
                    field: field.to_string(),
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Search Validators
// =============================================================================

/// Validates a region query.
///
/// The center must be finite (it is not bound-checked: searching around a
/// point outside the volume is legal). The radius must be finite and
/// non-negative.
pub fn validate_region(center: &Coordinates, radius: f64) -> ValidationResult<()> {
    if !center.is_finite() {
        return Err(ValidationError::invalid_format("center", "must be finite"));
    }
    if !radius.is_finite() {
        return Err(ValidationError::invalid_format("radius", "must be finite"));
    }
    if radius < 0.0 {
        return Err(ValidationError::Negative {
            field: "radius".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
