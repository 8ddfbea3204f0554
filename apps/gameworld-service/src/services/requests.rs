//! Request and response messages of the celestial object service.
//!
//! Validation is shape-only: required fields, id consistency, known mask
//! entries. Anything that needs the store (parent existence, versions)
//! happens in the handler.

use std::str::FromStr;

use gameworld_core::validation::validate_object;
use gameworld_core::{
    CelestialObject, CelestialObjectType, Coordinates, ObjectFilter, ObjectProperties,
    PropertyField, TypeInfo, ValidationError, VERSION_PROPERTY,
};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetObjectTypesRequest {
    pub parent_type: Option<CelestialObjectType>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetObjectTypesResponse {
    pub types: Vec<TypeInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetCelestialObjectRequest {
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCelestialObjectsRequest {
    /// 0 or negative selects the configured default.
    pub page_size: i32,
    /// Opaque to clients; currently the decimal offset of the next row.
    pub page_token: String,
    pub filter: Option<ObjectFilter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCelestialObjectsResponse {
    pub objects: Vec<CelestialObject>,
    pub next_page_token: Option<String>,
    pub total_count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCelestialObjectRequest {
    pub object: Option<CelestialObject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCelestialObjectRequest {
    pub id: String,
    pub object: Option<CelestialObject>,
    /// Field names to take from `object`; empty replaces the whole object.
    #[serde(default)]
    pub update_mask: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteCelestialObjectRequest {
    pub id: String,
    #[serde(default)]
    pub hard_delete: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRegionRequest {
    pub center: Coordinates,
    pub radius: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetHierarchyRequest {
    pub root_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetObjectPropertiesRequest {
    pub object_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateObjectPropertiesRequest {
    pub object_id: String,
    pub properties: Option<ObjectProperties>,
    #[serde(default)]
    pub update_mask: Vec<String>,
}

// =============================================================================
// Update masks
// =============================================================================

/// Top-level object fields an update mask may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectField {
    Name,
    ParentId,
    Type,
    Subtype,
    Designation,
    GlobalCoordinates,
    LocalCoordinates,
    Properties,
    Discovered,
    DiscoveryDate,
}

impl ObjectField {
    pub const ALL: [ObjectField; 10] = [
        ObjectField::Name,
        ObjectField::ParentId,
        ObjectField::Type,
        ObjectField::Subtype,
        ObjectField::Designation,
        ObjectField::GlobalCoordinates,
        ObjectField::LocalCoordinates,
        ObjectField::Properties,
        ObjectField::Discovered,
        ObjectField::DiscoveryDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectField::Name => "name",
            ObjectField::ParentId => "parent_id",
            ObjectField::Type => "type",
            ObjectField::Subtype => "subtype",
            ObjectField::Designation => "designation",
            ObjectField::GlobalCoordinates => "global_coordinates",
            ObjectField::LocalCoordinates => "local_coordinates",
            ObjectField::Properties => "properties",
            ObjectField::Discovered => "discovered",
            ObjectField::DiscoveryDate => "discovery_date",
        }
    }

    fn copy(&self, from: &CelestialObject, to: &mut CelestialObject) {
        match self {
            ObjectField::Name => to.name = from.name.clone(),
            ObjectField::ParentId => to.parent_id = from.parent_id.clone(),
            ObjectField::Type => to.object_type = from.object_type,
            ObjectField::Subtype => to.subtype = from.subtype.clone(),
            ObjectField::Designation => to.designation = from.designation.clone(),
            ObjectField::GlobalCoordinates => to.global_coordinates = from.global_coordinates,
            ObjectField::LocalCoordinates => to.local_coordinates = from.local_coordinates,
            ObjectField::Properties => to.properties = from.properties.clone(),
            ObjectField::Discovered => to.discovered = from.discovered,
            ObjectField::DiscoveryDate => to.discovery_date = from.discovery_date,
        }
    }
}

impl FromStr for ObjectField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ObjectField::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "update_mask".to_string(),
                allowed: ObjectField::ALL.iter().map(|f| f.as_str().to_string()).collect(),
            })
    }
}

pub fn parse_object_mask(mask: &[String]) -> Result<Vec<ObjectField>, ValidationError> {
    mask.iter().map(|entry| entry.parse()).collect()
}

pub fn parse_property_mask(mask: &[String]) -> Result<Vec<PropertyField>, ValidationError> {
    mask.iter()
        .map(|entry| {
            entry.parse::<PropertyField>().map_err(|_| ValidationError::NotAllowed {
                field: "update_mask".to_string(),
                allowed: PropertyField::ALL.iter().map(|f| f.as_str().to_string()).collect(),
            })
        })
        .collect()
}

/// Builds the object an update writes.
///
/// Without a mask the incoming object replaces the stored one. With a mask
/// only the named fields are taken from `incoming`. The expected version
/// always comes from `incoming`, never from the stored copy.
pub fn merge_update(
    id: &str,
    existing: &CelestialObject,
    incoming: &CelestialObject,
    mask: &[ObjectField],
) -> CelestialObject {
    let mut merged = if mask.is_empty() {
        incoming.clone()
    } else {
        let mut merged = existing.clone();
        for field in mask {
            field.copy(incoming, &mut merged);
        }
        merged
    };
    merged.id = id.to_string();
    normalize_parent(&mut merged);
    merged.properties.remove(VERSION_PROPERTY);
    if let Some(version) = incoming.properties.get(VERSION_PROPERTY) {
        merged
            .properties
            .insert(VERSION_PROPERTY.to_string(), version.clone());
    }
    merged
}

// =============================================================================
// Validation
// =============================================================================

/// The request shapes that carry validation rules of their own.
#[derive(Debug, Clone, Copy)]
pub enum RequestKind<'a> {
    Object(&'a CelestialObject),
    Create(&'a CreateCelestialObjectRequest),
    Update(&'a UpdateCelestialObjectRequest),
    Other,
}

pub fn validate_request(kind: RequestKind<'_>) -> ServiceResult<()> {
    match kind {
        RequestKind::Object(object) => Ok(validate_object(object)?),
        RequestKind::Create(request) => {
            let object = request
                .object
                .as_ref()
                .ok_or_else(|| ServiceError::invalid("Create request must contain object data"))?;
            if object.has_id() {
                return Err(ServiceError::invalid(
                    "Object ID should not be specified in create request",
                ));
            }
            validate_request(RequestKind::Object(object))
        }
        RequestKind::Update(request) => {
            if request.id.trim().is_empty() {
                return Err(ServiceError::invalid("Object ID is required"));
            }
            let object = request
                .object
                .as_ref()
                .ok_or_else(|| ServiceError::invalid("Object data is required"))?;
            if object.has_id() && object.id.trim() != request.id.trim() {
                return Err(ServiceError::invalid("Inconsistent object IDs in update request"));
            }
            let mask = parse_object_mask(&request.update_mask)?;
            // A masked update may carry a partial object; the merged result
            // is validated by the repository instead.
            if mask.is_empty() {
                validate_request(RequestKind::Object(object))?;
            }
            Ok(())
        }
        RequestKind::Other => Ok(()),
    }
}

/// Trims `parent_id` and drops it when blank, matching how the repository
/// stores a missing parent.
pub fn normalize_parent(object: &mut CelestialObject) {
    object.parent_id = object
        .parent_id
        .take()
        .map(|parent| parent.trim().to_string())
        .filter(|parent| !parent.is_empty());
}

/// Rejects empty identifiers with the caller's field name.
pub fn require_id<'a>(id: &'a str, message: &str) -> ServiceResult<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ServiceError::invalid(message));
    }
    Ok(id)
}
