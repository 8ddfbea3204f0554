//! Celestial object request handler.
//!
//! Each public method is one RPC: validate, call the repository, map the
//! outcome. Failures are logged with the method name before they are turned
//! into a [`Status`].

use std::future::Future;
use std::sync::Arc;

use gameworld_core::validation::validate_region;
use gameworld_core::{
    CelestialObject, CelestialObjectType, HierarchyNode, ObjectFilter, ObjectProperties,
};
use gameworld_db::{CelestialObjectRepository, UpdateOutcome};
use tokio::sync::watch;
use tonic::Status;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::{ServiceConfig, ServiceSettings};
use crate::error::{ServiceError, ServiceResult};
use crate::services::requests::*;

/// Serving state reported by [`GameWorldService::health_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServingStatus {
    Serving,
}

/// Celestial object service implementation.
pub struct GameWorldService {
    repo: Arc<dyn CelestialObjectRepository>,
    config: watch::Receiver<ServiceConfig>,
}

impl GameWorldService {
    /// Create a new service. Settings are read from `config` on every request.
    pub fn new(
        repo: Arc<dyn CelestialObjectRepository>,
        config: watch::Receiver<ServiceConfig>,
    ) -> Self {
        GameWorldService { repo, config }
    }

    fn settings(&self) -> ServiceSettings {
        self.config.borrow().service.clone()
    }

    // =========================================================================
    // Catalogue
    // =========================================================================

    pub async fn get_object_types(
        &self,
        request: GetObjectTypesRequest,
    ) -> Result<GetObjectTypesResponse, Status> {
        handle_request("GetObjectTypes", async move {
            validate_request(RequestKind::Other)?;
            let parent_type = match request.parent_type {
                Some(CelestialObjectType::Unspecified) => {
                    return Err(ServiceError::invalid("Parent type must be specified"))
                }
                other => other,
            };
            let types = self.repo.get_object_types(parent_type).await?;
            Ok(GetObjectTypesResponse { types })
        })
        .await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_celestial_object(
        &self,
        request: GetCelestialObjectRequest,
    ) -> Result<CelestialObject, Status> {
        handle_request("GetCelestialObject", async move {
            let id = require_id(&request.id, "Object ID cannot be empty")?;
            self.repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| ServiceError::not_found(id))
        })
        .await
    }

    pub async fn list_celestial_objects(
        &self,
        request: ListCelestialObjectsRequest,
    ) -> Result<ListCelestialObjectsResponse, Status> {
        handle_request("ListCelestialObjects", async move {
            let page_size = self.settings().page_size(request.page_size) as i64;
            let offset = parse_page_token(&request.page_token)?;
            let filter = request.filter.unwrap_or_default();

            let total_count = self.repo.count(&filter).await?;
            let objects = self.repo.list_page(&filter, page_size, offset).await?;

            let next_page_token = offset
                .checked_add(page_size)
                .filter(|next| *next < total_count)
                .map(|next| next.to_string());
            debug!(offset, page_size, total_count, returned = objects.len(), "Listed objects");

            Ok(ListCelestialObjectsResponse {
                objects,
                next_page_token,
                total_count,
            })
        })
        .await
    }

    pub async fn search_region(
        &self,
        request: SearchRegionRequest,
    ) -> Result<Vec<CelestialObject>, Status> {
        handle_request("SearchRegion", async move {
            validate_region(&request.center, request.radius)?;
            Ok(self
                .repo
                .find_in_region(request.center, request.radius)
                .await?)
        })
        .await
    }

    pub async fn get_hierarchy(
        &self,
        request: GetHierarchyRequest,
    ) -> Result<Vec<HierarchyNode>, Status> {
        handle_request("GetHierarchy", async move {
            let root_id = require_id(&request.root_id, "Root object ID is required")?;
            let nodes = self.repo.get_hierarchy(root_id).await?;
            if nodes.is_empty() {
                return Err(ServiceError::not_found(root_id));
            }
            Ok(nodes)
        })
        .await
    }

    pub async fn get_object_properties(
        &self,
        request: GetObjectPropertiesRequest,
    ) -> Result<ObjectProperties, Status> {
        handle_request("GetObjectProperties", async move {
            let id = require_id(&request.object_id, "Object ID is required")?;
            self.repo.get_properties(id).await?.ok_or_else(|| {
                ServiceError::NotFound(format!("No extended properties for object {}", id))
            })
        })
        .await
    }

    // =========================================================================
    // Writes
    // =========================================================================

    pub async fn create_celestial_object(
        &self,
        request: CreateCelestialObjectRequest,
    ) -> Result<CelestialObject, Status> {
        handle_request("CreateCelestialObject", async move {
            validate_request(RequestKind::Create(&request))?;
            let mut object = request
                .object
                .ok_or_else(|| ServiceError::invalid("Object data is required"))?;
            normalize_parent(&mut object);

            if let Some(parent_id) = object.parent_id.as_deref() {
                if self.repo.get_by_id(parent_id).await?.is_none() {
                    return Err(ServiceError::invalid("Parent object not found"));
                }
            }

            let created = self.repo.create(&object).await?;
            info!(id = %created.id, name = %created.name, "Created celestial object");
            Ok(created)
        })
        .await
    }

    pub async fn update_celestial_object(
        &self,
        request: UpdateCelestialObjectRequest,
    ) -> Result<CelestialObject, Status> {
        handle_request("UpdateCelestialObject", async move {
            validate_request(RequestKind::Update(&request))?;
            let mask = parse_object_mask(&request.update_mask)?;
            let id = request.id.trim();
            let incoming = request
                .object
                .as_ref()
                .ok_or_else(|| ServiceError::invalid("Object data is required"))?;

            let existing = self
                .repo
                .get_by_id(id)
                .await?
                .ok_or_else(|| ServiceError::not_found(id))?;

            let merged = merge_update(id, &existing, incoming, &mask);
            match self.repo.update(&merged).await? {
                UpdateOutcome::Updated(updated) => {
                    info!(id = %updated.id, version = ?updated.version(), "Updated celestial object");
                    Ok(updated)
                }
                UpdateOutcome::NotFound => Err(ServiceError::not_found(id)),
                UpdateOutcome::VersionConflict { current } => {
                    Err(ServiceError::FailedPrecondition(format!(
                        "Object version mismatch (current version {}). Please reload the object and try again.",
                        current
                    )))
                }
            }
        })
        .await
    }

    pub async fn delete_celestial_object(
        &self,
        request: DeleteCelestialObjectRequest,
    ) -> Result<(), Status> {
        handle_request("DeleteCelestialObject", async move {
            let id = require_id(&request.id, "Object ID is required")?;
            if self.repo.get_by_id(id).await?.is_none() {
                return Err(ServiceError::not_found(id));
            }

            let removed = if request.hard_delete {
                if !self.repo.get_children(id).await?.is_empty() {
                    return Err(ServiceError::FailedPrecondition(
                        "Cannot hard delete object with children. Delete children first or use soft delete."
                            .to_string(),
                    ));
                }
                self.repo.purge(id).await?
            } else {
                self.repo.remove(id).await?
            };

            if !removed {
                // Deleted concurrently between the lookup and the write.
                return Err(ServiceError::not_found(id));
            }
            info!(id = %id, hard = request.hard_delete, "Deleted celestial object");
            Ok(())
        })
        .await
    }

    pub async fn update_object_properties(
        &self,
        request: UpdateObjectPropertiesRequest,
    ) -> Result<ObjectProperties, Status> {
        handle_request("UpdateObjectProperties", async move {
            let id = require_id(&request.object_id, "Object ID is required")?;
            let properties = request
                .properties
                .ok_or_else(|| ServiceError::invalid("Properties are required"))?;
            let mask = parse_property_mask(&request.update_mask)?;

            if !self.repo.update_properties(id, &properties, &mask).await? {
                return Err(ServiceError::not_found(id));
            }
            self.repo
                .get_properties(id)
                .await?
                .ok_or_else(|| ServiceError::not_found(id))
        })
        .await
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Probes the store with a cheap count.
    pub async fn health_check(&self) -> Result<ServingStatus, Status> {
        match self.repo.count(&ObjectFilter::default()).await {
            Ok(_) => Ok(ServingStatus::Serving),
            Err(e) => {
                error!(error = %e, "Health check failed");
                Err(Status::internal("Service unhealthy"))
            }
        }
    }
}

/// Runs one request inside a span and logs its failure.
async fn handle_request<T, F>(method: &'static str, fut: F) -> Result<T, Status>
where
    F: Future<Output = ServiceResult<T>>,
{
    let span = info_span!("rpc", method);
    match fut.instrument(span).await {
        Ok(value) => Ok(value),
        Err(err) => {
            if err.is_server_fault() {
                error!(method, error = %err, "Request failed");
            } else {
                warn!(method, error = %err, "Request rejected");
            }
            Err(err.into())
        }
    }
}

fn parse_page_token(token: &str) -> ServiceResult<i64> {
    if token.is_empty() {
        return Ok(0);
    }
    match token.parse::<i64>() {
        Ok(offset) if offset >= 0 => Ok(offset),
        _ => Err(ServiceError::invalid("Invalid page token")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use gameworld_core::{
        Coordinates, PropertyField, TypeInfo, INITIAL_VERSION, VERSION_PROPERTY,
    };
    use gameworld_db::{DbError, DbResult};
    use tonic::Code;

    use crate::config::ConfigWatcher;

    // =========================================================================
    // In-memory repository
    // =========================================================================

    #[derive(Default)]
    struct MemoryRepository {
        objects: Mutex<BTreeMap<String, (CelestialObject, bool)>>,
        properties: Mutex<BTreeMap<String, ObjectProperties>>,
        next_id: Mutex<u32>,
        failing: AtomicBool,
    }

    impl MemoryRepository {
        fn check(&self) -> DbResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(DbError::ConnectionFailed("connection refused".into()));
            }
            Ok(())
        }

        fn live(&self) -> Vec<CelestialObject> {
            let mut objects: Vec<_> = self
                .objects
                .lock()
                .unwrap()
                .values()
                .filter(|(_, deleted)| !deleted)
                .map(|(obj, _)| obj.clone())
                .collect();
            objects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
            objects
        }
    }

    #[async_trait]
    impl CelestialObjectRepository for MemoryRepository {
        async fn get_by_id(&self, id: &str) -> DbResult<Option<CelestialObject>> {
            self.check()?;
            Ok(self.live().into_iter().find(|o| o.id == id))
        }

        async fn list(&self, filter: &ObjectFilter) -> DbResult<Vec<CelestialObject>> {
            self.check()?;
            Ok(self.live().into_iter().filter(|o| filter.matches(o)).collect())
        }

        async fn list_page(
            &self,
            filter: &ObjectFilter,
            limit: i64,
            offset: i64,
        ) -> DbResult<Vec<CelestialObject>> {
            Ok(self
                .list(filter)
                .await?
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        async fn count(&self, filter: &ObjectFilter) -> DbResult<i64> {
            Ok(self.list(filter).await?.len() as i64)
        }

        async fn create(&self, object: &CelestialObject) -> DbResult<CelestialObject> {
            self.check()?;
            gameworld_core::validation::validate_object(object)?;
            let mut created = object.clone();
            if !created.has_id() {
                let mut next = self.next_id.lock().unwrap();
                *next += 1;
                created.id = format!("obj-{:03}", *next);
            }
            created.set_version(INITIAL_VERSION);
            self.objects
                .lock()
                .unwrap()
                .insert(created.id.clone(), (created.clone(), false));
            Ok(created)
        }

        async fn update(&self, object: &CelestialObject) -> DbResult<UpdateOutcome> {
            self.check()?;
            gameworld_core::validation::validate_object(object)?;
            let expected = object.version().unwrap_or(INITIAL_VERSION);
            let mut objects = self.objects.lock().unwrap();
            let Some((stored, false)) = objects.get_mut(&object.id) else {
                return Ok(UpdateOutcome::NotFound);
            };
            let current = stored.version().unwrap_or(INITIAL_VERSION);
            if current != expected {
                return Ok(UpdateOutcome::VersionConflict { current });
            }
            let mut updated = object.clone();
            updated.set_version(current + 1);
            *stored = updated.clone();
            Ok(UpdateOutcome::Updated(updated))
        }

        async fn remove(&self, id: &str) -> DbResult<bool> {
            self.check()?;
            match self.objects.lock().unwrap().get_mut(id) {
                Some((_, deleted)) if !*deleted => {
                    *deleted = true;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn purge(&self, id: &str) -> DbResult<bool> {
            self.check()?;
            self.properties.lock().unwrap().remove(id);
            Ok(self.objects.lock().unwrap().remove(id).is_some())
        }

        async fn find_by_type(
            &self,
            object_type: CelestialObjectType,
        ) -> DbResult<Vec<CelestialObject>> {
            self.list(&ObjectFilter {
                types: vec![object_type],
                ..Default::default()
            })
            .await
        }

        async fn find_by_parent(&self, parent_id: &str) -> DbResult<Vec<CelestialObject>> {
            self.list(&ObjectFilter {
                parent_id: Some(parent_id.to_string()),
                ..Default::default()
            })
            .await
        }

        async fn get_parent(&self, child_id: &str) -> DbResult<Option<CelestialObject>> {
            let Some(child) = self.get_by_id(child_id).await? else {
                return Ok(None);
            };
            match child.parent_id {
                Some(parent) => self.get_by_id(&parent).await,
                None => Ok(None),
            }
        }

        async fn find_in_region(
            &self,
            center: Coordinates,
            radius: f64,
        ) -> DbResult<Vec<CelestialObject>> {
            validate_region(&center, radius)?;
            let mut hits: Vec<(f64, CelestialObject)> = self
                .list(&ObjectFilter::default())
                .await?
                .into_iter()
                .filter_map(|o| {
                    let d = o.global_coordinates?.distance_to(&center);
                    (d <= radius).then_some((d, o))
                })
                .collect();
            hits.sort_by(|a, b| a.0.total_cmp(&b.0));
            Ok(hits.into_iter().map(|(_, o)| o).collect())
        }

        async fn get_hierarchy(&self, root_id: &str) -> DbResult<Vec<HierarchyNode>> {
            let Some(root) = self.get_by_id(root_id).await? else {
                return Ok(vec![]);
            };
            let mut nodes = vec![HierarchyNode { level: 1, object: root }];
            let mut cursor = 0;
            while cursor < nodes.len() {
                let level = nodes[cursor].level + 1;
                let parent = nodes[cursor].object.id.clone();
                for child in self.find_by_parent(&parent).await? {
                    nodes.push(HierarchyNode { level, object: child });
                }
                cursor += 1;
            }
            Ok(nodes)
        }

        async fn get_properties(&self, object_id: &str) -> DbResult<Option<ObjectProperties>> {
            self.check()?;
            Ok(self.properties.lock().unwrap().get(object_id).cloned())
        }

        async fn update_properties(
            &self,
            object_id: &str,
            properties: &ObjectProperties,
            mask: &[PropertyField],
        ) -> DbResult<bool> {
            if self.get_by_id(object_id).await?.is_none() {
                return Ok(false);
            }
            let mut all = self.properties.lock().unwrap();
            let stored = all.entry(object_id.to_string()).or_insert_with(|| ObjectProperties {
                object_id: object_id.to_string(),
                ..Default::default()
            });
            for field in mask {
                match field {
                    PropertyField::Parallax => stored.parallax = properties.parallax,
                    PropertyField::Metallicity => stored.metallicity = properties.metallicity,
                    _ => {}
                }
            }
            Ok(true)
        }

        async fn get_object_types(
            &self,
            parent_type: Option<CelestialObjectType>,
        ) -> DbResult<Vec<TypeInfo>> {
            self.check()?;
            let catalogue = [
                (CelestialObjectType::Galaxy, None),
                (CelestialObjectType::StarSystemSingle, Some(CelestialObjectType::Galaxy)),
                (CelestialObjectType::Star, Some(CelestialObjectType::StarSystemSingle)),
            ];
            Ok(catalogue
                .into_iter()
                .filter(|(_, parent)| parent_type.is_none() || *parent == parent_type)
                .map(|(object_type, parent)| TypeInfo {
                    object_type,
                    subtype: None,
                    description: None,
                    parent_type: parent,
                })
                .collect())
        }

        async fn get_available_properties(
            &self,
            _object_type: CelestialObjectType,
        ) -> DbResult<Vec<String>> {
            Ok(vec![])
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn service_with(config: ServiceConfig) -> (GameWorldService, Arc<MemoryRepository>, ConfigWatcher) {
        let repo = Arc::new(MemoryRepository::default());
        let watcher = ConfigWatcher::from_config(config);
        let service = GameWorldService::new(repo.clone(), watcher.subscribe());
        (service, repo, watcher)
    }

    fn service() -> (GameWorldService, Arc<MemoryRepository>, ConfigWatcher) {
        service_with(ServiceConfig::default())
    }

    async fn create(service: &GameWorldService, object: CelestialObject) -> CelestialObject {
        service
            .create_celestial_object(CreateCelestialObjectRequest {
                object: Some(object),
            })
            .await
            .unwrap()
    }

    fn star(name: &str) -> CelestialObject {
        CelestialObject::new(name, CelestialObjectType::Star)
    }

    // =========================================================================
    // Tests
    // =========================================================================

    #[tokio::test]
    async fn test_get_requires_id_and_existing_object() {
        let (service, _, _) = service();

        let err = service
            .get_celestial_object(GetCelestialObjectRequest { id: "".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), "Object ID cannot be empty");

        let err = service
            .get_celestial_object(GetCelestialObjectRequest { id: "missing".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);

        let sol = create(&service, star("Sol")).await;
        let found = service
            .get_celestial_object(GetCelestialObjectRequest { id: sol.id.clone() })
            .await
            .unwrap();
        assert_eq!(found.name, "Sol");
    }

    #[tokio::test]
    async fn test_list_paginates_with_offset_tokens() {
        let (service, _, _) = service();
        for name in ["A", "B", "C", "D", "E"] {
            create(&service, star(name)).await;
        }

        let mut token = String::new();
        let mut names = Vec::new();
        let mut pages = 0;
        loop {
            let page = service
                .list_celestial_objects(ListCelestialObjectsRequest {
                    page_size: 2,
                    page_token: token.clone(),
                    filter: None,
                })
                .await
                .unwrap();
            assert_eq!(page.total_count, 5);
            names.extend(page.objects.into_iter().map(|o| o.name));
            pages += 1;
            match page.next_page_token {
                Some(next) => token = next,
                None => break,
            }
        }
        assert_eq!(pages, 3);
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn test_list_rejects_bad_token_and_applies_filter() {
        let (service, _, _) = service();
        create(&service, star("Vega")).await;
        create(&service, CelestialObject::new("Andromeda", CelestialObjectType::Galaxy)).await;

        for token in ["abc", "-1"] {
            let err = service
                .list_celestial_objects(ListCelestialObjectsRequest {
                    page_token: token.into(),
                    ..Default::default()
                })
                .await
                .unwrap_err();
            assert_eq!(err.code(), Code::InvalidArgument);
            assert_eq!(err.message(), "Invalid page token");
        }

        let page = service
            .list_celestial_objects(ListCelestialObjectsRequest {
                filter: Some(ObjectFilter {
                    types: vec![CelestialObjectType::Galaxy],
                    ..Default::default()
                }),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.objects[0].name, "Andromeda");
        assert!(page.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_list_offset_past_end_has_no_next_token() {
        let (service, _, _) = service();
        create(&service, star("Vega")).await;

        for token in [i64::MAX.to_string(), (i64::MAX - 5).to_string(), "7".to_string()] {
            let page = service
                .list_celestial_objects(ListCelestialObjectsRequest {
                    page_size: 10,
                    page_token: token,
                    filter: None,
                })
                .await
                .unwrap();
            assert!(page.objects.is_empty());
            assert_eq!(page.total_count, 1);
            assert!(page.next_page_token.is_none());
        }
    }

    #[tokio::test]
    async fn test_page_size_follows_live_config() {
        let (service, _, watcher) = service();
        for name in ["A", "B", "C"] {
            create(&service, star(name)).await;
        }

        let mut config = ServiceConfig::default();
        config.service.default_page_size = 1;
        config.service.max_page_size = 2;
        watcher.publish(config).unwrap();

        let page = service
            .list_celestial_objects(ListCelestialObjectsRequest::default())
            .await
            .unwrap();
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.next_page_token.as_deref(), Some("1"));

        let page = service
            .list_celestial_objects(ListCelestialObjectsRequest {
                page_size: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.objects.len(), 2);
    }

    #[tokio::test]
    async fn test_create_checks_id_and_parent() {
        let (service, _, _) = service();

        let err = service
            .create_celestial_object(CreateCelestialObjectRequest {
                object: Some(star("Sol").with_id("preset")),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let err = service
            .create_celestial_object(CreateCelestialObjectRequest {
                object: Some(
                    CelestialObject::new("Earth", CelestialObjectType::Planet).with_parent("nope"),
                ),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), "Parent object not found");

        let err = service
            .create_celestial_object(CreateCelestialObjectRequest {
                object: Some(CelestialObject::new("Rogue", CelestialObjectType::Planet)),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        // A blank parent is no parent at all.
        let loose = create(&service, star("Loose").with_parent("")).await;
        assert_eq!(loose.parent_id, None);

        let sol = create(&service, star("Sol")).await;
        let earth = create(
            &service,
            CelestialObject::new("Earth", CelestialObjectType::Planet).with_parent(sol.id.clone()),
        )
        .await;
        assert!(earth.has_id());
        assert_eq!(earth.version(), Some(1));
    }

    #[tokio::test]
    async fn test_update_version_flow() {
        let (service, _, _) = service();
        let sol = create(&service, star("Sol")).await;

        let mut edit = sol.clone();
        edit.designation = Some("G2V".into());
        let updated = service
            .update_celestial_object(UpdateCelestialObjectRequest {
                id: sol.id.clone(),
                object: Some(edit.clone()),
                update_mask: vec![],
            })
            .await
            .unwrap();
        assert_eq!(updated.version(), Some(2));
        assert_eq!(updated.designation.as_deref(), Some("G2V"));

        // Same (now stale) version again.
        let err = service
            .update_celestial_object(UpdateCelestialObjectRequest {
                id: sol.id.clone(),
                object: Some(edit),
                update_mask: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);
        assert!(err.message().contains("current version 2"));

        let err = service
            .update_celestial_object(UpdateCelestialObjectRequest {
                id: "missing".into(),
                object: Some(star("Ghost")),
                update_mask: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_masked_update_touches_only_named_fields() {
        let (service, _, _) = service();
        let sol = create(&service, star("Sol").with_property("mass_solar_masses", "1.0")).await;

        let patch = CelestialObject {
            name: "Helios".into(),
            ..Default::default()
        }
        .with_property(VERSION_PROPERTY, "1");
        let updated = service
            .update_celestial_object(UpdateCelestialObjectRequest {
                id: sol.id.clone(),
                object: Some(patch),
                update_mask: vec!["name".into()],
            })
            .await
            .unwrap();
        assert_eq!(updated.name, "Helios");
        assert_eq!(updated.object_type, CelestialObjectType::Star);
        assert_eq!(updated.numeric_property("mass_solar_masses"), Some(1.0));
    }

    #[tokio::test]
    async fn test_update_rejects_mismatched_ids() {
        let (service, _, _) = service();
        let err = service
            .update_celestial_object(UpdateCelestialObjectRequest {
                id: "a".into(),
                object: Some(star("Sol").with_id("b")),
                update_mask: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
        assert_eq!(err.message(), "Inconsistent object IDs in update request");
    }

    #[tokio::test]
    async fn test_update_accepts_padded_request_id() {
        let (service, _, _) = service();
        let sol = create(&service, star("Sol")).await;

        let mut edit = sol.clone();
        edit.designation = Some("G2V".into());
        let updated = service
            .update_celestial_object(UpdateCelestialObjectRequest {
                id: format!("  {}  ", sol.id),
                object: Some(edit),
                update_mask: vec![],
            })
            .await
            .unwrap();
        assert_eq!(updated.id, sol.id);
        assert_eq!(updated.version(), Some(2));
    }

    #[tokio::test]
    async fn test_delete_soft_and_hard() {
        let (service, repo, _) = service();
        // A blank parent is no parent at all.
        let loose = create(&service, star("Loose").with_parent("")).await;
        assert_eq!(loose.parent_id, None);

        let sol = create(&service, star("Sol")).await;
        let earth = create(
            &service,
            CelestialObject::new("Earth", CelestialObjectType::Planet).with_parent(sol.id.clone()),
        )
        .await;

        let err = service
            .delete_celestial_object(DeleteCelestialObjectRequest {
                id: sol.id.clone(),
                hard_delete: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);

        service
            .delete_celestial_object(DeleteCelestialObjectRequest {
                id: earth.id.clone(),
                hard_delete: false,
            })
            .await
            .unwrap();
        // Soft-deleted rows stay in storage but are invisible.
        assert!(repo.objects.lock().unwrap().contains_key(&earth.id));
        let err = service
            .get_celestial_object(GetCelestialObjectRequest { id: earth.id.clone() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);

        service
            .delete_celestial_object(DeleteCelestialObjectRequest {
                id: sol.id.clone(),
                hard_delete: true,
            })
            .await
            .unwrap();
        assert!(!repo.objects.lock().unwrap().contains_key(&sol.id));

        let err = service
            .delete_celestial_object(DeleteCelestialObjectRequest {
                id: sol.id.clone(),
                hard_delete: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_region_and_hierarchy() {
        let (service, _, _) = service();
        let galaxy = create(
            &service,
            CelestialObject::new("Milky Way", CelestialObjectType::Galaxy)
                .with_global_coordinates(Coordinates::new(0.0, 0.0, 0.0)),
        )
        .await;
        create(
            &service,
            star("Far")
                .with_parent(galaxy.id.clone())
                .with_global_coordinates(Coordinates::new(500.0, 0.0, 0.0)),
        )
        .await;
        create(
            &service,
            star("Near")
                .with_parent(galaxy.id.clone())
                .with_global_coordinates(Coordinates::new(3.0, 4.0, 0.0)),
        )
        .await;

        let hits = service
            .search_region(SearchRegionRequest {
                center: Coordinates::default(),
                radius: 10.0,
            })
            .await
            .unwrap();
        let names: Vec<_> = hits.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["Milky Way", "Near"]);

        let err = service
            .search_region(SearchRegionRequest {
                center: Coordinates::default(),
                radius: -1.0,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let tree = service
            .get_hierarchy(GetHierarchyRequest { root_id: galaxy.id.clone() })
            .await
            .unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0].level, 1);
        assert!(tree[1..].iter().all(|n| n.level == 2));

        let err = service
            .get_hierarchy(GetHierarchyRequest { root_id: "missing".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_object_properties() {
        let (service, _, _) = service();
        let sol = create(&service, star("Sol")).await;

        let err = service
            .get_object_properties(GetObjectPropertiesRequest { object_id: sol.id.clone() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);

        let stored = service
            .update_object_properties(UpdateObjectPropertiesRequest {
                object_id: sol.id.clone(),
                properties: Some(ObjectProperties {
                    parallax: Some(742.0),
                    ..Default::default()
                }),
                update_mask: vec!["parallax".into()],
            })
            .await
            .unwrap();
        assert_eq!(stored.parallax, Some(742.0));

        let err = service
            .update_object_properties(UpdateObjectPropertiesRequest {
                object_id: sol.id.clone(),
                properties: Some(ObjectProperties::default()),
                update_mask: vec!["luminosity".into()],
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);

        let err = service
            .update_object_properties(UpdateObjectPropertiesRequest {
                object_id: "missing".into(),
                properties: Some(ObjectProperties::default()),
                update_mask: vec!["parallax".into()],
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn test_object_types() {
        let (service, _, _) = service();
        let all = service
            .get_object_types(GetObjectTypesRequest::default())
            .await
            .unwrap();
        assert_eq!(all.types.len(), 3);

        let children = service
            .get_object_types(GetObjectTypesRequest {
                parent_type: Some(CelestialObjectType::Galaxy),
            })
            .await
            .unwrap();
        assert_eq!(children.types.len(), 1);
        assert_eq!(children.types[0].object_type, CelestialObjectType::StarSystemSingle);

        let err = service
            .get_object_types(GetObjectTypesRequest {
                parent_type: Some(CelestialObjectType::Unspecified),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_health_check_and_store_failures() {
        let (service, repo, _) = service();
        assert_eq!(service.health_check().await.unwrap(), ServingStatus::Serving);

        repo.failing.store(true, Ordering::SeqCst);
        let err = service.health_check().await.unwrap_err();
        assert_eq!(err.code(), Code::Internal);
        assert_eq!(err.message(), "Service unhealthy");

        let err = service
            .get_celestial_object(GetCelestialObjectRequest { id: "x".into() })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::Internal);
        assert!(!err.message().contains("refused"));
    }
}
