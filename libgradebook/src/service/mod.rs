//! Service layer for Gradebook
//!
//! `GradebookService` is the single entry point front ends use. It owns the
//! resource client, the three collection caches and the event bus, and hands
//! out per-entity sub-services that share them:
//!
//! - `StudentService`: students, student details, registrations, averages
//! - `ModuleService`: modules and module details
//! - `GradeService`: grades resolved against students and modules
//! - `EventBus`: refresh and mutation notifications
//!
//! # Example
//!
//! ```no_run
//! use libgradebook::forms::StudentForm;
//! use libgradebook::service::GradebookService;
//!
//! # async fn example() -> libgradebook::Result<()> {
//! let service = GradebookService::new()?;
//!
//! let students = service.students().reload().await?;
//! println!("{} students", students.len());
//!
//! let mut form = StudentForm::new();
//! form.set_id("42")?;
//! form.set_username("jdoe");
//! let outcome = service.students().add(&mut form).await;
//! if let Some(message) = outcome.message() {
//!     println!("{}", message);
//! }
//! # Ok(())
//! # }
//! ```

pub mod events;
pub mod grades;
pub mod messages;
pub mod modules;
pub mod mutation;
pub mod students;

pub use mutation::{MutationOutcome, MutationStatus, NoRefresh, Refresh, Workflow};

use serde::de::DeserializeOwned;
use std::sync::Arc;

use self::events::{Event, EventBus, EventReceiver};
use self::grades::GradeService;
use self::modules::ModuleService;
use self::students::StudentService;
use crate::cache::EntityCache;
use crate::client::{fetch_collection, HttpResourceClient, ResourceClient};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::types::EntityKind;

/// Main service facade
///
/// Sub-services share one client, one event bus and the same caches, so a
/// refresh through any of them is visible to all.
pub struct GradebookService {
    config: Arc<Config>,
    client: Arc<dyn ResourceClient>,
    students: StudentService,
    modules: ModuleService,
    grades: GradeService,
    event_bus: EventBus,
}

impl GradebookService {
    /// Load configuration from the default location and connect over HTTP
    pub fn new() -> Result<Self> {
        let config = Config::load_or_default()?;
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        config.validate()?;
        let client = HttpResourceClient::from_config(&config)?;
        Ok(Self::with_client(Arc::new(client), config))
    }

    /// Build the service over any client, e.g. a `MockClient`
    pub fn with_client(client: Arc<dyn ResourceClient>, config: Config) -> Self {
        let event_bus = EventBus::new(100);
        let student_cache = Arc::new(EntityCache::new());
        let module_cache = Arc::new(EntityCache::new());
        let grade_cache = Arc::new(EntityCache::new());

        let students = StudentService::new(
            Arc::clone(&client),
            Arc::clone(&student_cache),
            event_bus.clone(),
        );
        let modules = ModuleService::new(
            Arc::clone(&client),
            Arc::clone(&module_cache),
            event_bus.clone(),
        );
        let grades = GradeService::new(
            Arc::clone(&client),
            student_cache,
            module_cache,
            grade_cache,
            event_bus.clone(),
        );

        Self {
            config: Arc::new(config),
            client,
            students,
            modules,
            grades,
            event_bus,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn ResourceClient> {
        &self.client
    }

    pub fn students(&self) -> &StudentService {
        &self.students
    }

    pub fn modules(&self) -> &ModuleService {
        &self.modules
    }

    pub fn grades(&self) -> &GradeService {
        &self.grades
    }

    pub fn events(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}

/// Fetch a whole collection into its cache and announce it
pub(crate) async fn refresh_collection<T>(
    client: &dyn ResourceClient,
    cache: &EntityCache<T>,
    events: &EventBus,
    entity: EntityKind,
) -> std::result::Result<Arc<Vec<T>>, ApiError>
where
    T: DeserializeOwned + Send + Sync,
{
    let items: Vec<T> = fetch_collection(client, entity.path(), entity.embedded_key()).await?;
    let count = items.len();
    let generation = cache.store(items).await;
    tracing::info!("Refreshed {} ({} items, generation {})", entity, count, generation);
    events.emit(Event::CollectionRefreshed { entity, count });
    Ok(cache.snapshot().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Method, MockClient};
    use serde_json::json;

    fn service(client: &MockClient) -> GradebookService {
        GradebookService::with_client(Arc::new(client.clone()), Config::default_config())
    }

    #[tokio::test]
    async fn test_sub_services_share_caches() {
        let client = MockClient::new();
        client.respond_get(
            "/students",
            json!({"_embedded": {"students": [{
                "id": 1, "username": "ann01", "email": "ann@example.edu",
                "firstName": "Ann", "lastName": "Lee"
            }]}}),
        );
        let service = service(&client);

        service.students().reload().await.unwrap();
        let rows = service.grades().cached_rows().await;
        assert!(rows.is_empty());
        assert_eq!(service.students().cached().await.len(), 1);
        assert_eq!(client.call_count(Method::Get), 1);
    }

    #[tokio::test]
    async fn test_refresh_emits_collection_event() {
        let client = MockClient::new();
        client.respond_get("/modules", json!({"_embedded": {"modules": []}}));
        let service = service(&client);
        let mut receiver = service.subscribe();

        service.modules().reload().await.unwrap();

        assert_eq!(
            receiver.recv().await.unwrap(),
            Event::CollectionRefreshed {
                entity: EntityKind::Modules,
                count: 0
            }
        );
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let mut config = Config::default_config();
        config.api.base_url = "nope".to_string();
        let err = GradebookService::from_config(config).err().unwrap();
        assert_eq!(err.exit_code(), 2);
    }
}
