//! Grades, displayed against the cached students and modules

use async_trait::async_trait;
use std::sync::Arc;

use super::events::EventBus;
use super::mutation::{self, AddGrade, DeleteGrade, MutationOutcome, Refresh};
use super::refresh_collection;
use crate::cache::EntityCache;
use crate::client::ResourceClient;
use crate::error::ApiError;
use crate::filter::{apply_filters, FilterSet, GradeField};
use crate::forms::GradeForm;
use crate::relations::{Directory, GradeRow};
use crate::types::{EntityKind, Grade, Module, Student};

#[derive(Clone)]
pub struct GradeService {
    client: Arc<dyn ResourceClient>,
    students: Arc<EntityCache<Student>>,
    modules: Arc<EntityCache<Module>>,
    cache: Arc<EntityCache<Grade>>,
    events: EventBus,
}

impl GradeService {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        students: Arc<EntityCache<Student>>,
        modules: Arc<EntityCache<Module>>,
        cache: Arc<EntityCache<Grade>>,
        events: EventBus,
    ) -> Self {
        Self {
            client,
            students,
            modules,
            cache,
            events,
        }
    }

    /// Fetch `/grades` into the cache
    pub async fn reload(&self) -> Result<Arc<Vec<Grade>>, ApiError> {
        refresh_collection(
            self.client.as_ref(),
            &self.cache,
            &self.events,
            EntityKind::Grades,
        )
        .await
    }

    pub async fn cached(&self) -> Arc<Vec<Grade>> {
        self.cache.snapshot().await
    }

    pub fn cache(&self) -> &EntityCache<Grade> {
        &self.cache
    }

    /// Refresh students, modules and grades concurrently and join them
    ///
    /// Exactly three GET requests, however many grades there are.
    pub async fn rows(&self) -> Result<Vec<GradeRow>, ApiError> {
        let client = self.client.as_ref();
        let (students, modules, grades) = tokio::try_join!(
            refresh_collection(client, &self.students, &self.events, EntityKind::Students),
            refresh_collection(client, &self.modules, &self.events, EntityKind::Modules),
            refresh_collection(client, &self.cache, &self.events, EntityKind::Grades),
        )?;

        let directory = Directory::build(&students, &modules);
        Ok(directory.resolve(&grades))
    }

    /// Join whatever is cached, without network traffic
    pub async fn cached_rows(&self) -> Vec<GradeRow> {
        let students = self.students.snapshot().await;
        let modules = self.modules.snapshot().await;
        let grades = self.cache.snapshot().await;
        Directory::build(&students, &modules).resolve(&grades)
    }

    pub async fn list(&self, filters: &FilterSet<GradeField>) -> Result<Vec<GradeRow>, ApiError> {
        let rows = self.rows().await?;
        Ok(apply_filters(&rows, filters))
    }

    pub async fn add(&self, form: &mut GradeForm) -> MutationOutcome {
        mutation::run(
            self.client.as_ref(),
            &self.events,
            &mut AddGrade { form },
            self,
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> MutationOutcome {
        mutation::run(
            self.client.as_ref(),
            &self.events,
            &mut DeleteGrade { id },
            self,
        )
        .await
    }
}

#[async_trait]
impl Refresh for GradeService {
    async fn refresh(&self) -> Result<(), ApiError> {
        self.reload().await.map(|_| ())
    }
}
