//! Modules and the module detail aggregate

use async_trait::async_trait;
use std::sync::Arc;

use super::events::EventBus;
use super::mutation::{self, AddModule, DeleteModule, MutationOutcome, Refresh, Unregister};
use super::refresh_collection;
use crate::cache::EntityCache;
use crate::client::{fetch_one, path_segment, ResourceClient};
use crate::error::ApiError;
use crate::filter::{apply_filters, FilterSet, ModuleField};
use crate::forms::ModuleForm;
use crate::types::{EntityKind, Module, ModuleDetail};

#[derive(Clone)]
pub struct ModuleService {
    client: Arc<dyn ResourceClient>,
    cache: Arc<EntityCache<Module>>,
    events: EventBus,
}

impl ModuleService {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        cache: Arc<EntityCache<Module>>,
        events: EventBus,
    ) -> Self {
        Self {
            client,
            cache,
            events,
        }
    }

    pub async fn reload(&self) -> Result<Arc<Vec<Module>>, ApiError> {
        refresh_collection(
            self.client.as_ref(),
            &self.cache,
            &self.events,
            EntityKind::Modules,
        )
        .await
    }

    pub async fn cached(&self) -> Arc<Vec<Module>> {
        self.cache.snapshot().await
    }

    pub fn cache(&self) -> &EntityCache<Module> {
        &self.cache
    }

    pub async fn list(&self, filters: &FilterSet<ModuleField>) -> Result<Vec<Module>, ApiError> {
        let modules = self.reload().await?;
        Ok(apply_filters(&modules, filters))
    }

    /// `GET /modules/moduleDetails/{code}`
    pub async fn detail(&self, code: &str) -> Result<ModuleDetail, ApiError> {
        let code = path_segment(&code.trim().to_uppercase())?;
        fetch_one(
            self.client.as_ref(),
            &format!("/modules/moduleDetails/{}", code),
        )
        .await
    }

    /// Create a module, or update the one with the same code
    pub async fn add(&self, form: &mut ModuleForm) -> MutationOutcome {
        mutation::run(
            self.client.as_ref(),
            &self.events,
            &mut AddModule { form },
            self,
        )
        .await
    }

    /// Remove one student's registration from this module's roster
    pub async fn unregister(
        &self,
        student_id: i64,
        code: &str,
        refresh: &dyn Refresh,
    ) -> MutationOutcome {
        let mut workflow = Unregister {
            student_id,
            module_code: code.trim().to_uppercase(),
        };
        mutation::run(self.client.as_ref(), &self.events, &mut workflow, refresh).await
    }

    pub async fn delete(&self, code: &str) -> MutationOutcome {
        let mut workflow = DeleteModule {
            code: code.trim().to_uppercase(),
        };
        mutation::run(self.client.as_ref(), &self.events, &mut workflow, self).await
    }
}

#[async_trait]
impl Refresh for ModuleService {
    async fn refresh(&self) -> Result<(), ApiError> {
        self.reload().await.map(|_| ())
    }
}
