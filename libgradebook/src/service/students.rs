//! Students, their detail aggregate, registrations and averages

use async_trait::async_trait;
use std::sync::Arc;

use super::events::EventBus;
use super::mutation::{
    self, AddStudent, AddStudentGrade, DeleteStudent, DeleteStudentGrade, MutationOutcome, Refresh,
    Register, Unregister,
};
use super::refresh_collection;
use crate::cache::EntityCache;
use crate::client::{fetch_one, ResourceClient};
use crate::error::ApiError;
use crate::filter::{apply_filters, FilterSet, StudentField};
use crate::forms::{RegistrationForm, StudentForm, StudentGradeForm};
use crate::types::{Average, EntityKind, Student, StudentDetail};

#[derive(Clone)]
pub struct StudentService {
    client: Arc<dyn ResourceClient>,
    cache: Arc<EntityCache<Student>>,
    events: EventBus,
}

impl StudentService {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        cache: Arc<EntityCache<Student>>,
        events: EventBus,
    ) -> Self {
        Self {
            client,
            cache,
            events,
        }
    }

    /// Fetch `/students` into the cache
    pub async fn reload(&self) -> Result<Arc<Vec<Student>>, ApiError> {
        refresh_collection(
            self.client.as_ref(),
            &self.cache,
            &self.events,
            EntityKind::Students,
        )
        .await
    }

    /// Last fetched snapshot, without network traffic
    pub async fn cached(&self) -> Arc<Vec<Student>> {
        self.cache.snapshot().await
    }

    pub fn cache(&self) -> &EntityCache<Student> {
        &self.cache
    }

    /// Reload, then filter
    pub async fn list(&self, filters: &FilterSet<StudentField>) -> Result<Vec<Student>, ApiError> {
        let students = self.reload().await?;
        Ok(apply_filters(&students, filters))
    }

    /// `GET /students/studentDetail/{id}`
    pub async fn detail(&self, id: i64) -> Result<StudentDetail, ApiError> {
        fetch_one(
            self.client.as_ref(),
            &format!("/students/studentDetail/{}", id),
        )
        .await
    }

    /// Server-computed average; `None` while nothing is graded
    pub async fn average(&self, id: i64) -> Result<Option<f64>, ApiError> {
        let average: Average = fetch_one(
            self.client.as_ref(),
            &format!("/students/studentDetail/computeAverage/{}", id),
        )
        .await?;
        Ok(average.average)
    }

    /// Create or overwrite a student, then reload the list
    pub async fn add(&self, form: &mut StudentForm) -> MutationOutcome {
        mutation::run(
            self.client.as_ref(),
            &self.events,
            &mut AddStudent { form },
            self,
        )
        .await
    }

    /// Delete a student, then reload the list
    ///
    /// On failure the cached list is left exactly as it was.
    pub async fn delete(&self, id: i64) -> MutationOutcome {
        mutation::run(
            self.client.as_ref(),
            &self.events,
            &mut DeleteStudent { id },
            self,
        )
        .await
    }

    pub async fn register(
        &self,
        form: &mut RegistrationForm,
        refresh: &dyn Refresh,
    ) -> MutationOutcome {
        mutation::run(
            self.client.as_ref(),
            &self.events,
            &mut Register { form },
            refresh,
        )
        .await
    }

    /// Remove a registration; the server drops the matching grade too
    pub async fn unregister(
        &self,
        student_id: i64,
        module_code: &str,
        refresh: &dyn Refresh,
    ) -> MutationOutcome {
        let mut workflow = Unregister {
            student_id,
            module_code: module_code.trim().to_uppercase(),
        };
        mutation::run(self.client.as_ref(), &self.events, &mut workflow, refresh).await
    }

    pub async fn add_grade(
        &self,
        form: &mut StudentGradeForm,
        refresh: &dyn Refresh,
    ) -> MutationOutcome {
        mutation::run(
            self.client.as_ref(),
            &self.events,
            &mut AddStudentGrade { form },
            refresh,
        )
        .await
    }

    /// Delete one of the student's grades
    pub async fn delete_grade(&self, grade_id: i64, refresh: &dyn Refresh) -> MutationOutcome {
        mutation::run(
            self.client.as_ref(),
            &self.events,
            &mut DeleteStudentGrade { id: grade_id },
            refresh,
        )
        .await
    }
}

#[async_trait]
impl Refresh for StudentService {
    async fn refresh(&self) -> Result<(), ApiError> {
        self.reload().await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Method, MockClient};
    use crate::filter::Matcher;
    use crate::service::NoRefresh;
    use serde_json::json;

    fn service(client: &MockClient) -> StudentService {
        StudentService::new(
            Arc::new(client.clone()),
            Arc::new(EntityCache::new()),
            EventBus::default(),
        )
    }

    fn students_page() -> serde_json::Value {
        json!({"_embedded": {"students": [
            {"id": 1, "username": "ann01", "email": "ann@example.edu", "firstName": "Ann", "lastName": "Lee"},
            {"id": 2, "username": "bob02", "email": "bob@example.edu", "firstName": "Bob", "lastName": "Ray"}
        ]}})
    }

    #[tokio::test]
    async fn test_list_filters_after_reload() {
        let client = MockClient::new();
        client.respond_get("/students", students_page());
        let service = service(&client);

        let filters = FilterSet::new().with(StudentField::Name, Matcher::contains("an"));
        let students = service.list(&filters).await.unwrap();

        assert_eq!(students.len(), 1);
        assert_eq!(students[0].first_name, "Ann");
        assert_eq!(service.cached().await.len(), 2);
    }

    #[tokio::test]
    async fn test_add_reloads_list() {
        let client = MockClient::new();
        client.respond_get("/students", students_page());
        let service = service(&client);

        let mut form = StudentForm::new();
        form.set_id("3").unwrap();
        form.set_username("cat03");
        form.set_email("cat@example.edu");
        form.set_first_name("Cat");
        form.set_last_name("Roe");

        let outcome = service.add(&mut form).await;

        assert!(outcome.is_success());
        assert_eq!(form, StudentForm::default());
        assert_eq!(client.calls_to(Method::Get, "/students"), 1);
    }

    #[tokio::test]
    async fn test_delete_missing_student_leaves_cache() {
        let client = MockClient::new();
        client.respond_get("/students", students_page());
        client.fail_remove("/students/9", ApiError::status(404, ""));
        let service = service(&client);
        service.reload().await.unwrap();
        let generation = service.cache().generation();

        let outcome = service.delete(9).await;

        assert_eq!(outcome.message(), Some("Student was not found."));
        assert_eq!(service.cached().await.len(), 2);
        assert_eq!(service.cache().generation(), generation);
        assert_eq!(client.calls_to(Method::Get, "/students"), 1);
    }

    #[tokio::test]
    async fn test_detail_and_average() {
        let client = MockClient::new();
        client.respond_get(
            "/students/studentDetail/1",
            json!({
                "student": {"id": 1, "username": "ann01", "email": "ann@example.edu", "firstName": "Ann", "lastName": "Lee"},
                "registeredModules": [{"code": "CS101", "name": "Programming", "mnc": true}],
                "grades": []
            }),
        );
        client.respond_get(
            "/students/studentDetail/computeAverage/1",
            json!({"average": "NaN"}),
        );
        let service = service(&client);

        let detail = service.detail(1).await.unwrap();
        assert!(detail.is_registered("CS101"));
        assert_eq!(service.average(1).await.unwrap(), None);

        let err = service.detail(2).await.unwrap_err();
        assert_eq!(err.status_code(), Some(404));
    }

    #[tokio::test]
    async fn test_register_conflict_message() {
        let client = MockClient::new();
        client.fail_create(
            "/students/studentDetail/register",
            ApiError::status(409, ""),
        );
        let service = service(&client);

        let mut form = RegistrationForm::new(1);
        form.set_module("CS101");
        let outcome = service.register(&mut form, &NoRefresh).await;

        assert_eq!(
            outcome.message(),
            Some("Please choose a module which has not been registered.")
        );
        assert_eq!(form.module_code.as_deref(), Some("CS101"));
    }
}
