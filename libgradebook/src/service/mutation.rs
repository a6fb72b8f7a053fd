//! Mutation workflows
//!
//! A workflow turns form state into one request, then either resets the form
//! and refreshes whatever the caller is showing, or explains the failure with
//! its rule table. Failures never propagate: [`run`] always returns a
//! [`MutationOutcome`] the caller can display as-is.

use async_trait::async_trait;
use serde_json::Value;

use super::events::{Event, EventBus};
use super::messages::{self, Rule};
use crate::client::{path_segment, ResourceClient};
use crate::error::{ApiError, GradebookError, Result};
use crate::forms::{GradeForm, ModuleForm, RegistrationForm, StudentForm, StudentGradeForm};

/// Reload hook invoked after a successful mutation
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self) -> std::result::Result<(), ApiError>;
}

/// Refresh hook that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRefresh;

#[async_trait]
impl Refresh for NoRefresh {
    async fn refresh(&self) -> std::result::Result<(), ApiError> {
        Ok(())
    }
}

/// The request a workflow wants to send
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Create { path: String, payload: Value },
    Remove { path: String },
}

impl Submission {
    /// Serialise a form into a POST
    pub fn create(path: impl Into<String>, form: &impl serde::Serialize) -> Result<Self> {
        let payload = serde_json::to_value(form)
            .map_err(|e| ApiError::Parse(format!("failed to encode request: {}", e)))?;
        Ok(Submission::Create {
            path: path.into(),
            payload,
        })
    }

    pub fn remove(path: impl Into<String>) -> Self {
        Submission::Remove { path: path.into() }
    }

    pub fn path(&self) -> &str {
        match self {
            Submission::Create { path, .. } | Submission::Remove { path } => path,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Submission::Create { payload, .. } => Some(payload),
            Submission::Remove { .. } => None,
        }
    }
}

/// A create or delete sequence with its failure messages
pub trait Workflow: Send {
    /// Stable snake_case identifier, used in events and logs
    fn name(&self) -> &'static str;

    fn submission(&self) -> Result<Submission>;

    fn rules(&self) -> &'static [Rule];

    /// Confirmation shown after success
    fn success_notice(&self) -> Option<String> {
        None
    }

    /// Clear the form after success
    fn reset(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationStatus {
    Succeeded { notice: Option<String> },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub workflow: &'static str,
    pub status: MutationStatus,
    /// Underlying request error of a failed mutation
    pub error: Option<ApiError>,
    /// The mutation went through but the follow-up reload did not
    pub refresh_error: Option<ApiError>,
}

impl MutationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, MutationStatus::Succeeded { .. })
    }

    /// Notice on success, error message on failure
    pub fn message(&self) -> Option<&str> {
        match &self.status {
            MutationStatus::Succeeded { notice } => notice.as_deref(),
            MutationStatus::Failed { message } => Some(message),
        }
    }
}

/// Submit one workflow
pub async fn run<W>(
    client: &dyn ResourceClient,
    events: &EventBus,
    workflow: &mut W,
    refresh: &dyn Refresh,
) -> MutationOutcome
where
    W: Workflow + ?Sized,
{
    let name = workflow.name();

    let submission = match workflow.submission() {
        Ok(submission) => submission,
        Err(GradebookError::Api(error)) => {
            return fail(events, name, error.to_string(), Some(error))
        }
        Err(e) => return fail(events, name, e.to_string(), None),
    };

    let result = match &submission {
        Submission::Create { path, payload } => client.create(path, payload).await,
        Submission::Remove { path } => client.remove(path).await,
    };

    match result {
        Ok(()) => {
            workflow.reset();
            let refresh_error = refresh.refresh().await.err();
            if let Some(e) = &refresh_error {
                tracing::warn!("{} succeeded but refresh failed: {}", name, e);
            }

            let notice = workflow.success_notice();
            tracing::info!("{} succeeded ({})", name, submission.path());
            events.emit(Event::MutationSucceeded {
                workflow: name.to_string(),
                notice: notice.clone().unwrap_or_default(),
            });

            MutationOutcome {
                workflow: name,
                status: MutationStatus::Succeeded { notice },
                error: None,
                refresh_error,
            }
        }
        Err(error) => {
            let message =
                messages::describe_failure(workflow.rules(), submission.payload(), &error);
            fail(events, name, message, Some(error))
        }
    }
}

fn fail(
    events: &EventBus,
    name: &'static str,
    message: String,
    error: Option<ApiError>,
) -> MutationOutcome {
    tracing::warn!("{} failed: {}", name, message);
    events.emit(Event::MutationFailed {
        workflow: name.to_string(),
        message: message.clone(),
    });
    MutationOutcome {
        workflow: name,
        status: MutationStatus::Failed { message },
        error,
        refresh_error: None,
    }
}

// ============================================================================
// Workflows
// ============================================================================

pub struct AddStudent<'a> {
    pub form: &'a mut StudentForm,
}

impl Workflow for AddStudent<'_> {
    fn name(&self) -> &'static str {
        "add_student"
    }

    fn submission(&self) -> Result<Submission> {
        Submission::create("/students", &*self.form)
    }

    fn rules(&self) -> &'static [Rule] {
        messages::ADD_STUDENT
    }

    fn reset(&mut self) {
        self.form.clear();
    }
}

/// Create or update a module by code
pub struct AddModule<'a> {
    pub form: &'a mut ModuleForm,
}

impl Workflow for AddModule<'_> {
    fn name(&self) -> &'static str {
        "add_module"
    }

    fn submission(&self) -> Result<Submission> {
        Submission::create("/modules", &*self.form)
    }

    fn rules(&self) -> &'static [Rule] {
        messages::ADD_MODULE
    }

    fn reset(&mut self) {
        self.form.clear();
    }
}

pub struct AddGrade<'a> {
    pub form: &'a mut GradeForm,
}

impl Workflow for AddGrade<'_> {
    fn name(&self) -> &'static str {
        "add_grade"
    }

    fn submission(&self) -> Result<Submission> {
        Submission::create("/grades/addGrade", &*self.form)
    }

    fn rules(&self) -> &'static [Rule] {
        messages::ADD_GRADE
    }

    fn reset(&mut self) {
        self.form.clear();
    }
}

/// Grade entry from a student's detail screen
pub struct AddStudentGrade<'a> {
    pub form: &'a mut StudentGradeForm,
}

impl Workflow for AddStudentGrade<'_> {
    fn name(&self) -> &'static str {
        "add_student_grade"
    }

    fn submission(&self) -> Result<Submission> {
        Submission::create("/students/studentDetail/addGrade", &*self.form)
    }

    fn rules(&self) -> &'static [Rule] {
        messages::ADD_STUDENT_GRADE
    }

    fn reset(&mut self) {
        self.form.clear();
    }
}

pub struct Register<'a> {
    pub form: &'a mut RegistrationForm,
}

impl Workflow for Register<'_> {
    fn name(&self) -> &'static str {
        "register"
    }

    fn submission(&self) -> Result<Submission> {
        Submission::create("/students/studentDetail/register", &*self.form)
    }

    fn rules(&self) -> &'static [Rule] {
        messages::REGISTER
    }

    fn reset(&mut self) {
        self.form.clear();
    }
}

pub struct Unregister {
    pub student_id: i64,
    pub module_code: String,
}

impl Workflow for Unregister {
    fn name(&self) -> &'static str {
        "unregister"
    }

    fn submission(&self) -> Result<Submission> {
        Ok(Submission::remove(format!(
            "/students/studentDetail/registrations/{}/{}",
            self.student_id,
            path_segment(&self.module_code)?
        )))
    }

    fn rules(&self) -> &'static [Rule] {
        messages::UNREGISTER
    }

    fn success_notice(&self) -> Option<String> {
        Some("Successfully unregistered.".to_string())
    }
}

pub struct DeleteStudent {
    pub id: i64,
}

impl Workflow for DeleteStudent {
    fn name(&self) -> &'static str {
        "delete_student"
    }

    fn submission(&self) -> Result<Submission> {
        Ok(Submission::remove(format!("/students/{}", self.id)))
    }

    fn rules(&self) -> &'static [Rule] {
        messages::DELETE_STUDENT
    }

    fn success_notice(&self) -> Option<String> {
        Some("Student successfully deleted.".to_string())
    }
}

pub struct DeleteModule {
    pub code: String,
}

impl Workflow for DeleteModule {
    fn name(&self) -> &'static str {
        "delete_module"
    }

    fn submission(&self) -> Result<Submission> {
        Ok(Submission::remove(format!("/modules/{}", path_segment(&self.code)?)))
    }

    fn rules(&self) -> &'static [Rule] {
        messages::DELETE_MODULE
    }

    fn success_notice(&self) -> Option<String> {
        Some("Module successfully deleted.".to_string())
    }
}

pub struct DeleteGrade {
    pub id: i64,
}

impl Workflow for DeleteGrade {
    fn name(&self) -> &'static str {
        "delete_grade"
    }

    fn submission(&self) -> Result<Submission> {
        Ok(Submission::remove(format!("/grades/{}", self.id)))
    }

    fn rules(&self) -> &'static [Rule] {
        messages::DELETE_GRADE
    }

    fn success_notice(&self) -> Option<String> {
        Some("Grade successfully deleted.".to_string())
    }
}

/// Grade deletion from a student's detail screen
pub struct DeleteStudentGrade {
    pub id: i64,
}

impl Workflow for DeleteStudentGrade {
    fn name(&self) -> &'static str {
        "delete_student_grade"
    }

    fn submission(&self) -> Result<Submission> {
        Ok(Submission::remove(format!("/grades/{}", self.id)))
    }

    fn rules(&self) -> &'static [Rule] {
        messages::DELETE_STUDENT_GRADE
    }

    fn success_notice(&self) -> Option<String> {
        Some("Grade successfully deleted.".to_string())
    }
}
