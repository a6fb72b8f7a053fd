//! Detail screens and how the user got to them
//!
//! A detail view is built with an explicit [`NavigationContext`] describing
//! the screen it was opened from. There is no ambient "previous page" state:
//! whoever opens a detail view says where "back" leads.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::list::ListState;
use crate::error::ApiError;
use crate::filter::{apply_filters, RosterField};
use crate::forms::{RegistrationForm, StudentGradeForm};
use crate::service::modules::ModuleService;
use crate::service::students::StudentService;
use crate::service::{MutationOutcome, Refresh};
use crate::types::{ModuleDetail, RosterEntry, StudentDetail};

/// One breadcrumb
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    pub label: String,
    pub href: String,
}

impl Crumb {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
        }
    }

    pub fn home() -> Self {
        Self::new("Home", "/")
    }
}

/// Where a detail view was opened from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationContext {
    pub parent: Option<Crumb>,
    pub current: Option<Crumb>,
}

impl NavigationContext {
    /// Opened directly, e.g. from a bookmark
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_students() -> Self {
        Self {
            parent: None,
            current: Some(Crumb::new("Students", "/students")),
        }
    }

    pub fn from_modules() -> Self {
        Self {
            parent: None,
            current: Some(Crumb::new("Modules", "/modules")),
        }
    }

    pub fn from_module_detail(code: &str) -> Self {
        Self {
            parent: Some(Crumb::new("Modules", "/modules")),
            current: Some(Crumb::new(
                "Module Detail",
                format!("/modules/moduleDetails/{}", code),
            )),
        }
    }

    /// Home first, then the recorded crumbs
    pub fn trail(&self) -> Vec<Crumb> {
        std::iter::once(Crumb::home())
            .chain(self.parent.iter().cloned())
            .chain(self.current.iter().cloned())
            .collect()
    }

    /// The screen "back" returns to
    pub fn back(&self) -> Crumb {
        self.current.clone().unwrap_or_else(Crumb::home)
    }
}

/// A student's detail screen
///
/// The view is its own refresh hook: registering, unregistering or grading
/// through it reloads the detail it shows.
pub struct StudentDetailView {
    students: StudentService,
    student_id: i64,
    context: NavigationContext,
    detail: RwLock<Option<StudentDetail>>,
}

impl StudentDetailView {
    pub fn new(students: StudentService, student_id: i64, context: NavigationContext) -> Self {
        Self {
            students,
            student_id,
            context,
            detail: RwLock::new(None),
        }
    }

    pub fn student_id(&self) -> i64 {
        self.student_id
    }

    pub fn context(&self) -> &NavigationContext {
        &self.context
    }

    /// Fetch the detail and keep it for [`StudentDetailView::detail`]
    pub async fn load(&self) -> Result<StudentDetail, ApiError> {
        let detail = self.students.detail(self.student_id).await?;
        *self.detail.write().await = Some(detail.clone());
        Ok(detail)
    }

    /// Last loaded detail
    pub async fn detail(&self) -> Option<StudentDetail> {
        self.detail.read().await.clone()
    }

    pub async fn average(&self) -> Result<Option<f64>, ApiError> {
        self.students.average(self.student_id).await
    }

    pub fn registration_form(&self) -> RegistrationForm {
        RegistrationForm::new(self.student_id)
    }

    pub fn grade_form(&self) -> StudentGradeForm {
        StudentGradeForm::new(self.student_id)
    }

    pub async fn register(&self, form: &mut RegistrationForm) -> MutationOutcome {
        self.students.register(form, self).await
    }

    pub async fn unregister(&self, module_code: &str) -> MutationOutcome {
        self.students
            .unregister(self.student_id, module_code, self)
            .await
    }

    pub async fn add_grade(&self, form: &mut StudentGradeForm) -> MutationOutcome {
        self.students.add_grade(form, self).await
    }

    pub async fn delete_grade(&self, grade_id: i64) -> MutationOutcome {
        self.students.delete_grade(grade_id, self).await
    }
}

#[async_trait]
impl Refresh for StudentDetailView {
    async fn refresh(&self) -> Result<(), ApiError> {
        self.load().await.map(|_| ())
    }
}

/// A module's detail screen with a filterable roster
///
/// Unregistering through the view reloads the roster it shows.
pub struct ModuleDetailView {
    modules: ModuleService,
    code: String,
    context: NavigationContext,
    detail: RwLock<Option<ModuleDetail>>,
}

impl ModuleDetailView {
    pub fn new(modules: ModuleService, code: &str, context: NavigationContext) -> Self {
        Self {
            modules,
            code: code.trim().to_uppercase(),
            context,
            detail: RwLock::new(None),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn context(&self) -> &NavigationContext {
        &self.context
    }

    /// Context for a student detail opened from this screen
    pub fn student_context(&self) -> NavigationContext {
        NavigationContext::from_module_detail(&self.code)
    }

    pub async fn load(&self) -> Result<ModuleDetail, ApiError> {
        let detail = self.modules.detail(&self.code).await?;
        *self.detail.write().await = Some(detail.clone());
        Ok(detail)
    }

    pub async fn detail(&self) -> Option<ModuleDetail> {
        self.detail.read().await.clone()
    }

    /// Unregister a roster student, then reload the roster
    pub async fn unregister(&self, student_id: i64) -> MutationOutcome {
        self.modules.unregister(student_id, &self.code, self).await
    }

    /// Visible roster page of the last loaded detail
    pub async fn roster(&self, state: &ListState<RosterField>) -> Vec<RosterEntry> {
        match self.detail.read().await.as_ref() {
            Some(detail) => state.visible(&detail.roster()),
            None => Vec::new(),
        }
    }

    /// Roster entries matching the filters, across all pages
    pub async fn roster_len(&self, state: &ListState<RosterField>) -> usize {
        match self.detail.read().await.as_ref() {
            Some(detail) => apply_filters(&detail.roster(), &state.filters).len(),
            None => 0,
        }
    }
}

#[async_trait]
impl Refresh for ModuleDetailView {
    async fn refresh(&self) -> Result<(), ApiError> {
        self.load().await.map(|_| ())
    }
}
