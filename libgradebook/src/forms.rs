//! Form state behind the mutation workflows
//!
//! Setters take raw user input. Blank text becomes `None` and is sent as
//! `null`, so the server (and the missing-field rules) see exactly what the
//! user left out. Numeric setters reject text that is not a number.

use serde::Serialize;

use crate::error::{GradebookError, Result};

/// Blank input is absent input
fn text_input(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn number_input(field: &str, value: &str) -> Result<Option<i64>> {
    match text_input(value) {
        None => Ok(None),
        Some(text) => text.parse::<i64>().map(Some).map_err(|_| {
            GradebookError::InvalidInput(format!("{} must be a whole number, got '{}'", field, text))
        }),
    }
}

fn module_code_input(value: &str) -> Option<String> {
    text_input(value).map(|code| code.to_uppercase())
}

// ============================================================================
// Students
// ============================================================================

/// Body of `POST /students`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentForm {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl StudentForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_id(&mut self, value: &str) -> Result<()> {
        self.id = number_input("Student id", value)?;
        Ok(())
    }

    pub fn set_username(&mut self, value: &str) {
        self.username = text_input(value);
    }

    pub fn set_email(&mut self, value: &str) {
        self.email = text_input(value);
    }

    pub fn set_first_name(&mut self, value: &str) {
        self.first_name = text_input(value);
    }

    pub fn set_last_name(&mut self, value: &str) {
        self.last_name = text_input(value);
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Modules
// ============================================================================

/// Body of `POST /modules`; the code is stored upper-cased
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleForm {
    pub code: Option<String>,
    pub name: Option<String>,
    pub mnc: bool,
}

impl ModuleForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_code(&mut self, value: &str) {
        self.code = module_code_input(value);
    }

    pub fn set_name(&mut self, value: &str) {
        self.name = text_input(value);
    }

    pub fn set_mnc(&mut self, mnc: bool) {
        self.mnc = mnc;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// Grades
// ============================================================================

/// Body of `POST /grades/addGrade`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GradeForm {
    pub student_id: Option<i64>,
    pub module_code: Option<String>,
    pub score: Option<i64>,
}

impl GradeForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_student(&mut self, student_id: Option<i64>) {
        self.student_id = student_id;
    }

    pub fn set_module(&mut self, value: &str) {
        self.module_code = module_code_input(value);
    }

    pub fn set_score(&mut self, value: &str) -> Result<()> {
        self.score = number_input("Score", value)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Grade form on a student's detail screen
///
/// The student is fixed by the screen, so resetting keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentGradeForm {
    pub student_id: i64,
    pub module_code: Option<String>,
    pub score: Option<i64>,
}

impl StudentGradeForm {
    pub fn new(student_id: i64) -> Self {
        Self {
            student_id,
            module_code: None,
            score: None,
        }
    }

    pub fn set_module(&mut self, value: &str) {
        self.module_code = module_code_input(value);
    }

    pub fn set_score(&mut self, value: &str) -> Result<()> {
        self.score = number_input("Score", value)?;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.module_code = None;
        self.score = None;
    }
}

// ============================================================================
// Registrations
// ============================================================================

/// Body of `POST /students/studentDetail/register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationForm {
    pub student_id: i64,
    pub module_code: Option<String>,
}

impl RegistrationForm {
    pub fn new(student_id: i64) -> Self {
        Self {
            student_id,
            module_code: None,
        }
    }

    pub fn set_module(&mut self, value: &str) {
        self.module_code = module_code_input(value);
    }

    pub fn clear(&mut self) {
        self.module_code = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_student_form_serialises_blank_fields_as_null() {
        let mut form = StudentForm::new();
        form.set_id("7").unwrap();
        form.set_username("ann07");
        form.set_email("   ");

        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({
                "id": 7,
                "username": "ann07",
                "email": null,
                "firstName": null,
                "lastName": null
            })
        );
    }

    #[test]
    fn test_student_id_must_be_numeric() {
        let mut form = StudentForm::new();
        let err = form.set_id("seven").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(form.id, None);
    }

    #[test]
    fn test_module_code_is_upper_cased_and_trimmed() {
        let mut form = ModuleForm::new();
        form.set_code("  cs101 ");
        form.set_name("Programming");

        assert_eq!(form.code.as_deref(), Some("CS101"));
        assert!(!form.mnc);
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({"code": "CS101", "name": "Programming", "mnc": false})
        );
    }

    #[test]
    fn test_grade_form_payload_keys() {
        let mut form = GradeForm::new();
        form.set_student(Some(5));
        form.set_module("cs101");

        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({"student_id": 5, "module_code": "CS101", "score": null})
        );
    }

    #[test]
    fn test_student_grade_form_keeps_student_on_clear() {
        let mut form = StudentGradeForm::new(5);
        form.set_module("MA100");
        form.set_score("64").unwrap();
        form.clear();

        assert_eq!(form, StudentGradeForm::new(5));
    }

    #[test]
    fn test_registration_form_clear() {
        let mut form = RegistrationForm::new(3);
        form.set_module("cs101");
        assert_eq!(form.module_code.as_deref(), Some("CS101"));
        form.clear();
        assert_eq!(form.module_code, None);
        assert_eq!(form.student_id, 3);
    }
}
