//! Relationship resolution between grades and their student and module
//!
//! A [`Directory`] indexes the cached students by id and modules by code once,
//! then every grade resolves with two hash lookups and no network traffic.

use serde::Serialize;
use std::collections::HashMap;

use crate::types::{Grade, Module, Student};

/// A grade joined with display labels for its student and module
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeRow {
    pub grade_id: Option<i64>,
    pub student_id: Option<i64>,
    /// "First Last" when the student is known
    pub student_name: Option<String>,
    pub student_label: String,
    pub module_code: Option<String>,
    /// Module name when the module is known
    pub module_name: Option<String>,
    pub module_label: String,
    pub score: i64,
}

/// Lookup indices over one snapshot of students and modules
#[derive(Debug, Clone, Default)]
pub struct Directory {
    students: HashMap<i64, Student>,
    modules: HashMap<String, Module>,
}

impl Directory {
    pub fn build(students: &[Student], modules: &[Module]) -> Self {
        Self {
            students: students.iter().map(|s| (s.id, s.clone())).collect(),
            modules: modules.iter().map(|m| (m.code.clone(), m.clone())).collect(),
        }
    }

    pub fn student(&self, id: i64) -> Option<&Student> {
        self.students.get(&id)
    }

    pub fn module(&self, code: &str) -> Option<&Module> {
        self.modules.get(code)
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Resolve one grade
    pub fn resolve_one(&self, grade: &Grade) -> GradeRow {
        let student_id = grade.student_id();
        if student_id.is_none() || grade.module.is_none() {
            // Spring Data REST only links associations; those grades land here
            tracing::warn!(
                "Grade {:?} carries no inline student or module reference",
                grade.id
            );
        }
        let student = student_id.and_then(|id| self.student(id));
        let student_label = match (student, student_id) {
            (Some(student), _) => student.label(),
            (None, Some(id)) => format!("Unknown student ({})", id),
            (None, None) => "Unknown student".to_string(),
        };

        let module_code = grade.module_code().map(str::to_string);
        // An inlined module is as good as a cached one
        let module = module_code
            .as_deref()
            .and_then(|code| self.module(code))
            .or_else(|| grade.module.as_ref().and_then(|r| r.module()));
        let module_label = match (module, module_code.as_deref()) {
            (Some(module), _) => module.label(),
            (None, Some(code)) => format!("Unknown module ({})", code),
            (None, None) => "Unknown module".to_string(),
        };

        GradeRow {
            grade_id: grade.id,
            student_id,
            student_name: student.map(Student::full_name),
            student_label,
            module_code,
            module_name: module.map(|m| m.name.clone()),
            module_label,
            score: grade.score,
        }
    }

    /// Resolve every grade, preserving order
    pub fn resolve(&self, grades: &[Grade]) -> Vec<GradeRow> {
        grades.iter().map(|g| self.resolve_one(g)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ModuleRef, StudentRef};

    fn directory() -> Directory {
        Directory::build(
            &[Student {
                id: 5,
                username: "ann05".to_string(),
                email: "ann@example.edu".to_string(),
                first_name: "Ann".to_string(),
                last_name: "Lee".to_string(),
            }],
            &[Module {
                code: "CS101".to_string(),
                name: "Programming".to_string(),
                mnc: true,
            }],
        )
    }

    fn grade(student: Option<i64>, module: Option<&str>) -> Grade {
        Grade {
            id: Some(1),
            score: 68,
            student: student.map(StudentRef::Id),
            module: module.map(|c| ModuleRef::Code(c.to_string())),
        }
    }

    #[test]
    fn test_resolves_known_references() {
        let row = directory().resolve_one(&grade(Some(5), Some("CS101")));
        assert_eq!(row.student_label, "Ann Lee (5)");
        assert_eq!(row.module_label, "CS101 Programming");
        assert_eq!(row.student_name.as_deref(), Some("Ann Lee"));
        assert_eq!(row.score, 68);
    }

    #[test]
    fn test_unknown_references_keep_their_key() {
        let row = directory().resolve_one(&grade(Some(9), Some("ZZ999")));
        assert_eq!(row.student_label, "Unknown student (9)");
        assert_eq!(row.module_label, "Unknown module (ZZ999)");
        assert_eq!(row.student_name, None);
    }

    #[test]
    fn test_missing_references() {
        let row = directory().resolve_one(&grade(None, None));
        assert_eq!(row.student_label, "Unknown student");
        assert_eq!(row.module_label, "Unknown module");
    }

    #[test]
    fn test_inlined_module_resolves_without_cache() {
        let mut g = grade(Some(5), None);
        g.module = Some(ModuleRef::Embedded(Module {
            code: "MA100".to_string(),
            name: "Maths".to_string(),
            mnc: false,
        }));
        let row = directory().resolve_one(&g);
        assert_eq!(row.module_label, "MA100 Maths");
    }

    #[test]
    fn test_resolve_preserves_order() {
        let grades = vec![grade(Some(5), Some("CS101")), grade(Some(6), None)];
        let rows = directory().resolve(&grades);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].student_id, Some(6));
    }

    #[test]
    fn test_link_only_grade_resolves_to_unknown() {
        let grade: Grade = serde_json::from_value(serde_json::json!({
            "score": 55,
            "_links": {
                "self": {"href": "http://localhost:8080/grades/3"},
                "student": {"href": "http://localhost:8080/grades/3/student"},
                "module": {"href": "http://localhost:8080/grades/3/module"}
            }
        }))
        .unwrap();

        let row = directory().resolve_one(&grade);
        assert_eq!(row.student_label, "Unknown student");
        assert_eq!(row.module_label, "Unknown module");
        assert_eq!(row.student_id, None);
    }
}
