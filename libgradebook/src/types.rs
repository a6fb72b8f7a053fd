//! Wire types for the gradebook API

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Student {
    /// "First Last", the form every name filter matches against
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// "First Last (id)"
    pub fn label(&self) -> String {
        format!("{} ({})", self.full_name(), self.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    pub code: String,
    pub name: String,
    /// Mandatory non-core
    #[serde(default)]
    pub mnc: bool,
}

impl Module {
    /// "CODE Name"
    pub fn label(&self) -> String {
        format!("{} {}", self.code, self.name)
    }
}

/// Reference from a grade to its student
///
/// The server may send the bare id or the embedded student object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StudentRef {
    Id(i64),
    Embedded { id: i64 },
}

impl StudentRef {
    pub fn id(&self) -> i64 {
        match self {
            StudentRef::Id(id) | StudentRef::Embedded { id } => *id,
        }
    }
}

/// Reference from a grade to its module
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ModuleRef {
    Code(String),
    Embedded(Module),
}

impl ModuleRef {
    pub fn code(&self) -> &str {
        match self {
            ModuleRef::Code(code) => code,
            ModuleRef::Embedded(module) => &module.code,
        }
    }

    /// The embedded module, when the server inlined it
    pub fn module(&self) -> Option<&Module> {
        match self {
            ModuleRef::Embedded(module) => Some(module),
            ModuleRef::Code(_) => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Grade {
    #[serde(default)]
    pub id: Option<i64>,
    pub score: i64,
    #[serde(default)]
    pub student: Option<StudentRef>,
    #[serde(default)]
    pub module: Option<ModuleRef>,
}

impl Grade {
    pub fn student_id(&self) -> Option<i64> {
        self.student.as_ref().map(StudentRef::id)
    }

    pub fn module_code(&self) -> Option<&str> {
        self.module.as_ref().map(ModuleRef::code)
    }
}

/// Student with the grades the server embeds in module details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrolledStudent {
    #[serde(flatten)]
    pub student: Student,
    #[serde(default, rename = "gradeList")]
    pub grade_list: Vec<Grade>,
}

/// `GET /students/studentDetail/{id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetail {
    pub student: Student,
    #[serde(default)]
    pub registered_modules: Vec<Module>,
    #[serde(default)]
    pub grades: Vec<Grade>,
}

impl StudentDetail {
    pub fn is_registered(&self, module_code: &str) -> bool {
        self.registered_modules
            .iter()
            .any(|m| m.code.eq_ignore_ascii_case(module_code))
    }
}

/// `GET /students/studentDetail/computeAverage/{id}`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Average {
    #[serde(deserialize_with = "lenient_average")]
    pub average: Option<f64>,
}

/// `GET /modules/moduleDetails/{code}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDetail {
    pub module: Module,
    #[serde(default)]
    pub students: Vec<EnrolledStudent>,
    #[serde(default)]
    pub total_grades: usize,
    #[serde(default, deserialize_with = "lenient_average")]
    pub average: Option<f64>,
    #[serde(default, rename = "pieChart")]
    pub distribution: GradeDistribution,
}

/// One row of a module roster: a registered student and their score
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RosterEntry {
    pub student: Student,
    pub score: Option<i64>,
}

impl RosterEntry {
    pub fn is_graded(&self) -> bool {
        self.score.is_some()
    }
}

impl ModuleDetail {
    /// Registered students with their score for this module
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.students
            .iter()
            .map(|enrolled| RosterEntry {
                student: enrolled.student.clone(),
                score: enrolled
                    .grade_list
                    .iter()
                    .find(|g| g.module_code() == Some(self.module.code.as_str()))
                    .map(|g| g.score),
            })
            .collect()
    }
}

/// Score buckets of the module grade distribution, in display order
pub const GRADE_BUCKETS: [&str; 5] = ["0-40", "40-50", "50-60", "60-70", "70-100"];

/// Grade distribution with a fixed bucket order
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct GradeDistribution {
    counts: [u32; 5],
}

impl GradeDistribution {
    pub fn from_scores(scores: impl IntoIterator<Item = i64>) -> Self {
        let mut counts = [0u32; 5];
        for score in scores {
            let bucket = match score {
                s if s < 40 => 0,
                s if s < 50 => 1,
                s if s < 60 => 2,
                s if s < 70 => 3,
                _ => 4,
            };
            counts[bucket] += 1;
        }
        Self { counts }
    }

    /// `(bucket, count)` pairs in [`GRADE_BUCKETS`] order
    pub fn buckets(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        GRADE_BUCKETS.iter().copied().zip(self.counts.iter().copied())
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }
}

impl<'de> Deserialize<'de> for GradeDistribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: HashMap<String, u32> = HashMap::deserialize(deserializer)?;
        let mut counts = [0u32; 5];
        for (slot, bucket) in counts.iter_mut().zip(GRADE_BUCKETS.iter()) {
            *slot = raw.get(*bucket).copied().unwrap_or(0);
        }
        Ok(Self { counts })
    }
}

/// Accepts a number, `null`, or the string `"NaN"` the server writes when
/// nothing has been graded yet.
fn lenient_average<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
    };
    Ok(value.filter(|n| n.is_finite()))
}

/// Collections exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Students,
    Modules,
    Grades,
}

impl EntityKind {
    /// Resource path of the collection
    pub fn path(&self) -> &'static str {
        match self {
            EntityKind::Students => "/students",
            EntityKind::Modules => "/modules",
            EntityKind::Grades => "/grades",
        }
    }

    /// Key of the collection inside the `_embedded` envelope
    pub fn embedded_key(&self) -> &'static str {
        match self {
            EntityKind::Students => "students",
            EntityKind::Modules => "modules",
            EntityKind::Grades => "grades",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.embedded_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ann() -> Student {
        Student {
            id: 1,
            username: "ann01".to_string(),
            email: "ann@example.edu".to_string(),
            first_name: "Ann".to_string(),
            last_name: "Lee".to_string(),
        }
    }

    #[test]
    fn test_student_decodes_camel_case_and_ignores_extras() {
        let value = json!({
            "id": 1,
            "username": "ann01",
            "email": "ann@example.edu",
            "firstName": "Ann",
            "lastName": "Lee",
            "studentRegistration": [],
            "_links": {"self": {"href": "http://localhost:8080/students/1"}}
        });
        let student: Student = serde_json::from_value(value).unwrap();
        assert_eq!(student, ann());
        assert_eq!(student.label(), "Ann Lee (1)");
    }

    #[test]
    fn test_grade_references_accept_scalars() {
        let grade: Grade =
            serde_json::from_value(json!({"id": 3, "score": 71, "student": 1, "module": "CS101"}))
                .unwrap();
        assert_eq!(grade.student_id(), Some(1));
        assert_eq!(grade.module_code(), Some("CS101"));
    }

    #[test]
    fn test_grade_references_accept_embedded_objects() {
        let grade: Grade = serde_json::from_value(json!({
            "id": 3,
            "score": 71,
            "student": {"id": 1, "firstName": "Ann", "lastName": "Lee"},
            "module": {"code": "CS101", "name": "Programming", "mnc": true}
        }))
        .unwrap();
        assert_eq!(grade.student_id(), Some(1));
        assert_eq!(grade.module_code(), Some("CS101"));
        assert_eq!(grade.module.unwrap().module().unwrap().name, "Programming");
    }

    #[test]
    fn test_grade_without_references() {
        let grade: Grade = serde_json::from_value(json!({"id": 9, "score": 40})).unwrap();
        assert_eq!(grade.student_id(), None);
        assert_eq!(grade.module_code(), None);
    }

    #[test]
    fn test_average_accepts_nan_string_and_null() {
        let nan: Average = serde_json::from_value(json!({"average": "NaN"})).unwrap();
        let null: Average = serde_json::from_value(json!({"average": null})).unwrap();
        let number: Average = serde_json::from_value(json!({"average": 64.5})).unwrap();
        assert_eq!(nan.average, None);
        assert_eq!(null.average, None);
        assert_eq!(number.average, Some(64.5));
    }

    #[test]
    fn test_module_detail_roster_and_distribution() {
        let detail: ModuleDetail = serde_json::from_value(json!({
            "module": {"code": "CS101", "name": "Programming", "mnc": false},
            "students": [
                {
                    "id": 1, "username": "ann01", "email": "ann@example.edu",
                    "firstName": "Ann", "lastName": "Lee",
                    "gradeList": [
                        {"id": 10, "score": 55, "module": {"code": "MA100", "name": "Maths", "mnc": true}},
                        {"id": 11, "score": 82, "module": {"code": "CS101", "name": "Programming", "mnc": false}}
                    ]
                },
                {
                    "id": 2, "username": "bob02", "email": "bob@example.edu",
                    "firstName": "Bob", "lastName": "Ray", "gradeList": []
                }
            ],
            "totalGrades": 1,
            "average": 82.0,
            "pieChart": {"70-100": 1, "0-40": 0, "60-70": 0, "50-60": 0, "40-50": 0}
        }))
        .unwrap();

        let roster = detail.roster();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].score, Some(82));
        assert!(!roster[1].is_graded());

        let buckets: Vec<_> = detail.distribution.buckets().collect();
        assert_eq!(
            buckets,
            vec![("0-40", 0), ("40-50", 0), ("50-60", 0), ("60-70", 0), ("70-100", 1)]
        );
    }

    #[test]
    fn test_distribution_from_scores_bucket_edges() {
        let distribution = GradeDistribution::from_scores([0, 39, 40, 49, 50, 60, 69, 70, 100]);
        let counts: Vec<u32> = distribution.buckets().map(|(_, c)| c).collect();
        assert_eq!(counts, vec![2, 2, 1, 2, 2]);
        assert_eq!(distribution.total(), 9);
    }

    #[test]
    fn test_student_detail_registration_check_is_case_insensitive() {
        let detail = StudentDetail {
            student: ann(),
            registered_modules: vec![Module {
                code: "CS101".to_string(),
                name: "Programming".to_string(),
                mnc: false,
            }],
            grades: vec![],
        };
        assert!(detail.is_registered("cs101"));
        assert!(!detail.is_registered("MA100"));
    }

    #[test]
    fn test_entity_kind_paths() {
        assert_eq!(EntityKind::Students.path(), "/students");
        assert_eq!(EntityKind::Grades.embedded_key(), "grades");
        assert_eq!(EntityKind::Modules.to_string(), "modules");
    }
}
