//! User-facing failure messages
//!
//! Every workflow carries an ordered table of [`Rule`]s. The first rule that
//! matches a failure produces the message; when none matches, the error's
//! own display text is shown. Tables are plain slices, so the order a user
//! sees is the order declared here.

use serde_json::Value;

use crate::error::ApiError;

pub const NOT_REGISTERED: &str = "Please select a module which is registered to this student.";
pub const ALREADY_REGISTERED: &str = "Please choose a module which has not been registered.";
pub const STUDENT_OR_MODULE_NOT_FOUND: &str = "Student or module was not found.";
pub const UNPARSEABLE_ERROR: &str = "Failed to parse the error response.";
pub const UNKNOWN_ERROR: &str = "Unknown error.";

pub const STUDENT_NOT_FOUND: &str = "Student not found.";
pub const STUDENT_DETAIL_FAILED: &str = "An error occurred while fetching student details.";
pub const MODULE_NOT_FOUND: &str = "Module not found.";

/// One entry of a failure-message table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// First `(key, message)` whose key is absent or null in the payload
    MissingFields(&'static [(&'static str, &'static str)]),

    /// Constraint violation reported in the response body; markers are
    /// checked in order against the violation text
    Constraint {
        markers: &'static [(&'static str, &'static str)],
        fallback: &'static str,
    },

    /// Exact status code, regardless of body
    Status(u16, &'static str),

    /// Any HTTP response; transport failures fall through
    AnyResponse(&'static str),
}

impl Rule {
    fn apply(&self, payload: Option<&Value>, error: &ApiError) -> Option<String> {
        match self {
            Rule::MissingFields(fields) => {
                let payload = payload?;
                fields
                    .iter()
                    .find(|(key, _)| payload.get(*key).map_or(true, Value::is_null))
                    .map(|(_, message)| message.to_string())
            }
            Rule::Constraint { markers, fallback } => {
                let body = error.body()?;
                let decoded: Value = match serde_json::from_str(body) {
                    Ok(decoded) => decoded,
                    Err(_) => return Some(UNPARSEABLE_ERROR.to_string()),
                };
                let violation = violation_text(&decoded).unwrap_or_default();
                let message = markers
                    .iter()
                    .find(|(marker, _)| violation.contains(marker))
                    .map_or(*fallback, |(_, message)| *message);
                Some(message.to_string())
            }
            Rule::Status(code, message) => {
                (error.status_code() == Some(*code)).then(|| message.to_string())
            }
            Rule::AnyResponse(message) => error.status_code().map(|_| message.to_string()),
        }
    }
}

/// Innermost violation text of a Spring error body
fn violation_text(body: &Value) -> Option<&str> {
    ["/cause/cause/message", "/cause/message", "/message"]
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
}

/// Message for a failed mutation
pub fn describe_failure(rules: &[Rule], payload: Option<&Value>, error: &ApiError) -> String {
    rules
        .iter()
        .find_map(|rule| rule.apply(payload, error))
        .unwrap_or_else(|| error.to_string())
}

/// Read-only requests with their own messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    StudentDetail,
    ModuleDetail,
    Collection,
}

/// Message for a failed query
pub fn describe_query(query: Query, error: &ApiError) -> String {
    let not_found = error.status_code() == Some(404);
    match query {
        Query::StudentDetail if not_found => STUDENT_NOT_FOUND.to_string(),
        Query::StudentDetail => STUDENT_DETAIL_FAILED.to_string(),
        Query::ModuleDetail if not_found => MODULE_NOT_FOUND.to_string(),
        Query::ModuleDetail | Query::Collection => error.to_string(),
    }
}

// ============================================================================
// Rule tables
// ============================================================================

pub const ADD_STUDENT: &[Rule] = &[
    Rule::MissingFields(&[
        ("id", "Please fill in the student id."),
        ("username", "Please fill in the username."),
        ("email", "Please fill in the email."),
        ("firstName", "Please fill in the first name."),
        ("lastName", "Please fill in the last name."),
    ]),
    Rule::Constraint {
        // INDEX_BA must precede its prefix INDEX_B
        markers: &[
            ("INDEX_BA", "This username has been used, please use another."),
            ("INDEX_B", "This email has been used, please use another."),
        ],
        fallback: UNKNOWN_ERROR,
    },
];

pub const ADD_MODULE: &[Rule] = &[Rule::MissingFields(&[
    ("code", "Please fill in the code field."),
    ("name", "Please fill in the name field."),
])];

pub const ADD_GRADE: &[Rule] = &[
    Rule::MissingFields(&[
        ("student_id", "Please select the student."),
        ("module_code", "Please select the module."),
        ("score", "Please enter the score."),
    ]),
    Rule::Status(406, NOT_REGISTERED),
    Rule::Status(404, STUDENT_OR_MODULE_NOT_FOUND),
    Rule::Status(500, "Please select the student, module, and score."),
];

pub const ADD_STUDENT_GRADE: &[Rule] = &[
    Rule::MissingFields(&[
        ("module_code", "Please choose the module."),
        ("score", "Please enter the grade."),
    ]),
    Rule::Status(406, NOT_REGISTERED),
    Rule::Status(404, STUDENT_OR_MODULE_NOT_FOUND),
    Rule::Status(500, "Please choose the module and enter the grade."),
];

pub const REGISTER: &[Rule] = &[
    Rule::MissingFields(&[("module_code", "Please choose which module to register.")]),
    Rule::Status(409, ALREADY_REGISTERED),
    Rule::Status(404, STUDENT_OR_MODULE_NOT_FOUND),
    Rule::Status(500, "Please choose which module to register."),
];

pub const UNREGISTER: &[Rule] = &[
    Rule::Status(404, "Registration was not found."),
    Rule::AnyResponse("Failed to unregister."),
];

pub const DELETE_STUDENT: &[Rule] = &[
    Rule::Status(404, "Student was not found."),
    Rule::AnyResponse("Failed to delete student."),
];

pub const DELETE_MODULE: &[Rule] = &[
    Rule::Status(404, "Module was not found."),
    Rule::AnyResponse("Failed to delete module."),
];

pub const DELETE_GRADE: &[Rule] = &[
    Rule::Status(404, "Grade was not found."),
    Rule::AnyResponse("Failed to delete grade."),
];

/// Student detail screen wording
pub const DELETE_STUDENT_GRADE: &[Rule] = &[
    Rule::Status(404, "Grade was not found."),
    Rule::AnyResponse("Failed to delete the grade."),
];
