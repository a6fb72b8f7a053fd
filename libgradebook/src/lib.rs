//! Gradebook - client library for a student, module and grade registry
//!
//! This library talks to the gradebook REST API, keeps fetched collections in
//! memory, filters and pages them on the client, and runs the create and
//! delete workflows with user-facing failure messages.

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod forms;
pub mod logging;
pub mod relations;
pub mod service;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use client::{HttpResourceClient, MockClient, ResourceClient};
pub use config::Config;
pub use error::{ApiError, ErrorKind, GradebookError, Result};
pub use relations::{Directory, GradeRow};
pub use service::{GradebookService, MutationOutcome};
pub use types::{
    EntityKind, Grade, GradeDistribution, Module, ModuleDetail, RosterEntry, Student,
    StudentDetail,
};
