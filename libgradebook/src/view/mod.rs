//! View-model shared by front ends
//!
//! - [`list`]: filter and page state for list screens, driven by a pure reducer
//! - [`navigation`]: detail screens and the explicit context they were opened from

pub mod list;
pub mod navigation;

pub use list::{reduce, ListAction, ListState};
pub use navigation::{Crumb, ModuleDetailView, NavigationContext, StudentDetailView};
