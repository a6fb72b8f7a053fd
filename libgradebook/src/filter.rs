//! Client-side filtering and pagination
//!
//! Everything here is pure: the functions borrow a collection that was
//! already fetched and return a derived view of it. Predicates are ANDed and
//! an unset predicate matches everything, so a filter field the user has not
//! typed into yet has no effect.
//!
//! # Example
//!
//! ```
//! use libgradebook::filter::{apply_filters, paginate, FilterSet, Matcher};
//! use libgradebook::filter::StudentField;
//! use libgradebook::Student;
//!
//! let students = vec![
//!     Student { id: 1, username: "ann01".into(), email: "ann@uni.ac.uk".into(),
//!               first_name: "Ann".into(), last_name: "Lee".into() },
//!     Student { id: 2, username: "bob02".into(), email: "bob@uni.ac.uk".into(),
//!               first_name: "Bob".into(), last_name: "Ray".into() },
//! ];
//!
//! let mut filters = FilterSet::new();
//! filters.set(StudentField::Name, Matcher::contains("an"));
//!
//! let visible = apply_filters(&students, &filters);
//! assert_eq!(visible.len(), 1);
//! assert_eq!(paginate(&visible, 0, 5).len(), 1);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::relations::GradeRow;
use crate::types::{Module, RosterEntry, Student};

/// Three-valued boolean filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    MatchTrue,
    MatchFalse,
    #[default]
    Any,
}

impl TriState {
    pub fn matches(self, value: bool) -> bool {
        match self {
            TriState::MatchTrue => value,
            TriState::MatchFalse => !value,
            TriState::Any => true,
        }
    }
}

impl FromStr for TriState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yes" | "true" | "graded" => Ok(TriState::MatchTrue),
            "no" | "false" | "not-graded" | "ungraded" => Ok(TriState::MatchFalse),
            "any" | "" => Ok(TriState::Any),
            other => Err(format!(
                "Invalid filter value: '{}'. Valid options: yes, no, any",
                other
            )),
        }
    }
}

impl fmt::Display for TriState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TriState::MatchTrue => "yes",
            TriState::MatchFalse => "no",
            TriState::Any => "any",
        })
    }
}

/// Value a record exposes for one filterable field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    /// Matches when any of the strings contains the needle
    Text(Vec<Cow<'a, str>>),
    Flag(bool),
}

impl<'a> FieldValue<'a> {
    pub fn text(value: impl Into<Cow<'a, str>>) -> Self {
        FieldValue::Text(vec![value.into()])
    }
}

/// Predicate for a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Case-insensitive substring containment; stored lower-cased
    Contains(String),
    Flag(TriState),
}

impl Matcher {
    pub fn contains(needle: impl AsRef<str>) -> Self {
        Matcher::Contains(needle.as_ref().to_lowercase())
    }

    /// True when the matcher accepts every record
    pub fn is_vacuous(&self) -> bool {
        match self {
            Matcher::Contains(needle) => needle.is_empty(),
            Matcher::Flag(state) => *state == TriState::Any,
        }
    }

    pub fn matches(&self, value: &FieldValue<'_>) -> bool {
        if self.is_vacuous() {
            return true;
        }
        match (self, value) {
            (Matcher::Contains(needle), FieldValue::Text(haystacks)) => haystacks
                .iter()
                .any(|h| h.to_lowercase().contains(needle.as_str())),
            (Matcher::Flag(state), FieldValue::Flag(flag)) => state.matches(*flag),
            _ => false,
        }
    }
}

/// A record that can be filtered field by field
pub trait Filterable {
    type Field: Copy + Eq + fmt::Debug;

    fn field_value(&self, field: Self::Field) -> FieldValue<'_>;
}

/// Ordered set of predicates, at most one per field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSet<F> {
    predicates: Vec<(F, Matcher)>,
}

impl<F> Default for FilterSet<F> {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }
}

impl<F: Copy + Eq> FilterSet<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the matcher for a field, replacing any previous one in place
    pub fn set(&mut self, field: F, matcher: Matcher) {
        match self.predicates.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = matcher,
            None => self.predicates.push((field, matcher)),
        }
    }

    /// Builder form of [`FilterSet::set`]
    pub fn with(mut self, field: F, matcher: Matcher) -> Self {
        self.set(field, matcher);
        self
    }

    /// Set a substring matcher only when a needle was given
    pub fn with_text(self, field: F, needle: Option<&str>) -> Self {
        match needle {
            Some(needle) => self.with(field, Matcher::contains(needle)),
            None => self,
        }
    }

    pub fn remove(&mut self, field: F) {
        self.predicates.retain(|(f, _)| *f != field);
    }

    pub fn clear(&mut self) {
        self.predicates.clear();
    }

    pub fn get(&self, field: F) -> Option<&Matcher> {
        self.predicates
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m)
    }

    /// True when no predicate restricts anything
    pub fn is_unrestricted(&self) -> bool {
        self.predicates.iter().all(|(_, m)| m.is_vacuous())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(F, Matcher)> {
        self.predicates.iter()
    }

    pub fn accepts<T>(&self, item: &T) -> bool
    where
        T: Filterable<Field = F>,
    {
        self.predicates
            .iter()
            .all(|(field, matcher)| matcher.matches(&item.field_value(*field)))
    }
}

/// Keep the items every predicate accepts, in their original order
pub fn apply_filters<T>(items: &[T], filters: &FilterSet<T::Field>) -> Vec<T>
where
    T: Filterable + Clone,
{
    if filters.is_unrestricted() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| filters.accepts(*item))
        .cloned()
        .collect()
}

/// The half-open page `[page_index * page_size, page_index * page_size + page_size)`,
/// clamped to the collection; empty when the page lies past the end.
pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> &[T] {
    let start = match page_index.checked_mul(page_size) {
        Some(start) if start < items.len() => start,
        _ => return &[],
    };
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Number of pages needed to show `len` items
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    len.div_ceil(page_size)
}

// ============================================================================
// Field selectors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentField {
    /// Decimal id, substring match
    Id,
    /// "First Last"
    Name,
    Username,
    Email,
}

impl Filterable for Student {
    type Field = StudentField;

    fn field_value(&self, field: StudentField) -> FieldValue<'_> {
        match field {
            StudentField::Id => FieldValue::text(self.id.to_string()),
            StudentField::Name => FieldValue::text(self.full_name()),
            StudentField::Username => FieldValue::text(self.username.as_str()),
            StudentField::Email => FieldValue::text(self.email.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleField {
    Code,
    Name,
    Mnc,
}

impl Filterable for Module {
    type Field = ModuleField;

    fn field_value(&self, field: ModuleField) -> FieldValue<'_> {
        match field {
            ModuleField::Code => FieldValue::text(self.code.as_str()),
            ModuleField::Name => FieldValue::text(self.name.as_str()),
            ModuleField::Mnc => FieldValue::Flag(self.mnc),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeField {
    /// Student id or "First Last"
    Student,
    /// Module code or name
    Module,
}

impl Filterable for GradeRow {
    type Field = GradeField;

    fn field_value(&self, field: GradeField) -> FieldValue<'_> {
        match field {
            GradeField::Student => {
                let mut values: Vec<Cow<'_, str>> = Vec::with_capacity(2);
                if let Some(id) = self.student_id {
                    values.push(Cow::Owned(id.to_string()));
                }
                if let Some(name) = &self.student_name {
                    values.push(Cow::Borrowed(name.as_str()));
                }
                FieldValue::Text(values)
            }
            GradeField::Module => {
                let mut values: Vec<Cow<'_, str>> = Vec::with_capacity(2);
                if let Some(code) = &self.module_code {
                    values.push(Cow::Borrowed(code.as_str()));
                }
                if let Some(name) = &self.module_name {
                    values.push(Cow::Borrowed(name.as_str()));
                }
                FieldValue::Text(values)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterField {
    Id,
    Name,
    Username,
    Email,
    Graded,
}

impl Filterable for RosterEntry {
    type Field = RosterField;

    fn field_value(&self, field: RosterField) -> FieldValue<'_> {
        match field {
            RosterField::Id => self.student.field_value(StudentField::Id),
            RosterField::Name => self.student.field_value(StudentField::Name),
            RosterField::Username => self.student.field_value(StudentField::Username),
            RosterField::Email => self.student.field_value(StudentField::Email),
            RosterField::Graded => FieldValue::Flag(self.is_graded()),
        }
    }
}
