//! List screen state and its reducer
//!
//! `reduce` is a pure function: `(ListState, ListAction) -> ListState`.
//! Anything that changes which rows are visible sends the user back to the
//! first page.

use crate::filter::{apply_filters, page_count, paginate, FilterSet, Filterable, Matcher};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<F> {
    pub filters: FilterSet<F>,
    pub page: usize,
    pub page_size: usize,
}

impl<F: Copy + Eq> ListState<F> {
    pub fn new(page_size: usize) -> Self {
        Self {
            filters: FilterSet::new(),
            page: 0,
            page_size,
        }
    }

    /// Filter, then cut the current page
    pub fn visible<T>(&self, items: &[T]) -> Vec<T>
    where
        T: Filterable<Field = F> + Clone,
    {
        let filtered = apply_filters(items, &self.filters);
        paginate(&filtered, self.page, self.page_size).to_vec()
    }

    /// Pages available after filtering
    pub fn pages<T>(&self, items: &[T]) -> usize
    where
        T: Filterable<Field = F> + Clone,
    {
        page_count(apply_filters(items, &self.filters).len(), self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListAction<F> {
    SetFilter(F, Matcher),
    RemoveFilter(F),
    ClearFilters,
    SetPage(usize),
    SetPageSize(usize),
    /// The filtered collection now has this many items
    CollectionChanged(usize),
}

pub fn reduce<F: Copy + Eq>(state: ListState<F>, action: ListAction<F>) -> ListState<F> {
    match action {
        ListAction::SetFilter(field, matcher) => {
            let mut filters = state.filters;
            filters.set(field, matcher);
            ListState {
                filters,
                page: 0,
                ..state
            }
        }

        ListAction::RemoveFilter(field) => {
            let mut filters = state.filters;
            filters.remove(field);
            ListState {
                filters,
                page: 0,
                ..state
            }
        }

        ListAction::ClearFilters => ListState {
            filters: FilterSet::new(),
            page: 0,
            ..state
        },

        ListAction::SetPage(page) => ListState { page, ..state },

        // Zero would hide every row
        ListAction::SetPageSize(0) => state,
        ListAction::SetPageSize(page_size) => ListState {
            page_size,
            page: 0,
            ..state
        },

        ListAction::CollectionChanged(len) => {
            let last = page_count(len, state.page_size).saturating_sub(1);
            ListState {
                page: state.page.min(last),
                ..state
            }
        }
    }
}
