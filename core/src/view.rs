//! Filtered and sorted projection of the grocery collection.
//!
//! `derive_view` borrows the source items and returns references in display
//! order; the collection itself keeps its insertion order.

use std::cmp::Ordering;
use std::str::FromStr;

use thiserror::Error;

use crate::types::{GroceryItem, ItemStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Purchased,
}

impl StatusFilter {
    fn admits(self, status: ItemStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => status == ItemStatus::Pending,
            StatusFilter::Purchased => status == ItemStatus::Purchased,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    Quantity,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListQuery {
    pub text: String,
    pub status: StatusFilter,
    pub sort: SortField,
    pub order: SortOrder,
}

impl ListQuery {
    pub fn is_filtered(&self) -> bool {
        !self.text.is_empty() || self.status != StatusFilter::All
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} {value:?}")]
pub struct ParseQueryError {
    kind: &'static str,
    value: String,
}

macro_rules! impl_from_str {
    ($ty:ty, $kind:literal, { $($name:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ParseQueryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($variant),)+
                    _ => Err(ParseQueryError { kind: $kind, value: s.to_string() }),
                }
            }
        }
    };
}

impl_from_str!(StatusFilter, "status filter", {
    "all" => StatusFilter::All,
    "pending" => StatusFilter::Pending,
    "purchased" => StatusFilter::Purchased,
});

impl_from_str!(SortField, "sort field", {
    "name" => SortField::Name,
    "quantity" => SortField::Quantity,
    "status" => SortField::Status,
});

impl_from_str!(SortOrder, "sort order", {
    "asc" => SortOrder::Asc,
    "desc" => SortOrder::Desc,
});

/// Filter by case-insensitive name substring and status, then stable-sort.
pub fn derive_view<'a>(items: &'a [GroceryItem], query: &ListQuery) -> Vec<&'a GroceryItem> {
    let needle = query.text.to_lowercase();
    let mut view: Vec<&GroceryItem> = items
        .iter()
        .filter(|item| item.name.to_lowercase().contains(&needle))
        .filter(|item| query.status.admits(item.status))
        .collect();
    view.sort_by(|a, b| {
        let ordering = compare(a, b, query.sort);
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
    view
}

fn compare(a: &GroceryItem, b: &GroceryItem, field: SortField) -> Ordering {
    match field {
        SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortField::Quantity => a.quantity.cmp(&b.quantity),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
    }
}

/// Placeholder text for an empty view.
pub fn empty_message(query: &ListQuery) -> &'static str {
    if query.is_filtered() {
        "No items match your filters."
    } else {
        "Your grocery list is empty. Add some items!"
    }
}
