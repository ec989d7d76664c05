//! Plain-text rendering of the derived list view.

use std::fmt::Write;

use grocery_core::view::empty_message;
use grocery_core::{GroceryItem, ItemStatus, ListQuery};

pub fn render_list(view: &[&GroceryItem], query: &ListQuery) -> String {
    if view.is_empty() {
        return format!("{}\n", empty_message(query));
    }
    let width = view.iter().map(|item| item.name.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for item in view {
        let mark = match item.status {
            ItemStatus::Purchased => "x",
            ItemStatus::Pending => " ",
        };
        let _ = writeln!(
            out,
            "[{mark}] {id:>5}  {name:<width$}  x{quantity}",
            id = item.id,
            name = item.name,
            quantity = item.quantity,
        );
    }
    out
}
