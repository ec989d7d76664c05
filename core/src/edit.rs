//! Inline edit buffer: at most one row is editable at a time.

use crate::list::{GroceryList, ListError};
use crate::types::{GroceryItem, ItemId};
use crate::validation::{parse_quantity, validate_name};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Draft {
    id: ItemId,
    name: String,
    quantity: String,
}

/// Transient text buffers for the row being edited. Cancelling never touches
/// the API; committing hands back the item to pass to `GroceryList::update`.
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    draft: Option<Draft>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts editing `item`, discarding any other row's buffer.
    pub fn start(&mut self, item: &GroceryItem) {
        self.draft = Some(Draft {
            id: item.id,
            name: item.name.clone(),
            quantity: item.quantity.to_string(),
        });
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    pub fn editing(&self) -> Option<ItemId> {
        self.draft.as_ref().map(|d| d.id)
    }

    pub fn is_editing(&self, id: ItemId) -> bool {
        self.editing() == Some(id)
    }

    pub fn name(&self) -> Option<&str> {
        self.draft.as_ref().map(|d| d.name.as_str())
    }

    pub fn quantity(&self) -> Option<&str> {
        self.draft.as_ref().map(|d| d.quantity.as_str())
    }

    pub fn set_name(&mut self, name: &str) {
        if let Some(draft) = self.draft.as_mut() {
            draft.name = name.to_string();
        }
    }

    pub fn set_quantity(&mut self, quantity: &str) {
        if let Some(draft) = self.draft.as_mut() {
            draft.quantity = quantity.to_string();
        }
    }

    /// Validates the buffer against the current list entry and returns the
    /// edited item. Returns `Ok(None)` when nothing is being edited. The
    /// buffer is only cleared once validation passes, so the user can fix the
    /// input.
    pub fn commit(&mut self, list: &GroceryList) -> Result<Option<GroceryItem>, ListError> {
        let Some(draft) = self.draft.as_ref() else {
            return Ok(None);
        };
        let original = list.get(draft.id).ok_or(ListError::NotFound(draft.id))?;
        let name = validate_name(&draft.name)?;
        let quantity = parse_quantity(&draft.quantity)?;
        let edited = GroceryItem {
            name,
            quantity,
            ..original.clone()
        };
        self.draft = None;
        Ok(Some(edited))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemStatus;
    use crate::validation::ValidationError;

    fn list() -> GroceryList {
        GroceryList::from_items(vec![GroceryItem {
            id: 8,
            name: "Cheese".to_string(),
            quantity: 1,
            status: ItemStatus::Purchased,
            owner_id: 1,
            created_at: "2024-05-01T10:00:00".to_string(),
            updated_at: None,
        }])
    }

    #[test]
    fn commit_keeps_status_and_trims_name() {
        let list = list();
        let mut buffer = EditBuffer::new();
        buffer.start(&list.items()[0]);
        buffer.set_name("  Cheddar ");
        buffer.set_quantity("2");
        let edited = buffer.commit(&list).unwrap().unwrap();
        assert_eq!(edited.name, "Cheddar");
        assert_eq!(edited.quantity, 2);
        assert_eq!(edited.status, ItemStatus::Purchased);
        assert!(buffer.editing().is_none());
    }

    #[test]
    fn invalid_commit_keeps_buffer_open() {
        let list = list();
        let mut buffer = EditBuffer::new();
        buffer.start(&list.items()[0]);
        buffer.set_quantity("abc");
        let err = buffer.commit(&list).unwrap_err();
        assert!(matches!(err, ListError::Invalid(ValidationError::InvalidQuantity(_))));
        assert!(buffer.is_editing(8));
    }

    #[test]
    fn cancel_discards_edits() {
        let list = list();
        let mut buffer = EditBuffer::new();
        buffer.start(&list.items()[0]);
        buffer.set_name("Brie");
        buffer.cancel();
        assert!(buffer.name().is_none());
        assert!(buffer.commit(&list).unwrap().is_none());
        assert_eq!(list.items()[0].name, "Cheese");
    }

    #[test]
    fn starting_another_row_replaces_buffer() {
        let list = list();
        let mut buffer = EditBuffer::new();
        buffer.start(&list.items()[0]);
        let mut other = list.items()[0].clone();
        other.id = 9;
        buffer.start(&other);
        assert!(buffer.is_editing(9));
        assert!(!buffer.is_editing(8));
        assert_eq!(buffer.quantity(), Some("1"));
    }
}
