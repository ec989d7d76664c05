//! The grocery list view-model.
//!
//! # Design
//! Every mutation is an explicit two-step state transition, mirroring the
//! client's `build_*`/`parse_*` split:
//!
//! - `begin_*` validates, applies the optimistic change and returns a pending
//!   token that owns whatever is needed to undo it (the temporary id for adds,
//!   a snapshot of the collection for updates and deletes).
//! - `finish_*` takes that token plus the server's tagged result and either
//!   reconciles with the authoritative item or rolls back.
//!
//! A failed update or delete puts back its whole snapshot only if the list
//! saw no other mutation since its `begin_*`. Otherwise only the failed entry
//! is restored, so other changes (confirmed or still pending) are kept.
//!
//! `add`, `update`, `toggle_status` and `delete` run both steps around a
//! blocking `Api` call. An item with a request outstanding is locked: a second
//! `begin_*` for the same id fails with `ListError::Busy`, so responses can
//! never land out of order for one item.

use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::Api;
use crate::error::{ApiError, ErrorKind};
use crate::http::Transport;
use crate::storage::TokenStore;
use crate::types::{GroceryItem, GroceryUpdate, ItemId, ItemStatus, NewGroceryItem};
use crate::validation::{check_draft, validate_name, validate_quantity, ValidationError};
use crate::view::{derive_view, ListQuery};

#[derive(Debug, Error)]
pub enum ListError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("item {0} is not in the list")]
    NotFound(ItemId),
    #[error("item {0} already has a request in flight")]
    Busy(ItemId),
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ListError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ListError::Invalid(_) => ErrorKind::Validation,
            ListError::NotFound(_) => ErrorKind::NotFound,
            ListError::Busy(_) => ErrorKind::Conflict,
            ListError::Api(e) => e.kind(),
        }
    }
}

/// An optimistic add waiting for the server.
#[derive(Debug)]
#[must_use = "a pending add must be finished or the temporary entry stays in the list"]
pub struct PendingAdd {
    temp_id: ItemId,
    draft: NewGroceryItem,
}

impl PendingAdd {
    pub fn temp_id(&self) -> ItemId {
        self.temp_id
    }

    /// The validated payload to send.
    pub fn draft(&self) -> &NewGroceryItem {
        &self.draft
    }
}

#[derive(Debug)]
#[must_use = "a pending update must be finished or the item stays locked"]
pub struct PendingUpdate {
    id: ItemId,
    payload: GroceryUpdate,
    snapshot: Vec<GroceryItem>,
    generation: u64,
}

impl PendingUpdate {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn payload(&self) -> &GroceryUpdate {
        &self.payload
    }
}

#[derive(Debug)]
#[must_use = "a pending delete must be finished or the item stays locked"]
pub struct PendingDelete {
    id: ItemId,
    removed: GroceryItem,
    snapshot: Vec<GroceryItem>,
    generation: u64,
}

impl PendingDelete {
    pub fn id(&self) -> ItemId {
        self.id
    }
}

/// Owns the in-memory collection. Insertion order, newest adds first.
#[derive(Debug, Default)]
pub struct GroceryList {
    items: Vec<GroceryItem>,
    in_flight: HashSet<ItemId>,
    last_temp_id: ItemId,
    /// Bumped by every begin, finish and refresh.
    generation: u64,
}

impl GroceryList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<GroceryItem>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn items(&self) -> &[GroceryItem] {
        &self.items
    }

    pub fn get(&self, id: ItemId) -> Option<&GroceryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_in_flight(&self, id: ItemId) -> bool {
        self.in_flight.contains(&id)
    }

    pub fn view(&self, query: &ListQuery) -> Vec<&GroceryItem> {
        derive_view(&self.items, query)
    }

    /// Replace the whole collection with a fresh server listing.
    pub fn replace_all(&mut self, items: Vec<GroceryItem>) {
        self.items = items;
        self.generation += 1;
    }

    // -- add ----------------------------------------------------------------

    pub fn begin_add(
        &mut self,
        draft: &NewGroceryItem,
        owner_id: i64,
    ) -> Result<PendingAdd, ListError> {
        let draft = check_draft(draft)?;
        let temp_id = self.next_temp_id();
        self.items.insert(
            0,
            GroceryItem {
                id: temp_id,
                name: draft.name.clone(),
                quantity: draft.quantity,
                status: ItemStatus::Pending,
                owner_id,
                created_at: Utc::now().to_rfc3339(),
                updated_at: None,
            },
        );
        self.in_flight.insert(temp_id);
        self.generation += 1;
        Ok(PendingAdd { temp_id, draft })
    }

    pub fn finish_add(
        &mut self,
        pending: PendingAdd,
        result: Result<GroceryItem, ApiError>,
    ) -> Result<GroceryItem, ListError> {
        let PendingAdd { temp_id, draft } = pending;
        self.in_flight.remove(&temp_id);
        self.generation += 1;
        match result {
            Ok(created) => {
                match self.items.iter().position(|item| item.id == temp_id) {
                    Some(index) => self.items[index] = created.clone(),
                    None if self.get(created.id).is_none() => self.items.insert(0, created.clone()),
                    None => {}
                }
                // a refresh may already have pulled the created item in
                let mut seen = false;
                self.items.retain(|item| {
                    let duplicate = item.id == created.id && seen;
                    seen |= item.id == created.id;
                    !duplicate
                });
                info!(id = created.id, name = %created.name, "item added");
                Ok(created)
            }
            Err(e) => {
                self.items.retain(|item| item.id != temp_id);
                warn!(name = %draft.name, error = %e, "add failed, removed optimistic entry");
                Err(e.into())
            }
        }
    }

    // -- update -------------------------------------------------------------

    pub fn begin_update(&mut self, item: GroceryItem) -> Result<PendingUpdate, ListError> {
        let name = validate_name(&item.name)?;
        validate_quantity(item.quantity)?;
        let id = item.id;
        let index = self.lock(id)?;

        let snapshot = self.items.clone();
        let updated = GroceryItem { name, ..item };
        let payload = GroceryUpdate::from(&updated);
        self.items[index] = updated;
        self.in_flight.insert(id);
        self.generation += 1;
        Ok(PendingUpdate {
            id,
            payload,
            snapshot,
            generation: self.generation,
        })
    }

    pub fn finish_update(
        &mut self,
        pending: PendingUpdate,
        result: Result<GroceryItem, ApiError>,
    ) -> Result<GroceryItem, ListError> {
        let PendingUpdate {
            id,
            snapshot,
            generation,
            ..
        } = pending;
        let untouched = generation == self.generation;
        self.in_flight.remove(&id);
        self.generation += 1;
        match result {
            Ok(server) => {
                if let Some(entry) = self.items.iter_mut().find(|item| item.id == server.id) {
                    *entry = server.clone();
                }
                info!(id, name = %server.name, "item updated");
                Ok(server)
            }
            Err(e) => {
                self.restore(snapshot, id, untouched);
                warn!(id, error = %e, "update failed, restored previous entry");
                Err(e.into())
            }
        }
    }

    // -- delete -------------------------------------------------------------

    pub fn begin_delete(&mut self, id: ItemId) -> Result<PendingDelete, ListError> {
        let index = self.lock(id)?;
        let snapshot = self.items.clone();
        let removed = self.items.remove(index);
        self.in_flight.insert(id);
        self.generation += 1;
        Ok(PendingDelete {
            id,
            removed,
            snapshot,
            generation: self.generation,
        })
    }

    /// Returns the removed item on success.
    pub fn finish_delete(
        &mut self,
        pending: PendingDelete,
        result: Result<(), ApiError>,
    ) -> Result<GroceryItem, ListError> {
        let PendingDelete {
            id,
            removed,
            snapshot,
            generation,
        } = pending;
        let untouched = generation == self.generation;
        self.in_flight.remove(&id);
        self.generation += 1;
        match result {
            Ok(()) => {
                info!(id, name = %removed.name, "item deleted");
                Ok(removed)
            }
            Err(e) => {
                self.restore(snapshot, id, untouched);
                warn!(id, error = %e, "delete failed, restored item");
                Err(e.into())
            }
        }
    }

    // -- full cycles against the API ----------------------------------------

    /// Fetch the server's list and replace the local collection.
    pub fn refresh<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
    ) -> Result<usize, ListError> {
        let items = api.list_groceries()?;
        self.replace_all(items);
        Ok(self.items.len())
    }

    pub fn add<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
        draft: &NewGroceryItem,
        owner_id: i64,
    ) -> Result<GroceryItem, ListError> {
        let pending = self.begin_add(draft, owner_id)?;
        let result = api.add_grocery(pending.draft());
        self.finish_add(pending, result)
    }

    pub fn update<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
        item: GroceryItem,
    ) -> Result<GroceryItem, ListError> {
        let pending = self.begin_update(item)?;
        let result = api.update_grocery(pending.id(), pending.payload());
        self.finish_update(pending, result)
    }

    pub fn toggle_status<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
        id: ItemId,
    ) -> Result<GroceryItem, ListError> {
        let mut item = self.get(id).cloned().ok_or(ListError::NotFound(id))?;
        item.status = item.status.toggled();
        self.update(api, item)
    }

    pub fn delete<T: Transport, S: TokenStore>(
        &mut self,
        api: &Api<T, S>,
        id: ItemId,
    ) -> Result<GroceryItem, ListError> {
        let pending = self.begin_delete(id)?;
        let result = api.delete_grocery(id);
        self.finish_delete(pending, result)
    }

    // -- internals ----------------------------------------------------------

    /// Index of `id`, provided nothing is outstanding for it. Temporary
    /// entries always have their add in flight.
    fn lock(&self, id: ItemId) -> Result<usize, ListError> {
        if self.in_flight.contains(&id) {
            return Err(ListError::Busy(id));
        }
        self.items
            .iter()
            .position(|item| item.id == id)
            .ok_or(ListError::NotFound(id))
    }

    /// Negative, strictly decreasing, seeded from the wall clock.
    fn next_temp_id(&mut self) -> ItemId {
        let clock = -Utc::now().timestamp_millis().max(1);
        let id = clock.min(self.last_temp_id - 1);
        self.last_temp_id = id;
        id
    }

    /// `untouched`: nothing else began, finished or refreshed since the
    /// snapshot was taken, so it is still an exact picture of the list.
    fn restore(&mut self, mut snapshot: Vec<GroceryItem>, id: ItemId, untouched: bool) {
        if untouched {
            self.items = snapshot;
            return;
        }
        let Some(index) = snapshot.iter().position(|item| item.id == id) else {
            return;
        };
        let original = snapshot.swap_remove(index);
        match self.items.iter().position(|item| item.id == id) {
            Some(current) => self.items[current] = original,
            None => self.items.insert(index.min(self.items.len()), original),
        }
    }
}
