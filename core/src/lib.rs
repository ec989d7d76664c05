//! Client core for the grocery list service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), then layers the client-side
//! state on top: the session store and the optimistic list view-model.
//!
//! # Design
//! - `GroceryClient` is stateless; it holds only `base_url`.
//! - `Api` pairs it with a host-supplied `Transport` and a `TokenStore`, and
//!   attaches the bearer token on every call.
//! - `SessionStore` and `GroceryList` are ordinary values that take the `Api`
//!   as an argument; nothing is global.
//! - Everything runs on one logical thread. Network calls are the only
//!   suspension points.

pub mod api;
pub mod client;
pub mod edit;
pub mod error;
pub mod http;
pub mod list;
pub mod session;
pub mod storage;
#[cfg(feature = "ureq")]
pub mod transport;
pub mod types;
pub mod validation;
pub mod view;

#[cfg(test)]
mod testing;

pub use api::Api;
pub use client::{GroceryClient, DEFAULT_BASE_URL};
pub use edit::EditBuffer;
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use list::{GroceryList, ListError, PendingAdd, PendingDelete, PendingUpdate};
pub use session::{SessionError, SessionEvent, SessionState, SessionStatus, SessionStore};
pub use storage::{FileTokenStore, MemoryTokenStore, StorageError, TokenStore, TOKEN_KEY};
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{
    AccessToken, Credentials, GroceryItem, GroceryUpdate, ItemId, ItemStatus, MessageResponse,
    NewGroceryItem, PasswordChange, Profile, RegisteredUser, Registration,
};
pub use validation::ValidationError;
pub use view::{derive_view, ListQuery, SortField, SortOrder, StatusFilter};
