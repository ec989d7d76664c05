//! Domain DTOs for the grocery API.
//!
//! # Design
//! These mirror the backend schema but are defined independently from the
//! mock-server crate; the integration tests catch drift. Timestamps stay as
//! the ISO-8601 strings the server sends since the client never does date
//! arithmetic on them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned item id. Optimistic placeholders use negative values.
pub type ItemId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Pending,
    Purchased,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Purchased => "purchased",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ItemStatus::Pending => ItemStatus::Purchased,
            ItemStatus::Purchased => ItemStatus::Pending,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user as returned by `GET /users/me`.
///
/// Replaced wholesale on refetch; never edited locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub is_active: bool,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// A single grocery list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryItem {
    pub id: ItemId,
    pub name: String,
    pub quantity: u32,
    #[serde(default)]
    pub status: ItemStatus,
    pub owner_id: i64,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl GroceryItem {
    /// True for optimistic entries that have not been confirmed by the server.
    pub fn is_temporary(&self) -> bool {
        self.id < 0
    }
}

/// Payload for `POST /groceries/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGroceryItem {
    pub name: String,
    pub quantity: u32,
}

/// Payload for `PUT /groceries/{id}`. Only the user-editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroceryUpdate {
    pub name: String,
    pub quantity: u32,
    pub status: ItemStatus,
}

impl From<&GroceryItem> for GroceryUpdate {
    fn from(item: &GroceryItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            status: item.status,
        }
    }
}

/// Login input. Sent form-encoded with the email in the `username` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Payload for `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub email: String,
    pub password: String,
}

/// The account created by registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub email: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Payload for `PUT /users/me/password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
