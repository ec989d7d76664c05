//! Stateless HTTP request builder and response parser for the grocery API.
//!
//! # Design
//! `GroceryClient` holds only a `base_url` and carries no mutable state between
//! calls. Each backend operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Authentication is not attached here; `Api` adds the bearer header from the
//! persisted token just before the request leaves.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AccessToken, Credentials, GroceryItem, GroceryUpdate, ItemId, MessageResponse,
    NewGroceryItem, PasswordChange, Profile, RegisteredUser, Registration,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Synchronous, stateless client for the grocery API.
#[derive(Debug, Clone)]
pub struct GroceryClient {
    base_url: String,
}

impl Default for GroceryClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl GroceryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- auth ---------------------------------------------------------------

    /// The backend uses an OAuth2 password form, so the email travels as
    /// `username`.
    pub fn build_login(&self, credentials: &Credentials) -> HttpRequest {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("username", &credentials.email)
            .append_pair("password", &credentials.password)
            .finish();
        HttpRequest {
            method: HttpMethod::Post,
            path: self.url("/auth/login"),
            headers: vec![("content-type".to_string(), FORM.to_string())],
            body: Some(body),
        }
    }

    pub fn build_register(&self, input: &Registration) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth/register", input)
    }

    // -- users --------------------------------------------------------------

    pub fn build_current_user(&self) -> HttpRequest {
        self.empty_request(HttpMethod::Get, "/users/me")
    }

    pub fn build_change_password(&self, input: &PasswordChange) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, "/users/me/password", input)
    }

    pub fn build_delete_account(&self) -> HttpRequest {
        self.empty_request(HttpMethod::Delete, "/users/me")
    }

    // -- groceries ----------------------------------------------------------

    pub fn build_list_groceries(&self) -> HttpRequest {
        self.empty_request(HttpMethod::Get, "/groceries/")
    }

    pub fn build_add_grocery(&self, input: &NewGroceryItem) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/groceries/", input)
    }

    pub fn build_update_grocery(
        &self,
        id: ItemId,
        input: &GroceryUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/groceries/{id}"), input)
    }

    pub fn build_delete_grocery(&self, id: ItemId) -> HttpRequest {
        self.empty_request(HttpMethod::Delete, &format!("/groceries/{id}"))
    }

    // -- parsers ------------------------------------------------------------

    pub fn parse_login(&self, response: HttpResponse) -> Result<AccessToken, ApiError> {
        required(decode(&response)?)
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<RegisteredUser, ApiError> {
        required(decode(&response)?)
    }

    pub fn parse_current_user(&self, response: HttpResponse) -> Result<Profile, ApiError> {
        required(decode(&response)?)
    }

    pub fn parse_change_password(
        &self,
        response: HttpResponse,
    ) -> Result<MessageResponse, ApiError> {
        required(decode(&response)?)
    }

    pub fn parse_delete_account(&self, response: HttpResponse) -> Result<(), ApiError> {
        decode::<Value>(&response).map(|_| ())
    }

    /// An empty body is treated as an empty list.
    pub fn parse_list_groceries(&self, response: HttpResponse) -> Result<Vec<GroceryItem>, ApiError> {
        Ok(decode(&response)?.unwrap_or_default())
    }

    pub fn parse_add_grocery(&self, response: HttpResponse) -> Result<GroceryItem, ApiError> {
        required(decode(&response)?)
    }

    pub fn parse_update_grocery(&self, response: HttpResponse) -> Result<GroceryItem, ApiError> {
        required(decode(&response)?)
    }

    pub fn parse_delete_grocery(&self, response: HttpResponse) -> Result<(), ApiError> {
        decode::<Value>(&response).map(|_| ())
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    fn empty_request(&self, method: HttpMethod, endpoint: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(endpoint),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(endpoint),
            headers: vec![("content-type".to_string(), JSON.to_string())],
            body: Some(body),
        })
    }
}

/// Turn a response into `Ok(None)` for no-content responses, `Ok(Some(T))`
/// for JSON bodies, or the normalized `ApiError` for non-2xx statuses.
pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<Option<T>, ApiError> {
    if !response.is_success() {
        return Err(error_from_response(response));
    }
    if response.has_no_content() {
        return Ok(None);
    }
    serde_json::from_str(&response.body)
        .map(Some)
        .map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn required<T>(value: Option<T>) -> Result<T, ApiError> {
    value.ok_or(ApiError::MissingContent)
}

/// Build `ApiError::Http` from a non-2xx response.
///
/// `detail` lists (field validation errors) become `"field: msg"` joined by
/// `", "`, a string `detail` is used as-is, any other JSON body is
/// serialized whole, and an unparseable body falls back to the status text.
pub fn error_from_response(response: &HttpResponse) -> ApiError {
    let message = match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Null) => format!("HTTP error! status: {}", response.status),
        Ok(data) => match data.get("detail") {
            Some(Value::Array(entries)) => entries
                .iter()
                .map(format_detail_entry)
                .collect::<Vec<_>>()
                .join(", "),
            Some(Value::String(detail)) if !detail.is_empty() => detail.clone(),
            _ => data.to_string(),
        },
        Err(_) => status_text(response.status),
    };
    ApiError::Http {
        message,
        status: response.status,
        body: response.body.clone(),
    }
}

fn format_detail_entry(entry: &Value) -> String {
    let msg = match entry.get("msg") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => return entry.to_string(),
    };
    let field = entry
        .get("loc")
        .and_then(Value::as_array)
        .and_then(|loc| loc.last())
        .map(|last| match last {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    match field {
        Some(field) => format!("{field}: {msg}"),
        None => msg,
    }
}

fn status_text(status: u16) -> String {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}
