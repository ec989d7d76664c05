//! One call per backend operation, executed over a pluggable transport.
//!
//! `Api` glues the sans-IO `GroceryClient` to a `Transport` and reads the
//! persisted token on every call. When a token is stored the request carries
//! `Authorization: Bearer <token>`; otherwise the header is simply omitted and
//! the server decides.

use tracing::{debug, warn};

use crate::client::GroceryClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::storage::TokenStore;
use crate::types::{
    AccessToken, Credentials, GroceryItem, GroceryUpdate, ItemId, MessageResponse,
    NewGroceryItem, PasswordChange, Profile, RegisteredUser, Registration,
};

#[derive(Debug)]
pub struct Api<T, S> {
    client: GroceryClient,
    transport: T,
    tokens: S,
}

impl<T: Transport, S: TokenStore> Api<T, S> {
    pub fn new(client: GroceryClient, transport: T, tokens: S) -> Self {
        Self {
            client,
            transport,
            tokens,
        }
    }

    pub fn client(&self) -> &GroceryClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn tokens(&self) -> &S {
        &self.tokens
    }

    /// Attach the stored token (if any) and execute the request.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let request = match self.tokens.load() {
            Some(token) => request.with_bearer(&token),
            None => request,
        };
        debug!(method = request.method.as_str(), url = %request.path, "calling API");
        self.transport.execute(&request).map_err(|e| {
            warn!(method = request.method.as_str(), url = %request.path, error = %e, "request failed without a response");
            ApiError::Network(e.0)
        })
    }

    fn call<R>(
        &self,
        request: HttpRequest,
        parse: impl FnOnce(&GroceryClient, HttpResponse) -> Result<R, ApiError>,
    ) -> Result<R, ApiError> {
        let method = request.method.as_str();
        let url = request.path.clone();
        let response = self.send(request)?;
        parse(&self.client, response).inspect_err(|e| {
            if !matches!(e, ApiError::Network(_)) {
                warn!(method, %url, status = e.status(), error = %e, "API error");
            }
        })
    }

    pub fn login(&self, credentials: &Credentials) -> Result<AccessToken, ApiError> {
        self.call(self.client.build_login(credentials), GroceryClient::parse_login)
    }

    pub fn register(&self, input: &Registration) -> Result<RegisteredUser, ApiError> {
        self.call(self.client.build_register(input)?, GroceryClient::parse_register)
    }

    pub fn current_user(&self) -> Result<Profile, ApiError> {
        self.call(self.client.build_current_user(), GroceryClient::parse_current_user)
    }

    pub fn change_password(&self, input: &PasswordChange) -> Result<MessageResponse, ApiError> {
        self.call(
            self.client.build_change_password(input)?,
            GroceryClient::parse_change_password,
        )
    }

    pub fn delete_account(&self) -> Result<(), ApiError> {
        self.call(self.client.build_delete_account(), GroceryClient::parse_delete_account)
    }

    pub fn list_groceries(&self) -> Result<Vec<GroceryItem>, ApiError> {
        self.call(self.client.build_list_groceries(), GroceryClient::parse_list_groceries)
    }

    pub fn add_grocery(&self, input: &NewGroceryItem) -> Result<GroceryItem, ApiError> {
        self.call(self.client.build_add_grocery(input)?, GroceryClient::parse_add_grocery)
    }

    pub fn update_grocery(&self, id: ItemId, input: &GroceryUpdate) -> Result<GroceryItem, ApiError> {
        self.call(
            self.client.build_update_grocery(id, input)?,
            GroceryClient::parse_update_grocery,
        )
    }

    pub fn delete_grocery(&self, id: ItemId) -> Result<(), ApiError> {
        self.call(self.client.build_delete_grocery(id), GroceryClient::parse_delete_grocery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryTokenStore;
    use crate::testing::ScriptedTransport;

    fn api(transport: ScriptedTransport, tokens: MemoryTokenStore) -> Api<ScriptedTransport, MemoryTokenStore> {
        Api::new(GroceryClient::new("http://api.test"), transport, tokens)
    }

    #[test]
    fn bearer_is_attached_when_token_is_stored() {
        let api = api(
            ScriptedTransport::new().reply(200, "[]"),
            MemoryTokenStore::with_token("tok"),
        );
        api.list_groceries().unwrap();
        let sent = api.transport().requests();
        assert_eq!(sent[0].header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn header_is_omitted_without_token() {
        let api = api(
            ScriptedTransport::new().reply(401, r#"{"detail":"Not authenticated"}"#),
            MemoryTokenStore::new(),
        );
        let err = api.list_groceries().unwrap_err();
        assert_eq!(err.to_string(), "Not authenticated");
        assert!(api.transport().requests()[0].header("authorization").is_none());
    }

    #[test]
    fn transport_failure_is_a_network_error() {
        let api = api(
            ScriptedTransport::new().fail("connection refused"),
            MemoryTokenStore::new(),
        );
        let err = api.current_user().unwrap_err();
        assert_eq!(err, ApiError::Network("connection refused".to_string()));
    }

    #[test]
    fn delete_returns_unit_on_204() {
        let api = api(ScriptedTransport::new().reply(204, ""), MemoryTokenStore::with_token("t"));
        api.delete_grocery(3).unwrap();
        assert_eq!(api.transport().requests()[0].path, "http://api.test/groceries/3");
    }
}
