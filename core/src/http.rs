//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `GroceryClient` builds
//! `HttpRequest` values and parses `HttpResponse` values; the only place real
//! I/O happens is behind the `Transport` trait, which the host implements
//! (ureq in the CLI, a scripted fake in tests).

use thiserror::Error;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the absolute URL. Header names are stored lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Attach `authorization: Bearer <token>`.
    pub fn with_bearer(mut self, token: &str) -> Self {
        self.headers
            .push(("authorization".to_string(), format!("Bearer {token}")));
        self
    }
}

/// An HTTP response described as plain data.
///
/// Hosts must hand back every response they received, including 4xx/5xx;
/// status interpretation belongs to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for 204, an explicit zero `content-length`, or an empty body.
    pub fn has_no_content(&self) -> bool {
        self.status == 204
            || find_header(&self.headers, "content-length").is_some_and(|v| v.trim() == "0")
            || self.body.trim().is_empty()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// The request never produced a response (DNS, refused connection, TLS, ...).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Executes `HttpRequest`s against the network.
///
/// Implementations must return non-2xx responses as `Ok`; `Err` is reserved
/// for failures where no response exists at all.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, headers: Vec<(&str, &str)>, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        }
    }

    #[test]
    fn no_content_on_204_even_with_body() {
        assert!(response(204, vec![], "garbage").has_no_content());
    }

    #[test]
    fn no_content_on_zero_content_length() {
        assert!(response(200, vec![("Content-Length", "0")], "").has_no_content());
    }

    #[test]
    fn json_body_has_content() {
        let r = response(200, vec![("content-length", "2")], "[]");
        assert!(!r.has_no_content());
        assert!(r.is_success());
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(response(201, vec![], "").is_success());
        assert!(!response(302, vec![], "").is_success());
        assert!(!response(401, vec![], "").is_success());
    }

    #[test]
    fn bearer_header_is_appended() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            path: "http://x/users/me".to_string(),
            headers: Vec::new(),
            body: None,
        }
        .with_bearer("abc");
        assert_eq!(req.header("Authorization"), Some("Bearer abc"));
    }
}
