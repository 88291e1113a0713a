//! `RadikoTransport` trait and the request/response values it exchanges.
#![allow(clippy::future_not_send)]

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};

use super::error::Result;

/// Outbound request: method, endpoint path (relative to the base URL) and
/// header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Endpoint path, e.g. `v2/api/auth1`.
    pub path: String,
    /// Header fields in insertion order.
    pub headers: Vec<(&'static str, String)>,
    /// Handshake requests never carry the stored session token.
    pub handshake: bool,
}

impl TransportRequest {
    /// Creates a `GET` request without headers.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            headers: Vec::new(),
            handshake: false,
        }
    }

    /// Marks the request as part of the authorization handshake.
    #[must_use]
    pub const fn handshake(mut self) -> Self {
        self.handshake = true;
        self
    }

    /// Appends a header field.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    /// Returns the first value of the named header (case-insensitive).
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Response of a successful exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body decoded as UTF-8 text.
    pub body: String,
}

impl TransportResponse {
    /// Returns the named response header as text, if present and valid.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// HTTP request/response collaborator.
///
/// Abstracts the exchange so the handshake can run against a mock in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(RadikoTransport: Send)]
pub trait LocalRadikoTransport {
    /// Sends one request and waits for its response.
    ///
    /// # Errors
    ///
    /// Returns `RadikoError::Transport` if the exchange fails or the status
    /// is not successful.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;
}
