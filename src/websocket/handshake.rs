//! Upgrade request headers for the websocket attach endpoint.
//!
//! The HTTP transport sends these headers once, when it opens the
//! `/containers/{id}/attach/ws` connection. Every request carries a fresh
//! `Sec-WebSocket-Key`: sixteen random bytes, base64 encoded.
//!
//! The engine does not check `Origin` on attach, so the default is a plain
//! `http://localhost` rather than a client-specific scheme. Callers that
//! sit behind an origin-checking proxy set their own with
//! [`UpgradeRequest::with_origin`].

use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Websocket protocol version requested by the client.
pub const WEBSOCKET_VERSION: &str = "13";

/// `Host` header sent when none is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// `Origin` header sent when none is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost";

/// Headers for one websocket upgrade request.
///
/// # Examples
///
/// ```
/// use dockerframe::websocket::handshake::UpgradeRequest;
///
/// let request = UpgradeRequest::new().with_host("docker.sock");
/// let headers = request.headers();
/// assert!(headers.contains(&("Upgrade", "websocket")));
/// assert!(headers.contains(&("Sec-WebSocket-Key", request.key())));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeRequest {
    host: String,
    origin: String,
    key: String,
}

impl UpgradeRequest {
    /// Build a request with default host and origin and a fresh key.
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            origin: DEFAULT_ORIGIN.to_owned(),
            key: generate_key(),
        }
    }

    /// Replace the `Host` header.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Replace the `Origin` header.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// The `Sec-WebSocket-Key` nonce of this request.
    #[must_use]
    pub fn key(&self) -> &str { &self.key }

    /// Header name/value pairs to send with the upgrade request.
    #[must_use]
    pub fn headers(&self) -> [(&'static str, &str); 6] {
        [
            ("Host", self.host.as_str()),
            ("Origin", self.origin.as_str()),
            ("Upgrade", "websocket"),
            ("Connection", "Upgrade"),
            ("Sec-WebSocket-Version", WEBSOCKET_VERSION),
            ("Sec-WebSocket-Key", self.key.as_str()),
        ]
    }
}

impl Default for UpgradeRequest {
    fn default() -> Self { Self::new() }
}

/// Generate a `Sec-WebSocket-Key` value.
#[must_use]
pub fn generate_key() -> String { STANDARD.encode(rand::random::<[u8; 16]>()) }
