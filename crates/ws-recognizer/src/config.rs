//! Recognition session configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use inkwire_protocol::constants::{DEFAULT_HOST, SECURE_SCHEME};
use inkwire_protocol::{MathParameter, TextParameter};

/// Where the recognition server lives and how to authenticate with it.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Origin scheme; `https` selects `wss`, anything else `ws`.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Host (and optional port) of the recognition server.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub application_key: String,

    #[serde(default)]
    pub hmac_key: String,
}

fn default_scheme() -> String {
    SECURE_SCHEME.into()
}

fn default_host() -> String {
    DEFAULT_HOST.into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            application_key: String::new(),
            hmac_key: String::new(),
        }
    }
}

impl ServerConfig {
    pub fn is_secure(&self) -> bool {
        self.scheme == SECURE_SCHEME
    }

    /// WebSocket URL for the endpoint at `suffix`.
    pub fn websocket_url(&self, suffix: &str) -> String {
        let scheme = if self.is_secure() { "wss" } else { "ws" };
        format!("{scheme}://{}{suffix}", self.host)
    }
}

// Keeps the HMAC key out of logs.
impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("scheme", &self.scheme)
            .field("host", &self.host)
            .field("application_key", &self.application_key)
            .field("hmac_key", &"<redacted>")
            .finish()
    }
}

/// Everything a session needs: server access plus recognition parameters
/// for the start frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub math: MathParameter,

    #[serde(default)]
    pub text: TextParameter,
}
