#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;
use std::io;

use tokio_tungstenite::tungstenite;

use super::frame::DecodeError;

/// WebSocket error variants.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error decoding an inbound WebSocket frame
    Decode(DecodeError),
    /// WebSocket connection was closed
    ConnectionClosed,
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "Failed to decode WebSocket message: {e}"),
            Self::ConnectionClosed => write!(f, "WebSocket connection closed"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Decode(e) => Some(e),
            Self::ConnectionClosed => None,
        }
    }
}

/// Transport failure normalized to a `{code, message}` pair, as handed to error observers.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// Short machine-readable code (`io::ErrorKind`, HTTP status, or error family)
    pub code: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl TransportError {
    #[must_use]
    pub fn new<S: Into<String>>(code: Option<String>, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) if !code.is_empty() => write!(f, "{code},{}", self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl StdError for TransportError {}

impl From<&tungstenite::Error> for TransportError {
    fn from(e: &tungstenite::Error) -> Self {
        let code = match e {
            tungstenite::Error::Io(io) => Some(io_code(io)),
            tungstenite::Error::Http(response) => Some(response.status().as_u16().to_string()),
            tungstenite::Error::Tls(_) => Some("tls".to_owned()),
            tungstenite::Error::Protocol(_) => Some("protocol".to_owned()),
            tungstenite::Error::Capacity(_) => Some("capacity".to_owned()),
            tungstenite::Error::Url(_) => Some("url".to_owned()),
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Some("closed".to_owned())
            }
            _ => None,
        };

        Self::new(code, e.to_string())
    }
}

fn io_code(e: &io::Error) -> String {
    format!("{:?}", e.kind())
}

// Integration with main Error type
impl From<WsError> for crate::error::Error {
    fn from(e: WsError) -> Self {
        crate::error::Error::with_source(crate::error::Kind::WebSocket, e)
    }
}
