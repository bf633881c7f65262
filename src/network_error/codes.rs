//! Public error categories and internal engine error codes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse error category surfaced to callers of the HTTP client API.
///
/// Discriminants follow the public numbering of the client API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(i32)]
pub enum PublicErrorCode {
    HostnameNotResolved = 1,
    InternetDisconnected = 2,
    NetworkChanged = 3,
    TimedOut = 4,
    ConnectionClosed = 5,
    ConnectionTimedOut = 6,
    ConnectionRefused = 7,
    ConnectionReset = 8,
    AddressUnreachable = 9,
    QuicProtocolFailed = 10,
    Other = 11,
}

impl PublicErrorCode {
    pub const ALL: [PublicErrorCode; 11] = [
        Self::HostnameNotResolved,
        Self::InternetDisconnected,
        Self::NetworkChanged,
        Self::TimedOut,
        Self::ConnectionClosed,
        Self::ConnectionTimedOut,
        Self::ConnectionRefused,
        Self::ConnectionReset,
        Self::AddressUnreachable,
        Self::QuicProtocolFailed,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HostnameNotResolved => "hostname_not_resolved",
            Self::InternetDisconnected => "internet_disconnected",
            Self::NetworkChanged => "network_changed",
            Self::TimedOut => "timed_out",
            Self::ConnectionClosed => "connection_closed",
            Self::ConnectionTimedOut => "connection_timed_out",
            Self::ConnectionRefused => "connection_refused",
            Self::ConnectionReset => "connection_reset",
            Self::AddressUnreachable => "address_unreachable",
            Self::QuicProtocolFailed => "quic_protocol_failed",
            Self::Other => "other",
        }
    }

    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl fmt::Display for PublicErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PublicErrorCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|code| code.as_str() == normalized || code.code().to_string() == normalized)
            .ok_or_else(|| format!("Unknown error category: '{}'", s))
    }
}

/// Internal engine error code.
///
/// The engine's code space is larger than what this layer names; unknown codes
/// are carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetError(pub i32);

impl NetError {
    pub const FAILED: NetError = NetError(-2);
    pub const TIMED_OUT: NetError = NetError(-7);
    pub const NETWORK_CHANGED: NetError = NetError(-21);
    pub const CONNECTION_CLOSED: NetError = NetError(-100);
    pub const CONNECTION_RESET: NetError = NetError(-101);
    pub const CONNECTION_REFUSED: NetError = NetError(-102);
    pub const NAME_NOT_RESOLVED: NetError = NetError(-105);
    pub const INTERNET_DISCONNECTED: NetError = NetError(-106);
    pub const ADDRESS_UNREACHABLE: NetError = NetError(-109);
    pub const CONNECTION_TIMED_OUT: NetError = NetError(-118);
    pub const HTTP2_PING_FAILED: NetError = NetError(-352);
    pub const QUIC_PROTOCOL_ERROR: NetError = NetError(-356);
    pub const QUIC_HANDSHAKE_FAILED: NetError = NetError(-358);

    pub fn code(&self) -> i32 {
        self.0
    }

    /// Symbolic name for known codes
    pub fn name(&self) -> Option<&'static str> {
        let name = match *self {
            Self::FAILED => "ERR_FAILED",
            Self::TIMED_OUT => "ERR_TIMED_OUT",
            Self::NETWORK_CHANGED => "ERR_NETWORK_CHANGED",
            Self::CONNECTION_CLOSED => "ERR_CONNECTION_CLOSED",
            Self::CONNECTION_RESET => "ERR_CONNECTION_RESET",
            Self::CONNECTION_REFUSED => "ERR_CONNECTION_REFUSED",
            Self::NAME_NOT_RESOLVED => "ERR_NAME_NOT_RESOLVED",
            Self::INTERNET_DISCONNECTED => "ERR_INTERNET_DISCONNECTED",
            Self::ADDRESS_UNREACHABLE => "ERR_ADDRESS_UNREACHABLE",
            Self::CONNECTION_TIMED_OUT => "ERR_CONNECTION_TIMED_OUT",
            Self::HTTP2_PING_FAILED => "ERR_HTTP2_PING_FAILED",
            Self::QUIC_PROTOCOL_ERROR => "ERR_QUIC_PROTOCOL_ERROR",
            Self::QUIC_HANDSHAKE_FAILED => "ERR_QUIC_HANDSHAKE_FAILED",
            _ => return None,
        };
        Some(name)
    }

    /// Keepalive/handshake failures a stream may retry without backoff
    pub fn is_stream_transient(&self) -> bool {
        matches!(*self, Self::HTTP2_PING_FAILED | Self::QUIC_HANDSHAKE_FAILED)
    }

    /// Public category reported for this internal code.
    pub fn public_code(&self) -> PublicErrorCode {
        match *self {
            Self::NAME_NOT_RESOLVED => PublicErrorCode::HostnameNotResolved,
            Self::INTERNET_DISCONNECTED => PublicErrorCode::InternetDisconnected,
            Self::NETWORK_CHANGED => PublicErrorCode::NetworkChanged,
            Self::TIMED_OUT => PublicErrorCode::TimedOut,
            Self::CONNECTION_CLOSED => PublicErrorCode::ConnectionClosed,
            Self::CONNECTION_TIMED_OUT => PublicErrorCode::ConnectionTimedOut,
            Self::CONNECTION_REFUSED => PublicErrorCode::ConnectionRefused,
            Self::CONNECTION_RESET => PublicErrorCode::ConnectionReset,
            Self::ADDRESS_UNREACHABLE => PublicErrorCode::AddressUnreachable,
            Self::QUIC_PROTOCOL_ERROR => PublicErrorCode::QuicProtocolFailed,
            _ => PublicErrorCode::Other,
        }
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        NetError(code)
    }
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}
