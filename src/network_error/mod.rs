//! # Network Error Classification
//!
//! Network failures reported by the engine, and whether the failed operation
//! may be retried immediately without backoff.
//!
//! Every variant carries a message, a public [`PublicErrorCode`] category and
//! the engine's internal [`NetError`]. The retry decision is a match over the
//! variant: `Stream` recognises keepalive and handshake failures, and every
//! variant falls back to the shared default policy for codes it does not
//! recognise.

pub mod codes;

pub use codes::{NetError, PublicErrorCode};

use crate::observability::MetricsRecorder;
use serde::Serialize;
use std::fmt;

/// Variant tag of a [`NetworkError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    Network,
    Stream,
    Quic,
}

impl NetworkErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Stream => "stream",
            Self::Quic => "quic",
        }
    }
}

impl fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network failure reported by the engine
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Transport-level failure
    #[error("{message}, error code: {error_code}, internal error code: {internal_code}")]
    Network { message: String, error_code: PublicErrorCode, internal_code: NetError },

    /// Failure of a bidirectional stream
    #[error("{message}, error code: {error_code}, internal error code: {internal_code}")]
    Stream { message: String, error_code: PublicErrorCode, internal_code: NetError },

    /// QUIC failure with the transport's detailed error code
    #[error(
        "{message}, error code: {error_code}, internal error code: {internal_code}, quic detailed error code: {quic_detailed_error_code}"
    )]
    Quic {
        message: String,
        error_code: PublicErrorCode,
        internal_code: NetError,
        quic_detailed_error_code: i32,
    },
}

impl NetworkError {
    pub fn network(
        message: impl Into<String>,
        error_code: PublicErrorCode,
        internal_code: impl Into<NetError>,
    ) -> Self {
        Self::Network { message: message.into(), error_code, internal_code: internal_code.into() }
    }

    pub fn stream(
        message: impl Into<String>,
        error_code: PublicErrorCode,
        internal_code: impl Into<NetError>,
    ) -> Self {
        Self::Stream { message: message.into(), error_code, internal_code: internal_code.into() }
    }

    pub fn quic(
        message: impl Into<String>,
        error_code: PublicErrorCode,
        internal_code: impl Into<NetError>,
        quic_detailed_error_code: i32,
    ) -> Self {
        Self::Quic {
            message: message.into(),
            error_code,
            internal_code: internal_code.into(),
            quic_detailed_error_code,
        }
    }

    /// Builds an error whose public category is derived from the internal code.
    pub fn from_internal(
        kind: NetworkErrorKind,
        message: impl Into<String>,
        internal_code: impl Into<NetError>,
    ) -> Self {
        let internal_code = internal_code.into();
        let error_code = internal_code.public_code();
        match kind {
            NetworkErrorKind::Network => Self::network(message, error_code, internal_code),
            NetworkErrorKind::Stream => Self::stream(message, error_code, internal_code),
            NetworkErrorKind::Quic => Self::quic(message, error_code, internal_code, 0),
        }
    }

    pub fn kind(&self) -> NetworkErrorKind {
        match self {
            Self::Network { .. } => NetworkErrorKind::Network,
            Self::Stream { .. } => NetworkErrorKind::Stream,
            Self::Quic { .. } => NetworkErrorKind::Quic,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Network { message, .. }
            | Self::Stream { message, .. }
            | Self::Quic { message, .. } => message,
        }
    }

    pub fn error_code(&self) -> PublicErrorCode {
        match self {
            Self::Network { error_code, .. }
            | Self::Stream { error_code, .. }
            | Self::Quic { error_code, .. } => *error_code,
        }
    }

    pub fn internal_code(&self) -> NetError {
        match self {
            Self::Network { internal_code, .. }
            | Self::Stream { internal_code, .. }
            | Self::Quic { internal_code, .. } => *internal_code,
        }
    }

    pub fn quic_detailed_error_code(&self) -> Option<i32> {
        match self {
            Self::Quic { quic_detailed_error_code, .. } => Some(*quic_detailed_error_code),
            _ => None,
        }
    }

    /// False when a stream-transient internal code arrives under a specific
    /// public category, which classification treats as an internal defect.
    pub fn has_consistent_category(&self) -> bool {
        !(self.internal_code().is_stream_transient() && self.error_code() != PublicErrorCode::Other)
    }

    /// Whether the failed operation may be retried right away, without backoff.
    pub fn immediately_retryable(&self) -> bool {
        let retryable = match self {
            Self::Stream { error_code, internal_code, .. } if internal_code.is_stream_transient() => {
                check_transient_category(*error_code, *internal_code);
                true
            }
            _ => default_retryable(self.error_code()),
        };

        MetricsRecorder::new().record_classification(self.kind().as_str(), retryable);
        tracing::debug!(
            kind = %self.kind(),
            error_code = %self.error_code(),
            internal_code = %self.internal_code(),
            retryable,
            "classified network error"
        );
        retryable
    }
}

/// Policy shared by every variant.
fn default_retryable(error_code: PublicErrorCode) -> bool {
    match error_code {
        PublicErrorCode::NetworkChanged
        | PublicErrorCode::TimedOut
        | PublicErrorCode::ConnectionClosed
        | PublicErrorCode::ConnectionTimedOut
        | PublicErrorCode::ConnectionReset => true,
        PublicErrorCode::HostnameNotResolved
        | PublicErrorCode::InternetDisconnected
        | PublicErrorCode::ConnectionRefused
        | PublicErrorCode::AddressUnreachable
        | PublicErrorCode::QuicProtocolFailed
        | PublicErrorCode::Other => false,
    }
}

/// Transient internal codes are only ever reported under the `Other` category.
fn check_transient_category(error_code: PublicErrorCode, internal_code: NetError) {
    if error_code != PublicErrorCode::Other {
        tracing::error!(
            error_code = %error_code,
            internal_code = %internal_code,
            "transient internal code reported under a specific public category"
        );
        MetricsRecorder::new().record_invariant_violation(internal_code.code());
    }

    debug_assert!(
        error_code == PublicErrorCode::Other,
        "transient internal code {} reported as {} instead of other",
        internal_code,
        error_code
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_ping_timeout_is_retryable() {
        let err = NetworkError::stream(
            "Exception in BidirectionalStream",
            PublicErrorCode::Other,
            NetError::HTTP2_PING_FAILED,
        );
        assert!(err.immediately_retryable());
    }

    #[test]
    fn stream_quic_handshake_failure_is_retryable() {
        let err = NetworkError::stream("handshake", PublicErrorCode::Other, NetError::QUIC_HANDSHAKE_FAILED);
        assert!(err.immediately_retryable());
    }

    #[test]
    fn stream_falls_back_to_default_policy() {
        let refused =
            NetworkError::stream("refused", PublicErrorCode::ConnectionRefused, NetError::CONNECTION_REFUSED);
        assert!(!refused.immediately_retryable());

        let reset =
            NetworkError::stream("reset", PublicErrorCode::ConnectionReset, NetError::CONNECTION_RESET);
        assert!(reset.immediately_retryable());

        let other = NetworkError::stream("failed", PublicErrorCode::Other, NetError::FAILED);
        assert!(!other.immediately_retryable());
    }

    #[test]
    fn base_variants_do_not_special_case_transient_codes() {
        let network = NetworkError::network("ping", PublicErrorCode::Other, NetError::HTTP2_PING_FAILED);
        assert!(!network.immediately_retryable());

        let quic = NetworkError::quic("handshake", PublicErrorCode::Other, NetError::QUIC_HANDSHAKE_FAILED, 42);
        assert!(!quic.immediately_retryable());
    }

    #[test]
    fn default_policy_table() {
        let retryable: Vec<_> =
            PublicErrorCode::ALL.into_iter().filter(|code| default_retryable(*code)).collect();
        assert_eq!(
            retryable,
            vec![
                PublicErrorCode::NetworkChanged,
                PublicErrorCode::TimedOut,
                PublicErrorCode::ConnectionClosed,
                PublicErrorCode::ConnectionTimedOut,
                PublicErrorCode::ConnectionReset,
            ]
        );
    }

    #[test]
    fn transient_code_under_other_passes_the_category_check() {
        check_transient_category(PublicErrorCode::Other, NetError::HTTP2_PING_FAILED);
        check_transient_category(PublicErrorCode::Other, NetError::QUIC_HANDSHAKE_FAILED);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "transient internal code")]
    fn mismatched_transient_category_asserts_in_debug_builds() {
        let err = NetworkError::stream("ping", PublicErrorCode::TimedOut, NetError::HTTP2_PING_FAILED);
        err.immediately_retryable();
    }

    #[test]
    fn consistency_check_matches_classifier_invariant() {
        assert!(NetworkError::stream("ping", PublicErrorCode::Other, NetError::HTTP2_PING_FAILED)
            .has_consistent_category());
        assert!(!NetworkError::stream("ping", PublicErrorCode::TimedOut, NetError::HTTP2_PING_FAILED)
            .has_consistent_category());
        assert!(NetworkError::network("reset", PublicErrorCode::ConnectionReset, NetError::CONNECTION_RESET)
            .has_consistent_category());
    }

    #[test]
    fn from_internal_derives_public_category() {
        let err = NetworkError::from_internal(NetworkErrorKind::Stream, "ping", -352);
        assert_eq!(err.error_code(), PublicErrorCode::Other);
        assert_eq!(err.internal_code(), NetError::HTTP2_PING_FAILED);
        assert!(err.immediately_retryable());

        let quic = NetworkError::from_internal(NetworkErrorKind::Quic, "proto", -356);
        assert_eq!(quic.error_code(), PublicErrorCode::QuicProtocolFailed);
        assert_eq!(quic.quic_detailed_error_code(), Some(0));
        assert!(!quic.immediately_retryable());
    }

    #[test]
    fn display_includes_codes() {
        let err = NetworkError::quic("Exception in UrlRequest", PublicErrorCode::QuicProtocolFailed, -356, 16);
        assert_eq!(
            err.to_string(),
            "Exception in UrlRequest, error code: quic_protocol_failed, internal error code: ERR_QUIC_PROTOCOL_ERROR (-356), quic detailed error code: 16"
        );
        assert_eq!(err.kind(), NetworkErrorKind::Quic);
        assert_eq!(err.message(), "Exception in UrlRequest");
    }
}
