//! Integration tests for immediate-retry classification

use envoy_mobile_config::network_error::{NetError, NetworkError, NetworkErrorKind};
use envoy_mobile_config::PublicErrorCode;
use proptest::prelude::*;

const RETRYABLE: [PublicErrorCode; 5] = [
    PublicErrorCode::NetworkChanged,
    PublicErrorCode::TimedOut,
    PublicErrorCode::ConnectionClosed,
    PublicErrorCode::ConnectionTimedOut,
    PublicErrorCode::ConnectionReset,
];

fn any_category() -> impl Strategy<Value = PublicErrorCode> {
    prop::sample::select(PublicErrorCode::ALL.to_vec())
}

fn non_transient_code() -> impl Strategy<Value = NetError> {
    (-1000i32..0)
        .prop_map(NetError::from)
        .prop_filter("stream-transient codes are special-cased", |code| !code.is_stream_transient())
}

proptest! {
    #[test]
    fn base_variants_follow_the_default_policy(category in any_category(), code in -1000i32..0) {
        let network = NetworkError::network("failure", category, code);
        prop_assert_eq!(network.immediately_retryable(), RETRYABLE.contains(&category));

        let quic = NetworkError::quic("failure", category, code, 7);
        prop_assert_eq!(quic.immediately_retryable(), RETRYABLE.contains(&category));
    }

    #[test]
    fn streams_without_transient_codes_follow_the_default_policy(
        category in any_category(),
        code in non_transient_code(),
    ) {
        let stream = NetworkError::stream("failure", category, code);
        prop_assert_eq!(stream.immediately_retryable(), RETRYABLE.contains(&category));
    }
}

#[test]
fn stream_keepalive_and_handshake_failures_retry_immediately() {
    for code in [NetError::HTTP2_PING_FAILED, NetError::QUIC_HANDSHAKE_FAILED] {
        let err = NetworkError::stream("Exception in BidirectionalStream", PublicErrorCode::Other, code);
        assert!(err.immediately_retryable(), "{} should be retryable", code);
    }
}

#[test]
fn stream_with_other_category_and_generic_code_is_not_retryable() {
    let err = NetworkError::stream("failed", PublicErrorCode::Other, NetError::FAILED);
    assert!(!err.immediately_retryable());
}

#[test]
fn derived_categories_classify_like_explicit_ones() {
    let cases = [
        (NetError::CONNECTION_RESET, true),
        (NetError::NETWORK_CHANGED, true),
        (NetError::NAME_NOT_RESOLVED, false),
        (NetError::INTERNET_DISCONNECTED, false),
        (NetError::QUIC_PROTOCOL_ERROR, false),
    ];
    for (code, expected) in cases {
        let err = NetworkError::from_internal(NetworkErrorKind::Network, "failure", code);
        assert_eq!(err.immediately_retryable(), expected, "{}", code);
    }
}

#[test]
#[cfg(not(debug_assertions))]
fn inconsistent_transient_category_still_retries_in_release_builds() {
    let err = NetworkError::stream("ping", PublicErrorCode::TimedOut, NetError::HTTP2_PING_FAILED);
    assert!(err.immediately_retryable());
}
