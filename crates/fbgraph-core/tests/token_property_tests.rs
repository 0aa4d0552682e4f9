//! Property-based tests for the signed request and cookie codecs.

use std::collections::BTreeMap;

use fbgraph_core::{
    build_signed_request, decode_cookie_token, encode_cookie_token, parse_signed_request, Error,
};
use proptest::{
    prelude::{prop_assert, prop_assert_eq, Strategy},
    proptest,
    test_runner::{Config as ProptestConfig, FileFailurePersistence},
};

const TOKEN_PROP_CASES: u32 = 128;
const BASE64URL_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn token_proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: TOKEN_PROP_CASES,
        failure_persistence: Some(Box::new(FileFailurePersistence::WithSource(
            "token-property-regressions",
        ))),
        ..ProptestConfig::default()
    }
}

fn user_id_strategy() -> impl Strategy<Value = String> {
    "[0-9]{1,15}|testuser[0-9a-f]{1,8}"
}

fn secret_strategy() -> impl Strategy<Value = String> {
    "[ -~]{1,40}"
}

fn access_token_strategy() -> impl Strategy<Value = String> {
    "[0-9a-f]{32}|[A-Za-z0-9|._-]{1,64}"
}

proptest! {
    #![proptest_config(token_proptest_config())]

    #[test]
    fn test_signed_request_round_trip(
        user_id in user_id_strategy(),
        token in access_token_strategy(),
        secret in secret_strategy(),
    ) {
        let encoded = build_signed_request(&user_id, Some(&token), &secret).unwrap();
        prop_assert!(!encoded.contains('='));

        let request = parse_signed_request(&encoded, &secret).unwrap();
        prop_assert_eq!(request.user_id.as_deref(), Some(user_id.as_str()));
        prop_assert_eq!(request.oauth_token.as_deref(), Some(token.as_str()));
        prop_assert!(request.issued_at.is_some());
    }

    #[test]
    fn test_signed_request_without_token_is_anonymous(
        user_id in user_id_strategy(),
        secret in secret_strategy(),
    ) {
        let encoded = build_signed_request(&user_id, None, &secret).unwrap();
        let request = parse_signed_request(&encoded, &secret).unwrap();
        prop_assert!(request.is_anonymous());
        prop_assert_eq!(request.user_id, None);
        prop_assert_eq!(request.oauth_token, None);
    }

    #[test]
    fn test_payload_tamper_is_signature_mismatch(
        user_id in user_id_strategy(),
        token in access_token_strategy(),
        position in 0usize..10_000,
        replacement in 0usize..BASE64URL_ALPHABET.len(),
    ) {
        let encoded = build_signed_request(&user_id, Some(&token), "s3cr3t").unwrap();
        let dot = encoded.find('.').unwrap();
        let payload_len = encoded.len() - dot - 1;
        let index = dot + 1 + position % payload_len;

        let mut bytes = encoded.into_bytes();
        let mut new_char = BASE64URL_ALPHABET[replacement];
        if new_char == bytes[index] {
            new_char = BASE64URL_ALPHABET[(replacement + 1) % BASE64URL_ALPHABET.len()];
        }
        bytes[index] = new_char;
        let tampered = String::from_utf8(bytes).unwrap();

        prop_assert!(matches!(
            parse_signed_request(&tampered, "s3cr3t"),
            Err(Error::SignatureMismatch)
        ));
    }

    #[test]
    fn test_wrong_secret_is_signature_mismatch(
        user_id in user_id_strategy(),
        secret in secret_strategy(),
        other in secret_strategy(),
    ) {
        proptest::prop_assume!(secret != other);
        let encoded = build_signed_request(&user_id, None, &secret).unwrap();
        prop_assert!(matches!(
            parse_signed_request(&encoded, &other),
            Err(Error::SignatureMismatch)
        ));
    }

    #[test]
    fn test_cookie_round_trip(
        user_id in user_id_strategy(),
        token in access_token_strategy(),
        secret in secret_strategy(),
    ) {
        let mut fields = BTreeMap::new();
        fields.insert("uid".to_string(), user_id.clone());
        fields.insert("access_token".to_string(), token.clone());
        fields.insert("expires".to_string(), "0".to_string());

        let raw = encode_cookie_token(&fields, &secret);
        let decoded = decode_cookie_token(&raw, &secret).unwrap();
        prop_assert_eq!(&decoded["uid"], &user_id);
        prop_assert_eq!(&decoded["access_token"], &token);

        // Quoted cookie values decode the same way
        let quoted = format!("\"{raw}\"");
        prop_assert!(decode_cookie_token(&quoted, &secret).is_some());
    }
}
