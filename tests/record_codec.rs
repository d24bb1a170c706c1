// Copyright (c) 2026 bizast contributors
// Licensed under the Apache-2.0 License.

//! Fixture-based checks for the canonical-plaintext and key-derivation
//! properties (P5, P6), using the seed `00..00` fixture from the spec's
//! end-to-end scenarios.

use bizast::record;

const SEED_ZERO_PLAINTEXT: &str = r#"{"message":"https://example.org/","name":"home","version":0}"#;

#[test]
fn p5_canonical_plaintext_is_byte_stable() {
    let bytes = record::canonical_plaintext("home", "https://example.org/", 0);
    assert_eq!(String::from_utf8(bytes).unwrap(), SEED_ZERO_PLAINTEXT);
}

#[test]
fn p6_storage_key_round_trips_through_record_key() {
    let fp = "a".repeat(64);
    let record_key = record::record_key("home", &fp);
    let sk = record::storage_key(&record_key);

    let (name, parsed_fp) = record::parse_record_key(&record_key).unwrap();
    assert_eq!(name, "home");
    assert_eq!(parsed_fp, fp);
    assert_eq!(record::storage_key(&record::record_key(&name, &parsed_fp)), sk);
}

#[test]
fn p6_validation_rejects_mismatched_expected_storage_key() {
    use ring::signature::{Ed25519KeyPair, KeyPair};

    let seed = [0u8; 32];
    let kp = Ed25519KeyPair::from_seed_unchecked(&seed).unwrap();
    let key_bytes = kp.public_key().as_ref().to_vec();
    let plaintext = record::canonical_plaintext("home", "https://example.org/", 0);
    let sig = kp.sign(&plaintext);

    let rec = record::Record {
        name: "home".to_string(),
        message: "https://example.org/".to_string(),
        version: 0,
        key: hex::encode(key_bytes),
        signature: hex::encode(sig.as_ref()),
    };
    let bytes = record::encode(&rec);

    let wrong_expected = [0xabu8; 20];
    let result = bizast::validate::validate(Some(&wrong_expected), &bytes, None);
    assert!(result.is_err());
}
