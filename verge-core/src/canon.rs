//! Canonical serialization and hashing for records.
//!
//! Collaborators that hash artifacts for provenance need a byte-stable
//! rendition of a record: keys in sorted order, floats rendered as
//! round-trip string tokens so the bytes do not depend on serializer
//! version, and non-finite values spelled out (`"NaN"`, `"Infinity"`,
//! `"-Infinity"`). The evaluator cache uses the same digest, so memoization
//! can never disagree with provenance hashing.
//!
//! This module is an isolated boundary utility; registry and solver logic
//! never depend on it.

use std::fmt::Write;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::Record;

/// Renders a float as a stable, round-trip string token.
fn float_token(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{value:?}")
    }
}

/// Canonical JSON value for a record: sorted keys, tokenized floats.
#[must_use]
pub fn canonical_json(record: &impl Record) -> Value {
    let mut fields = record.fields();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    let mut map = Map::new();
    for (key, value) in fields {
        map.insert(key.to_string(), Value::String(float_token(value)));
    }
    Value::Object(map)
}

/// Canonical compact JSON string for a record.
#[must_use]
pub fn canonical_string(record: &impl Record) -> String {
    canonical_json(record).to_string()
}

/// SHA-256 digest of the canonical JSON string.
#[must_use]
pub fn digest(record: &impl Record) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(canonical_string(record).as_bytes());
    hasher.finalize().into()
}

/// Hex-encoded [`digest`].
#[must_use]
pub fn digest_hex(record: &impl Record) -> String {
    digest(record).iter().fold(
        String::with_capacity(64),
        |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        },
    )
}
