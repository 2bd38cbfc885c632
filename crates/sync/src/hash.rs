// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content hashing for conflict detection (§4.8.1-4.8.2): `H` is SHA-256 over
//! a canonicalization of an element's content-fields that sorts container
//! keys and tag arrays and never sees transient fields (timestamps, version
//! counters) because `ExternalFields` doesn't carry them.

use sf_core::ExternalFields;
use sha2::{Digest, Sha256};

/// Hashes the content-fields of a local or remote element. Both sides must
/// go through the same `ExternalFields` shape before hashing so `H` agrees
/// across local and external representations.
pub fn content_hash(fields: &ExternalFields) -> String {
    let mut canonical = fields.clone();
    canonical.tags.sort();
    // `serde_json::Map` is a `BTreeMap` (no `preserve_order` feature), so
    // object keys serialize in sorted order regardless of struct field order.
    let value = serde_json::to_value(&canonical).unwrap_or(serde_json::Value::Null);
    let json = serde_json::to_string(&value).unwrap_or_default();
    format!("{:x}", Sha256::digest(json.as_bytes()))
}
