/*!
 * Copyright 2025 Release Workshop Ltd
 * Licensed under the Elastic License 2.0; you may not use this file except in compliance with the Elastic License 2.0.
 * See the LICENSE file in the project root for details.
 */
//! Percentage bucketing.
//!
//! The hashed bytes are `namespace || config key || context key || value`,
//! hashed with xxHash32 (seed 0). An entity is in the bucket when
//! `hash % 100000 <= threshold`. Every client implementation must agree on
//! this bit for bit.

use xxhash_rust::xxh32::xxh32;

use crate::evaluator::context::ContextValue;

/// Upper bound of a bucket threshold (100%).
pub const MAX_THRESHOLD: u32 = 100_000;

const SEED: u32 = 0;

/// Canonical bytes of a bucketable value, or `None` for booleans.
fn value_bytes(value: &ContextValue) -> Option<Vec<u8>> {
    match value {
        ContextValue::String(s) => Some(s.as_bytes().to_vec()),
        ContextValue::Int(n) => Some(n.to_be_bytes().to_vec()),
        ContextValue::Double(n) => Some(n.to_be_bytes().to_vec()),
        ContextValue::Bool(_) => None,
    }
}

/// The raw hash for one bucketing decision.
#[must_use]
pub fn bucket_hash(
    namespace: &str,
    config_key: &str,
    context_key: &str,
    value: &ContextValue,
) -> Option<u32> {
    let value = value_bytes(value)?;
    let mut bytes =
        Vec::with_capacity(namespace.len() + config_key.len() + context_key.len() + value.len());
    bytes.extend_from_slice(namespace.as_bytes());
    bytes.extend_from_slice(config_key.as_bytes());
    bytes.extend_from_slice(context_key.as_bytes());
    bytes.extend_from_slice(&value);
    Some(xxh32(&bytes, SEED))
}

/// Whether a hash falls inside `threshold` (inclusive).
#[must_use]
pub fn in_bucket(hash: u32, threshold: u32) -> bool {
    hash % MAX_THRESHOLD <= threshold
}
