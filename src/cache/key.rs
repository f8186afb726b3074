//! Deterministic cache keys for generated content.
//!
//! The key covers the tenant, a normalised subject, the attributes and the explicit
//! preferences. Destination and ranking criteria are excluded: they change where and
//! how content is delivered, not what gets generated.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::models::WorkItem;

/// Hex-encoded SHA-256 key for an item's Generate stage
pub fn generation_cache_key(item: &WorkItem) -> String {
    let mut hasher = Sha256::new();
    feed(&mut hasher, "tenant", &item.tenant_id);
    feed(&mut hasher, "subject", &normalize(&item.payload.subject));
    feed_map(&mut hasher, "attribute", &item.payload.attributes);
    feed_map(&mut hasher, "preference", &item.payload.preferences);
    hex::encode(hasher.finalize())
}

/// Trim, lowercase and collapse internal whitespace
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

// BTreeMap iteration is sorted, so insertion order never affects the key
fn feed_map(hasher: &mut Sha256, label: &str, map: &BTreeMap<String, String>) {
    for (key, value) in map {
        feed(hasher, label, &normalize(key));
        feed(hasher, label, &normalize(value));
    }
}

// Length-prefixed so adjacent fields cannot run together
fn feed(hasher: &mut Sha256, label: &str, value: &str) {
    hasher.update(label.as_bytes());
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
