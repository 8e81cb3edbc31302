//! Property-based test generators using proptest.
//!
//! Keys are built from short lowercase segments joined with `/`, so
//! generated namespaces nest a few levels deep without hitting any
//! backend's key validation.

use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for a single key segment.
pub fn segment_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{1,6}").expect("Invalid regex")
}

/// Strategy for a leaf key of one to four segments.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..=4).prop_map(|segments| segments.join("/"))
}

/// Strategy for an entry value.
pub fn value_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..64)
}

/// Strategy for a whole namespace of up to `max_keys` entries.
pub fn namespace_strategy(max_keys: usize) -> impl Strategy<Value = BTreeMap<String, Vec<u8>>> {
    prop::collection::btree_map(key_strategy(), value_strategy(), 0..=max_keys)
}

/// Strategy for a `(queue_size, workers)` pair.
pub fn sizing_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=16, 1usize..=8)
}
