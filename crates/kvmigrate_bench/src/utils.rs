//! Benchmark utilities.

use kvmigrate_storage::InMemoryBackend;

/// Generate deterministic entry data of the specified size.
pub fn payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Build a source store with `count` entries of `payload_size` bytes,
/// spread over `fanout` top-level namespaces.
pub fn populated_source(count: usize, fanout: usize, payload_size: usize) -> InMemoryBackend {
    let fanout = fanout.max(1);
    let data = payload(payload_size);
    InMemoryBackend::with_entries(
        (0..count).map(|i| (format!("ns{}/key{i:06}", i % fanout), data.clone())),
    )
}
