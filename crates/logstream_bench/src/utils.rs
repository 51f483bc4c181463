//! Benchmark utilities.

/// Generate deterministic event data of the specified size.
pub fn event_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Number of events of `event_size` bytes that fit in `total` bytes.
pub fn events_in(total: u64, event_size: usize) -> u64 {
    total / event_size as u64
}
