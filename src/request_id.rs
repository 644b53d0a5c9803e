//! Process-wide request-id allocation.
//!
//! One atomic counter serves every session in the process. It is seeded once
//! from the OS random source so consecutive process runs do not collide in
//! agent-side duplicate caches, then incremented modulo 2^31 per request.
//! Issued ids are never negative and never zero.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicI32, Ordering};

static COUNTER: OnceLock<AtomicI32> = OnceLock::new();

/// Allocate the next request id.
pub(crate) fn next_request_id() -> i32 {
    let counter = COUNTER.get_or_init(|| {
        let mut seed = [0u8; 4];
        getrandom::fill(&mut seed).expect("OS random source unavailable");
        AtomicI32::new(i32::from_be_bytes(seed) & 0x7FFF_FFFF)
    });

    loop {
        let id = counter.fetch_add(1, Ordering::Relaxed) & 0x7FFF_FFFF;
        if id != 0 {
            return id;
        }
    }
}
