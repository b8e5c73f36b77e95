//! Deterministic random number generation.
//!
//! Each consumer gets a named ChaCha stream whose seed is derived from the
//! master seed and the stream name alone, so the sequence a stream produces
//! does not depend on the order in which streams are first touched.

use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RngManager {
    master_seed: u64,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master_seed: seed,
            streams: HashMap::new(),
        }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    pub fn stream(&mut self, name: &str) -> StreamRng<'_> {
        let seed = derive_seed(self.master_seed, name);
        let entry = self
            .streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(seed));
        StreamRng { inner: entry }
    }
}

/// FNV-1a over the stream name, folded into the master seed.
fn derive_seed(master: u64, name: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;
    let mut hash = FNV_OFFSET ^ master;
    for byte in name.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

pub struct StreamRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for StreamRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn same_seed_same_stream_same_sequence() {
        let mut a = RngManager::new(42);
        let mut b = RngManager::new(42);
        let va: f64 = a.stream("agents").gen();
        let vb: f64 = b.stream("agents").gen();
        assert_eq!(va, vb);
    }

    #[test]
    fn different_streams_diverge() {
        let mut manager = RngManager::new(42);
        let va: f64 = manager.stream("agents").gen();
        let vb: f64 = manager.stream("placement").gen();
        assert_ne!(va, vb);
    }

    #[test]
    fn stream_sequence_is_independent_of_first_touch_order() {
        let mut forward = RngManager::new(7);
        let _: u64 = forward.stream("agents").gen();
        let late: u64 = forward.stream("placement").gen();

        let mut reversed = RngManager::new(7);
        let early: u64 = reversed.stream("placement").gen();
        assert_eq!(early, late);
    }

    #[test]
    fn stream_state_persists_between_borrows() {
        let mut manager = RngManager::new(3);
        let first: u64 = manager.stream("agents").gen();
        let second: u64 = manager.stream("agents").gen();
        assert_ne!(first, second);
    }
}
