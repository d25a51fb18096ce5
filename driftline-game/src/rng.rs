//! Independent seeded random streams for card draws and drift rolls.
use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

use crate::constants::{STREAM_TAG_DECK, STREAM_TAG_DRIFT};

/// Default stream type used by seeded engines.
pub type StreamRng = CountingRng<ChaCha20Rng>;

/// One generator per concern, so deck draws never shift drift rolls.
#[derive(Debug, Clone)]
pub struct RngStreams<R> {
    pub deck: R,
    pub drift: R,
}

impl<R: RngCore> RngStreams<R> {
    #[must_use]
    pub const fn new(deck: R, drift: R) -> Self {
        Self { deck, drift }
    }
}

impl RngStreams<StreamRng> {
    /// Construct both streams from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            deck: CountingRng::seeded(derive_stream_seed(seed, STREAM_TAG_DECK)),
            drift: CountingRng::seeded(derive_stream_seed(seed, STREAM_TAG_DRIFT)),
        }
    }

    /// Streams seeded from a random user seed, returned alongside it.
    #[must_use]
    pub fn from_entropy() -> (u64, Self) {
        let seed = rand::random::<u64>();
        (seed, Self::from_user_seed(seed))
    }

    /// Total draws across both streams.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.deck.draws().saturating_add(self.drift.draws())
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha20Rng> {
    fn seeded(seed: u64) -> Self {
        Self::new(ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore> CountingRng<R> {
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng, draws: 0 }
    }

    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

/// Replays a fixed cycle of `u64` outputs.
///
/// With `gen_bool`, an output of `0` always succeeds and `u64::MAX` always
/// fails; with `gen_range`, `0` selects the lowest value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedRng {
    values: Vec<u64>,
    cursor: usize,
}

impl ScriptedRng {
    /// # Panics
    ///
    /// Panics if `values` is empty.
    #[must_use]
    pub fn new(values: Vec<u64>) -> Self {
        assert!(!values.is_empty(), "scripted rng needs at least one value");
        Self { values, cursor: 0 }
    }

    /// Stream that repeats one value forever.
    #[must_use]
    pub fn constant(value: u64) -> Self {
        Self::new(vec![value])
    }

    /// Outputs handed out so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.wrapping_add(1);
        value
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}
