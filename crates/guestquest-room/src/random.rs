//! Injectable randomness.
//!
//! Every room owns a [`GameRng`] and deals and draws with `rand`'s slice
//! helpers (`shuffle`, `choose`, `choose_multiple`) on it. The server
//! seeds from the operating system; tests pass a fixed seed so a run is
//! reproducible.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// The generator a room shuffles and draws with.
pub type GameRng = Box<dyn RngCore + Send>;

/// A generator seeded from the operating system.
pub fn os_rng() -> GameRng {
    Box::new(StdRng::from_os_rng())
}

/// A reproducible generator for a given seed.
pub fn seeded_rng(seed: u64) -> GameRng {
    Box::new(StdRng::seed_from_u64(seed))
}
