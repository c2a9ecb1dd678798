//! 31-bit linear-congruential random source for the stochastic opcodes.
//!
//! Park-Miller generator (multiplier 742938285, modulus 2^31 - 1) with
//! Carta's add-the-high-bits reduction, so no division appears on the
//! audio path. Each generator instance owns its seed; new instances are
//! seeded from a process-wide cell that advances under a lock, so
//! instances created back to back never observe the same value.

use std::sync::Mutex;

use lazy_static::lazy_static;

const MULTIPLIER: u64 = 742_938_285;
const SEED_MAX: u32 = 0x7FFF_FFFE;

/// 2^-31, the scale that maps raw 31-bit draws onto the unit interval.
pub(crate) const DV2_31: f64 = 4.656612873077392578125e-10;

lazy_static! {
    static ref GLOBAL_SEED: Mutex<u32> = Mutex::new(15937);
}

/// One step of the generator. Output stays in [1, 2^31 - 2] for any seed
/// in that range.
#[inline]
pub fn rand31(seed: u32) -> u32 {
    let tmp = u64::from(seed) * MULTIPLIER;
    let r = (tmp & 0x7FFF_FFFF) as u32 + (tmp >> 31) as u32;
    (r & 0x7FFF_FFFF) + (r >> 31)
}

/// Advance the process-wide seed and return the new value.
pub fn next_global_seed() -> u32 {
    let mut seed = GLOBAL_SEED.lock().unwrap();
    *seed = rand31(*seed);
    *seed
}

/// Reseed the process-wide cell, clamped into the generator's range.
/// Intended for tests and reproducible offline renders.
pub fn set_global_seed(seed: u32) {
    *GLOBAL_SEED.lock().unwrap() = seed.clamp(1, SEED_MAX);
}

/// Map a raw draw onto [-1, 1): double it, recentre around zero.
#[inline]
pub(crate) fn bipolar(raw: u32) -> f64 {
    f64::from(((raw << 1) as i32).wrapping_sub(0x7FFF_FFFF)) * DV2_31
}

/// Map a raw draw onto [0, 1).
#[inline]
pub(crate) fn unipolar(raw: u32) -> f64 {
    f64::from(raw) * DV2_31
}

/// Per-instance generator state.
#[derive(Debug, Clone, Copy)]
pub struct Rand31 {
    seed: u32,
}

impl Rand31 {
    /// Seed from the process-wide cell.
    pub fn from_global() -> Self {
        Self {
            seed: next_global_seed(),
        }
    }

    /// Explicit seed, clamped into the generator's nonzero range.
    pub fn with_seed(seed: u32) -> Self {
        Self {
            seed: seed.clamp(1, SEED_MAX),
        }
    }

    /// Next raw 31-bit draw.
    #[inline]
    pub fn next_raw(&mut self) -> u32 {
        self.seed = rand31(self.seed);
        self.seed
    }

    /// Next draw mapped onto [-1, 1).
    #[inline]
    pub fn next_bipolar(&mut self) -> f64 {
        bipolar(self.next_raw())
    }

    /// Next draw mapped onto [0, 1).
    #[inline]
    pub fn next_unipolar(&mut self) -> f64 {
        unipolar(self.next_raw())
    }
}

impl Default for Rand31 {
    fn default() -> Self {
        Self::with_seed(1)
    }
}
