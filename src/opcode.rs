//! Execution contract for signal-generating units.

use thiserror::Error;

use crate::Sample;

/// Fixed execution parameters for one performance: the scheduler drives
/// every opcode with the same sample rate and block length.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfContext {
    /// Samples per second.
    pub sample_rate: f64,
    /// Samples per processing block.
    pub block_size: usize,
}

impl PerfContext {
    pub fn new(sample_rate: f64, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }

    /// Seconds per sample.
    #[inline]
    pub fn sample_dur(&self) -> f64 {
        1.0 / self.sample_rate
    }
}

/// Errors an opcode instance can report. Parameter problems never land
/// here; the contract requires those to be clamped at init.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OpcodeError {
    #[error("output buffer holds {got} samples, expected block size {want}")]
    BlockSizeMismatch { want: usize, got: usize },

    #[error("process_block called before init")]
    NotInitialized,
}

/// Two-phase contract for one opcode instance.
///
/// The scheduler calls [`init`](Opcode::init) once when the note begins,
/// then [`process_block`](Opcode::process_block) once per audio block for
/// the note's lifetime, and [`deinit`](Opcode::deinit) when it ends.
///
/// `init` must validate and clamp parameters onto instance-owned state
/// (never writing back through caller-visible inputs) and allocate any
/// scratch memory; it assumes no prior state. `process_block` must be
/// deterministic given instance state and current parameter values, write
/// exactly one sample per slot of `out`, and leave the state consistent
/// for the next call. Range clamping and wraparound happen inside
/// `process_block`, never deferred to the caller.
pub trait Opcode: Send {
    fn init(&mut self, ctx: &PerfContext) -> Result<(), OpcodeError>;

    fn process_block(&mut self, ctx: &PerfContext, out: &mut [Sample]) -> Result<(), OpcodeError>;

    /// Optional teardown; default is a no-op.
    fn deinit(&mut self, _ctx: &PerfContext) -> Result<(), OpcodeError> {
        Ok(())
    }
}
