//! Performance-time core of an audio synthesis runtime.
//!
//! Two halves: the name-resolution subsystem that binds textual instrument
//! and opcode names to numeric handles (built while compiling an orchestra,
//! queried while audio renders), and the init/process-block contract every
//! signal-generating unit satisfies, exercised here by the `gendy` family
//! of dynamic stochastic generators.
//!
//! The orchestra parser, the block scheduler, and the wider opcode library
//! are external collaborators: the parser fills a [`Session`] and runs the
//! numbering pass, the scheduler resolves references through it and drives
//! [`Opcode`] instances one block at a time.

pub mod gendy;
pub mod instruments;
pub mod intern;
pub mod opcode;
pub mod opcodes;
pub mod random;
pub mod resolver;
pub mod session;

/// Audio sample type. The engine runs double-width throughout.
pub type Sample = f64;

pub use crate::instruments::{check_name, InsNo, InstrDef, NamedInstrTable};
pub use crate::intern::{StringInterner, Symbol};
pub use crate::opcode::{Opcode, OpcodeError, PerfContext};
pub use crate::opcodes::{OpcodeDescriptor, OpcodeIndex, OpcodeTable};
pub use crate::resolver::{OpcodeOrInstr, Phase, ResolveError, ScoreArg};
pub use crate::session::Session;
