//! Compile-time and performance-time name/number resolution.
//!
//! Opcodes hand the runtime either a string or a number when they refer
//! to an instrument (or another opcode). Resolution turns that argument
//! into a numeric handle, or a typed failure tagged with the phase the
//! caller is in, so a failed init aborts one note rather than the whole
//! performance. Every failure also emits a `tracing` diagnostic at the
//! matching phase.

use thiserror::Error;
use tracing::warn;

use crate::instruments::InsNo;
use crate::opcodes::OpcodeIndex;
use crate::session::Session;

/// Engine phase a resolution runs in. Failures carry it so diagnostics
/// land in the right place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Note initialization, before any audio for the note renders.
    Init,
    /// Active rendering.
    Perf,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Init => f.write_str("init"),
            Phase::Perf => f.write_str("perf"),
        }
    }
}

/// Numeric value marking a p-field that was written as a string in the
/// score. A number compares equal to this when the event's string
/// argument should be used instead.
pub const STRING_ARG_CODE: f64 = 3945467.0;

/// Does `v` carry the string-argument sentinel?
#[inline]
pub fn is_string_code(v: f64) -> bool {
    v == STRING_ARG_CODE
}

/// An opcode argument as the dispatcher sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreArg<'a> {
    Str(&'a str),
    Num(f64),
}

/// Result of a combined opcode-or-instrument search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeOrInstr {
    Opcode(OpcodeIndex),
    Instrument(InsNo),
}

/// Typed resolution failure, replacing the classic -1 sentinel. The
/// caller aborts only its own instantiation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("{phase}: instrument {name:?} not found")]
    UnknownInstrument { phase: Phase, name: String },

    #[error("{phase}: instrument number {number} is not defined")]
    UnknownNumber { phase: Phase, number: i64 },

    #[error("{phase}: opcode {name:?} not found")]
    UnknownOpcode { phase: Phase, name: String },

    #[error("{phase}: a numeric reference cannot name an opcode")]
    NumericOpcodeRef { phase: Phase },

    #[error("{phase}: string argument expected but the event carries none")]
    MissingEventString { phase: Phase },
}

impl ResolveError {
    /// The phase the failing resolution ran in.
    pub fn phase(&self) -> Phase {
        match self {
            ResolveError::UnknownInstrument { phase, .. }
            | ResolveError::UnknownNumber { phase, .. }
            | ResolveError::UnknownOpcode { phase, .. }
            | ResolveError::NumericOpcodeRef { phase }
            | ResolveError::MissingEventString { phase } => *phase,
        }
    }
}

impl Session {
    /// Compile-time instrument resolution: numbered or named references.
    ///
    /// A numeric argument carrying the string sentinel resolves through
    /// the current event's string p-field; any other number must
    /// (truncated toward zero) address a live slot in the by-number
    /// array.
    pub fn resolve_instrument(&self, arg: ScoreArg<'_>) -> Result<InsNo, ResolveError> {
        match arg {
            ScoreArg::Str(name) => self.lookup_named(name, Phase::Init),
            ScoreArg::Num(v) if is_string_code(v) => {
                let name = self.require_event_string(Phase::Init)?;
                self.lookup_named(name, Phase::Init)
            }
            ScoreArg::Num(v) => self.lookup_number(v, Phase::Init),
        }
    }

    /// Performance-time instrument resolution: named instruments only.
    /// Used by constructs that stay live while audio renders, where
    /// spawning an instrument by bare number is not meaningful.
    pub fn resolve_instrument_perf(&self, name: &str) -> Result<InsNo, ResolveError> {
        self.lookup_named(name, Phase::Perf)
    }

    /// Compile-time resolution over opcodes as well as instruments.
    /// Instrument names win when both tables hold the name; with
    /// `opcodes_only`, instruments are not considered at all.
    pub fn resolve_opcode_or_instrument(
        &self,
        arg: ScoreArg<'_>,
        opcodes_only: bool,
    ) -> Result<OpcodeOrInstr, ResolveError> {
        let name = match arg {
            ScoreArg::Str(name) => name,
            ScoreArg::Num(v) if is_string_code(v) => self.require_event_string(Phase::Init)?,
            ScoreArg::Num(v) => {
                if opcodes_only {
                    warn!(phase = %Phase::Init, value = v, "numeric reference in opcode-only lookup");
                    return Err(ResolveError::NumericOpcodeRef { phase: Phase::Init });
                }
                return self.lookup_number(v, Phase::Init).map(OpcodeOrInstr::Instrument);
            }
        };
        if !opcodes_only {
            if let Some(insno) = self.instruments.find(name) {
                return Ok(OpcodeOrInstr::Instrument(insno));
            }
        }
        if let Some(idx) = self.opcodes.find(name) {
            return Ok(OpcodeOrInstr::Opcode(idx));
        }
        warn!(phase = %Phase::Init, name, "opcode not found");
        Err(ResolveError::UnknownOpcode {
            phase: Phase::Init,
            name: name.to_owned(),
        })
    }

    /// Build a file name from an opcode argument.
    ///
    /// A string argument is the file name verbatim. A number carrying the
    /// string sentinel uses the event's string p-field; a number that,
    /// rounded to nearest, addresses a stored string constant uses that;
    /// anything else synthesizes `base_name` followed by the rounded
    /// integer (base `"soundin."` and 3 give `"soundin.3"`).
    pub fn derive_file_name(
        &self,
        arg: ScoreArg<'_>,
        base_name: &str,
    ) -> Result<String, ResolveError> {
        match arg {
            ScoreArg::Str(s) => Ok(s.to_owned()),
            ScoreArg::Num(v) if is_string_code(v) => {
                self.require_event_string(Phase::Init).map(str::to_owned)
            }
            ScoreArg::Num(v) => {
                let n = v.round() as i64;
                if n >= 0 {
                    if let Some(s) = self.strset(n as u32) {
                        return Ok(s.to_owned());
                    }
                }
                Ok(format!("{base_name}{n}"))
            }
        }
    }

    fn lookup_named(&self, name: &str, phase: Phase) -> Result<InsNo, ResolveError> {
        self.instruments.find(name).ok_or_else(|| {
            warn!(phase = %phase, name, "instrument not found");
            ResolveError::UnknownInstrument {
                phase,
                name: name.to_owned(),
            }
        })
    }

    fn lookup_number(&self, v: f64, phase: Phase) -> Result<InsNo, ResolveError> {
        let number = v as i64;
        if number > 0 && number <= u32::MAX as i64 {
            let insno = InsNo(number as u32);
            if self.instruments.by_number(insno).is_some() {
                return Ok(insno);
            }
        }
        warn!(phase = %phase, number, "instrument number not defined");
        Err(ResolveError::UnknownNumber { phase, number })
    }

    fn require_event_string(&self, phase: Phase) -> Result<&str, ResolveError> {
        self.event_string().ok_or_else(|| {
            warn!(phase = %phase, "string argument expected but the event carries none");
            ResolveError::MissingEventString { phase }
        })
    }
}
