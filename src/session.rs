//! Compilation-session state.
//!
//! One [`Session`] owns everything a single orchestra compilation builds:
//! the string-intern table, the opcode registry, the named-instrument
//! table, the string-constant (`strset`) slots, and the string p-field of
//! the score event currently being dispatched. Compilation fills it
//! single-threaded; once numbering has run, performance-time code only
//! reads it. Recompiling calls [`reset`](Session::reset), which releases
//! everything compilation-scoped while the opcode registry, built once
//! from the built-in list, persists for the process.

use tracing::debug;

use crate::instruments::NamedInstrTable;
use crate::intern::{StringInterner, Symbol};
use crate::opcodes::OpcodeTable;

#[derive(Debug)]
pub struct Session {
    pub strings: StringInterner,
    pub opcodes: OpcodeTable,
    pub instruments: NamedInstrTable,
    strset: Vec<Option<Symbol>>,
    event_string: Option<String>,
}

impl Session {
    /// A fresh session with the opcode registry seeded from builtins.
    pub fn new() -> Self {
        Self {
            strings: StringInterner::new(),
            opcodes: OpcodeTable::from_builtins(),
            instruments: NamedInstrTable::new(),
            strset: Vec::new(),
            event_string: None,
        }
    }

    /// Release all compilation-scoped state, keeping the opcode registry
    /// (including any user-defined entries added so far).
    pub fn reset(&mut self) {
        self.strings.clear();
        self.instruments.reset();
        self.strset.clear();
        self.event_string = None;
        debug!("session reset");
    }

    /// Store a string constant at `index`, as the `strset` facility does.
    pub fn set_strset(&mut self, index: u32, s: &str) {
        let sym = self.strings.intern(s);
        let idx = index as usize;
        if self.strset.len() <= idx {
            self.strset.resize(idx + 1, None);
        }
        self.strset[idx] = Some(sym);
    }

    /// The string constant at `index`, if one was stored.
    pub fn strset(&self, index: u32) -> Option<&str> {
        self.strset
            .get(index as usize)
            .copied()
            .flatten()
            .and_then(|sym| self.strings.try_resolve(sym))
    }

    /// Install (or clear) the string p-field of the score event being
    /// dispatched; read by resolution when a numeric argument carries the
    /// string sentinel.
    pub fn set_event_string(&mut self, s: Option<String>) {
        self.event_string = s;
    }

    pub fn event_string(&self) -> Option<&str> {
        self.event_string.as_deref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
