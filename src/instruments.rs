//! Named-instrument registry and the numbering pass.
//!
//! While an orchestra compiles, instruments register here by name (and
//! numbered instruments claim their slots). After the last registration the
//! compiler runs [`NamedInstrTable::assign_numbers`] exactly once, which
//! consolidates everything into a dense by-number array the scheduler and
//! the resolver read for the rest of the performance.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::opcodes::OpcodeIndex;

/// Instrument number. Zero is reserved; real numbers start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsNo(pub u32);

impl std::fmt::Display for InsNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A compiled instrument definition. The compiler owns it; the table and
/// the by-number array only share it.
#[derive(Debug, Default)]
pub struct InstrDef {
    /// Opcode indices in evaluation order.
    pub body: Vec<OpcodeIndex>,
}

/// Is `s` a valid instrument or opcode name?
///
/// Non-empty; a name starting with a digit must be all digits (a pure
/// instrument number); otherwise every byte must be ASCII alphanumeric
/// or `_`. So `"1"` is valid while `"1abc"` is not.
pub fn check_name(s: &str) -> bool {
    let bytes = s.as_bytes();
    let Some(&first) = bytes.first() else {
        return false;
    };
    if first.is_ascii_digit() {
        return bytes.iter().all(u8::is_ascii_digit);
    }
    bytes
        .iter()
        .all(|&b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Registration failures. The `name` field hands ownership of the string
/// back to the caller when insertion did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocError {
    #[error("invalid instrument name {name:?}")]
    InvalidName { name: String },

    #[error("instrument {name:?} is already defined")]
    Duplicate { name: String },

    #[error("instrument number {number} is already taken")]
    DuplicateNumber { number: InsNo },

    #[error("instrument number 0 is reserved")]
    ReservedNumber,
}

/// Numbering-pass failures. Nothing is assigned when the pass fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumberingError {
    #[error("instrument numbers were already assigned for this compilation")]
    AlreadyAssigned,

    #[error("instruments {first:?} and {second:?} are both pinned to number {number}")]
    PinConflict {
        number: InsNo,
        first: String,
        second: String,
    },

    #[error("instrument {name:?} is pinned to number {number}, which is already taken")]
    NumberTaken { number: InsNo, name: String },
}

#[derive(Debug)]
struct Entry {
    name: String,
    def: Arc<InstrDef>,
    pin: Option<InsNo>,
    assigned: Option<InsNo>,
}

/// Name-indexed instrument registry for one compilation.
#[derive(Debug, Default)]
pub struct NamedInstrTable {
    entries: Vec<Entry>,
    by_name: HashMap<String, usize>,
    by_number: Vec<Option<Arc<InstrDef>>>,
    max_numbered: u32,
    numbered: bool,
}

impl NamedInstrTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` -> `def`. Ownership of `name` transfers to the
    /// table on success; on failure the error carries it back and the
    /// table is untouched.
    ///
    /// `pin`, when set, requests that exact number during the numbering
    /// pass. A conflict between two pins surfaces there, not here.
    pub fn allocate(
        &mut self,
        name: String,
        def: Arc<InstrDef>,
        pin: Option<InsNo>,
    ) -> Result<(), AllocError> {
        if !check_name(&name) {
            return Err(AllocError::InvalidName { name });
        }
        if self.by_name.contains_key(&name) {
            return Err(AllocError::Duplicate { name });
        }
        let pin = pin.filter(|p| p.0 != 0);
        let slot = self.entries.len();
        self.by_name.insert(name.clone(), slot);
        self.entries.push(Entry {
            name,
            def,
            pin,
            assigned: None,
        });
        Ok(())
    }

    /// Claim a slot for an explicitly numbered (non-named) instrument.
    pub fn register_numbered(
        &mut self,
        number: InsNo,
        def: Arc<InstrDef>,
    ) -> Result<(), AllocError> {
        if number.0 == 0 {
            return Err(AllocError::ReservedNumber);
        }
        let idx = number.0 as usize;
        if self.by_number.len() <= idx {
            self.by_number.resize(idx + 1, None);
        }
        if self.by_number[idx].is_some() {
            return Err(AllocError::DuplicateNumber { number });
        }
        self.by_number[idx] = Some(def);
        self.max_numbered = self.max_numbered.max(number.0);
        Ok(())
    }

    /// Number lookup for a named instrument. `None` before the numbering
    /// pass has run, or for names never registered.
    pub fn find(&self, name: &str) -> Option<InsNo> {
        self.by_name
            .get(name)
            .and_then(|&slot| self.entries[slot].assigned)
    }

    /// Definition lookup by name, valid as soon as the name is allocated.
    pub fn def_by_name(&self, name: &str) -> Option<&Arc<InstrDef>> {
        self.by_name.get(name).map(|&slot| &self.entries[slot].def)
    }

    /// Definition lookup by number, valid once numbers are assigned (or,
    /// for numbered instruments, once registered).
    pub fn by_number(&self, number: InsNo) -> Option<&Arc<InstrDef>> {
        self.by_number
            .get(number.0 as usize)
            .and_then(|slot| slot.as_ref())
    }

    /// Has the numbering pass run?
    pub fn is_numbered(&self) -> bool {
        self.numbered
    }

    /// Number of named entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The one-time numbering pass.
    ///
    /// Pinned entries take their pinned numbers exactly; the rest get
    /// consecutive numbers after the highest explicitly numbered
    /// instrument, in registration order, skipping any slot a pin already
    /// claimed. Runs once per compilation; a second call without an
    /// intervening [`reset`](Self::reset) fails loudly.
    pub fn assign_numbers(&mut self) -> Result<&[Option<Arc<InstrDef>>], NumberingError> {
        if self.numbered {
            return Err(NumberingError::AlreadyAssigned);
        }

        let mut claimed: HashMap<u32, usize> = HashMap::new();
        for (slot, entry) in self.entries.iter().enumerate() {
            let Some(pin) = entry.pin else { continue };
            if let Some(&prev) = claimed.get(&pin.0) {
                return Err(NumberingError::PinConflict {
                    number: pin,
                    first: self.entries[prev].name.clone(),
                    second: entry.name.clone(),
                });
            }
            if self.slot_taken(pin) {
                return Err(NumberingError::NumberTaken {
                    number: pin,
                    name: entry.name.clone(),
                });
            }
            claimed.insert(pin.0, slot);
        }

        let mut next = self.max_numbered;
        for slot in 0..self.entries.len() {
            let number = match self.entries[slot].pin {
                Some(pin) => pin,
                None => loop {
                    next += 1;
                    if !claimed.contains_key(&next) && !self.slot_taken(InsNo(next)) {
                        break InsNo(next);
                    }
                },
            };
            let idx = number.0 as usize;
            if self.by_number.len() <= idx {
                self.by_number.resize(idx + 1, None);
            }
            self.by_number[idx] = Some(self.entries[slot].def.clone());
            self.entries[slot].assigned = Some(number);
            debug!(name = %self.entries[slot].name, number = number.0, "assigned instrument number");
        }

        self.numbered = true;
        Ok(&self.by_number)
    }

    fn slot_taken(&self, number: InsNo) -> bool {
        self.by_number
            .get(number.0 as usize)
            .is_some_and(|slot| slot.is_some())
    }

    /// Release every entry and owned name, back to the just-created
    /// state. Safe whether or not numbering ran.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.by_name.clear();
        self.by_number.clear();
        self.max_numbered = 0;
        self.numbered = false;
    }
}
