//! Name-indexed registry of opcode descriptors.
//!
//! Seeded once per process from the static built-in list, extensible with
//! user-defined entries. Indices handed out by the table are stable for
//! its whole lifetime: redefinition swaps the descriptor in place, so
//! opcode indices already embedded in compiled instruments stay valid.

use std::borrow::Cow;
use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;
use tracing::debug;

use crate::gendy::{Gendy, Gendyx};
use crate::instruments::check_name;
use crate::opcode::Opcode;

/// Builds a fresh, uninitialized instance of the opcode. The instance
/// carries both phases of the execution contract.
pub type OpcodeFactory = fn() -> Box<dyn Opcode>;

/// Index of a descriptor in an [`OpcodeTable`]. Stable across
/// redefinition; dies with the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpcodeIndex(pub usize);

/// One registered opcode: name, type signatures, and the factory standing
/// in for the init/perf handler pair.
#[derive(Debug, Clone)]
pub struct OpcodeDescriptor {
    pub name: Cow<'static, str>,
    /// Output argument type signature, e.g. `"a"`.
    pub out_types: Cow<'static, str>,
    /// Input argument type signature, e.g. `"kkkkkkkkkoO"`.
    pub in_types: Cow<'static, str>,
    /// Reserved dispatch flags.
    pub flags: u32,
    pub factory: OpcodeFactory,
}

lazy_static! {
    /// The static built-in list every table starts from.
    pub static ref BUILTIN_OPCODES: Vec<OpcodeDescriptor> = vec![
        OpcodeDescriptor {
            name: Cow::Borrowed("gendy"),
            out_types: Cow::Borrowed("a"),
            in_types: Cow::Borrowed("kkkkkkkkkoO"),
            flags: 0,
            factory: || Box::new(Gendy::default()),
        },
        OpcodeDescriptor {
            name: Cow::Borrowed("gendyx"),
            out_types: Cow::Borrowed("a"),
            in_types: Cow::Borrowed("kkkkkkkkkkkoO"),
            flags: 0,
            factory: || Box::new(Gendyx::default()),
        },
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpcodeTableError {
    #[error("invalid opcode name {name:?}")]
    InvalidName { name: String },

    #[error("opcode {name:?} is already defined")]
    Duplicate { name: String },
}

/// Name-indexed opcode registry with sub-linear lookup.
#[derive(Debug, Default)]
pub struct OpcodeTable {
    entries: Vec<OpcodeDescriptor>,
    by_name: HashMap<String, OpcodeIndex>,
}

impl OpcodeTable {
    /// An empty table. Most callers want [`from_builtins`](Self::from_builtins).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Populate from the static built-in list.
    pub fn from_builtins() -> Self {
        Self::from_descriptors(BUILTIN_OPCODES.iter().cloned())
    }

    /// Populate from an arbitrary descriptor list. Later duplicates of a
    /// name replace earlier ones, as a redefinition would.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = OpcodeDescriptor>) -> Self {
        let mut table = Self::empty();
        for desc in descriptors {
            match table.add_entry(desc, true) {
                Ok(_) => {}
                Err(err) => debug!(%err, "skipping malformed descriptor"),
            }
        }
        table
    }

    /// Insert a descriptor.
    ///
    /// If the name is already present and `allow_redefinition` is false,
    /// fails without mutating the table. If true, the old descriptor is
    /// replaced in place and the existing index stays valid.
    pub fn add_entry(
        &mut self,
        desc: OpcodeDescriptor,
        allow_redefinition: bool,
    ) -> Result<OpcodeIndex, OpcodeTableError> {
        if !check_name(&desc.name) {
            return Err(OpcodeTableError::InvalidName {
                name: desc.name.into_owned(),
            });
        }
        if let Some(&idx) = self.by_name.get(desc.name.as_ref()) {
            if !allow_redefinition {
                return Err(OpcodeTableError::Duplicate {
                    name: desc.name.into_owned(),
                });
            }
            debug!(name = %desc.name, index = idx.0, "redefining opcode");
            self.entries[idx.0] = desc;
            return Ok(idx);
        }
        let idx = OpcodeIndex(self.entries.len());
        self.by_name.insert(desc.name.to_string(), idx);
        self.entries.push(desc);
        Ok(idx)
    }

    /// Hashed name lookup.
    pub fn find(&self, name: &str) -> Option<OpcodeIndex> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, idx: OpcodeIndex) -> Option<&OpcodeDescriptor> {
        self.entries.get(idx.0)
    }

    /// Build a fresh instance of the opcode at `idx`.
    pub fn instantiate(&self, idx: OpcodeIndex) -> Option<Box<dyn Opcode>> {
        self.get(idx).map(|desc| (desc.factory)())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
