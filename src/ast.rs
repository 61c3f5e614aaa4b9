//! # Abstract syntax and machine data model
//!
//! This module defines the expression AST (`IntExp`, `LocationExp`,
//! `ArithExp`), the TCAM program shape (`Pattern`, `Rule`, `Table`, `Tcam`),
//! and the mutable machine state (`DataStore`, `MachineState`) described in
//! the data model section of the specification. Everything here is a
//! tagged, structurally-equatable, structurally-hashable value type — the
//! loaders (`ir`, `config`) build these, and the evaluator walks them.

use std::collections::HashMap;
use std::fmt;

use crate::bitvector::BitVector;
use crate::error::{Result, TcamError};
use crate::sizedint::SizedInt;

/// Reserved region name for the input packet: immutable, read-only, not a
/// `DataStore`.
pub const PACKET: &str = "packet";

/// A bit range `[start, end]` (inclusive) within a named region, with
/// concrete integer bounds.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    pub name: String,
    pub start: u64,
    pub end: u64,
}

impl Location {
    /// Construct a `Location`, failing if `start > end`.
    pub fn new(name: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        let name = name.into();
        if start > end {
            return Err(TcamError::runtime(format!(
                "location {}[{}:{}] has start position later than end position",
                name, start, end
            )));
        }
        Ok(Location { name, start, end })
    }

    /// `end - start + 1`.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// An unresolved `Location` whose bounds are expressions, evaluated against
/// the current machine state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocationExp {
    pub name: String,
    pub start: Box<IntExp>,
    pub end: Box<IntExp>,
}

impl LocationExp {
    pub fn new(name: impl Into<String>, start: IntExp, end: IntExp) -> Self {
        LocationExp {
            name: name.into(),
            start: Box::new(start),
            end: Box::new(end),
        }
    }
}

/// The arithmetic operators supported by the expression grammar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Plus,
    Minus,
    LShift,
    RShift,
    /// A unary width cast. `left` abusively holds an `IntExp` whose constant
    /// value is the target width; `right` is the expression being cast.
    Cast,
}

/// A binary (or, for `Cast`, pseudo-unary) arithmetic expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArithExp {
    pub op: ArithOp,
    pub left: Box<IntExp>,
    pub right: Box<IntExp>,
}

/// An integer-valued expression: a constant, a location read, or an
/// arithmetic operation over further `IntExp`s.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntExp {
    Const(SizedInt),
    Location(LocationExp),
    Arith(ArithExp),
}

impl IntExp {
    pub fn arith(op: ArithOp, left: IntExp, right: IntExp) -> IntExp {
        IntExp::Arith(ArithExp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

/// One of the three generic TCAM actions and its arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    MoveCursor(IntExp),
    CopyData { src: IntExp, dst: LocationExp },
    ExtractHeader { id: String, loc: LocationExp },
}

/// A ternary match pattern: a `(value, mask)` pair of equal-length
/// `BitVector`s. Matches a key `k` iff `k & mask == value & mask`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    pub value: BitVector,
    pub mask: BitVector,
}

impl Pattern {
    pub fn new(value: BitVector, mask: BitVector) -> Result<Self> {
        if value.length() != mask.length() {
            return Err(TcamError::parse(format!(
                "pattern value/mask length mismatch: {} vs {}",
                value.length(),
                mask.length()
            )));
        }
        Ok(Pattern { value, mask })
    }

    /// Whether this pattern matches `key`. `key` must have the same length
    /// as the pattern.
    pub fn matches(&self, key: &BitVector) -> Result<bool> {
        let masked_key = key.and(&self.mask)?;
        let masked_value = self.value.and(&self.mask)?;
        Ok(masked_key == masked_value)
    }
}

/// An ordered list of patterns (one per key) plus the de-duplicated set of
/// actions to apply when all patterns match. The action "set" is
/// represented as a `Vec` with structural-equality de-duplication applied at
/// load time (see `ir::parse_rule`); order beyond that is not semantically
/// significant (§5 of the specification).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub patterns: Vec<Pattern>,
    pub actions: Vec<Action>,
}

/// An ordered list of rules; first match wins.
pub type Table = Vec<Rule>;

/// An ordered list of tables, indexed by stage number.
pub type Tcam = Vec<Table>;

/// A mutable bit-addressable store, generalizing a hardware register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataStore {
    pub value: BitVector,
    pub read: bool,
    pub write: bool,
    pub persistent: bool,
    pub masked_writes: bool,
}

impl DataStore {
    /// A zeroed store of the given width with the given access flags.
    pub fn new_zeroed(width: usize, read: bool, write: bool, persistent: bool, masked_writes: bool) -> Self {
        DataStore {
            value: BitVector::new_zeroed(width),
            read,
            write,
            persistent,
            masked_writes,
        }
    }
}

/// The mutable state of the abstract machine: cursor position, current
/// stage, data stores, TCAM match keys, and extracted headers.
///
/// `headers` preserves insertion order (observable per the specification),
/// implemented as a `Vec` of pairs rather than a `HashMap`; the number of
/// headers extracted in a single run is small, so a linear scan on lookup
/// is not a concern.
#[derive(Clone, Debug)]
pub struct MachineState {
    pub cursor: u64,
    pub stage: usize,
    pub stores: HashMap<String, DataStore>,
    pub keys: Vec<Location>,
    headers: Vec<(String, BitVector)>,
}

impl MachineState {
    pub fn new(stores: HashMap<String, DataStore>, keys: Vec<Location>) -> Self {
        MachineState {
            cursor: 0,
            stage: 0,
            stores,
            keys,
            headers: Vec::new(),
        }
    }

    /// Whether a header with this name has already been extracted.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n == name)
    }

    /// Extract-once insertion: fails if `name` was already extracted.
    pub fn insert_header(&mut self, name: String, value: BitVector) -> Result<()> {
        if self.has_header(&name) {
            return Err(TcamError::runtime(format!(
                "header '{}' was already extracted",
                name
            )));
        }
        self.headers.push((name, value));
        Ok(())
    }

    /// Headers in extraction order.
    pub fn headers(&self) -> &[(String, BitVector)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&BitVector> {
        self.headers.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "cursor: {}", self.cursor)?;
        writeln!(f, "stage: {}", self.stage)?;
        writeln!(f, "headers:")?;
        for (name, value) in &self.headers {
            writeln!(f, "  {}: {}", name, value.to_hex())?;
        }
        writeln!(f, "stores:")?;
        let mut names: Vec<&String> = self.stores.keys().collect();
        names.sort();
        for name in names {
            let store = &self.stores[name];
            if store.persistent {
                writeln!(f, "  {}: {}", name, store.value.to_hex())?;
            }
        }
        Ok(())
    }
}
