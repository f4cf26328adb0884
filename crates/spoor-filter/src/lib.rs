//! CNF event-filter compiler and decompiler.
//!
//! A filter is a conjunction of clauses; a clause is a disjunction of
//! terms; a term tests one field for (in)equality with one value string.
//! [`compile`] lowers that description to the flat `u64` array the query
//! side consumes; [`decompile`] lifts the array back.
//!
//! # Wire layout
//!
//! The array is the concatenation of clause frames. Each frame starts
//! with the number of words that follow in the frame (two per term), then
//! `(flag, item)` pairs:
//!
//! - `item != 0` — a real term; `flag` 0 means equal, 1 means not-equal.
//! - `item == 0` — a literal clause member; `flag` 1 means TRUE, 0 FALSE.
//!
//! Note the flag's double duty: `1` is the *negative* op on a real item
//! but the *true* literal. That asymmetry is inherited wire contract and
//! is preserved bit-exact; see `literal_folding_quirk` in the tests.

use serde::{Deserialize, Serialize};
use spoor_error::{Result, SpoorError};
use spoor_storage::StoreReader;
use spoor_types::Item;

// ---------------------------------------------------------------------------
// Filter description
// ---------------------------------------------------------------------------

/// Comparison operator of a term.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    #[default]
    Equal,
    NotEqual,
}

impl Op {
    /// Parse the text form. Anything outside `equal`/`notequal` fails
    /// with `InvalidOperator`.
    pub fn parse(text: &str) -> Result<Self> {
        match text {
            "equal" => Ok(Self::Equal),
            "notequal" => Ok(Self::NotEqual),
            other => Err(SpoorError::InvalidOperator {
                op: other.to_owned(),
            }),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "equal",
            Self::NotEqual => "notequal",
        }
    }
}

/// One predicate: `field op value`. `op` defaults to equal when omitted
/// from a serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub value: String,
    #[serde(default)]
    pub op: Op,
}

impl Term {
    pub fn new(field: impl Into<String>, value: impl Into<String>, op: Op) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            op,
        }
    }

    pub fn equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, value, Op::Equal)
    }

    pub fn not_equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, value, Op::NotEqual)
    }
}

/// OR of terms. The filter itself is an AND of clauses.
pub type Clause = Vec<Term>;

/// A decompiled clause member: a resolvable term, or the boolean left
/// behind by literal folding (the folded value string does not survive).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClauseMember {
    Term(Term),
    Literal(bool),
}

const FLAG_NEGATIVE: u64 = 1;

// ---------------------------------------------------------------------------
// Compile
// ---------------------------------------------------------------------------

/// Lower a CNF description to the binary filter array.
///
/// Terms whose value is missing from the field's lexicon cannot denote a
/// real item and fold to a literal: `(value == "") == (op == equal)`. An
/// absent value therefore satisfies "equal to empty" and fails
/// "not-equal to empty". Unknown field names are an error, not a fold.
pub fn compile<R: StoreReader>(reader: &R, clauses: &[Clause]) -> Result<Vec<u64>> {
    let mut wire = Vec::new();
    for clause in clauses {
        let frame_start = wire.len();
        wire.push(0);
        for term in clause {
            let field = reader
                .field_id(&term.field)
                .ok_or_else(|| SpoorError::unknown_field(&term.field))?;
            match reader.item(field, &term.value) {
                Some(item) => {
                    wire.push(u64::from(term.op == Op::NotEqual));
                    wire.push(item.as_u64());
                }
                None => {
                    let literal = (term.value.is_empty()) == (term.op == Op::Equal);
                    wire.push(u64::from(literal));
                    wire.push(0);
                }
            }
        }
        wire[frame_start] = (wire.len() - frame_start - 1) as u64;
    }
    Ok(wire)
}

// ---------------------------------------------------------------------------
// Decompile
// ---------------------------------------------------------------------------

/// Lift a binary filter array back to clause form.
///
/// Exact left inverse of [`compile`] for real terms; folded terms come
/// back as [`ClauseMember::Literal`] with only the boolean intact.
pub fn decompile<R: StoreReader>(reader: &R, wire: &[u64]) -> Result<Vec<Vec<ClauseMember>>> {
    let mut clauses = Vec::new();
    let mut i = 0usize;
    while i < wire.len() {
        let frame_len = usize::try_from(wire[i])
            .map_err(|_| SpoorError::bad_filter(format!("clause length {} too large", wire[i])))?;
        if frame_len % 2 != 0 {
            return Err(SpoorError::bad_filter(format!(
                "clause at word {i} has odd length {frame_len}"
            )));
        }
        let end = i + 1 + frame_len;
        if end > wire.len() {
            return Err(SpoorError::bad_filter(format!(
                "clause at word {i} runs past the array"
            )));
        }
        let mut members = Vec::with_capacity(frame_len / 2);
        let mut j = i + 1;
        while j < end {
            let flag = wire[j];
            let raw = wire[j + 1];
            if flag > FLAG_NEGATIVE {
                return Err(SpoorError::bad_filter(format!(
                    "flag {flag} at word {j} is not 0 or 1"
                )));
            }
            if raw == 0 {
                members.push(ClauseMember::Literal(flag == FLAG_NEGATIVE));
            } else {
                let item = Item::from_u64(raw);
                let field = item.field();
                let name = reader.field_name(field).ok_or_else(|| {
                    SpoorError::bad_filter(format!("item at word {} references {field}", j + 1))
                })?;
                let value = reader.value(field, item.value()).ok_or(SpoorError::ValueLookup {
                    field: field.as_u32(),
                    value: item.value().as_u64(),
                })?;
                let op = if flag == FLAG_NEGATIVE {
                    Op::NotEqual
                } else {
                    Op::Equal
                };
                members.push(ClauseMember::Term(Term::new(name, value, op)));
            }
            j += 2;
        }
        clauses.push(members);
        i = end;
    }
    Ok(clauses)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate a compiled filter against one event's items.
///
/// True when every clause has at least one satisfied member. The array is
/// assumed well-framed (compile output, or decompile-validated); a
/// truncated frame conservatively fails its clause.
#[must_use]
pub fn matches(wire: &[u64], items: &[Item]) -> bool {
    let mut i = 0usize;
    while i < wire.len() {
        let frame_len = wire[i] as usize;
        let end = (i + 1 + frame_len).min(wire.len());
        let mut satisfied = false;
        let mut j = i + 1;
        while j + 2 <= end {
            let flag = wire[j];
            let raw = wire[j + 1];
            let hit = if raw == 0 {
                flag == FLAG_NEGATIVE
            } else {
                let present = items.contains(&Item::from_u64(raw));
                (flag == FLAG_NEGATIVE) != present
            };
            if hit {
                satisfied = true;
                break;
            }
            j += 2;
        }
        if !satisfied {
            return false;
        }
        i += 1 + frame_len;
    }
    true
}
