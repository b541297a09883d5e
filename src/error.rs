use std::io;
use thiserror::Error;
use write_fonts::types::Tag;

use crate::{subtable::LookupKind, table::TableTag};

/// Errors produced while inspecting or editing an OpenType Layout table
#[derive(Debug, Error)]
pub enum OtlError {
    /// A subtable kind was reached that the requested operation has no handler for
    #[error("{operation} has no handler for {kind} subtables")]
    UnsupportedLookupKind {
        /// The operation being performed
        operation: &'static str,
        /// The kind of subtable which could not be handled
        kind: LookupKind,
    },

    /// Parallel arrays inside a subtable disagree in length
    #[error("Inconsistent coverage in {kind}: {detail}")]
    InconsistentCoverage {
        /// The kind of subtable which is malformed
        kind: LookupKind,
        /// What did not line up
        detail: String,
    },

    /// Two language systems being merged point at different required features
    #[error("Conflicting required feature in {script}/{language}: {first} vs {second}")]
    RequiredFeatureConflict {
        /// Script tag
        script: Tag,
        /// Language system tag (`dflt` for the default language system)
        language: Tag,
        /// Required feature index in the first table
        first: u16,
        /// Required feature index in the second table
        second: u16,
    },

    /// Two tables of different kinds were combined
    #[error("Cannot combine a {found} table with a {expected} table")]
    TableMismatch {
        /// The tag of the table being merged into
        expected: TableTag,
        /// The tag of the table being merged from
        found: TableTag,
    },

    /// A list grew beyond what a 16-bit OpenType index can address
    #[error("Too many {what}: {count} does not fit in a 16-bit index")]
    IndexOverflow {
        /// What kind of list overflowed
        what: &'static str,
        /// The size it would have had
        count: usize,
    },

    /// An index points past the end of the list it refers to
    #[error("Dangling {what} index {index} (list has {len} entries)")]
    InvalidIndex {
        /// What kind of index dangles
        what: &'static str,
        /// The offending index
        index: u16,
        /// Length of the list it indexes
        len: usize,
    },

    /// A lookup, feature, language system or script has nothing left in it
    #[error("Empty {what} at index {index}")]
    EmptyNode {
        /// What kind of node is empty
        what: &'static str,
        /// Its position in the owning list
        index: usize,
    },

    #[error("IO Error: {0}")]
    /// IO error
    IO(#[from] io::Error),

    #[error("JSON error: {0}")]
    /// Error reading or writing the JSON form of a table
    Json(#[from] serde_json::Error),

    /// A filter could not be constructed or applied
    #[error("Filter error: {0}")]
    FilterError(String),
}
