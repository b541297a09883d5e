//! The closed set of GSUB and GPOS subtable kinds
//!
//! Every subtable a lookup can hold is one variant of [`SubTable`], named after
//! its record type and format number (`SingleSubstFormat2`, `PairPosFormat1`,
//! ...). [`LookupKind`] is the fieldless mirror of that enum and is what
//! discovery queries and errors talk about.
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{error::OtlError, table::TableTag};

mod context;
mod gpos;
mod gsub;

pub use context::{
    ChainedClassSequenceRule, ChainedSequenceContextFormat1, ChainedSequenceContextFormat2,
    ChainedSequenceContextFormat3, ChainedSequenceRule, ClassSequenceRule, LookupRecords,
    SequenceContextFormat1, SequenceContextFormat2, SequenceContextFormat3, SequenceLookupRecord,
    SequenceRule,
};
pub use gpos::{
    Anchor, Class2Record, CursivePosFormat1, EntryExitRecord, MarkBasePosFormat1,
    MarkLigPosFormat1, MarkMarkPosFormat1, MarkRecord, PairPosFormat1, PairPosFormat2,
    PairValueRecord, SinglePosFormat1, SinglePosFormat2, ValueRecord,
};
pub use gsub::{
    AlternateSubst, Ligature, LigatureSubst, MultipleSubst, ReverseChainSingleSubst, SingleSubst,
};

/// A glyph name
pub type GlyphName = SmolStr;

/// An ordered list of glyphs; the position of a glyph indexes parallel arrays
pub type Coverage = Vec<GlyphName>;

/// A glyph to class mapping. Glyphs not listed are in class 0.
pub type ClassDef = IndexMap<GlyphName, u16>;

/// The set of class values actually assigned in a class definition
pub(crate) fn classes_in(class_def: &ClassDef) -> BTreeSet<u16> {
    class_def.values().copied().collect()
}

/// Declare the subtable enum and its kind enum together, so they cannot drift
///
/// Usage: `declare_subtables! { KindName(Payload) in Table type N format M, ... }`
macro_rules! declare_subtables {
    ($(
        $kind:ident($payload:ty) in $table:ident type $lookup_type:literal format $format:literal
    ),* $(,)?) => {
        /// One subtable of a lookup
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub enum SubTable {
            $(
                #[allow(missing_docs)]
                $kind($payload),
            )*
        }

        /// The record type and format of a subtable
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum LookupKind {
            $(
                #[allow(missing_docs)]
                $kind,
            )*
        }

        impl SubTable {
            /// The kind of this subtable
            pub fn kind(&self) -> LookupKind {
                match self {
                    $( SubTable::$kind(_) => LookupKind::$kind, )*
                }
            }
        }

        impl LookupKind {
            /// Every subtable kind
            pub const ALL: &'static [LookupKind] = &[$( LookupKind::$kind, )*];

            /// The name of this kind, e.g. `"SingleSubstFormat2"`
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( LookupKind::$kind => stringify!($kind), )*
                }
            }

            /// Which table this kind of subtable lives in
            pub fn table(&self) -> TableTag {
                match self {
                    $( LookupKind::$kind => TableTag::$table, )*
                }
            }

            /// The OpenType lookup type number
            pub fn lookup_type(&self) -> u16 {
                match self {
                    $( LookupKind::$kind => $lookup_type, )*
                }
            }

            /// The subtable format number
            pub fn format(&self) -> u16 {
                match self {
                    $( LookupKind::$kind => $format, )*
                }
            }
        }
    };
}

declare_subtables! {
    SingleSubstFormat1(SingleSubst) in Gsub type 1 format 1,
    SingleSubstFormat2(SingleSubst) in Gsub type 1 format 2,
    MultipleSubstFormat1(MultipleSubst) in Gsub type 2 format 1,
    AlternateSubstFormat1(AlternateSubst) in Gsub type 3 format 1,
    LigatureSubstFormat1(LigatureSubst) in Gsub type 4 format 1,
    ContextSubstFormat1(SequenceContextFormat1) in Gsub type 5 format 1,
    ContextSubstFormat2(SequenceContextFormat2) in Gsub type 5 format 2,
    ContextSubstFormat3(SequenceContextFormat3) in Gsub type 5 format 3,
    ChainContextSubstFormat1(ChainedSequenceContextFormat1) in Gsub type 6 format 1,
    ChainContextSubstFormat2(ChainedSequenceContextFormat2) in Gsub type 6 format 2,
    ChainContextSubstFormat3(ChainedSequenceContextFormat3) in Gsub type 6 format 3,
    ExtensionSubstFormat1(Box<SubTable>) in Gsub type 7 format 1,
    ReverseChainSingleSubstFormat1(ReverseChainSingleSubst) in Gsub type 8 format 1,
    SinglePosFormat1(SinglePosFormat1) in Gpos type 1 format 1,
    SinglePosFormat2(SinglePosFormat2) in Gpos type 1 format 2,
    PairPosFormat1(PairPosFormat1) in Gpos type 2 format 1,
    PairPosFormat2(PairPosFormat2) in Gpos type 2 format 2,
    CursivePosFormat1(CursivePosFormat1) in Gpos type 3 format 1,
    MarkBasePosFormat1(MarkBasePosFormat1) in Gpos type 4 format 1,
    MarkLigPosFormat1(MarkLigPosFormat1) in Gpos type 5 format 1,
    MarkMarkPosFormat1(MarkMarkPosFormat1) in Gpos type 6 format 1,
    ContextPosFormat1(SequenceContextFormat1) in Gpos type 7 format 1,
    ContextPosFormat2(SequenceContextFormat2) in Gpos type 7 format 2,
    ContextPosFormat3(SequenceContextFormat3) in Gpos type 7 format 3,
    ChainContextPosFormat1(ChainedSequenceContextFormat1) in Gpos type 8 format 1,
    ChainContextPosFormat2(ChainedSequenceContextFormat2) in Gpos type 8 format 2,
    ChainContextPosFormat3(ChainedSequenceContextFormat3) in Gpos type 8 format 3,
    ExtensionPosFormat1(Box<SubTable>) in Gpos type 9 format 1,
}

impl LookupKind {
    /// Whether this kind is an indirection wrapper around another subtable
    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            LookupKind::ExtensionSubstFormat1 | LookupKind::ExtensionPosFormat1
        )
    }

    /// Whether this kind applies other lookups through contextual rules
    pub fn is_contextual(&self) -> bool {
        matches!(self.lookup_type(), 5 | 6) && self.table() == TableTag::Gsub
            || matches!(self.lookup_type(), 7 | 8) && self.table() == TableTag::Gpos
    }
}

impl Display for LookupKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialOrd for LookupKind {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// Kinds sort by name, which is how they are reported
impl Ord for LookupKind {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl SubTable {
    /// The wrapped subtable, if this is an extension
    pub fn extension_inner(&self) -> Option<&SubTable> {
        match self {
            SubTable::ExtensionSubstFormat1(inner) | SubTable::ExtensionPosFormat1(inner) => {
                Some(inner)
            }
            _ => None,
        }
    }

    /// Mutable access to the wrapped subtable, if this is an extension
    pub fn extension_inner_mut(&mut self) -> Option<&mut SubTable> {
        match self {
            SubTable::ExtensionSubstFormat1(inner) | SubTable::ExtensionPosFormat1(inner) => {
                Some(inner)
            }
            _ => None,
        }
    }

    /// Check that the parallel arrays inside this subtable line up
    pub fn check_consistency(&self) -> Result<(), OtlError> {
        let kind = self.kind();
        match self {
            SubTable::ExtensionSubstFormat1(inner) | SubTable::ExtensionPosFormat1(inner) => {
                inner.check_consistency()
            }
            SubTable::ReverseChainSingleSubstFormat1(st) => st.check_consistency(kind),
            SubTable::SinglePosFormat2(st) => st.check_consistency(kind),
            SubTable::PairPosFormat1(st) => st.check_consistency(kind),
            SubTable::PairPosFormat2(st) => st.check_consistency(kind),
            SubTable::CursivePosFormat1(st) => st.check_consistency(kind),
            SubTable::MarkBasePosFormat1(st) => st.check_consistency(kind),
            SubTable::MarkLigPosFormat1(st) => st.check_consistency(kind),
            SubTable::MarkMarkPosFormat1(st) => st.check_consistency(kind),
            SubTable::ContextSubstFormat1(st) | SubTable::ContextPosFormat1(st) => {
                st.check_consistency(kind)
            }
            SubTable::ChainContextSubstFormat1(st) | SubTable::ChainContextPosFormat1(st) => {
                st.check_consistency(kind)
            }
            _ => Ok(()),
        }
    }
}

/// Fail with [`OtlError::InconsistentCoverage`] unless two parallel arrays match
pub(crate) fn check_parallel(
    kind: LookupKind,
    what: &str,
    coverage_len: usize,
    records_len: usize,
) -> Result<(), OtlError> {
    if coverage_len != records_len {
        return Err(OtlError::InconsistentCoverage {
            kind,
            detail: format!(
                "{} coverage has {} glyphs but {} records",
                what, coverage_len, records_len
            ),
        });
    }
    Ok(())
}
