//! Contextual and chained contextual rules, shared between GSUB and GPOS
use serde::{Deserialize, Serialize};

use super::{check_parallel, ClassDef, Coverage, GlyphName, LookupKind};
use crate::{error::OtlError, table::LookupIndex};

/// Apply a lookup at one position of a matched sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceLookupRecord {
    /// Position in the input sequence
    pub sequence_index: u16,
    /// The lookup to apply there
    pub lookup_index: LookupIndex,
}

impl SequenceLookupRecord {
    /// A record applying `lookup` at `sequence_index`
    pub fn new(sequence_index: u16, lookup: u16) -> Self {
        SequenceLookupRecord {
            sequence_index,
            lookup_index: LookupIndex(lookup),
        }
    }
}

/// Anything which carries a list of nested lookup references
pub trait LookupRecords {
    /// The nested lookup references
    fn lookup_records(&self) -> &[SequenceLookupRecord];
    /// Mutable access to the nested lookup references
    fn lookup_records_mut(&mut self) -> &mut Vec<SequenceLookupRecord>;
}

macro_rules! impl_lookup_records {
    ($($ty:ty),*) => {
        $(
            impl LookupRecords for $ty {
                fn lookup_records(&self) -> &[SequenceLookupRecord] {
                    &self.lookup_records
                }
                fn lookup_records_mut(&mut self) -> &mut Vec<SequenceLookupRecord> {
                    &mut self.lookup_records
                }
            }
        )*
    };
}

/// A rule matching a glyph sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceRule {
    /// Input glyphs after the first (covered) one
    pub input: Vec<GlyphName>,
    /// Lookups to apply on a match
    #[serde(default)]
    pub lookup_records: Vec<SequenceLookupRecord>,
}

/// A rule matching a class sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassSequenceRule {
    /// Input classes after the first one
    pub input: Vec<u16>,
    /// Lookups to apply on a match
    #[serde(default)]
    pub lookup_records: Vec<SequenceLookupRecord>,
}

/// A chained rule matching glyph sequences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainedSequenceRule {
    /// Backtrack glyphs, nearest first
    #[serde(default)]
    pub backtrack: Vec<GlyphName>,
    /// Input glyphs after the first (covered) one
    pub input: Vec<GlyphName>,
    /// Lookahead glyphs
    #[serde(default)]
    pub lookahead: Vec<GlyphName>,
    /// Lookups to apply on a match
    #[serde(default)]
    pub lookup_records: Vec<SequenceLookupRecord>,
}

/// A chained rule matching class sequences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainedClassSequenceRule {
    /// Backtrack classes, nearest first
    #[serde(default)]
    pub backtrack: Vec<u16>,
    /// Input classes after the first one
    pub input: Vec<u16>,
    /// Lookahead classes
    #[serde(default)]
    pub lookahead: Vec<u16>,
    /// Lookups to apply on a match
    #[serde(default)]
    pub lookup_records: Vec<SequenceLookupRecord>,
}

/// Context by glyph sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceContextFormat1 {
    /// First glyphs of the rules
    pub coverage: Coverage,
    /// Rule sets, parallel to `coverage`
    pub rule_sets: Vec<Option<Vec<SequenceRule>>>,
}

impl SequenceContextFormat1 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "", self.coverage.len(), self.rule_sets.len())
    }
}

/// Context by class sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceContextFormat2 {
    /// First glyphs of the rules
    pub coverage: Coverage,
    /// Classes of input glyphs
    #[serde(default)]
    pub class_def: ClassDef,
    /// Rule sets, indexed by the class of the first glyph
    pub class_sets: Vec<Option<Vec<ClassSequenceRule>>>,
}

/// Context by per-position coverage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequenceContextFormat3 {
    /// One coverage per input position
    pub coverages: Vec<Coverage>,
    /// Lookups to apply on a match
    #[serde(default)]
    pub lookup_records: Vec<SequenceLookupRecord>,
}

/// Chained context by glyph sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainedSequenceContextFormat1 {
    /// First glyphs of the rules
    pub coverage: Coverage,
    /// Rule sets, parallel to `coverage`
    pub rule_sets: Vec<Option<Vec<ChainedSequenceRule>>>,
}

impl ChainedSequenceContextFormat1 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "", self.coverage.len(), self.rule_sets.len())
    }
}

/// Chained context by class sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainedSequenceContextFormat2 {
    /// First glyphs of the rules
    pub coverage: Coverage,
    /// Classes of backtrack glyphs
    #[serde(default)]
    pub backtrack_class_def: ClassDef,
    /// Classes of input glyphs
    #[serde(default)]
    pub input_class_def: ClassDef,
    /// Classes of lookahead glyphs
    #[serde(default)]
    pub lookahead_class_def: ClassDef,
    /// Rule sets, indexed by the input class of the first glyph
    pub class_sets: Vec<Option<Vec<ChainedClassSequenceRule>>>,
}

/// Chained context by per-position coverage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainedSequenceContextFormat3 {
    /// One coverage per backtrack position, nearest first
    #[serde(default)]
    pub backtrack_coverages: Vec<Coverage>,
    /// One coverage per input position
    pub input_coverages: Vec<Coverage>,
    /// One coverage per lookahead position
    #[serde(default)]
    pub lookahead_coverages: Vec<Coverage>,
    /// Lookups to apply on a match
    #[serde(default)]
    pub lookup_records: Vec<SequenceLookupRecord>,
}

impl_lookup_records!(
    SequenceRule,
    ClassSequenceRule,
    ChainedSequenceRule,
    ChainedClassSequenceRule,
    SequenceContextFormat3,
    ChainedSequenceContextFormat3
);
