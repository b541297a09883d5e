use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{check_parallel, Coverage, GlyphName, LookupKind};
use crate::error::OtlError;

/// One-to-one substitution (both formats share this payload)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingleSubst {
    /// Input glyph to substitute glyph
    pub mapping: IndexMap<GlyphName, GlyphName>,
}

/// One-to-many substitution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultipleSubst {
    /// Input glyph to the sequence it is replaced by
    pub mapping: IndexMap<GlyphName, Vec<GlyphName>>,
}

/// One-from-many substitution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlternateSubst {
    /// Input glyph to its set of alternates
    pub alternates: IndexMap<GlyphName, Vec<GlyphName>>,
}

/// A single ligature: the components following the first glyph, and the result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ligature {
    /// The ligature glyph
    pub glyph: GlyphName,
    /// Component glyphs after the first one
    pub components: Vec<GlyphName>,
}

/// Many-to-one substitution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LigatureSubst {
    /// First glyph of a sequence to the ligatures starting with it
    pub ligatures: IndexMap<GlyphName, Vec<Ligature>>,
}

/// Reverse chaining contextual single substitution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReverseChainSingleSubst {
    /// Glyphs being substituted
    pub coverage: Coverage,
    /// Substitutes, parallel to `coverage`
    pub substitutes: Vec<GlyphName>,
    /// Backtrack context, one coverage per position
    #[serde(default)]
    pub backtrack_coverages: Vec<Coverage>,
    /// Lookahead context, one coverage per position
    #[serde(default)]
    pub lookahead_coverages: Vec<Coverage>,
}

impl ReverseChainSingleSubst {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "Input", self.coverage.len(), self.substitutes.len())
    }
}
