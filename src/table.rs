//! The in-memory form of a GSUB or GPOS table
//!
//! The table is an arena of indices: scripts point at features by
//! [`FeatureIndex`], features and contextual rules point at lookups by
//! [`LookupIndex`], and nothing holds a reference to anything else.
use std::{
    fmt::{Display, Formatter},
    path::Path,
};

use serde::{Deserialize, Serialize};
use write_fonts::types::Tag;

use crate::{
    error::OtlError,
    layout::nested::find_nested_references,
    remap::ListIndex,
    subtable::{LookupKind, SubTable},
};

/// Which layout table this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TableTag {
    /// Glyph substitution
    #[serde(rename = "GSUB")]
    Gsub,
    /// Glyph positioning
    #[serde(rename = "GPOS")]
    Gpos,
}

impl TableTag {
    /// The OpenType table tag
    pub fn tag(&self) -> Tag {
        match self {
            TableTag::Gsub => Tag::new(b"GSUB"),
            TableTag::Gpos => Tag::new(b"GPOS"),
        }
    }
}

impl Display for TableTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TableTag::Gsub => f.write_str("GSUB"),
            TableTag::Gpos => f.write_str("GPOS"),
        }
    }
}

/// Position of a lookup in the lookup list
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct LookupIndex(pub u16);

/// Position of a feature in the feature list
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct FeatureIndex(pub u16);

impl Display for LookupIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for FeatureIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positional identity of a subtable: which lookup, and where within it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SubTableId {
    /// The owning lookup
    pub lookup: LookupIndex,
    /// Position within the lookup's subtables
    pub subtable: usize,
}

impl SubTableId {
    /// Identify subtable `subtable` of lookup `lookup`
    pub fn new(lookup: u16, subtable: usize) -> Self {
        SubTableId {
            lookup: LookupIndex(lookup),
            subtable,
        }
    }
}

impl Display for SubTableId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "lookup {} subtable {}", self.lookup, self.subtable)
    }
}

/// A set of features to apply for one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangSys {
    /// A feature which is always applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_feature: Option<FeatureIndex>,
    /// Features applied for this language
    #[serde(default)]
    pub feature_indices: Vec<FeatureIndex>,
}

impl LangSys {
    /// A language system with no required feature
    pub fn new(feature_indices: Vec<FeatureIndex>) -> Self {
        LangSys {
            required_feature: None,
            feature_indices,
        }
    }

    /// Whether this language system selects no feature at all
    pub fn is_empty(&self) -> bool {
        self.required_feature.is_none() && self.feature_indices.is_empty()
    }

    /// Every feature index this language system refers to
    pub fn all_features(&self) -> impl Iterator<Item = FeatureIndex> + '_ {
        self.required_feature
            .iter()
            .chain(self.feature_indices.iter())
            .copied()
    }
}

/// A tagged language system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LangSysRecord {
    /// OpenType language system tag
    pub tag: Tag,
    /// The language system
    pub lang_sys: LangSys,
}

/// The language systems of one script
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    /// Used for languages without a record of their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_lang_sys: Option<LangSys>,
    /// Language-specific systems
    #[serde(default)]
    pub lang_sys: Vec<LangSysRecord>,
}

impl Script {
    /// Whether this script has no language system left
    pub fn is_empty(&self) -> bool {
        self.default_lang_sys.is_none() && self.lang_sys.is_empty()
    }

    /// Every language system of this script, default first
    pub fn all_lang_sys(&self) -> impl Iterator<Item = (Tag, &LangSys)> + '_ {
        self.default_lang_sys
            .iter()
            .map(|ls| (Tag::new(b"dflt"), ls))
            .chain(self.lang_sys.iter().map(|r| (r.tag, &r.lang_sys)))
    }

    /// Mutable access to every language system of this script
    pub fn all_lang_sys_mut(&mut self) -> impl Iterator<Item = &mut LangSys> + '_ {
        self.default_lang_sys
            .iter_mut()
            .chain(self.lang_sys.iter_mut().map(|r| &mut r.lang_sys))
    }
}

/// A tagged script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRecord {
    /// OpenType script tag
    pub tag: Tag,
    /// The script
    pub script: Script,
}

/// The lookups making up one feature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    /// Lookups in application order
    #[serde(default)]
    pub lookup_indices: Vec<LookupIndex>,
}

/// A tagged feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// OpenType feature tag
    pub tag: Tag,
    /// The feature
    pub feature: Feature,
}

impl FeatureRecord {
    /// A feature with the given tag and lookups
    pub fn new(tag: &[u8; 4], lookups: &[u16]) -> Self {
        FeatureRecord {
            tag: Tag::new(tag),
            feature: Feature {
                lookup_indices: lookups.iter().copied().map(LookupIndex).collect(),
            },
        }
    }
}

/// A list of subtables applied together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lookup {
    /// Lookup flags
    #[serde(default)]
    pub flag: u16,
    /// Mark filtering set index, when the flag asks for one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_filtering_set: Option<u16>,
    /// The subtables, tried in order
    pub subtables: Vec<SubTable>,
}

impl Lookup {
    /// A lookup with no flags
    pub fn new(subtables: Vec<SubTable>) -> Self {
        Lookup {
            flag: 0,
            mark_filtering_set: None,
            subtables,
        }
    }
}

/// A GSUB or GPOS table: script list, feature list and lookup list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtlTable {
    /// Which table this is
    pub tag: TableTag,
    /// The entry point into the feature graph
    #[serde(default)]
    pub scripts: Vec<ScriptRecord>,
    /// Features, referred to by index from language systems
    #[serde(default)]
    pub features: Vec<FeatureRecord>,
    /// Lookups, referred to by index from features and contextual rules
    #[serde(default)]
    pub lookups: Vec<Lookup>,
}

impl OtlTable {
    /// An empty table
    pub fn new(tag: TableTag) -> Self {
        OtlTable {
            tag,
            scripts: vec![],
            features: vec![],
            lookups: vec![],
        }
    }

    /// Read the JSON form of a table
    pub fn load(path: impl AsRef<Path>) -> Result<Self, OtlError> {
        let buffered = std::io::BufReader::new(std::fs::File::open(path)?);
        Ok(serde_json::from_reader(buffered)?)
    }

    /// Write the JSON form of a table
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), OtlError> {
        let file = std::fs::File::create(path)?;
        let mut buffer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut buffer, &self)?;
        Ok(())
    }

    /// Look up a lookup by index
    pub fn lookup(&self, index: LookupIndex) -> Option<&Lookup> {
        self.lookups.get(index.position())
    }

    /// Look up a feature by index
    pub fn feature(&self, index: FeatureIndex) -> Option<&FeatureRecord> {
        self.features.get(index.position())
    }

    /// Look up a subtable by its position
    pub fn subtable(&self, id: SubTableId) -> Option<&SubTable> {
        self.lookup(id.lookup)
            .and_then(|lookup| lookup.subtables.get(id.subtable))
    }

    /// Look up a script by tag
    pub fn script(&self, tag: Tag) -> Option<&Script> {
        self.scripts
            .iter()
            .find(|record| record.tag == tag)
            .map(|record| &record.script)
    }

    /// Mutable access to every language system in every script
    pub(crate) fn all_lang_sys_mut(&mut self) -> impl Iterator<Item = &mut LangSys> + '_ {
        self.scripts
            .iter_mut()
            .flat_map(|record| record.script.all_lang_sys_mut())
    }

    /// Check that the table is well formed
    ///
    /// Every lookup and feature reference must resolve, no lookup, feature,
    /// language system or script may be empty, every subtable must belong to
    /// this kind of table, and parallel arrays inside subtables must line up.
    pub fn validate(&self) -> Result<(), OtlError> {
        for (index, lookup) in self.lookups.iter().enumerate() {
            if lookup.subtables.is_empty() {
                return Err(OtlError::EmptyNode {
                    what: "lookup",
                    index,
                });
            }
            for subtable in &lookup.subtables {
                let kind = innermost_kind(subtable);
                if kind.table() != self.tag {
                    return Err(OtlError::TableMismatch {
                        expected: self.tag,
                        found: kind.table(),
                    });
                }
                subtable.check_consistency()?;
            }
        }
        for (_, nested) in find_nested_references(self)? {
            self.check_lookup_index(nested)?;
        }
        for (index, record) in self.features.iter().enumerate() {
            if record.feature.lookup_indices.is_empty() {
                return Err(OtlError::EmptyNode {
                    what: "feature",
                    index,
                });
            }
            for lookup in &record.feature.lookup_indices {
                self.check_lookup_index(*lookup)?;
            }
        }
        for (index, record) in self.scripts.iter().enumerate() {
            if record.script.is_empty() {
                return Err(OtlError::EmptyNode {
                    what: "script",
                    index,
                });
            }
            for (_, lang_sys) in record.script.all_lang_sys() {
                if lang_sys.is_empty() {
                    return Err(OtlError::EmptyNode {
                        what: "language system",
                        index,
                    });
                }
                for feature in lang_sys.all_features() {
                    if feature.position() >= self.features.len() {
                        return Err(OtlError::InvalidIndex {
                            what: "feature",
                            index: feature.0,
                            len: self.features.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn check_lookup_index(&self, index: LookupIndex) -> Result<(), OtlError> {
        if index.position() >= self.lookups.len() {
            return Err(OtlError::InvalidIndex {
                what: "lookup",
                index: index.0,
                len: self.lookups.len(),
            });
        }
        Ok(())
    }
}

fn innermost_kind(subtable: &SubTable) -> LookupKind {
    match subtable.extension_inner() {
        Some(inner) => inner.kind(),
        None => subtable.kind(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::subtable::{SingleSubst, SinglePosFormat1, ValueRecord};
    use pretty_assertions::assert_eq;

    fn lnum_table() -> OtlTable {
        OtlTable {
            tag: TableTag::Gsub,
            scripts: vec![ScriptRecord {
                tag: Tag::new(b"latn"),
                script: Script {
                    default_lang_sys: Some(LangSys::new(vec![FeatureIndex(0)])),
                    lang_sys: vec![],
                },
            }],
            features: vec![FeatureRecord::new(b"lnum", &[0])],
            lookups: vec![Lookup::new(vec![SubTable::SingleSubstFormat1(SingleSubst {
                mapping: [("one".into(), "one.lf".into())].into_iter().collect(),
            })])],
        }
    }

    #[test]
    fn test_valid_table() {
        assert!(lnum_table().validate().is_ok());
    }

    #[test]
    fn test_dangling_feature_index() {
        let mut table = lnum_table();
        if let Some(ls) = table.scripts[0].script.default_lang_sys.as_mut() {
            ls.feature_indices.push(FeatureIndex(3));
        }
        assert!(matches!(
            table.validate(),
            Err(OtlError::InvalidIndex {
                what: "feature",
                index: 3,
                len: 1
            })
        ));
    }

    #[test]
    fn test_empty_feature() {
        let mut table = lnum_table();
        table.features[0].feature.lookup_indices.clear();
        assert!(matches!(
            table.validate(),
            Err(OtlError::EmptyNode {
                what: "feature",
                index: 0
            })
        ));
    }

    #[test]
    fn test_wrong_table_subtable() {
        let mut table = lnum_table();
        table.lookups.push(Lookup::new(vec![SubTable::SinglePosFormat1(
            SinglePosFormat1 {
                coverage: vec!["one".into()],
                value: ValueRecord::x_advance(10),
            },
        )]));
        assert!(matches!(
            table.validate(),
            Err(OtlError::TableMismatch {
                expected: TableTag::Gsub,
                found: TableTag::Gpos
            })
        ));
    }

    #[test]
    fn test_json_form() {
        let table = lnum_table();
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["tag"], "GSUB");
        assert_eq!(json["features"][0]["tag"], "lnum");
        assert_eq!(
            json["lookups"][0]["subtables"][0]["SingleSubstFormat1"]["mapping"]["one"],
            "one.lf"
        );
        let back: OtlTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }
}
