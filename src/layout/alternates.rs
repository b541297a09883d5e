//! Glyphs reachable through substitution
use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use write_fonts::types::Tag;

use crate::{
    error::OtlError,
    layout::{
        nested::find_nested_references,
        visitor::{traverse, unsupported, LookupVisitor},
    },
    subtable::{
        AlternateSubst, ChainedSequenceContextFormat1, ChainedSequenceContextFormat2,
        ChainedSequenceContextFormat3, GlyphName, LigatureSubst, LookupKind, MultipleSubst,
        ReverseChainSingleSubst, SequenceContextFormat1, SequenceContextFormat2,
        SequenceContextFormat3, SingleSubst,
    },
    table::{LookupIndex, OtlTable, SubTableId, TableTag},
};

/// An output glyph and the features which can produce it
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FeatureAlternate {
    /// Feature tags, sorted
    pub features: Vec<Tag>,
    /// The substituted glyph
    pub glyph: GlyphName,
}

/// Input glyph to the alternates it can be substituted by
pub type AlternateMap = BTreeMap<GlyphName, Vec<FeatureAlternate>>;

/// All glyphs reachable from `glyphs` through any number of substitutions
///
/// The input glyphs themselves are only included if some substitution
/// produces them.
pub fn find_alternate_glyphs(
    table: &OtlTable,
    glyphs: &BTreeSet<GlyphName>,
) -> Result<BTreeSet<GlyphName>, OtlError> {
    let mut all_alternates = BTreeSet::new();
    let mut done = BTreeSet::new();
    let mut todo = glyphs.clone();
    let mut rounds = 0;
    // Alternates can themselves be substituted, so keep going until a pass
    // turns up nothing new. `all_alternates` grows every round and is bounded
    // by the glyphs mentioned in the table.
    loop {
        rounds += 1;
        let found: BTreeSet<GlyphName> = traverse(
            &mut AlternateGlyphFinder { glyphs: &todo },
            &table.lookups,
        )?
        .into_iter()
        .collect();
        if found.is_subset(&all_alternates) {
            break;
        }
        all_alternates.extend(found.iter().cloned());
        done.append(&mut todo);
        todo = found.difference(&done).cloned().collect();
    }
    log::debug!(
        "Found {} alternate glyphs in {} rounds",
        all_alternates.len(),
        rounds
    );
    Ok(all_alternates)
}

/// For every input glyph, the glyphs it can become and which features do it
///
/// Lookups only reached through contextual rules inherit the features of the
/// contextual lookups which invoke them, unless `only_direct` is set; then
/// only single substitutions directly referenced by a feature are reported.
pub fn find_alternate_glyphs_and_features(
    table: &OtlTable,
    only_direct: bool,
) -> Result<AlternateMap, OtlError> {
    let tags = subtable_feature_tags(table, only_direct)?;
    let found = traverse(
        &mut AlternateGlyphAndFeatureFinder {
            tags: &tags,
            only_direct,
            current: SubTableId::default(),
        },
        &table.lookups,
    )?;

    let mut merged: BTreeMap<GlyphName, BTreeMap<GlyphName, BTreeSet<Tag>>> = BTreeMap::new();
    for (input, features, output) in found {
        merged
            .entry(input)
            .or_default()
            .entry(output)
            .or_default()
            .extend(features);
    }
    Ok(merged
        .into_iter()
        .map(|(input, outputs)| {
            let mut alternates: Vec<FeatureAlternate> = outputs
                .into_iter()
                .map(|(glyph, features)| FeatureAlternate {
                    features: features.into_iter().collect(),
                    glyph,
                })
                .collect();
            alternates.sort();
            (input, alternates)
        })
        .collect())
}

/// Simple one-to-one alternates directly reachable from a feature
pub fn find_single_subst_alts(table: &OtlTable) -> Result<AlternateMap, OtlError> {
    find_alternate_glyphs_and_features(table, true)
}

fn subtables_of(
    table: &OtlTable,
    lookup: LookupIndex,
) -> Result<impl Iterator<Item = SubTableId>, OtlError> {
    let count = table
        .lookup(lookup)
        .ok_or(OtlError::InvalidIndex {
            what: "lookup",
            index: lookup.0,
            len: table.lookups.len(),
        })?
        .subtables
        .len();
    Ok((0..count).map(move |subtable| SubTableId { lookup, subtable }))
}

/// Which feature tags can trigger each subtable
fn subtable_feature_tags(
    table: &OtlTable,
    only_direct: bool,
) -> Result<HashMap<SubTableId, BTreeSet<Tag>>, OtlError> {
    let mut tags: HashMap<SubTableId, BTreeSet<Tag>> = HashMap::new();
    for record in &table.features {
        for lookup in &record.feature.lookup_indices {
            for id in subtables_of(table, *lookup)? {
                tags.entry(id).or_default().insert(record.tag);
            }
        }
    }
    if only_direct {
        return Ok(tags);
    }
    // Nested lookups can be several levels deep; the tag sets only grow
    let nested = find_nested_references(table)?;
    loop {
        let mut changed = false;
        for (owner, lookup) in &nested {
            let Some(owner_tags) = tags.get(owner).cloned() else {
                continue;
            };
            for id in subtables_of(table, *lookup)? {
                let entry = tags.entry(id).or_default();
                let before = entry.len();
                entry.extend(owner_tags.iter().copied());
                changed |= entry.len() != before;
            }
        }
        if !changed {
            break;
        }
    }
    Ok(tags)
}

// Contextual substitutions do their work through other lookups
macro_rules! contextual_handlers {
    () => {
        fn visit_context_format1(
            &mut self,
            kind: LookupKind,
            _: &SequenceContextFormat1,
        ) -> Result<Vec<Self::Output>, OtlError> {
            through_other_lookups(Self::OPERATION, kind)
        }
        fn visit_context_format2(
            &mut self,
            kind: LookupKind,
            _: &SequenceContextFormat2,
        ) -> Result<Vec<Self::Output>, OtlError> {
            through_other_lookups(Self::OPERATION, kind)
        }
        fn visit_context_format3(
            &mut self,
            kind: LookupKind,
            _: &SequenceContextFormat3,
        ) -> Result<Vec<Self::Output>, OtlError> {
            through_other_lookups(Self::OPERATION, kind)
        }
        fn visit_chain_context_format1(
            &mut self,
            kind: LookupKind,
            _: &ChainedSequenceContextFormat1,
        ) -> Result<Vec<Self::Output>, OtlError> {
            through_other_lookups(Self::OPERATION, kind)
        }
        fn visit_chain_context_format2(
            &mut self,
            kind: LookupKind,
            _: &ChainedSequenceContextFormat2,
        ) -> Result<Vec<Self::Output>, OtlError> {
            through_other_lookups(Self::OPERATION, kind)
        }
        fn visit_chain_context_format3(
            &mut self,
            kind: LookupKind,
            _: &ChainedSequenceContextFormat3,
        ) -> Result<Vec<Self::Output>, OtlError> {
            through_other_lookups(Self::OPERATION, kind)
        }
    };
}

fn through_other_lookups<T>(operation: &'static str, kind: LookupKind) -> Result<Vec<T>, OtlError> {
    if kind.table() == TableTag::Gsub {
        Ok(vec![])
    } else {
        unsupported(operation, kind)
    }
}

struct AlternateGlyphFinder<'a> {
    glyphs: &'a BTreeSet<GlyphName>,
}

impl LookupVisitor for AlternateGlyphFinder<'_> {
    type Output = GlyphName;
    const OPERATION: &'static str = "find alternate glyphs";

    fn visit_single_subst(
        &mut self,
        _: LookupKind,
        subtable: &SingleSubst,
    ) -> Result<Vec<GlyphName>, OtlError> {
        Ok(self
            .glyphs
            .iter()
            .filter_map(|glyph| subtable.mapping.get(glyph))
            .cloned()
            .collect())
    }

    fn visit_multiple_subst(
        &mut self,
        _: LookupKind,
        subtable: &MultipleSubst,
    ) -> Result<Vec<GlyphName>, OtlError> {
        Ok(self
            .glyphs
            .iter()
            .filter_map(|glyph| subtable.mapping.get(glyph))
            .flatten()
            .cloned()
            .collect())
    }

    fn visit_alternate_subst(
        &mut self,
        _: LookupKind,
        subtable: &AlternateSubst,
    ) -> Result<Vec<GlyphName>, OtlError> {
        Ok(self
            .glyphs
            .iter()
            .filter_map(|glyph| subtable.alternates.get(glyph))
            .flatten()
            .cloned()
            .collect())
    }

    fn visit_ligature_subst(
        &mut self,
        _: LookupKind,
        subtable: &LigatureSubst,
    ) -> Result<Vec<GlyphName>, OtlError> {
        let mut found = vec![];
        for (first, ligatures) in &subtable.ligatures {
            for ligature in ligatures {
                if self.glyphs.contains(first)
                    || ligature.components.iter().any(|c| self.glyphs.contains(c))
                {
                    found.push(ligature.glyph.clone());
                }
            }
        }
        Ok(found)
    }

    fn visit_reverse_chain_single_subst(
        &mut self,
        _: LookupKind,
        subtable: &ReverseChainSingleSubst,
    ) -> Result<Vec<GlyphName>, OtlError> {
        Ok(subtable
            .coverage
            .iter()
            .zip(subtable.substitutes.iter())
            .filter(|(glyph, _)| self.glyphs.contains(*glyph))
            .map(|(_, substitute)| substitute.clone())
            .collect())
    }

    contextual_handlers!();
}

type TaggedSubstitution = (GlyphName, BTreeSet<Tag>, GlyphName);

struct AlternateGlyphAndFeatureFinder<'a> {
    tags: &'a HashMap<SubTableId, BTreeSet<Tag>>,
    only_direct: bool,
    current: SubTableId,
}

impl AlternateGlyphAndFeatureFinder<'_> {
    /// Tag every (input, output) pair with the features reaching this
    /// subtable. Subtables no feature reaches produce nothing.
    fn tagged<'g>(
        &self,
        pairs: impl Iterator<Item = (&'g GlyphName, &'g GlyphName)>,
    ) -> Vec<TaggedSubstitution> {
        let Some(tags) = self.tags.get(&self.current) else {
            return vec![];
        };
        pairs
            .map(|(input, output)| (input.clone(), tags.clone(), output.clone()))
            .collect()
    }
}

impl LookupVisitor for AlternateGlyphAndFeatureFinder<'_> {
    type Output = TaggedSubstitution;
    const OPERATION: &'static str = "find alternate glyphs and features";

    fn enter_subtable(&mut self, id: SubTableId) {
        self.current = id;
    }

    fn visit_single_subst(
        &mut self,
        _: LookupKind,
        subtable: &SingleSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        Ok(self.tagged(subtable.mapping.iter()))
    }

    fn visit_multiple_subst(
        &mut self,
        _: LookupKind,
        subtable: &MultipleSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        if self.only_direct {
            return Ok(vec![]);
        }
        Ok(self.tagged(
            subtable
                .mapping
                .iter()
                .flat_map(|(input, outputs)| outputs.iter().map(move |output| (input, output))),
        ))
    }

    fn visit_alternate_subst(
        &mut self,
        _: LookupKind,
        subtable: &AlternateSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        if self.only_direct {
            return Ok(vec![]);
        }
        Ok(self.tagged(
            subtable
                .alternates
                .iter()
                .flat_map(|(input, outputs)| outputs.iter().map(move |output| (input, output))),
        ))
    }

    // Both the first glyph and every component map to the ligature
    fn visit_ligature_subst(
        &mut self,
        _: LookupKind,
        subtable: &LigatureSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        if self.only_direct {
            return Ok(vec![]);
        }
        Ok(self.tagged(subtable.ligatures.iter().flat_map(|(first, ligatures)| {
            ligatures.iter().flat_map(move |ligature| {
                std::iter::once(first)
                    .chain(ligature.components.iter())
                    .map(move |input| (input, &ligature.glyph))
            })
        })))
    }

    fn visit_reverse_chain_single_subst(
        &mut self,
        _: LookupKind,
        subtable: &ReverseChainSingleSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        if self.only_direct {
            return Ok(vec![]);
        }
        Ok(self.tagged(subtable.coverage.iter().zip(subtable.substitutes.iter())))
    }

    contextual_handlers!();
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        subtable::{Ligature, SequenceLookupRecord, SinglePosFormat1, SubTable},
        table::{FeatureRecord, Lookup},
    };
    use pretty_assertions::assert_eq;

    fn glyphs(names: &[&str]) -> BTreeSet<GlyphName> {
        names.iter().map(|n| GlyphName::from(*n)).collect()
    }

    fn single(pairs: &[(&str, &str)]) -> SubTable {
        SubTable::SingleSubstFormat2(SingleSubst {
            mapping: pairs.iter().map(|(a, b)| ((*a).into(), (*b).into())).collect(),
        })
    }

    fn table() -> OtlTable {
        let mut table = OtlTable::new(TableTag::Gsub);
        table.lookups = vec![
            // 0: referenced by onum directly
            Lookup::new(vec![single(&[("one", "one.osf"), ("two", "two.osf")])]),
            // 1: only reached through lookup 2
            Lookup::new(vec![single(&[("one.osf", "one.osf.ss01")])]),
            // 2: contextual, referenced by calt
            Lookup::new(vec![SubTable::ChainContextSubstFormat3(
                ChainedSequenceContextFormat3 {
                    input_coverages: vec![glyphs(&["one.osf"]).into_iter().collect()],
                    lookup_records: vec![SequenceLookupRecord::new(0, 1)],
                    ..Default::default()
                },
            )]),
            // 3: ligature under liga
            Lookup::new(vec![SubTable::LigatureSubstFormat1(LigatureSubst {
                ligatures: [(
                    "f".into(),
                    vec![Ligature {
                        glyph: "f_i".into(),
                        components: vec!["i".into()],
                    }],
                )]
                .into_iter()
                .collect(),
            })]),
        ];
        table.features = vec![
            FeatureRecord::new(b"calt", &[2]),
            FeatureRecord::new(b"liga", &[3]),
            FeatureRecord::new(b"onum", &[0]),
            FeatureRecord::new(b"pnum", &[0]),
        ];
        table
    }

    fn alt(features: &[&[u8; 4]], glyph: &str) -> FeatureAlternate {
        FeatureAlternate {
            features: features.iter().map(|t| Tag::new(t)).collect(),
            glyph: glyph.into(),
        }
    }

    #[test]
    fn test_closure_reaches_fixed_point() {
        let table = table();
        let found = find_alternate_glyphs(&table, &glyphs(&["one"])).unwrap();
        assert_eq!(found, glyphs(&["one.osf", "one.osf.ss01"]));
        // Nothing more to find from the result
        let again = find_alternate_glyphs(&table, &found).unwrap();
        assert!(again.is_subset(&found));
        assert_eq!(find_alternate_glyphs(&table, &glyphs(&["one"])).unwrap(), found);
    }

    #[test]
    fn test_ligature_components_reach_ligature() {
        let table = table();
        assert_eq!(
            find_alternate_glyphs(&table, &glyphs(&["i"])).unwrap(),
            glyphs(&["f_i"])
        );
    }

    #[test]
    fn test_single_subst_alts_are_direct_only() {
        let alts = find_single_subst_alts(&table()).unwrap();
        assert_eq!(alts["one"], vec![alt(&[b"onum", b"pnum"], "one.osf")]);
        // lookup 1 is only reachable through calt
        assert!(!alts.contains_key("one.osf"));
        assert!(!alts.contains_key("f"));
    }

    #[test]
    fn test_nested_lookups_inherit_features() {
        let alts = find_alternate_glyphs_and_features(&table(), false).unwrap();
        assert_eq!(alts["one.osf"], vec![alt(&[b"calt"], "one.osf.ss01")]);
        assert_eq!(alts["f"], vec![alt(&[b"liga"], "f_i")]);
        assert_eq!(alts["i"], vec![alt(&[b"liga"], "f_i")]);
    }

    #[test]
    fn test_positioning_is_unsupported() {
        let mut table = table();
        table.lookups.push(Lookup::new(vec![SubTable::SinglePosFormat1(
            SinglePosFormat1::default(),
        )]));
        assert!(matches!(
            find_alternate_glyphs(&table, &glyphs(&["one"])),
            Err(OtlError::UnsupportedLookupKind {
                kind: LookupKind::SinglePosFormat1,
                ..
            })
        ));
    }
}
