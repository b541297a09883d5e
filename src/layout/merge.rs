//! Merging one table's features into another's
//!
//! The second table's lookups and features are appended to the first's and
//! its scripts folded in language system by language system. Where a
//! language system ends up with two features of the same tag, the later
//! feature's lookups are moved into the earlier one and the later feature
//! goes away.
use std::collections::{BTreeMap, BTreeSet};

use write_fonts::types::Tag;

use crate::{
    error::OtlError,
    layout::{nested::remap_nested_lookups, prune::remap_lang_sys},
    remap::{ListIndex, Remap},
    table::{FeatureIndex, FeatureRecord, LangSys, LookupIndex, OtlTable, Script},
};

/// Merge the lookups, features and scripts of `other` into `table`
///
/// Both tables must be of the same kind. The merged feature list is sorted
/// by tag, and so is the script list. `table` is only modified if the merge
/// succeeds.
pub fn merge_features(table: &mut OtlTable, mut other: OtlTable) -> Result<(), OtlError> {
    if table.tag != other.tag {
        return Err(OtlError::TableMismatch {
            expected: table.tag,
            found: other.tag,
        });
    }
    log::info!(
        "Merging {} lookups and {} features into {}",
        other.lookups.len(),
        other.features.len(),
        table.tag
    );
    let mut merged = table.clone();

    // Move the other table's indices past the end of ours
    let lookup_offset = Remap::<LookupIndex>::offset(other.lookups.len(), merged.lookups.len())?;
    remap_nested_lookups(&mut other, &lookup_offset)?;
    for record in other.features.iter_mut() {
        lookup_offset.apply_to(&mut record.feature.lookup_indices);
    }
    let feature_offset =
        Remap::<FeatureIndex>::offset(other.features.len(), merged.features.len())?;
    for lang_sys in other.all_lang_sys_mut() {
        remap_lang_sys(lang_sys, &feature_offset);
    }
    merged.lookups.append(&mut other.lookups);
    merged.features.append(&mut other.features);

    let mut duplicates = BTreeSet::new();
    for record in other.scripts {
        match merged.scripts.iter_mut().find(|r| r.tag == record.tag) {
            Some(existing) => merge_script(
                &mut existing.script,
                record.script,
                record.tag,
                &merged.features,
                &mut duplicates,
            )?,
            None => merged.scripts.push(record),
        }
    }
    merge_duplicate_features(&mut merged, &duplicates)?;

    merged.scripts.sort_by_key(|record| record.tag);
    sort_feature_list(&mut merged)?;
    *table = merged;
    Ok(())
}

/// Stably sort the feature list by tag, renumbering every reference to it
pub fn sort_feature_list(table: &mut OtlTable) -> Result<(), OtlError> {
    let mut order: Vec<usize> = (0..table.features.len()).collect();
    order.sort_by_key(|index| table.features[*index].tag);
    let remap = Remap::<FeatureIndex>::from_order(&order)?;
    if remap.is_identity() {
        return Ok(());
    }
    let mut old: Vec<Option<FeatureRecord>> = table.features.drain(..).map(Some).collect();
    table.features = order
        .iter()
        .filter_map(|index| old.get_mut(*index).and_then(Option::take))
        .collect();
    for lang_sys in table.all_lang_sys_mut() {
        remap_lang_sys(lang_sys, &remap);
    }
    Ok(())
}

fn merge_script(
    script: &mut Script,
    other: Script,
    script_tag: Tag,
    features: &[FeatureRecord],
    duplicates: &mut BTreeSet<(FeatureIndex, FeatureIndex)>,
) -> Result<(), OtlError> {
    match (script.default_lang_sys.as_mut(), other.default_lang_sys) {
        (Some(lang_sys), Some(other_lang_sys)) => {
            merge_lang_sys(lang_sys, other_lang_sys, script_tag, Tag::new(b"dflt"))?;
            duplicates.extend(find_duplicate_features(features, lang_sys));
        }
        (None, Some(other_lang_sys)) => script.default_lang_sys = Some(other_lang_sys),
        (_, None) => {}
    }
    for record in other.lang_sys {
        match script.lang_sys.iter_mut().find(|r| r.tag == record.tag) {
            Some(existing) => {
                merge_lang_sys(&mut existing.lang_sys, record.lang_sys, script_tag, record.tag)?;
                duplicates.extend(find_duplicate_features(features, &existing.lang_sys));
            }
            None => script.lang_sys.push(record),
        }
    }
    script.lang_sys.sort_by_key(|record| record.tag);
    Ok(())
}

fn merge_lang_sys(
    lang_sys: &mut LangSys,
    other: LangSys,
    script: Tag,
    language: Tag,
) -> Result<(), OtlError> {
    match (lang_sys.required_feature, other.required_feature) {
        (Some(first), Some(second)) if first != second => {
            return Err(OtlError::RequiredFeatureConflict {
                script,
                language,
                first: first.0,
                second: second.0,
            });
        }
        (None, required) => lang_sys.required_feature = required,
        _ => {}
    }
    for feature in other.feature_indices {
        if !lang_sys.feature_indices.contains(&feature) {
            lang_sys.feature_indices.push(feature);
        }
    }
    Ok(())
}

/// Pairs of (earliest, later) features sharing a tag within one language
/// system
fn find_duplicate_features(
    features: &[FeatureRecord],
    lang_sys: &LangSys,
) -> Vec<(FeatureIndex, FeatureIndex)> {
    let mut by_tag: BTreeMap<Tag, Vec<FeatureIndex>> = BTreeMap::new();
    for index in &lang_sys.feature_indices {
        if let Some(record) = features.get(index.position()) {
            by_tag.entry(record.tag).or_default().push(*index);
        }
    }
    by_tag
        .into_values()
        .flat_map(|indices| {
            let main = indices[0];
            indices[1..]
                .iter()
                .map(move |secondary| (main, *secondary))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Fold each duplicate feature into the feature it duplicates, then remove
/// it, pointing every reference to it at the surviving feature
fn merge_duplicate_features(
    table: &mut OtlTable,
    duplicates: &BTreeSet<(FeatureIndex, FeatureIndex)>,
) -> Result<(), OtlError> {
    if duplicates.is_empty() {
        return Ok(());
    }
    // A feature may be a duplicate in one language system and the original
    // in another, so resolve chains to the lowest index
    let mut target: Vec<usize> = (0..table.features.len()).collect();
    fn resolve(target: &[usize], mut index: usize) -> usize {
        while target[index] != index {
            index = target[index];
        }
        index
    }
    for (main, secondary) in duplicates {
        let main = resolve(&target, main.position());
        let secondary = resolve(&target, secondary.position());
        if main != secondary {
            target[main.max(secondary)] = main.min(secondary);
        }
    }
    let target: Vec<usize> = (0..target.len()).map(|i| resolve(&target, i)).collect();

    for (index, survivor) in target.iter().copied().enumerate() {
        if survivor == index {
            continue;
        }
        log::info!(
            "Merging duplicate feature {} '{}' into feature {}",
            index,
            table.features[index].tag,
            survivor
        );
        let lookups = table.features[index].feature.lookup_indices.clone();
        let main = &mut table.features[survivor].feature.lookup_indices;
        for lookup in lookups {
            if !main.contains(&lookup) {
                main.push(lookup);
            }
        }
    }

    let compaction = Remap::<FeatureIndex>::from_retained(
        target.iter().enumerate().map(|(index, survivor)| index == *survivor),
    )?;
    let redirect = Remap::from_targets(
        target
            .iter()
            .map(|survivor| compaction.get(FeatureIndex::from_u16(*survivor as u16)))
            .collect(),
    );
    let mut keep = target.iter().enumerate().map(|(index, survivor)| index == *survivor);
    table
        .features
        .retain(|_| keep.next().unwrap_or(false));
    for lang_sys in table.all_lang_sys_mut() {
        remap_lang_sys(lang_sys, &redirect);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        subtable::{
            ChainedSequenceContextFormat3, SequenceLookupRecord, SingleSubst, SubTable,
        },
        table::{LangSysRecord, Lookup, ScriptRecord, TableTag},
    };
    use pretty_assertions::assert_eq;

    fn single(from: &str, to: &str) -> Lookup {
        Lookup::new(vec![SubTable::SingleSubstFormat1(SingleSubst {
            mapping: [(from.into(), to.into())].into_iter().collect(),
        })])
    }

    fn script(tag: &[u8; 4], default: &[u16], languages: &[(&[u8; 4], &[u16])]) -> ScriptRecord {
        let lang_sys =
            |indices: &[u16]| LangSys::new(indices.iter().copied().map(FeatureIndex).collect());
        ScriptRecord {
            tag: Tag::new(tag),
            script: Script {
                default_lang_sys: Some(lang_sys(default)),
                lang_sys: languages
                    .iter()
                    .map(|(tag, indices)| LangSysRecord {
                        tag: Tag::new(tag),
                        lang_sys: lang_sys(indices),
                    })
                    .collect(),
            },
        }
    }

    fn table(
        lookups: Vec<Lookup>,
        features: Vec<FeatureRecord>,
        scripts: Vec<ScriptRecord>,
    ) -> OtlTable {
        OtlTable {
            tag: TableTag::Gsub,
            scripts,
            features,
            lookups,
        }
    }

    #[test]
    fn test_merge_disjoint_tables() {
        let mut first = table(
            vec![single("one", "one.lf")],
            vec![FeatureRecord::new(b"lnum", &[0])],
            vec![script(b"latn", &[0], &[])],
        );
        let second = table(
            vec![
                single("a", "a.sc"),
                Lookup::new(vec![SubTable::ChainContextSubstFormat3(
                    ChainedSequenceContextFormat3 {
                        input_coverages: vec![vec!["a".into()]],
                        lookup_records: vec![SequenceLookupRecord::new(0, 0)],
                        ..Default::default()
                    },
                )]),
            ],
            vec![
                FeatureRecord::new(b"smcp", &[0]),
                FeatureRecord::new(b"calt", &[1]),
            ],
            vec![script(b"cyrl", &[0, 1], &[])],
        );
        merge_features(&mut first, second).unwrap();

        assert_eq!(first.lookups.len(), 3);
        assert_eq!(
            first.features,
            vec![
                FeatureRecord::new(b"calt", &[2]),
                FeatureRecord::new(b"lnum", &[0]),
                FeatureRecord::new(b"smcp", &[1]),
            ]
        );
        // The nested reference followed its lookup
        let SubTable::ChainContextSubstFormat3(context) = &first.lookups[2].subtables[0] else {
            panic!("wrong kind");
        };
        assert_eq!(context.lookup_records, vec![SequenceLookupRecord::new(0, 1)]);
        assert_eq!(
            first.scripts,
            vec![script(b"cyrl", &[2, 0], &[]), script(b"latn", &[1], &[])]
        );
        first.validate().unwrap();
    }

    #[test]
    fn test_merge_same_feature_tags() {
        let mut first = table(
            vec![single("a", "a.sc")],
            vec![FeatureRecord::new(b"smcp", &[0])],
            vec![script(b"latn", &[0], &[(b"TRK ", &[0])])],
        );
        let second = table(
            vec![single("b", "b.sc"), single("c", "c.alt")],
            vec![
                FeatureRecord::new(b"smcp", &[0]),
                FeatureRecord::new(b"salt", &[1]),
            ],
            vec![script(b"latn", &[0, 1], &[(b"DEU ", &[1])])],
        );
        merge_features(&mut first, second).unwrap();

        assert_eq!(
            first.features,
            vec![
                FeatureRecord::new(b"salt", &[2]),
                FeatureRecord::new(b"smcp", &[0, 1]),
            ]
        );
        assert_eq!(
            first.scripts,
            vec![script(
                b"latn",
                &[1, 0],
                &[(b"DEU ", &[0]), (b"TRK ", &[1])]
            )]
        );
        first.validate().unwrap();
    }

    #[test]
    fn test_conflicting_required_features() {
        let with_required = |lookups: Vec<Lookup>| {
            let mut t = table(
                lookups,
                vec![FeatureRecord::new(b"ccmp", &[0])],
                vec![script(b"latn", &[], &[])],
            );
            if let Some(default) = t.scripts[0].script.default_lang_sys.as_mut() {
                default.required_feature = Some(FeatureIndex(0));
            }
            t
        };
        let mut first = with_required(vec![single("a", "b")]);
        let before = first.clone();
        let result = merge_features(&mut first, with_required(vec![single("c", "d")]));
        assert!(matches!(
            result,
            Err(OtlError::RequiredFeatureConflict {
                first: 0,
                second: 1,
                ..
            })
        ));
        assert_eq!(first, before);
    }

    #[test]
    fn test_mismatched_tables() {
        let mut gsub = OtlTable::new(TableTag::Gsub);
        assert!(matches!(
            merge_features(&mut gsub, OtlTable::new(TableTag::Gpos)),
            Err(OtlError::TableMismatch { .. })
        ));
    }

    #[test]
    fn test_sort_feature_list() {
        let mut t = table(
            vec![single("a", "b"), single("c", "d"), single("e", "f")],
            vec![
                FeatureRecord::new(b"liga", &[0]),
                FeatureRecord::new(b"kern", &[1]),
                FeatureRecord::new(b"liga", &[2]),
            ],
            vec![script(b"latn", &[0, 1, 2], &[])],
        );
        sort_feature_list(&mut t).unwrap();
        assert_eq!(
            t.features,
            vec![
                FeatureRecord::new(b"kern", &[1]),
                FeatureRecord::new(b"liga", &[0]),
                FeatureRecord::new(b"liga", &[2]),
            ]
        );
        assert_eq!(t.scripts, vec![script(b"latn", &[1, 0, 2], &[])]);
    }
}
