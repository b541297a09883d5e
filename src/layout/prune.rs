//! Removing dead nodes from the lookup graph
//!
//! Once some subtables are known to be dead, the damage is propagated upward:
//! empty lookups go, contextual rules pointing at them go (which may kill more
//! subtables), then empty features, then empty language systems and scripts.
//! Every level is renumbered on the way so no dangling index survives.
use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    error::OtlError,
    layout::nested::remap_nested_lookups,
    remap::{checked_index, Remap},
    table::{FeatureIndex, LangSys, LookupIndex, OtlTable, SubTableId},
};

/// What a pruning pass removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneReport {
    /// Passes through the lookup/nested-reference loop
    pub rounds: usize,
    /// Subtables removed from lookups
    pub removed_subtables: usize,
    /// Lookups removed from the lookup list
    pub removed_lookups: usize,
    /// Features removed from the feature list
    pub removed_features: usize,
    /// Scripts removed from the script list
    pub removed_scripts: usize,
    /// Language systems removed from scripts (including default ones)
    pub removed_lang_sys: usize,
}

/// Remove `dead` subtables and everything which transitively depends only on
/// them
pub(crate) fn cascade(
    table: &mut OtlTable,
    mut dead: Vec<SubTableId>,
) -> Result<PruneReport, OtlError> {
    let mut report = PruneReport::default();
    let lookups_before = table.lookups.len();
    let mut lookup_remap = Remap::identity(lookups_before)?;
    // Each round either removes at least one subtable or stops, so the loop
    // is bounded by the number of subtables in the table.
    loop {
        report.rounds += 1;
        dead.sort();
        dead.dedup();
        report.removed_subtables += dead.len();
        let remap = prune_lookups(table, &dead)?;
        log::debug!(
            "Pruning round {}: {} dead subtables, {} of {} lookups left",
            report.rounds,
            dead.len(),
            remap.retained(),
            remap.len()
        );
        lookup_remap = lookup_remap.then(&remap);
        dead = remap_nested_lookups(table, &remap)?;
        if dead.is_empty() {
            break;
        }
    }
    report.removed_lookups = lookups_before - table.lookups.len();

    let features_before = table.features.len();
    let feature_remap = prune_features(table, &lookup_remap)?;
    report.removed_features = features_before - table.features.len();

    let (removed_scripts, removed_lang_sys) = prune_scripts(table, &feature_remap);
    report.removed_scripts = removed_scripts;
    report.removed_lang_sys = removed_lang_sys;
    Ok(report)
}

/// Drop the given subtables, then any lookup with none left
pub(crate) fn prune_lookups(
    table: &mut OtlTable,
    dead: &[SubTableId],
) -> Result<Remap<LookupIndex>, OtlError> {
    let dead: BTreeSet<&SubTableId> = dead.iter().collect();
    for (position, lookup) in table.lookups.iter_mut().enumerate() {
        let lookup_index: LookupIndex = checked_index(position)?;
        let mut subtable = 0;
        lookup.subtables.retain(|_| {
            let id = SubTableId {
                lookup: lookup_index,
                subtable,
            };
            subtable += 1;
            !dead.contains(&id)
        });
    }
    let remap = Remap::from_retained(table.lookups.iter().map(|l| !l.subtables.is_empty()))?;
    for (index, lookup) in table.lookups.iter().enumerate() {
        if lookup.subtables.is_empty() {
            log::debug!("Removing empty lookup {}", index);
        }
    }
    table.lookups.retain(|l| !l.subtables.is_empty());
    Ok(remap)
}

/// Rewrite feature lookup lists through `lookup_remap` and drop features
/// left with no lookups
pub(crate) fn prune_features(
    table: &mut OtlTable,
    lookup_remap: &Remap<LookupIndex>,
) -> Result<Remap<FeatureIndex>, OtlError> {
    for record in table.features.iter_mut() {
        lookup_remap.apply_to(&mut record.feature.lookup_indices);
        if record.feature.lookup_indices.is_empty() {
            log::debug!("Removing empty feature '{}'", record.tag);
        }
    }
    let remap = Remap::from_retained(
        table
            .features
            .iter()
            .map(|f| !f.feature.lookup_indices.is_empty()),
    )?;
    table
        .features
        .retain(|f| !f.feature.lookup_indices.is_empty());
    Ok(remap)
}

/// Rewrite a language system's feature references. A required feature which
/// no longer exists is cleared.
pub(crate) fn remap_lang_sys(lang_sys: &mut LangSys, feature_remap: &Remap<FeatureIndex>) {
    lang_sys.required_feature = lang_sys
        .required_feature
        .and_then(|feature| feature_remap.get(feature));
    feature_remap.apply_to(&mut lang_sys.feature_indices);
}

/// Rewrite every language system through `feature_remap`, dropping empty
/// language systems and then empty scripts. Returns how many scripts and
/// language systems were removed.
pub(crate) fn prune_scripts(
    table: &mut OtlTable,
    feature_remap: &Remap<FeatureIndex>,
) -> (usize, usize) {
    let mut removed_lang_sys = 0;
    for record in table.scripts.iter_mut() {
        let script = &mut record.script;
        if let Some(default) = script.default_lang_sys.as_mut() {
            remap_lang_sys(default, feature_remap);
            if default.is_empty() {
                log::debug!("Removing empty default language system of '{}'", record.tag);
                script.default_lang_sys = None;
                removed_lang_sys += 1;
            }
        }
        let before = script.lang_sys.len();
        script.lang_sys.retain_mut(|lang_sys_record| {
            remap_lang_sys(&mut lang_sys_record.lang_sys, feature_remap);
            !lang_sys_record.lang_sys.is_empty()
        });
        removed_lang_sys += before - script.lang_sys.len();
    }
    let before = table.scripts.len();
    table.scripts.retain(|record| {
        if record.script.is_empty() {
            log::debug!("Removing empty script '{}'", record.tag);
        }
        !record.script.is_empty()
    });
    (before - table.scripts.len(), removed_lang_sys)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        subtable::{SingleSubst, SubTable},
        table::{FeatureRecord, LangSysRecord, Lookup, Script, ScriptRecord, TableTag},
    };
    use pretty_assertions::assert_eq;
    use write_fonts::types::Tag;

    fn dummy() -> SubTable {
        SubTable::SingleSubstFormat1(SingleSubst {
            mapping: [("a".into(), "b".into())].into_iter().collect(),
        })
    }

    fn table() -> OtlTable {
        let mut table = OtlTable::new(TableTag::Gsub);
        table.lookups = vec![
            Lookup::new(vec![dummy(), dummy()]),
            Lookup::new(vec![dummy()]),
            Lookup::new(vec![dummy()]),
        ];
        table.features = vec![
            FeatureRecord::new(b"aalt", &[0, 1]),
            FeatureRecord::new(b"smcp", &[1]),
            FeatureRecord::new(b"ss01", &[2]),
        ];
        table.scripts = vec![
            ScriptRecord {
                tag: Tag::new(b"latn"),
                script: Script {
                    default_lang_sys: Some(LangSys::new(vec![FeatureIndex(0), FeatureIndex(1)])),
                    lang_sys: vec![LangSysRecord {
                        tag: Tag::new(b"TRK "),
                        lang_sys: LangSys {
                            required_feature: Some(FeatureIndex(1)),
                            feature_indices: vec![FeatureIndex(2)],
                        },
                    }],
                },
            },
            ScriptRecord {
                tag: Tag::new(b"cyrl"),
                script: Script {
                    default_lang_sys: Some(LangSys::new(vec![FeatureIndex(1)])),
                    lang_sys: vec![],
                },
            },
        ];
        table
    }

    #[test]
    fn test_cascade_removes_dependants() {
        let mut table = table();
        // Kill lookup 1 entirely and half of lookup 0
        let report = cascade(
            &mut table,
            vec![SubTableId::new(1, 0), SubTableId::new(0, 1)],
        )
        .unwrap();
        assert_eq!(
            report,
            PruneReport {
                rounds: 1,
                removed_subtables: 2,
                removed_lookups: 1,
                removed_features: 1,
                removed_scripts: 1,
                removed_lang_sys: 1,
            }
        );
        assert_eq!(table.lookups.len(), 2);
        assert_eq!(table.lookups[0].subtables.len(), 1);
        assert_eq!(
            table.features,
            vec![
                FeatureRecord::new(b"aalt", &[0]),
                FeatureRecord::new(b"ss01", &[1])
            ]
        );
        let latn = table.script(Tag::new(b"latn")).unwrap();
        assert_eq!(
            latn.default_lang_sys,
            Some(LangSys::new(vec![FeatureIndex(0)]))
        );
        // The required feature went away but the language system survives
        assert_eq!(
            latn.lang_sys[0].lang_sys,
            LangSys::new(vec![FeatureIndex(1)])
        );
        assert!(table.script(Tag::new(b"cyrl")).is_none());
        table.validate().unwrap();
    }

    #[test]
    fn test_nothing_dead_is_a_no_op() {
        let mut table = table();
        let before = table.clone();
        let report = cascade(&mut table, vec![]).unwrap();
        assert_eq!(report.rounds, 1);
        assert_eq!(report.removed_lookups, 0);
        assert_eq!(table, before);
    }

    #[test]
    fn test_prune_lookups_rejects_oversized_list() {
        let mut table = OtlTable::new(TableTag::Gsub);
        table.lookups = vec![Lookup::new(vec![dummy()]); usize::from(u16::MAX) + 2];
        assert!(matches!(
            prune_lookups(&mut table, &[]),
            Err(OtlError::IndexOverflow { what: "lookup", .. })
        ));
    }
}
