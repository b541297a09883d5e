//! Removing glyphs from every subtable
//!
//! The per-subtable rules decide when a subtable has nothing left to do; the
//! resulting dead subtables are handed to [`cascade`] to propagate through
//! the rest of the table.
use std::collections::BTreeSet;

use crate::{
    error::OtlError,
    layout::{
        prune::{cascade, PruneReport},
        visitor::{traverse_mut, Liveness, LookupVisitorMut},
    },
    remap::ClassRemap,
    subtable::{
        classes_in, AlternateSubst, ChainedClassSequenceRule, ChainedSequenceContextFormat1,
        ChainedSequenceContextFormat2, ChainedSequenceContextFormat3, ClassDef,
        ClassSequenceRule, Coverage, CursivePosFormat1, GlyphName, LigatureSubst, LookupKind,
        MarkBasePosFormat1, MarkLigPosFormat1, MarkMarkPosFormat1, MultipleSubst,
        PairPosFormat1, PairPosFormat2, ReverseChainSingleSubst, SequenceContextFormat1,
        SequenceContextFormat2, SequenceContextFormat3, SinglePosFormat1, SinglePosFormat2,
        SingleSubst,
    },
    table::OtlTable,
};

/// Remove `glyphs` from every subtable of the table and prune whatever this
/// leaves empty
///
/// The table is only modified if the whole operation succeeds.
pub fn delete_glyphs(
    table: &mut OtlTable,
    glyphs: &BTreeSet<GlyphName>,
) -> Result<PruneReport, OtlError> {
    log::info!("Deleting {} glyphs from {}", glyphs.len(), table.tag);
    let mut working = table.clone();
    let dead = traverse_mut(&mut GlyphDeleter { glyphs }, &mut working.lookups)?;
    let report = cascade(&mut working, dead)?;
    log::info!(
        "Removed {} lookups, {} features and {} scripts",
        report.removed_lookups,
        report.removed_features,
        report.removed_scripts
    );
    *table = working;
    Ok(report)
}

struct GlyphDeleter<'a> {
    glyphs: &'a BTreeSet<GlyphName>,
}

impl GlyphDeleter<'_> {
    fn deleted(&self, glyph: &GlyphName) -> bool {
        self.glyphs.contains(glyph)
    }

    /// Drop the coverage entries for deleted glyphs along with their
    /// parallel records
    fn retain_parallel<T>(&self, coverage: &mut Coverage, records: &mut Vec<T>) {
        self.retain_parallel_if(coverage, records, |_| true);
    }

    /// As [`retain_parallel`](Self::retain_parallel), also dropping entries
    /// whose record fails `keep`
    fn retain_parallel_if<T>(
        &self,
        coverage: &mut Coverage,
        records: &mut Vec<T>,
        keep: impl Fn(&T) -> bool,
    ) {
        let flags: Vec<bool> = coverage
            .iter()
            .zip(records.iter())
            .map(|(glyph, record)| !self.deleted(glyph) && keep(record))
            .collect();
        let mut coverage_flags = flags.iter();
        coverage.retain(|_| coverage_flags.next().copied().unwrap_or(false));
        let mut record_flags = flags.iter();
        records.retain(|_| record_flags.next().copied().unwrap_or(false));
    }

    fn delete_from_coverage(&self, coverage: &mut Coverage) {
        coverage.retain(|glyph| !self.deleted(glyph));
    }

    /// Delete glyphs from a class definition and close up the classes which
    /// lost all their glyphs
    fn delete_from_class_def(&self, class_def: &mut ClassDef) -> ClassRemap {
        let before = classes_in(class_def);
        class_def.retain(|glyph, _| !self.deleted(glyph));
        let remap = ClassRemap::between(&before, &classes_in(class_def));
        for class in class_def.values_mut() {
            if let Some(new) = remap.map(*class) {
                *class = new;
            }
        }
        remap
    }

    /// Shared by the glyph-sequence contexts: drop rules mentioning deleted
    /// glyphs, then coverage entries whose glyph is gone or whose rule set
    /// emptied
    fn delete_from_rule_sets<R>(
        &self,
        coverage: &mut Coverage,
        rule_sets: &mut Vec<Option<Vec<R>>>,
        mentions_deleted: impl Fn(&R) -> bool,
    ) -> Liveness {
        for set in rule_sets.iter_mut() {
            if let Some(rules) = set {
                rules.retain(|rule| !mentions_deleted(rule));
                if rules.is_empty() {
                    *set = None;
                }
            }
        }
        self.retain_parallel_if(coverage, rule_sets, Option::is_some);
        Liveness::dead_if(coverage.is_empty())
    }

    fn any_deleted<'g>(&self, mut glyphs: impl Iterator<Item = &'g GlyphName>) -> bool {
        glyphs.any(|glyph| self.deleted(glyph))
    }
}

fn warn_short_class_sets<T>(kind: LookupKind, before: &BTreeSet<u16>, class_sets: &[T]) {
    if let Some(highest) = before.last() {
        if usize::from(*highest) >= class_sets.len() {
            log::warn!(
                "{} uses class {} but only has {} class sets",
                kind,
                highest,
                class_sets.len()
            );
        }
    }
}

/// Drop whole class sets for classes that vanished, then the rules that
/// mention vanished classes elsewhere in their sequences
fn remap_class_sets<R>(
    class_sets: &mut Vec<Option<Vec<R>>>,
    input: &ClassRemap,
    remap_rule: impl Fn(&mut R) -> bool,
) {
    input.retain_rows(class_sets);
    for set in class_sets.iter_mut() {
        if let Some(rules) = set {
            rules.retain_mut(|rule| remap_rule(rule));
            if rules.is_empty() {
                *set = None;
            }
        }
    }
}

fn no_rules_left<R>(class_sets: &[Option<Vec<R>>]) -> bool {
    class_sets
        .iter()
        .all(|set| set.as_ref().map_or(true, |rules| rules.is_empty()))
}

impl LookupVisitorMut for GlyphDeleter<'_> {
    const OPERATION: &'static str = "delete glyphs";

    fn visit_single_subst(
        &mut self,
        _: LookupKind,
        subtable: &mut SingleSubst,
    ) -> Result<Liveness, OtlError> {
        subtable
            .mapping
            .retain(|input, output| !self.deleted(input) && !self.deleted(output));
        Ok(Liveness::dead_if(subtable.mapping.is_empty()))
    }

    fn visit_multiple_subst(
        &mut self,
        _: LookupKind,
        subtable: &mut MultipleSubst,
    ) -> Result<Liveness, OtlError> {
        subtable.mapping.retain(|input, outputs| {
            !self.deleted(input) && !self.any_deleted(outputs.iter())
        });
        Ok(Liveness::dead_if(subtable.mapping.is_empty()))
    }

    fn visit_alternate_subst(
        &mut self,
        _: LookupKind,
        subtable: &mut AlternateSubst,
    ) -> Result<Liveness, OtlError> {
        subtable.alternates.retain(|input, alternates| {
            alternates.retain(|glyph| !self.deleted(glyph));
            !self.deleted(input) && !alternates.is_empty()
        });
        Ok(Liveness::dead_if(subtable.alternates.is_empty()))
    }

    fn visit_ligature_subst(
        &mut self,
        _: LookupKind,
        subtable: &mut LigatureSubst,
    ) -> Result<Liveness, OtlError> {
        subtable.ligatures.retain(|first, ligatures| {
            ligatures.retain(|ligature| {
                !self.deleted(&ligature.glyph) && !self.any_deleted(ligature.components.iter())
            });
            !self.deleted(first) && !ligatures.is_empty()
        });
        Ok(Liveness::dead_if(subtable.ligatures.is_empty()))
    }

    fn visit_reverse_chain_single_subst(
        &mut self,
        kind: LookupKind,
        subtable: &mut ReverseChainSingleSubst,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        self.retain_parallel_if(
            &mut subtable.coverage,
            &mut subtable.substitutes,
            |substitute| !self.deleted(substitute),
        );
        for coverage in subtable
            .backtrack_coverages
            .iter_mut()
            .chain(subtable.lookahead_coverages.iter_mut())
        {
            self.delete_from_coverage(coverage);
        }
        Ok(Liveness::dead_if(
            subtable.coverage.is_empty()
                || subtable.backtrack_coverages.iter().any(Vec::is_empty)
                || subtable.lookahead_coverages.iter().any(Vec::is_empty),
        ))
    }

    fn visit_single_pos_format1(
        &mut self,
        _: LookupKind,
        subtable: &mut SinglePosFormat1,
    ) -> Result<Liveness, OtlError> {
        self.delete_from_coverage(&mut subtable.coverage);
        Ok(Liveness::dead_if(subtable.coverage.is_empty()))
    }

    fn visit_single_pos_format2(
        &mut self,
        kind: LookupKind,
        subtable: &mut SinglePosFormat2,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        self.retain_parallel(&mut subtable.coverage, &mut subtable.values);
        Ok(Liveness::dead_if(subtable.coverage.is_empty()))
    }

    fn visit_pair_pos_format1(
        &mut self,
        kind: LookupKind,
        subtable: &mut PairPosFormat1,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        for pair_set in subtable.pair_sets.iter_mut() {
            pair_set.retain(|pair| !self.deleted(&pair.second_glyph));
        }
        self.retain_parallel_if(&mut subtable.coverage, &mut subtable.pair_sets, |set| {
            !set.is_empty()
        });
        Ok(Liveness::dead_if(subtable.coverage.is_empty()))
    }

    fn visit_pair_pos_format2(
        &mut self,
        kind: LookupKind,
        subtable: &mut PairPosFormat2,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        self.delete_from_coverage(&mut subtable.coverage);
        let first = self.delete_from_class_def(&mut subtable.class_def1);
        let second = self.delete_from_class_def(&mut subtable.class_def2);
        if !first.is_identity() || !second.is_identity() {
            first.retain_rows(&mut subtable.class1_records);
            for row in subtable.class1_records.iter_mut() {
                second.retain_rows(row);
            }
        }
        // Emptiness of the matrix follows from emptiness of the class definitions
        Ok(Liveness::dead_if(
            subtable.coverage.is_empty()
                || subtable.class_def1.is_empty()
                || subtable.class_def2.is_empty(),
        ))
    }

    fn visit_cursive_pos(
        &mut self,
        kind: LookupKind,
        subtable: &mut CursivePosFormat1,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        self.retain_parallel(&mut subtable.coverage, &mut subtable.entry_exits);
        Ok(Liveness::dead_if(subtable.coverage.is_empty()))
    }

    fn visit_mark_base_pos(
        &mut self,
        kind: LookupKind,
        subtable: &mut MarkBasePosFormat1,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        self.retain_parallel(&mut subtable.mark_coverage, &mut subtable.marks);
        self.retain_parallel(&mut subtable.base_coverage, &mut subtable.bases);
        Ok(Liveness::dead_if(
            subtable.mark_coverage.is_empty() || subtable.base_coverage.is_empty(),
        ))
    }

    fn visit_mark_lig_pos(
        &mut self,
        kind: LookupKind,
        subtable: &mut MarkLigPosFormat1,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        self.retain_parallel(&mut subtable.mark_coverage, &mut subtable.marks);
        self.retain_parallel(&mut subtable.ligature_coverage, &mut subtable.ligatures);
        Ok(Liveness::dead_if(
            subtable.mark_coverage.is_empty() || subtable.ligature_coverage.is_empty(),
        ))
    }

    fn visit_mark_mark_pos(
        &mut self,
        kind: LookupKind,
        subtable: &mut MarkMarkPosFormat1,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        self.retain_parallel(&mut subtable.mark1_coverage, &mut subtable.mark1s);
        self.retain_parallel(&mut subtable.mark2_coverage, &mut subtable.mark2s);
        Ok(Liveness::dead_if(
            subtable.mark1_coverage.is_empty() || subtable.mark2_coverage.is_empty(),
        ))
    }

    fn visit_context_format1(
        &mut self,
        kind: LookupKind,
        subtable: &mut SequenceContextFormat1,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        Ok(self.delete_from_rule_sets(
            &mut subtable.coverage,
            &mut subtable.rule_sets,
            |rule| self.any_deleted(rule.input.iter()),
        ))
    }

    fn visit_context_format2(
        &mut self,
        kind: LookupKind,
        subtable: &mut SequenceContextFormat2,
    ) -> Result<Liveness, OtlError> {
        self.delete_from_coverage(&mut subtable.coverage);
        warn_short_class_sets(kind, &classes_in(&subtable.class_def), &subtable.class_sets);
        let input = self.delete_from_class_def(&mut subtable.class_def);
        if !input.is_identity() {
            remap_class_sets(
                &mut subtable.class_sets,
                &input,
                |rule: &mut ClassSequenceRule| match input.map_sequence(&rule.input) {
                    Some(classes) => {
                        rule.input = classes;
                        true
                    }
                    None => false,
                },
            );
        }
        Ok(Liveness::dead_if(
            subtable.coverage.is_empty() || no_rules_left(&subtable.class_sets),
        ))
    }

    fn visit_context_format3(
        &mut self,
        _: LookupKind,
        subtable: &mut SequenceContextFormat3,
    ) -> Result<Liveness, OtlError> {
        for coverage in subtable.coverages.iter_mut() {
            self.delete_from_coverage(coverage);
        }
        Ok(Liveness::dead_if(
            subtable.coverages.iter().any(Vec::is_empty),
        ))
    }

    fn visit_chain_context_format1(
        &mut self,
        kind: LookupKind,
        subtable: &mut ChainedSequenceContextFormat1,
    ) -> Result<Liveness, OtlError> {
        subtable.check_consistency(kind)?;
        Ok(self.delete_from_rule_sets(
            &mut subtable.coverage,
            &mut subtable.rule_sets,
            |rule| {
                self.any_deleted(
                    rule.backtrack
                        .iter()
                        .chain(rule.input.iter())
                        .chain(rule.lookahead.iter()),
                )
            },
        ))
    }

    fn visit_chain_context_format2(
        &mut self,
        kind: LookupKind,
        subtable: &mut ChainedSequenceContextFormat2,
    ) -> Result<Liveness, OtlError> {
        self.delete_from_coverage(&mut subtable.coverage);
        warn_short_class_sets(
            kind,
            &classes_in(&subtable.input_class_def),
            &subtable.class_sets,
        );
        let backtrack = self.delete_from_class_def(&mut subtable.backtrack_class_def);
        let input = self.delete_from_class_def(&mut subtable.input_class_def);
        let lookahead = self.delete_from_class_def(&mut subtable.lookahead_class_def);
        if !backtrack.is_identity() || !input.is_identity() || !lookahead.is_identity() {
            remap_class_sets(
                &mut subtable.class_sets,
                &input,
                |rule: &mut ChainedClassSequenceRule| {
                    match (
                        backtrack.map_sequence(&rule.backtrack),
                        input.map_sequence(&rule.input),
                        lookahead.map_sequence(&rule.lookahead),
                    ) {
                        (Some(b), Some(i), Some(l)) => {
                            rule.backtrack = b;
                            rule.input = i;
                            rule.lookahead = l;
                            true
                        }
                        _ => false,
                    }
                },
            );
        }
        Ok(Liveness::dead_if(
            subtable.coverage.is_empty() || no_rules_left(&subtable.class_sets),
        ))
    }

    fn visit_chain_context_format3(
        &mut self,
        _: LookupKind,
        subtable: &mut ChainedSequenceContextFormat3,
    ) -> Result<Liveness, OtlError> {
        for coverage in subtable
            .backtrack_coverages
            .iter_mut()
            .chain(subtable.input_coverages.iter_mut())
            .chain(subtable.lookahead_coverages.iter_mut())
        {
            self.delete_from_coverage(coverage);
        }
        Ok(Liveness::dead_if(
            subtable
                .backtrack_coverages
                .iter()
                .chain(subtable.input_coverages.iter())
                .chain(subtable.lookahead_coverages.iter())
                .any(Vec::is_empty),
        ))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        subtable::{
            Anchor, ChainedSequenceRule, Class2Record, Ligature, MarkRecord, PairValueRecord,
            SequenceLookupRecord, SequenceRule, SubTable, ValueRecord,
        },
        table::{FeatureIndex, FeatureRecord, LangSys, Lookup, Script, ScriptRecord, TableTag},
    };
    use pretty_assertions::assert_eq;
    use write_fonts::types::Tag;

    fn glyphs(names: &[&str]) -> BTreeSet<GlyphName> {
        names.iter().map(|n| GlyphName::from(*n)).collect()
    }

    fn coverage(names: &[&str]) -> Coverage {
        names.iter().map(|n| GlyphName::from(*n)).collect()
    }

    fn delete_from(subtable: &mut SubTable, names: &[&str]) -> Liveness {
        let glyphs = glyphs(names);
        GlyphDeleter { glyphs: &glyphs }
            .visit_subtable(subtable)
            .unwrap()
    }

    #[test]
    fn test_single_subst_loses_both_sides() {
        let mut st = SubTable::SingleSubstFormat1(SingleSubst {
            mapping: [
                ("a".into(), "a.sc".into()),
                ("b".into(), "b.sc".into()),
                ("c".into(), "c.sc".into()),
            ]
            .into_iter()
            .collect(),
        });
        assert_eq!(delete_from(&mut st, &["a", "b.sc"]), Liveness::Alive);
        let SubTable::SingleSubstFormat1(single) = &st else {
            panic!("wrong kind");
        };
        assert_eq!(single.mapping.keys().collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(delete_from(&mut st, &["c.sc"]), Liveness::Dead);
    }

    #[test]
    fn test_ligature_component_deletion() {
        let mut st = SubTable::LigatureSubstFormat1(LigatureSubst {
            ligatures: [(
                "f".into(),
                vec![
                    Ligature {
                        glyph: "f_i".into(),
                        components: vec!["i".into()],
                    },
                    Ligature {
                        glyph: "f_l".into(),
                        components: vec!["l".into()],
                    },
                ],
            )]
            .into_iter()
            .collect(),
        });
        assert_eq!(delete_from(&mut st, &["i"]), Liveness::Alive);
        assert_eq!(delete_from(&mut st, &["f_l"]), Liveness::Dead);
    }

    #[test]
    fn test_pair_pos_format1_keeps_arrays_parallel() {
        let pair = |second: &str| PairValueRecord {
            second_glyph: second.into(),
            value1: ValueRecord::x_advance(-20),
            value2: ValueRecord::default(),
        };
        let mut st = SubTable::PairPosFormat1(PairPosFormat1 {
            coverage: coverage(&["A", "T", "V"]),
            pair_sets: vec![vec![pair("V")], vec![pair("o"), pair("a")], vec![pair("A")]],
        });
        assert_eq!(delete_from(&mut st, &["V", "o"]), Liveness::Alive);
        let SubTable::PairPosFormat1(pp) = &st else {
            panic!("wrong kind");
        };
        // A lost its only pair, V was deleted outright
        assert_eq!(pp.coverage, coverage(&["T"]));
        assert_eq!(pp.pair_sets, vec![vec![pair("a")]]);
        st.check_consistency().unwrap();
    }

    #[test]
    fn test_pair_pos_format2_closes_class_gaps() {
        let cell = |v: i16| Class2Record {
            value1: ValueRecord::x_advance(v),
            value2: ValueRecord::default(),
        };
        let mut st = SubTable::PairPosFormat2(PairPosFormat2 {
            coverage: coverage(&["A", "T", "V"]),
            class_def1: [("A".into(), 1), ("T".into(), 2), ("V".into(), 3)]
                .into_iter()
                .collect(),
            class_def2: [("o".into(), 1), ("a".into(), 2)].into_iter().collect(),
            class1_records: vec![
                vec![cell(0), cell(1), cell(2)],
                vec![cell(10), cell(11), cell(12)],
                vec![cell(20), cell(21), cell(22)],
                vec![cell(30), cell(31), cell(32)],
            ],
        });
        assert_eq!(delete_from(&mut st, &["T", "o"]), Liveness::Alive);
        let SubTable::PairPosFormat2(pp) = &st else {
            panic!("wrong kind");
        };
        assert_eq!(pp.coverage, coverage(&["A", "V"]));
        assert_eq!(
            pp.class_def1,
            ClassDef::from_iter([("A".into(), 1), ("V".into(), 2)])
        );
        assert_eq!(pp.class_def2, ClassDef::from_iter([("a".into(), 1)]));
        assert_eq!(
            pp.class1_records,
            vec![
                vec![cell(0), cell(2)],
                vec![cell(10), cell(12)],
                vec![cell(30), cell(32)],
            ]
        );
        st.check_consistency().unwrap();
        assert_eq!(delete_from(&mut st, &["a"]), Liveness::Dead);
    }

    #[test]
    fn test_mark_base_dies_with_either_coverage() {
        let mark = MarkRecord {
            class: 0,
            anchor: Anchor::new(100, 500),
        };
        let mut st = SubTable::MarkBasePosFormat1(MarkBasePosFormat1 {
            mark_coverage: coverage(&["acute", "grave"]),
            base_coverage: coverage(&["a"]),
            marks: vec![mark, mark],
            bases: vec![vec![Some(Anchor::new(250, 450))]],
        });
        assert_eq!(delete_from(&mut st, &["grave"]), Liveness::Alive);
        assert_eq!(delete_from(&mut st, &["a"]), Liveness::Dead);
    }

    #[test]
    fn test_chain_context_format2_class_rules() {
        let rule = |input: Vec<u16>, lookahead: Vec<u16>| ChainedClassSequenceRule {
            backtrack: vec![],
            input,
            lookahead,
            lookup_records: vec![SequenceLookupRecord::new(0, 1)],
        };
        let mut st = SubTable::ChainContextSubstFormat2(ChainedSequenceContextFormat2 {
            coverage: coverage(&["a", "b"]),
            input_class_def: [("a".into(), 1), ("b".into(), 2)].into_iter().collect(),
            lookahead_class_def: [("x".into(), 1), ("y".into(), 2)].into_iter().collect(),
            class_sets: vec![
                None,
                Some(vec![rule(vec![], vec![2])]),
                Some(vec![rule(vec![], vec![1])]),
            ],
            ..Default::default()
        });
        // Drops input class 1 (and its class set) and lookahead class 1
        assert_eq!(delete_from(&mut st, &["a", "x"]), Liveness::Dead);

        let mut st = SubTable::ChainContextSubstFormat2(ChainedSequenceContextFormat2 {
            coverage: coverage(&["a", "b"]),
            input_class_def: [("a".into(), 1), ("b".into(), 2)].into_iter().collect(),
            lookahead_class_def: [("x".into(), 1), ("y".into(), 2)].into_iter().collect(),
            class_sets: vec![
                None,
                Some(vec![rule(vec![], vec![2])]),
                Some(vec![rule(vec![], vec![2])]),
            ],
            ..Default::default()
        });
        assert_eq!(delete_from(&mut st, &["a", "x"]), Liveness::Alive);
        let SubTable::ChainContextSubstFormat2(cc) = &st else {
            panic!("wrong kind");
        };
        assert_eq!(cc.class_sets, vec![None, Some(vec![rule(vec![], vec![1])])]);
        assert_eq!(cc.input_class_def, ClassDef::from_iter([("b".into(), 1)]));
    }

    #[test]
    fn test_context_format1_rules_follow_coverage() {
        let rule = |input: &[&str]| SequenceRule {
            input: coverage(input),
            lookup_records: vec![SequenceLookupRecord::new(0, 1)],
        };
        let mut st = SubTable::ContextPosFormat1(SequenceContextFormat1 {
            coverage: coverage(&["a", "b", "c"]),
            rule_sets: vec![
                Some(vec![rule(&["x"]), rule(&["y"])]),
                Some(vec![rule(&["x"])]),
                Some(vec![rule(&[])]),
            ],
        });
        assert_eq!(delete_from(&mut st, &["x", "c"]), Liveness::Alive);
        let SubTable::ContextPosFormat1(context) = &st else {
            panic!("wrong kind");
        };
        assert_eq!(context.coverage, coverage(&["a"]));
        assert_eq!(context.rule_sets, vec![Some(vec![rule(&["y"])])]);
        assert_eq!(delete_from(&mut st, &["y"]), Liveness::Dead);

        let mut st = SubTable::ChainContextPosFormat1(ChainedSequenceContextFormat1 {
            coverage: coverage(&["a"]),
            rule_sets: vec![Some(vec![ChainedSequenceRule {
                lookahead: coverage(&["period"]),
                lookup_records: vec![SequenceLookupRecord::new(0, 1)],
                ..Default::default()
            }])],
        });
        assert_eq!(delete_from(&mut st, &["period"]), Liveness::Dead);
    }

    #[test]
    fn test_format3_dies_with_any_coverage() {
        let mut st = SubTable::ChainContextPosFormat3(ChainedSequenceContextFormat3 {
            backtrack_coverages: vec![coverage(&["x"])],
            input_coverages: vec![coverage(&["a", "b"])],
            lookahead_coverages: vec![],
            lookup_records: vec![SequenceLookupRecord::new(0, 0)],
        });
        assert_eq!(delete_from(&mut st, &["a"]), Liveness::Alive);
        assert_eq!(delete_from(&mut st, &["x"]), Liveness::Dead);
    }

    #[test]
    fn test_inconsistent_input_is_reported() {
        let mut st = SubTable::CursivePosFormat1(CursivePosFormat1 {
            coverage: coverage(&["a", "b"]),
            entry_exits: vec![],
        });
        let glyphs = glyphs(&["a"]);
        assert!(matches!(
            GlyphDeleter { glyphs: &glyphs }.visit_subtable(&mut st),
            Err(OtlError::InconsistentCoverage {
                kind: LookupKind::CursivePosFormat1,
                ..
            })
        ));
    }

    fn lnum_table() -> OtlTable {
        let mut table = OtlTable::new(TableTag::Gsub);
        table.lookups = vec![Lookup::new(vec![SubTable::SingleSubstFormat1(
            SingleSubst {
                mapping: [("one".into(), "one.lf".into())].into_iter().collect(),
            },
        )])];
        table.features = vec![FeatureRecord::new(b"lnum", &[0])];
        table.scripts = vec![ScriptRecord {
            tag: Tag::new(b"latn"),
            script: Script {
                default_lang_sys: Some(LangSys::new(vec![FeatureIndex(0)])),
                lang_sys: vec![],
            },
        }];
        table
    }

    #[test]
    fn test_deleting_output_glyph_empties_table() {
        let mut table = lnum_table();
        let report = delete_glyphs(&mut table, &glyphs(&["one.lf"])).unwrap();
        assert_eq!(report.removed_lookups, 1);
        assert_eq!(report.removed_features, 1);
        assert_eq!(report.removed_scripts, 1);
        assert!(table.lookups.is_empty());
        assert!(table.features.is_empty());
        assert!(table.scripts.is_empty());
    }

    #[test]
    fn test_failed_deletion_leaves_table_alone() {
        let mut table = lnum_table();
        table.lookups.push(Lookup::new(vec![SubTable::SinglePosFormat2(
            SinglePosFormat2 {
                coverage: coverage(&["one", "two"]),
                values: vec![],
            },
        )]));
        let before = table.clone();
        assert!(delete_glyphs(&mut table, &glyphs(&["one.lf"])).is_err());
        assert_eq!(table, before);
    }
}
