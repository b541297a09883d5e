//! Lookups referenced from inside contextual rules
//!
//! Contextual subtables do their work by invoking other lookups at positions
//! of the matched sequence. Those references are found here, and rewritten
//! here when the lookup list is renumbered.
use std::collections::BTreeSet;

use crate::{
    error::OtlError,
    layout::visitor::{traverse, traverse_mut, Liveness, LookupVisitor, LookupVisitorMut},
    remap::Remap,
    subtable::{
        AlternateSubst, ChainedSequenceContextFormat1, ChainedSequenceContextFormat2,
        ChainedSequenceContextFormat3, Coverage, CursivePosFormat1, LigatureSubst, LookupKind,
        LookupRecords, MarkBasePosFormat1, MarkLigPosFormat1, MarkMarkPosFormat1, MultipleSubst,
        PairPosFormat1, PairPosFormat2, ReverseChainSingleSubst, SequenceContextFormat1,
        SequenceContextFormat2, SequenceContextFormat3, SequenceLookupRecord, SinglePosFormat1,
        SinglePosFormat2, SingleSubst,
    },
    table::{LookupIndex, OtlTable, SubTableId},
};

// Subtables which cannot hold nested lookup references
macro_rules! no_nested_lookups {
    ($($method:ident($ty:ty)),*) => {
        $(
            fn $method(&mut self, _: LookupKind, _: &$ty) -> Result<Vec<Self::Output>, OtlError> {
                Ok(vec![])
            }
        )*
    };
}

macro_rules! always_alive {
    ($($method:ident($ty:ty)),*) => {
        $(
            fn $method(&mut self, _: LookupKind, _: &mut $ty) -> Result<Liveness, OtlError> {
                Ok(Liveness::Alive)
            }
        )*
    };
}

/// Every (owning subtable, referenced lookup) pair in the table
pub(crate) fn find_nested_references(
    table: &OtlTable,
) -> Result<Vec<(SubTableId, LookupIndex)>, OtlError> {
    traverse(&mut NestedLookupFinder::default(), &table.lookups)
}

/// The lookups which are referenced from inside contextual rules
pub fn find_nested_lookups(table: &OtlTable) -> Result<BTreeSet<LookupIndex>, OtlError> {
    Ok(find_nested_references(table)?
        .into_iter()
        .map(|(_, lookup)| lookup)
        .collect())
}

/// Rewrite every nested lookup reference through `remap`
///
/// References to lookups which no longer exist are dropped, along with rules
/// left with nothing to do. Returns the contextual subtables which lost all
/// their rules this way.
pub fn remap_nested_lookups(
    table: &mut OtlTable,
    remap: &Remap<LookupIndex>,
) -> Result<Vec<SubTableId>, OtlError> {
    let dead = traverse_mut(&mut NestedLookupRemapper { remap }, &mut table.lookups)?;
    for id in &dead {
        log::debug!("Contextual {} has no nested lookups left", id);
    }
    Ok(dead)
}

#[derive(Default)]
struct NestedLookupFinder {
    current: SubTableId,
}

impl NestedLookupFinder {
    fn references<'a, R: LookupRecords + 'a>(
        &self,
        rules: impl Iterator<Item = &'a R>,
    ) -> Vec<(SubTableId, LookupIndex)> {
        rules
            .flat_map(|rule| rule.lookup_records().iter())
            .map(|record| (self.current, record.lookup_index))
            .collect()
    }
}

impl LookupVisitor for NestedLookupFinder {
    type Output = (SubTableId, LookupIndex);
    const OPERATION: &'static str = "find nested lookups";

    fn enter_subtable(&mut self, id: SubTableId) {
        self.current = id;
    }

    no_nested_lookups!(
        visit_single_subst(SingleSubst),
        visit_multiple_subst(MultipleSubst),
        visit_alternate_subst(AlternateSubst),
        visit_ligature_subst(LigatureSubst),
        visit_reverse_chain_single_subst(ReverseChainSingleSubst),
        visit_single_pos_format1(SinglePosFormat1),
        visit_single_pos_format2(SinglePosFormat2),
        visit_pair_pos_format1(PairPosFormat1),
        visit_pair_pos_format2(PairPosFormat2),
        visit_cursive_pos(CursivePosFormat1),
        visit_mark_base_pos(MarkBasePosFormat1),
        visit_mark_lig_pos(MarkLigPosFormat1),
        visit_mark_mark_pos(MarkMarkPosFormat1)
    );

    fn visit_context_format1(
        &mut self,
        _: LookupKind,
        subtable: &SequenceContextFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        Ok(self.references(subtable.rule_sets.iter().flatten().flatten()))
    }
    fn visit_context_format2(
        &mut self,
        _: LookupKind,
        subtable: &SequenceContextFormat2,
    ) -> Result<Vec<Self::Output>, OtlError> {
        Ok(self.references(subtable.class_sets.iter().flatten().flatten()))
    }
    fn visit_context_format3(
        &mut self,
        _: LookupKind,
        subtable: &SequenceContextFormat3,
    ) -> Result<Vec<Self::Output>, OtlError> {
        Ok(self.references(std::iter::once(subtable)))
    }
    fn visit_chain_context_format1(
        &mut self,
        _: LookupKind,
        subtable: &ChainedSequenceContextFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        Ok(self.references(subtable.rule_sets.iter().flatten().flatten()))
    }
    fn visit_chain_context_format2(
        &mut self,
        _: LookupKind,
        subtable: &ChainedSequenceContextFormat2,
    ) -> Result<Vec<Self::Output>, OtlError> {
        Ok(self.references(subtable.class_sets.iter().flatten().flatten()))
    }
    fn visit_chain_context_format3(
        &mut self,
        _: LookupKind,
        subtable: &ChainedSequenceContextFormat3,
    ) -> Result<Vec<Self::Output>, OtlError> {
        Ok(self.references(std::iter::once(subtable)))
    }
}

struct NestedLookupRemapper<'a> {
    remap: &'a Remap<LookupIndex>,
}

impl NestedLookupRemapper<'_> {
    fn remap_records(&self, records: &mut Vec<SequenceLookupRecord>) {
        records.retain_mut(|record| match self.remap.get(record.lookup_index) {
            Some(new) => {
                record.lookup_index = new;
                true
            }
            None => false,
        });
    }

    /// Remap the rules of a format 1 or 2 subtable. Rules which never had
    /// nested lookups are left alone; rules which lose all of theirs are
    /// dropped, and a rule set with no rules left becomes null.
    fn remap_rule_sets<R: LookupRecords>(&self, sets: &mut [Option<Vec<R>>]) -> Liveness {
        let mut dropped_any = false;
        for set in sets.iter_mut() {
            let Some(rules) = set else {
                continue;
            };
            let before = rules.len();
            rules.retain_mut(|rule| {
                if rule.lookup_records().is_empty() {
                    return true;
                }
                self.remap_records(rule.lookup_records_mut());
                !rule.lookup_records().is_empty()
            });
            dropped_any |= rules.len() != before;
            if rules.is_empty() {
                *set = None;
            }
        }
        Liveness::dead_if(dropped_any && sets.iter().all(Option::is_none))
    }

    /// As [`remap_rule_sets`](Self::remap_rule_sets) for rule sets parallel
    /// to a coverage: a glyph whose rule set this empties leaves the coverage
    /// with it
    fn remap_covered_rule_sets<R: LookupRecords>(
        &self,
        coverage: &mut Coverage,
        sets: &mut Vec<Option<Vec<R>>>,
    ) -> Liveness {
        let was_null: Vec<bool> = sets.iter().map(Option::is_none).collect();
        let liveness = self.remap_rule_sets(sets);
        let keep: Vec<bool> = sets
            .iter()
            .zip(was_null)
            .map(|(set, was_null)| was_null || set.is_some())
            .collect();
        let mut coverage_flags = keep.iter();
        coverage.retain(|_| coverage_flags.next().copied().unwrap_or(true));
        let mut set_flags = keep.iter();
        sets.retain(|_| set_flags.next().copied().unwrap_or(true));
        liveness
    }

    fn remap_flat<R: LookupRecords>(&self, subtable: &mut R) -> Liveness {
        if subtable.lookup_records().is_empty() {
            return Liveness::Alive;
        }
        self.remap_records(subtable.lookup_records_mut());
        Liveness::dead_if(subtable.lookup_records().is_empty())
    }
}

impl LookupVisitorMut for NestedLookupRemapper<'_> {
    const OPERATION: &'static str = "remap nested lookups";

    always_alive!(
        visit_single_subst(SingleSubst),
        visit_multiple_subst(MultipleSubst),
        visit_alternate_subst(AlternateSubst),
        visit_ligature_subst(LigatureSubst),
        visit_reverse_chain_single_subst(ReverseChainSingleSubst),
        visit_single_pos_format1(SinglePosFormat1),
        visit_single_pos_format2(SinglePosFormat2),
        visit_pair_pos_format1(PairPosFormat1),
        visit_pair_pos_format2(PairPosFormat2),
        visit_cursive_pos(CursivePosFormat1),
        visit_mark_base_pos(MarkBasePosFormat1),
        visit_mark_lig_pos(MarkLigPosFormat1),
        visit_mark_mark_pos(MarkMarkPosFormat1)
    );

    fn visit_context_format1(
        &mut self,
        _: LookupKind,
        subtable: &mut SequenceContextFormat1,
    ) -> Result<Liveness, OtlError> {
        Ok(self.remap_covered_rule_sets(&mut subtable.coverage, &mut subtable.rule_sets))
    }
    fn visit_context_format2(
        &mut self,
        _: LookupKind,
        subtable: &mut SequenceContextFormat2,
    ) -> Result<Liveness, OtlError> {
        Ok(self.remap_rule_sets(&mut subtable.class_sets))
    }
    fn visit_context_format3(
        &mut self,
        _: LookupKind,
        subtable: &mut SequenceContextFormat3,
    ) -> Result<Liveness, OtlError> {
        Ok(self.remap_flat(subtable))
    }
    fn visit_chain_context_format1(
        &mut self,
        _: LookupKind,
        subtable: &mut ChainedSequenceContextFormat1,
    ) -> Result<Liveness, OtlError> {
        Ok(self.remap_covered_rule_sets(&mut subtable.coverage, &mut subtable.rule_sets))
    }
    fn visit_chain_context_format2(
        &mut self,
        _: LookupKind,
        subtable: &mut ChainedSequenceContextFormat2,
    ) -> Result<Liveness, OtlError> {
        Ok(self.remap_rule_sets(&mut subtable.class_sets))
    }
    fn visit_chain_context_format3(
        &mut self,
        _: LookupKind,
        subtable: &mut ChainedSequenceContextFormat3,
    ) -> Result<Liveness, OtlError> {
        Ok(self.remap_flat(subtable))
    }
}
