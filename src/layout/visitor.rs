use crate::{
    error::OtlError,
    subtable::{
        AlternateSubst, ChainedSequenceContextFormat1, ChainedSequenceContextFormat2,
        ChainedSequenceContextFormat3, CursivePosFormat1, LigatureSubst, LookupKind,
        MarkBasePosFormat1, MarkLigPosFormat1, MarkMarkPosFormat1, MultipleSubst,
        PairPosFormat1, PairPosFormat2, ReverseChainSingleSubst, SequenceContextFormat1,
        SequenceContextFormat2, SequenceContextFormat3, SinglePosFormat1, SinglePosFormat2,
        SingleSubst, SubTable,
    },
    table::{Lookup, SubTableId},
};

/// What a mutating visitor found a subtable to be after it was done with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// The subtable still does something
    Alive,
    /// The subtable is now empty of functional content and should be pruned
    Dead,
}

impl Liveness {
    /// `Dead` if `condition` holds
    pub fn dead_if(condition: bool) -> Self {
        if condition {
            Liveness::Dead
        } else {
            Liveness::Alive
        }
    }
}

pub(crate) fn unsupported<T>(operation: &'static str, kind: LookupKind) -> Result<T, OtlError> {
    Err(OtlError::UnsupportedLookupKind { operation, kind })
}

/// Read-only visitor over subtables
///
/// Each handler returns the per-subtable results, which [`traverse`]
/// concatenates. The default for every handler is to fail: an operation has
/// to opt in to each subtable shape it understands.
#[allow(unused_variables)]
pub trait LookupVisitor {
    /// What this visitor collects
    type Output;
    /// Name of the operation, used in errors
    const OPERATION: &'static str;

    /// Called before each subtable is dispatched
    fn enter_subtable(&mut self, id: SubTableId) {}

    fn visit_single_subst(
        &mut self,
        kind: LookupKind,
        subtable: &SingleSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_multiple_subst(
        &mut self,
        kind: LookupKind,
        subtable: &MultipleSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_alternate_subst(
        &mut self,
        kind: LookupKind,
        subtable: &AlternateSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_ligature_subst(
        &mut self,
        kind: LookupKind,
        subtable: &LigatureSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_reverse_chain_single_subst(
        &mut self,
        kind: LookupKind,
        subtable: &ReverseChainSingleSubst,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_single_pos_format1(
        &mut self,
        kind: LookupKind,
        subtable: &SinglePosFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_single_pos_format2(
        &mut self,
        kind: LookupKind,
        subtable: &SinglePosFormat2,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_pair_pos_format1(
        &mut self,
        kind: LookupKind,
        subtable: &PairPosFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_pair_pos_format2(
        &mut self,
        kind: LookupKind,
        subtable: &PairPosFormat2,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_cursive_pos(
        &mut self,
        kind: LookupKind,
        subtable: &CursivePosFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_mark_base_pos(
        &mut self,
        kind: LookupKind,
        subtable: &MarkBasePosFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_mark_lig_pos(
        &mut self,
        kind: LookupKind,
        subtable: &MarkLigPosFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_mark_mark_pos(
        &mut self,
        kind: LookupKind,
        subtable: &MarkMarkPosFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_context_format1(
        &mut self,
        kind: LookupKind,
        subtable: &SequenceContextFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_context_format2(
        &mut self,
        kind: LookupKind,
        subtable: &SequenceContextFormat2,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_context_format3(
        &mut self,
        kind: LookupKind,
        subtable: &SequenceContextFormat3,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_chain_context_format1(
        &mut self,
        kind: LookupKind,
        subtable: &ChainedSequenceContextFormat1,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_chain_context_format2(
        &mut self,
        kind: LookupKind,
        subtable: &ChainedSequenceContextFormat2,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_chain_context_format3(
        &mut self,
        kind: LookupKind,
        subtable: &ChainedSequenceContextFormat3,
    ) -> Result<Vec<Self::Output>, OtlError> {
        unsupported(Self::OPERATION, kind)
    }

    /// Dispatch one (already unwrapped) subtable to its handler
    fn visit_subtable(&mut self, subtable: &SubTable) -> Result<Vec<Self::Output>, OtlError> {
        let kind = subtable.kind();
        match subtable {
            SubTable::SingleSubstFormat1(st) | SubTable::SingleSubstFormat2(st) => {
                self.visit_single_subst(kind, st)
            }
            SubTable::MultipleSubstFormat1(st) => self.visit_multiple_subst(kind, st),
            SubTable::AlternateSubstFormat1(st) => self.visit_alternate_subst(kind, st),
            SubTable::LigatureSubstFormat1(st) => self.visit_ligature_subst(kind, st),
            SubTable::ReverseChainSingleSubstFormat1(st) => {
                self.visit_reverse_chain_single_subst(kind, st)
            }
            SubTable::SinglePosFormat1(st) => self.visit_single_pos_format1(kind, st),
            SubTable::SinglePosFormat2(st) => self.visit_single_pos_format2(kind, st),
            SubTable::PairPosFormat1(st) => self.visit_pair_pos_format1(kind, st),
            SubTable::PairPosFormat2(st) => self.visit_pair_pos_format2(kind, st),
            SubTable::CursivePosFormat1(st) => self.visit_cursive_pos(kind, st),
            SubTable::MarkBasePosFormat1(st) => self.visit_mark_base_pos(kind, st),
            SubTable::MarkLigPosFormat1(st) => self.visit_mark_lig_pos(kind, st),
            SubTable::MarkMarkPosFormat1(st) => self.visit_mark_mark_pos(kind, st),
            SubTable::ContextSubstFormat1(st) | SubTable::ContextPosFormat1(st) => {
                self.visit_context_format1(kind, st)
            }
            SubTable::ContextSubstFormat2(st) | SubTable::ContextPosFormat2(st) => {
                self.visit_context_format2(kind, st)
            }
            SubTable::ContextSubstFormat3(st) | SubTable::ContextPosFormat3(st) => {
                self.visit_context_format3(kind, st)
            }
            SubTable::ChainContextSubstFormat1(st) | SubTable::ChainContextPosFormat1(st) => {
                self.visit_chain_context_format1(kind, st)
            }
            SubTable::ChainContextSubstFormat2(st) | SubTable::ChainContextPosFormat2(st) => {
                self.visit_chain_context_format2(kind, st)
            }
            SubTable::ChainContextSubstFormat3(st) | SubTable::ChainContextPosFormat3(st) => {
                self.visit_chain_context_format3(kind, st)
            }
            // Only reachable for an extension nested inside another extension
            SubTable::ExtensionSubstFormat1(_) | SubTable::ExtensionPosFormat1(_) => {
                unsupported(Self::OPERATION, kind)
            }
        }
    }
}

/// Mutating visitor over subtables
///
/// Handlers edit the subtable in place and report whether anything is left
/// of it. As with [`LookupVisitor`], unhandled shapes fail.
#[allow(unused_variables)]
pub trait LookupVisitorMut {
    /// Name of the operation, used in errors
    const OPERATION: &'static str;

    /// Called before each subtable is dispatched
    fn enter_subtable(&mut self, id: SubTableId) {}

    fn visit_single_subst(
        &mut self,
        kind: LookupKind,
        subtable: &mut SingleSubst,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_multiple_subst(
        &mut self,
        kind: LookupKind,
        subtable: &mut MultipleSubst,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_alternate_subst(
        &mut self,
        kind: LookupKind,
        subtable: &mut AlternateSubst,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_ligature_subst(
        &mut self,
        kind: LookupKind,
        subtable: &mut LigatureSubst,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_reverse_chain_single_subst(
        &mut self,
        kind: LookupKind,
        subtable: &mut ReverseChainSingleSubst,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_single_pos_format1(
        &mut self,
        kind: LookupKind,
        subtable: &mut SinglePosFormat1,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_single_pos_format2(
        &mut self,
        kind: LookupKind,
        subtable: &mut SinglePosFormat2,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_pair_pos_format1(
        &mut self,
        kind: LookupKind,
        subtable: &mut PairPosFormat1,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_pair_pos_format2(
        &mut self,
        kind: LookupKind,
        subtable: &mut PairPosFormat2,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_cursive_pos(
        &mut self,
        kind: LookupKind,
        subtable: &mut CursivePosFormat1,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_mark_base_pos(
        &mut self,
        kind: LookupKind,
        subtable: &mut MarkBasePosFormat1,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_mark_lig_pos(
        &mut self,
        kind: LookupKind,
        subtable: &mut MarkLigPosFormat1,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_mark_mark_pos(
        &mut self,
        kind: LookupKind,
        subtable: &mut MarkMarkPosFormat1,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_context_format1(
        &mut self,
        kind: LookupKind,
        subtable: &mut SequenceContextFormat1,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_context_format2(
        &mut self,
        kind: LookupKind,
        subtable: &mut SequenceContextFormat2,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_context_format3(
        &mut self,
        kind: LookupKind,
        subtable: &mut SequenceContextFormat3,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_chain_context_format1(
        &mut self,
        kind: LookupKind,
        subtable: &mut ChainedSequenceContextFormat1,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_chain_context_format2(
        &mut self,
        kind: LookupKind,
        subtable: &mut ChainedSequenceContextFormat2,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }
    fn visit_chain_context_format3(
        &mut self,
        kind: LookupKind,
        subtable: &mut ChainedSequenceContextFormat3,
    ) -> Result<Liveness, OtlError> {
        unsupported(Self::OPERATION, kind)
    }

    /// Dispatch one (already unwrapped) subtable to its handler
    fn visit_subtable(&mut self, subtable: &mut SubTable) -> Result<Liveness, OtlError> {
        let kind = subtable.kind();
        match subtable {
            SubTable::SingleSubstFormat1(st) | SubTable::SingleSubstFormat2(st) => {
                self.visit_single_subst(kind, st)
            }
            SubTable::MultipleSubstFormat1(st) => self.visit_multiple_subst(kind, st),
            SubTable::AlternateSubstFormat1(st) => self.visit_alternate_subst(kind, st),
            SubTable::LigatureSubstFormat1(st) => self.visit_ligature_subst(kind, st),
            SubTable::ReverseChainSingleSubstFormat1(st) => {
                self.visit_reverse_chain_single_subst(kind, st)
            }
            SubTable::SinglePosFormat1(st) => self.visit_single_pos_format1(kind, st),
            SubTable::SinglePosFormat2(st) => self.visit_single_pos_format2(kind, st),
            SubTable::PairPosFormat1(st) => self.visit_pair_pos_format1(kind, st),
            SubTable::PairPosFormat2(st) => self.visit_pair_pos_format2(kind, st),
            SubTable::CursivePosFormat1(st) => self.visit_cursive_pos(kind, st),
            SubTable::MarkBasePosFormat1(st) => self.visit_mark_base_pos(kind, st),
            SubTable::MarkLigPosFormat1(st) => self.visit_mark_lig_pos(kind, st),
            SubTable::MarkMarkPosFormat1(st) => self.visit_mark_mark_pos(kind, st),
            SubTable::ContextSubstFormat1(st) | SubTable::ContextPosFormat1(st) => {
                self.visit_context_format1(kind, st)
            }
            SubTable::ContextSubstFormat2(st) | SubTable::ContextPosFormat2(st) => {
                self.visit_context_format2(kind, st)
            }
            SubTable::ContextSubstFormat3(st) | SubTable::ContextPosFormat3(st) => {
                self.visit_context_format3(kind, st)
            }
            SubTable::ChainContextSubstFormat1(st) | SubTable::ChainContextPosFormat1(st) => {
                self.visit_chain_context_format1(kind, st)
            }
            SubTable::ChainContextSubstFormat2(st) | SubTable::ChainContextPosFormat2(st) => {
                self.visit_chain_context_format2(kind, st)
            }
            SubTable::ChainContextSubstFormat3(st) | SubTable::ChainContextPosFormat3(st) => {
                self.visit_chain_context_format3(kind, st)
            }
            SubTable::ExtensionSubstFormat1(_) | SubTable::ExtensionPosFormat1(_) => {
                unsupported(Self::OPERATION, kind)
            }
        }
    }
}

/// Look through one level of extension wrapping
fn unwrap_extension(subtable: &SubTable) -> &SubTable {
    subtable.extension_inner().unwrap_or(subtable)
}

fn unwrap_extension_mut(subtable: &mut SubTable) -> &mut SubTable {
    match subtable {
        SubTable::ExtensionSubstFormat1(inner) | SubTable::ExtensionPosFormat1(inner) => {
            inner.as_mut()
        }
        other => other,
    }
}

/// Walk every subtable of every lookup in order, concatenating the results
pub fn traverse<V: LookupVisitor + ?Sized>(
    visitor: &mut V,
    lookups: &[Lookup],
) -> Result<Vec<V::Output>, OtlError> {
    let mut results = vec![];
    for (lookup_index, lookup) in lookups.iter().enumerate() {
        for (subtable_index, subtable) in lookup.subtables.iter().enumerate() {
            visitor.enter_subtable(subtable_id(lookup_index, subtable_index)?);
            results.extend(visitor.visit_subtable(unwrap_extension(subtable))?);
        }
    }
    Ok(results)
}

/// Walk every subtable of every lookup in order, letting the visitor edit
/// them, and return the subtables it reported dead
pub fn traverse_mut<V: LookupVisitorMut + ?Sized>(
    visitor: &mut V,
    lookups: &mut [Lookup],
) -> Result<Vec<SubTableId>, OtlError> {
    let mut dead = vec![];
    for (lookup_index, lookup) in lookups.iter_mut().enumerate() {
        for (subtable_index, subtable) in lookup.subtables.iter_mut().enumerate() {
            let id = subtable_id(lookup_index, subtable_index)?;
            visitor.enter_subtable(id);
            if visitor.visit_subtable(unwrap_extension_mut(subtable))? == Liveness::Dead {
                dead.push(id);
            }
        }
    }
    Ok(dead)
}

fn subtable_id(lookup: usize, subtable: usize) -> Result<SubTableId, OtlError> {
    let lookup = u16::try_from(lookup).map_err(|_| OtlError::IndexOverflow {
        what: "lookup",
        count: lookup + 1,
    })?;
    Ok(SubTableId::new(lookup, subtable))
}
