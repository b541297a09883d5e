//! Index renumbering
//!
//! Whenever entries are removed from (or reordered within) a lookup list or a
//! feature list, every reference to that list has to be rewritten. A [`Remap`]
//! records, for each old index, the new index it moved to or `None` when the
//! entry no longer exists, so a reference to a deleted node is something every
//! caller has to handle explicitly.
use std::{collections::BTreeSet, fmt::Debug};

use crate::{
    error::OtlError,
    table::{FeatureIndex, LookupIndex},
};

/// A 16-bit index into one of the table's lists
pub trait ListIndex: Copy + Eq + Debug {
    /// Human readable name of the list, used in error messages
    const LIST: &'static str;
    /// Build an index from a raw value
    fn from_u16(value: u16) -> Self;
    /// The raw value of this index
    fn to_u16(self) -> u16;
    /// This index as a list position
    fn position(self) -> usize {
        usize::from(self.to_u16())
    }
}

impl ListIndex for LookupIndex {
    const LIST: &'static str = "lookup";
    fn from_u16(value: u16) -> Self {
        LookupIndex(value)
    }
    fn to_u16(self) -> u16 {
        self.0
    }
}

impl ListIndex for FeatureIndex {
    const LIST: &'static str = "feature";
    fn from_u16(value: u16) -> Self {
        FeatureIndex(value)
    }
    fn to_u16(self) -> u16 {
        self.0
    }
}

pub(crate) fn checked_index<I: ListIndex>(position: usize) -> Result<I, OtlError> {
    u16::try_from(position)
        .map(I::from_u16)
        .map_err(|_| OtlError::IndexOverflow {
            what: I::LIST,
            count: position + 1,
        })
}

/// A mapping from old list positions to new ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remap<I: ListIndex> {
    targets: Vec<Option<I>>,
}

impl<I: ListIndex> Remap<I> {
    /// Wrap an explicit old-to-new table
    pub fn from_targets(targets: Vec<Option<I>>) -> Self {
        Remap { targets }
    }

    /// Every index maps to itself
    pub fn identity(len: usize) -> Result<Self, OtlError> {
        Ok(Remap {
            targets: (0..len)
                .map(|i| checked_index(i).map(Some))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Keep the entries flagged `true`, renumbering them contiguously in order
    pub fn from_retained(keep: impl IntoIterator<Item = bool>) -> Result<Self, OtlError> {
        let mut next = 0;
        let mut targets = vec![];
        for kept in keep {
            if kept {
                targets.push(Some(checked_index(next)?));
                next += 1;
            } else {
                targets.push(None);
            }
        }
        Ok(Remap { targets })
    }

    /// Shift `len` entries up by `by`, as when appending one list to another
    pub fn offset(len: usize, by: usize) -> Result<Self, OtlError> {
        if len + by > usize::from(u16::MAX) + 1 {
            return Err(OtlError::IndexOverflow {
                what: I::LIST,
                count: len + by,
            });
        }
        Ok(Remap {
            targets: (0..len)
                .map(|i| checked_index(i + by).map(Some))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Build the remap for a reordering, where `order[new] == old`
    pub fn from_order(order: &[usize]) -> Result<Self, OtlError> {
        let mut targets = vec![None; order.len()];
        for (new, &old) in order.iter().enumerate() {
            if let Some(slot) = targets.get_mut(old) {
                *slot = Some(checked_index(new)?);
            }
        }
        Ok(Remap { targets })
    }

    /// Where `old` went, or `None` if it was removed or was never valid
    pub fn get(&self, old: I) -> Option<I> {
        self.targets.get(old.position()).copied().flatten()
    }

    /// Number of entries in the old list
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether the old list was empty
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Number of entries which survive
    pub fn retained(&self) -> usize {
        self.targets.iter().filter(|t| t.is_some()).count()
    }

    /// Whether applying this remap changes nothing
    pub fn is_identity(&self) -> bool {
        self.targets
            .iter()
            .enumerate()
            .all(|(i, t)| t.map(|t| t.position()) == Some(i))
    }

    /// Apply `self`, then `next`
    pub fn then(&self, next: &Remap<I>) -> Remap<I> {
        Remap {
            targets: self
                .targets
                .iter()
                .map(|t| t.and_then(|t| next.get(t)))
                .collect(),
        }
    }

    /// Rewrite a list of indices, dropping the ones which no longer exist
    /// and any duplicates this produces
    pub fn apply_to(&self, indices: &mut Vec<I>) {
        let mut seen = BTreeSet::new();
        *indices = indices
            .iter()
            .filter_map(|i| self.get(*i))
            .filter(|i| seen.insert(i.to_u16()))
            .collect();
    }
}

/// Renumbering of classes within a class definition after some classes lost
/// all their glyphs
///
/// Surviving classes keep their relative order and close up the gaps. Class 0
/// is never removed, since it still stands for every glyph the definition
/// does not list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassRemap {
    deleted: BTreeSet<u16>,
}

impl ClassRemap {
    /// Compare the classes in use before and after a deletion
    pub fn between(before: &BTreeSet<u16>, after: &BTreeSet<u16>) -> Self {
        ClassRemap {
            deleted: before.difference(after).copied().filter(|c| *c != 0).collect(),
        }
    }

    /// Whether no class was removed
    pub fn is_identity(&self) -> bool {
        self.deleted.is_empty()
    }

    /// Whether `class` was removed
    pub fn is_deleted(&self, class: u16) -> bool {
        self.deleted.contains(&class)
    }

    /// The removed classes, highest first, which is the order to delete
    /// parallel rows in
    pub fn deleted_descending(&self) -> impl Iterator<Item = u16> + '_ {
        self.deleted.iter().rev().copied()
    }

    /// The new number of `class`, or `None` if it was removed
    pub fn map(&self, class: u16) -> Option<u16> {
        if self.deleted.contains(&class) {
            return None;
        }
        let below = self.deleted.range(..class).count();
        // `below` counts distinct u16 values smaller than `class`, so this cannot underflow
        Some(class - below as u16)
    }

    /// Map every class in a rule sequence, or `None` if any was removed
    pub fn map_sequence(&self, classes: &[u16]) -> Option<Vec<u16>> {
        classes.iter().map(|c| self.map(*c)).collect()
    }

    /// Drop the rows of a class-indexed array belonging to removed classes
    pub fn retain_rows<T>(&self, rows: &mut Vec<T>) {
        for class in self.deleted_descending() {
            let class = usize::from(class);
            if class < rows.len() {
                rows.remove(class);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::BTreeMap;

    fn set(classes: &[u16]) -> BTreeSet<u16> {
        classes.iter().copied().collect()
    }

    #[rstest]
    #[case(&[1, 2, 3], &[1, 2, 3], &[], &[(0, 0), (1, 1), (2, 2), (3, 3)])]
    #[case(&[1, 2, 3], &[1, 3], &[2], &[(0, 0), (1, 1), (3, 2)])]
    #[case(&[1, 2, 3, 4, 5, 6], &[1, 3, 4, 6], &[5, 2], &[(0, 0), (1, 1), (3, 2), (4, 3), (6, 4)])]
    #[case(&[1, 2, 3, 4, 5, 6], &[], &[6, 5, 4, 3, 2, 1], &[(0, 0)])]
    #[case(&[0, 1, 2, 3], &[1, 2], &[3], &[(0, 0), (1, 1), (2, 2)])]
    #[case(&[0, 1, 2, 3], &[], &[3, 2, 1], &[(0, 0)])]
    #[case(&[], &[], &[], &[(0, 0)])]
    fn test_class_remap(
        #[case] before: &[u16],
        #[case] after: &[u16],
        #[case] deleted: &[u16],
        #[case] expected: &[(u16, u16)],
    ) {
        let remap = ClassRemap::between(&set(before), &set(after));
        assert_eq!(remap.deleted_descending().collect::<Vec<_>>(), deleted);
        let highest = before.iter().copied().max().unwrap_or(0);
        let mapped: BTreeMap<u16, u16> = (0..=highest)
            .filter_map(|c| remap.map(c).map(|n| (c, n)))
            .collect();
        assert_eq!(mapped, expected.iter().copied().collect());
    }

    #[test]
    fn test_class_remap_rows() {
        let remap = ClassRemap::between(&set(&[0, 1, 2, 3]), &set(&[0, 2]));
        let mut rows = vec!["zero", "one", "two", "three"];
        remap.retain_rows(&mut rows);
        assert_eq!(rows, vec!["zero", "two"]);
        assert_eq!(remap.map_sequence(&[2, 0]), Some(vec![1, 0]));
        assert_eq!(remap.map_sequence(&[2, 3]), None);
    }

    #[test]
    fn test_retained_is_contiguous() {
        let remap: Remap<LookupIndex> =
            Remap::from_retained([true, false, true, false, true]).unwrap();
        assert_eq!(remap.get(LookupIndex(0)), Some(LookupIndex(0)));
        assert_eq!(remap.get(LookupIndex(1)), None);
        assert_eq!(remap.get(LookupIndex(2)), Some(LookupIndex(1)));
        assert_eq!(remap.get(LookupIndex(4)), Some(LookupIndex(2)));
        assert_eq!(remap.get(LookupIndex(9)), None);
        assert_eq!(remap.retained(), 3);
        assert!(!remap.is_identity());
    }

    #[test]
    fn test_composition() {
        let first: Remap<LookupIndex> = Remap::from_retained([true, false, true, true]).unwrap();
        let second: Remap<LookupIndex> = Remap::from_retained([false, true, true]).unwrap();
        let both = first.then(&second);
        assert_eq!(
            (0..4).map(|i| both.get(LookupIndex(i))).collect::<Vec<_>>(),
            vec![None, None, Some(LookupIndex(0)), Some(LookupIndex(1))]
        );
    }

    #[test]
    fn test_order_and_apply() {
        // new list is [old 2, old 0, old 1]
        let remap: Remap<FeatureIndex> = Remap::from_order(&[2, 0, 1]).unwrap();
        let mut indices = vec![FeatureIndex(0), FeatureIndex(2), FeatureIndex(0)];
        remap.apply_to(&mut indices);
        assert_eq!(indices, vec![FeatureIndex(1), FeatureIndex(0)]);
    }

    #[test]
    fn test_offset_overflow() {
        let offset = Remap::<LookupIndex>::offset(3, 10).unwrap();
        assert_eq!(offset.get(LookupIndex(2)), Some(LookupIndex(12)));
        assert!(matches!(
            Remap::<LookupIndex>::offset(2, 65535),
            Err(OtlError::IndexOverflow { what: "lookup", .. })
        ));
        assert!(Remap::<LookupIndex>::identity(4).unwrap().is_identity());
    }
}
