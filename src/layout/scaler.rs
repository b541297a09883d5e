//! Scaling GPOS design-unit values
use crate::{
    error::OtlError,
    layout::visitor::{traverse_mut, unsupported, Liveness, LookupVisitorMut},
    subtable::{
        Anchor, ChainedSequenceContextFormat1, ChainedSequenceContextFormat2,
        ChainedSequenceContextFormat3, CursivePosFormat1, LookupKind, MarkBasePosFormat1,
        MarkLigPosFormat1, MarkMarkPosFormat1, MarkRecord, PairPosFormat1, PairPosFormat2,
        SequenceContextFormat1, SequenceContextFormat2, SequenceContextFormat3,
        SinglePosFormat1, SinglePosFormat2, ValueRecord,
    },
    table::{OtlTable, TableTag},
};

/// Multiply every placement, advance and anchor coordinate in a GPOS table
/// by `factor`, rounding to the nearest unit
///
/// Nothing is restructured; contextual positioning carries no values of its
/// own and is left alone.
pub fn scale_gpos(table: &mut OtlTable, factor: f64) -> Result<(), OtlError> {
    if table.tag != TableTag::Gpos {
        return Err(OtlError::TableMismatch {
            expected: TableTag::Gpos,
            found: table.tag,
        });
    }
    log::info!("Scaling GPOS values by {}", factor);
    let mut working = table.clone();
    traverse_mut(&mut ValueScaler { factor }, &mut working.lookups)?;
    *table = working;
    Ok(())
}

struct ValueScaler {
    factor: f64,
}

impl ValueScaler {
    fn scale(&self, value: i16) -> i16 {
        let scaled = (f64::from(value) * self.factor).round_ties_even();
        // Saturates at the i16 bounds; NaN becomes 0
        scaled as i16
    }

    fn scale_value_record(&self, record: &mut ValueRecord) {
        for field in record.fields_mut() {
            if let Some(value) = field.as_mut() {
                *value = self.scale(*value);
            }
        }
    }

    fn scale_anchor(&self, anchor: &mut Anchor) {
        anchor.x = self.scale(anchor.x);
        anchor.y = self.scale(anchor.y);
    }

    fn scale_anchors<'a>(&self, anchors: impl Iterator<Item = &'a mut Option<Anchor>>) {
        for anchor in anchors.flatten() {
            self.scale_anchor(anchor);
        }
    }

    fn scale_marks(&self, marks: &mut [MarkRecord]) {
        for mark in marks {
            self.scale_anchor(&mut mark.anchor);
        }
    }
}

// Contextual positioning only points at other lookups
macro_rules! contextual_no_op {
    ($($method:ident($ty:ty)),*) => {
        $(
            fn $method(&mut self, kind: LookupKind, _: &mut $ty) -> Result<Liveness, OtlError> {
                if kind.table() != TableTag::Gpos {
                    return unsupported(Self::OPERATION, kind);
                }
                Ok(Liveness::Alive)
            }
        )*
    };
}

impl LookupVisitorMut for ValueScaler {
    const OPERATION: &'static str = "scale GPOS";

    fn visit_single_pos_format1(
        &mut self,
        _: LookupKind,
        subtable: &mut SinglePosFormat1,
    ) -> Result<Liveness, OtlError> {
        self.scale_value_record(&mut subtable.value);
        Ok(Liveness::Alive)
    }

    fn visit_single_pos_format2(
        &mut self,
        _: LookupKind,
        subtable: &mut SinglePosFormat2,
    ) -> Result<Liveness, OtlError> {
        for value in subtable.values.iter_mut() {
            self.scale_value_record(value);
        }
        Ok(Liveness::Alive)
    }

    fn visit_pair_pos_format1(
        &mut self,
        _: LookupKind,
        subtable: &mut PairPosFormat1,
    ) -> Result<Liveness, OtlError> {
        for pair in subtable.pair_sets.iter_mut().flatten() {
            self.scale_value_record(&mut pair.value1);
            self.scale_value_record(&mut pair.value2);
        }
        Ok(Liveness::Alive)
    }

    fn visit_pair_pos_format2(
        &mut self,
        _: LookupKind,
        subtable: &mut PairPosFormat2,
    ) -> Result<Liveness, OtlError> {
        for record in subtable.class1_records.iter_mut().flatten() {
            self.scale_value_record(&mut record.value1);
            self.scale_value_record(&mut record.value2);
        }
        Ok(Liveness::Alive)
    }

    fn visit_cursive_pos(
        &mut self,
        _: LookupKind,
        subtable: &mut CursivePosFormat1,
    ) -> Result<Liveness, OtlError> {
        for record in subtable.entry_exits.iter_mut() {
            self.scale_anchors([&mut record.entry, &mut record.exit].into_iter());
        }
        Ok(Liveness::Alive)
    }

    fn visit_mark_base_pos(
        &mut self,
        _: LookupKind,
        subtable: &mut MarkBasePosFormat1,
    ) -> Result<Liveness, OtlError> {
        self.scale_marks(&mut subtable.marks);
        self.scale_anchors(subtable.bases.iter_mut().flatten());
        Ok(Liveness::Alive)
    }

    fn visit_mark_lig_pos(
        &mut self,
        _: LookupKind,
        subtable: &mut MarkLigPosFormat1,
    ) -> Result<Liveness, OtlError> {
        self.scale_marks(&mut subtable.marks);
        self.scale_anchors(subtable.ligatures.iter_mut().flatten().flatten());
        Ok(Liveness::Alive)
    }

    fn visit_mark_mark_pos(
        &mut self,
        _: LookupKind,
        subtable: &mut MarkMarkPosFormat1,
    ) -> Result<Liveness, OtlError> {
        self.scale_marks(&mut subtable.mark1s);
        self.scale_anchors(subtable.mark2s.iter_mut().flatten());
        Ok(Liveness::Alive)
    }

    contextual_no_op!(
        visit_context_format1(SequenceContextFormat1),
        visit_context_format2(SequenceContextFormat2),
        visit_context_format3(SequenceContextFormat3),
        visit_chain_context_format1(ChainedSequenceContextFormat1),
        visit_chain_context_format2(ChainedSequenceContextFormat2),
        visit_chain_context_format3(ChainedSequenceContextFormat3)
    );
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        subtable::{Class2Record, PairValueRecord, SequenceLookupRecord, SingleSubst, SubTable},
        table::Lookup,
    };
    use pretty_assertions::assert_eq;

    fn kerning() -> OtlTable {
        let mut table = OtlTable::new(TableTag::Gpos);
        table.lookups = vec![
            Lookup::new(vec![SubTable::PairPosFormat1(PairPosFormat1 {
                coverage: vec!["A".into()],
                pair_sets: vec![vec![PairValueRecord {
                    second_glyph: "V".into(),
                    value1: ValueRecord::x_advance(-80),
                    value2: ValueRecord::default(),
                }]],
            })]),
            Lookup::new(vec![SubTable::ExtensionPosFormat1(Box::new(
                SubTable::MarkBasePosFormat1(MarkBasePosFormat1 {
                    mark_coverage: vec!["acute".into()],
                    base_coverage: vec!["a".into()],
                    marks: vec![MarkRecord {
                        class: 0,
                        anchor: Anchor::new(0, 500),
                    }],
                    bases: vec![vec![Some(Anchor::new(251, 449))]],
                }),
            ))]),
            Lookup::new(vec![SubTable::ChainContextPosFormat3(
                ChainedSequenceContextFormat3 {
                    input_coverages: vec![vec!["A".into()]],
                    lookup_records: vec![SequenceLookupRecord::new(0, 0)],
                    ..Default::default()
                },
            )]),
        ];
        table
    }

    fn base_anchor(table: &OtlTable) -> Anchor {
        let Some(SubTable::MarkBasePosFormat1(mb)) = table.lookups[1].subtables[0].extension_inner()
        else {
            panic!("wrong kind");
        };
        mb.bases[0][0].unwrap()
    }

    #[test]
    fn test_scale_values_and_anchors() {
        let mut table = kerning();
        scale_gpos(&mut table, 2.0).unwrap();
        let SubTable::PairPosFormat1(pp) = &table.lookups[0].subtables[0] else {
            panic!("wrong kind");
        };
        assert_eq!(pp.pair_sets[0][0].value1, ValueRecord::x_advance(-160));
        // Unset fields stay unset
        assert_eq!(pp.pair_sets[0][0].value2, ValueRecord::default());
        assert_eq!(base_anchor(&table), Anchor::new(502, 898));
    }

    #[test]
    fn test_scale_rounds_half_to_even() {
        let mut table = kerning();
        scale_gpos(&mut table, 0.5).unwrap();
        // 251 / 2 = 125.5 and 449 / 2 = 224.5
        assert_eq!(base_anchor(&table), Anchor::new(126, 224));
    }

    #[test]
    fn test_scale_is_linear_within_rounding() {
        let mut twice = kerning();
        scale_gpos(&mut twice, 1.5).unwrap();
        scale_gpos(&mut twice, 4.0).unwrap();
        let mut once = kerning();
        scale_gpos(&mut once, 6.0).unwrap();
        let (a, b) = (base_anchor(&twice), base_anchor(&once));
        assert!((a.x - b.x).abs() <= 4);
        assert!((a.y - b.y).abs() <= 4);
    }

    #[test]
    fn test_scale_saturates() {
        let mut table = OtlTable::new(TableTag::Gpos);
        table.lookups = vec![Lookup::new(vec![SubTable::PairPosFormat2(PairPosFormat2 {
            coverage: vec!["A".into()],
            class_def1: Default::default(),
            class_def2: Default::default(),
            class1_records: vec![vec![Class2Record {
                value1: ValueRecord::x_advance(20000),
                value2: ValueRecord::default(),
            }]],
        })])];
        scale_gpos(&mut table, 3.0).unwrap();
        let SubTable::PairPosFormat2(pp) = &table.lookups[0].subtables[0] else {
            panic!("wrong kind");
        };
        assert_eq!(pp.class1_records[0][0].value1.x_advance, Some(i16::MAX));
    }

    #[test]
    fn test_gsub_table_is_rejected() {
        let mut table = OtlTable::new(TableTag::Gsub);
        assert!(matches!(
            scale_gpos(&mut table, 2.0),
            Err(OtlError::TableMismatch {
                expected: TableTag::Gpos,
                found: TableTag::Gsub
            })
        ));
    }

    #[test]
    fn test_substitution_subtable_is_unsupported() {
        let mut table = kerning();
        table.lookups.push(Lookup::new(vec![SubTable::SingleSubstFormat1(
            SingleSubst::default(),
        )]));
        let before = table.clone();
        assert!(matches!(
            scale_gpos(&mut table, 2.0),
            Err(OtlError::UnsupportedLookupKind {
                kind: LookupKind::SingleSubstFormat1,
                ..
            })
        ));
        assert_eq!(table, before);
    }
}
