use std::collections::BTreeSet;

use crate::{
    error::OtlError,
    layout::visitor::{traverse, unsupported, LookupVisitor},
    subtable::{LookupKind, SubTable},
    table::OtlTable,
};

/// The distinct subtable kinds used in a table, looking through extensions
pub fn find_lookup_types(table: &OtlTable) -> Result<BTreeSet<LookupKind>, OtlError> {
    Ok(traverse(&mut LookupTypeFinder, &table.lookups)?
        .into_iter()
        .collect())
}

struct LookupTypeFinder;

impl LookupVisitor for LookupTypeFinder {
    type Output = LookupKind;
    const OPERATION: &'static str = "find lookup types";

    // Every kind is handled the same way, so skip the per-shape dispatch
    fn visit_subtable(&mut self, subtable: &SubTable) -> Result<Vec<LookupKind>, OtlError> {
        let kind = subtable.kind();
        if kind.is_extension() {
            return unsupported(Self::OPERATION, kind);
        }
        Ok(vec![kind])
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        subtable::{PairPosFormat1, SinglePosFormat1},
        table::{Lookup, TableTag},
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup_types() {
        let mut table = OtlTable::new(TableTag::Gpos);
        table.lookups = vec![
            Lookup::new(vec![
                SubTable::SinglePosFormat1(SinglePosFormat1::default()),
                SubTable::ExtensionPosFormat1(Box::new(SubTable::PairPosFormat1(
                    PairPosFormat1::default(),
                ))),
            ]),
            Lookup::new(vec![SubTable::SinglePosFormat1(SinglePosFormat1::default())]),
        ];
        let kinds = find_lookup_types(&table).unwrap();
        assert_eq!(
            kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>(),
            vec!["PairPosFormat1", "SinglePosFormat1"]
        );
    }
}
