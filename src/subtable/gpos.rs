use serde::{Deserialize, Serialize};

use super::{check_parallel, ClassDef, Coverage, GlyphName, LookupKind};
use crate::error::OtlError;

/// Positioning adjustment, in design units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRecord {
    /// Horizontal placement adjustment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_placement: Option<i16>,
    /// Vertical placement adjustment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_placement: Option<i16>,
    /// Horizontal advance adjustment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_advance: Option<i16>,
    /// Vertical advance adjustment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_advance: Option<i16>,
}

impl ValueRecord {
    /// A record which only adjusts the horizontal advance
    pub fn x_advance(value: i16) -> Self {
        ValueRecord {
            x_advance: Some(value),
            ..Default::default()
        }
    }

    pub(crate) fn fields_mut(&mut self) -> [&mut Option<i16>; 4] {
        [
            &mut self.x_placement,
            &mut self.y_placement,
            &mut self.x_advance,
            &mut self.y_advance,
        ]
    }
}

/// An attachment point, in design units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchor {
    /// X coordinate
    pub x: i16,
    /// Y coordinate
    pub y: i16,
    /// Outline point index (format 2 anchors)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contour_point: Option<u16>,
}

impl Anchor {
    /// A plain format 1 anchor
    pub fn new(x: i16, y: i16) -> Self {
        Anchor {
            x,
            y,
            contour_point: None,
        }
    }
}

/// Single adjustment, the same value for every covered glyph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SinglePosFormat1 {
    /// Glyphs being adjusted
    pub coverage: Coverage,
    /// The adjustment
    pub value: ValueRecord,
}

/// Single adjustment, one value per covered glyph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SinglePosFormat2 {
    /// Glyphs being adjusted
    pub coverage: Coverage,
    /// Adjustments, parallel to `coverage`
    pub values: Vec<ValueRecord>,
}

impl SinglePosFormat2 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "", self.coverage.len(), self.values.len())
    }
}

/// Adjustment for one (first, second) glyph pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairValueRecord {
    /// The second glyph of the pair
    pub second_glyph: GlyphName,
    /// Adjustment for the first glyph
    #[serde(default)]
    pub value1: ValueRecord,
    /// Adjustment for the second glyph
    #[serde(default)]
    pub value2: ValueRecord,
}

/// Pair adjustment by glyph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairPosFormat1 {
    /// First glyphs of the pairs
    pub coverage: Coverage,
    /// Pair sets, parallel to `coverage`
    pub pair_sets: Vec<Vec<PairValueRecord>>,
}

impl PairPosFormat1 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "", self.coverage.len(), self.pair_sets.len())
    }
}

/// One cell of the class-pair matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class2Record {
    /// Adjustment for the first glyph
    #[serde(default)]
    pub value1: ValueRecord,
    /// Adjustment for the second glyph
    #[serde(default)]
    pub value2: ValueRecord,
}

/// Pair adjustment by class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PairPosFormat2 {
    /// First glyphs of the pairs
    pub coverage: Coverage,
    /// Classes of the first glyphs
    pub class_def1: ClassDef,
    /// Classes of the second glyphs
    pub class_def2: ClassDef,
    /// Matrix rows are indexed by first class, columns by second class
    pub class1_records: Vec<Vec<Class2Record>>,
}

impl PairPosFormat2 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        let rows = self.class1_records.len();
        if let Some(class) = self.class_def1.values().find(|c| usize::from(**c) >= rows) {
            return Err(OtlError::InconsistentCoverage {
                kind,
                detail: format!("first class {} but only {} class rows", class, rows),
            });
        }
        let columns = self.class1_records.first().map_or(0, |row| row.len());
        if self.class1_records.iter().any(|row| row.len() != columns) {
            return Err(OtlError::InconsistentCoverage {
                kind,
                detail: "class rows differ in length".to_string(),
            });
        }
        if let Some(class) = self
            .class_def2
            .values()
            .find(|c| usize::from(**c) >= columns)
        {
            return Err(OtlError::InconsistentCoverage {
                kind,
                detail: format!("second class {} but only {} class columns", class, columns),
            });
        }
        Ok(())
    }
}

/// Entry and exit anchors for one cursively attached glyph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryExitRecord {
    /// Entry anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<Anchor>,
    /// Exit anchor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<Anchor>,
}

/// Cursive attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CursivePosFormat1 {
    /// Glyphs being attached
    pub coverage: Coverage,
    /// Entry/exit records, parallel to `coverage`
    pub entry_exits: Vec<EntryExitRecord>,
}

impl CursivePosFormat1 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "", self.coverage.len(), self.entry_exits.len())
    }
}

/// A mark glyph's class and anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkRecord {
    /// Mark class
    pub class: u16,
    /// Attachment point on the mark
    pub anchor: Anchor,
}

/// Mark-to-base attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkBasePosFormat1 {
    /// Mark glyphs
    pub mark_coverage: Coverage,
    /// Base glyphs
    pub base_coverage: Coverage,
    /// Mark records, parallel to `mark_coverage`
    pub marks: Vec<MarkRecord>,
    /// Per base glyph, one anchor per mark class; parallel to `base_coverage`
    pub bases: Vec<Vec<Option<Anchor>>>,
}

impl MarkBasePosFormat1 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "Mark", self.mark_coverage.len(), self.marks.len())?;
        check_parallel(kind, "Base", self.base_coverage.len(), self.bases.len())
    }
}

/// Mark-to-ligature attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkLigPosFormat1 {
    /// Mark glyphs
    pub mark_coverage: Coverage,
    /// Ligature glyphs
    pub ligature_coverage: Coverage,
    /// Mark records, parallel to `mark_coverage`
    pub marks: Vec<MarkRecord>,
    /// Per ligature, per component, one anchor per mark class; parallel to
    /// `ligature_coverage`
    pub ligatures: Vec<Vec<Vec<Option<Anchor>>>>,
}

impl MarkLigPosFormat1 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "Mark", self.mark_coverage.len(), self.marks.len())?;
        check_parallel(
            kind,
            "Ligature",
            self.ligature_coverage.len(),
            self.ligatures.len(),
        )
    }
}

/// Mark-to-mark attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkMarkPosFormat1 {
    /// Attaching marks
    pub mark1_coverage: Coverage,
    /// Base marks
    pub mark2_coverage: Coverage,
    /// Attaching mark records, parallel to `mark1_coverage`
    pub mark1s: Vec<MarkRecord>,
    /// Per base mark, one anchor per mark class; parallel to `mark2_coverage`
    pub mark2s: Vec<Vec<Option<Anchor>>>,
}

impl MarkMarkPosFormat1 {
    pub(crate) fn check_consistency(&self, kind: LookupKind) -> Result<(), OtlError> {
        check_parallel(kind, "Mark1", self.mark1_coverage.len(), self.mark1s.len())?;
        check_parallel(kind, "Mark2", self.mark2_coverage.len(), self.mark2s.len())
    }
}
