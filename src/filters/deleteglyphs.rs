use std::collections::BTreeSet;

use crate::{filters::TableFilter, GlyphName};

/// A filter that removes glyphs from every subtable, pruning whatever is
/// left empty
pub struct DeleteGlyphs(Vec<GlyphName>);

impl DeleteGlyphs {
    /// Create a new DeleteGlyphs filter
    pub fn new(glyph_names: Vec<String>) -> Self {
        DeleteGlyphs(glyph_names.into_iter().map(GlyphName::from).collect())
    }
}

impl TableFilter for DeleteGlyphs {
    fn apply(&self, table: &mut crate::OtlTable) -> Result<(), crate::OtlError> {
        log::info!("Deleting glyphs: {:?}", self.0);
        let glyphs: BTreeSet<GlyphName> = self.0.iter().cloned().collect();
        let report = crate::delete_glyphs(table, &glyphs)?;
        log::debug!("Pruning finished after {} rounds", report.rounds);
        Ok(())
    }

    fn from_str(s: &str) -> Result<Self, crate::OtlError>
    where
        Self: Sized,
    {
        let glyph_names: Vec<String> = s
            .split(',')
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty())
            .collect();
        if glyph_names.is_empty() {
            return Err(crate::OtlError::FilterError(
                "No glyphs given to delete".to_string(),
            ));
        }
        Ok(DeleteGlyphs::new(glyph_names))
    }

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized,
    {
        clap::Arg::new("deleteglyphs")
            .long("delete-glyphs")
            .help("Delete the specified glyphs (comma-separated list)")
            .value_name("GLYPHS")
            .action(clap::ArgAction::Append)
    }
}
