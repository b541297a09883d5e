use std::path::PathBuf;

use crate::filters::TableFilter;

/// A filter that merges the features of another table, read from a JSON
/// file, into this one
pub struct MergeFeatures(PathBuf);

impl MergeFeatures {
    /// Create a new MergeFeatures filter
    pub fn new(path: impl Into<PathBuf>) -> Self {
        MergeFeatures(path.into())
    }
}

impl TableFilter for MergeFeatures {
    fn apply(&self, table: &mut crate::OtlTable) -> Result<(), crate::OtlError> {
        log::info!("Merging features from {}", self.0.display());
        let other = crate::OtlTable::load(&self.0)?;
        crate::merge_features(table, other)
    }

    fn from_str(s: &str) -> Result<Self, crate::OtlError>
    where
        Self: Sized,
    {
        Ok(MergeFeatures::new(s))
    }

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized,
    {
        clap::Arg::new("mergefeatures")
            .long("merge-features")
            .help("Merge the lookups and features of another table of the same kind")
            .value_name("TABLE")
            .action(clap::ArgAction::Append)
    }
}
