use crate::filters::TableFilter;

#[derive(Default)]
/// A filter that sorts the feature list by tag
pub struct SortFeatures;

impl SortFeatures {
    /// Create a new SortFeatures filter
    pub fn new() -> Self {
        SortFeatures
    }
}

impl TableFilter for SortFeatures {
    fn apply(&self, table: &mut crate::OtlTable) -> Result<(), crate::OtlError> {
        log::info!("Sorting feature list");
        crate::sort_feature_list(table)
    }

    fn from_str(_s: &str) -> Result<Self, crate::OtlError>
    where
        Self: Sized,
    {
        Ok(SortFeatures::new())
    }

    #[cfg(feature = "cli")]
    fn arg() -> clap::Arg
    where
        Self: Sized,
    {
        clap::Arg::new("sortfeatures")
            .long("sort-features")
            .help("Sort the feature list by tag")
            .action(clap::ArgAction::SetTrue)
    }
}
