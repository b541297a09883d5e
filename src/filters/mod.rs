/// Declare the table filters, their modules and their CLI names together
///
/// Usage: `declare_filters! { TypeName(module_name) => "cli_name", ... }`
macro_rules! declare_filters {
    ($($type:ident($module:ident) => $name:literal),* $(,)?) => {
        $(mod $module;)*
        pub use self::{$($module::$type),*};

        /// Command-line names of every table filter, in declaration order
        pub const FILTER_NAMES: &[&str] = &[$($name),*];

        // One clap argument per filter, grouped so main can recover their order
        #[cfg(feature = "cli")]
        #[doc="Add filter arguments to a clap Command"]
        pub fn filter_group(command: clap::Command) -> clap::Command {
            let args = [$($type::arg()),*];
            let ids: Vec<_> = args.iter().map(|arg| arg.get_id().clone()).collect();
            command
                .next_help_heading("Table filters")
                .args(args)
                .group(clap::ArgGroup::new("filters").args(ids).multiple(true))
        }

        /// Build the filter registered under `name` from its string argument
        pub fn cli_to_filter(
            name: &str,
            arg: &str,
        ) -> Result<Box<dyn TableFilter>, crate::OtlError> {
            match name {
                $($name => Ok(Box::new($type::from_str(arg)?)),)*
                _ => Err(crate::OtlError::FilterError(format!(
                    "Unknown filter: {} (expected one of {})",
                    name,
                    FILTER_NAMES.join(", ")
                ))),
            }
        }
    };
}

declare_filters! {
    DeleteGlyphs(deleteglyphs) => "deleteglyphs",
    ScaleGpos(scalegpos) => "scalegpos",
    MergeFeatures(mergefeatures) => "mergefeatures",
    SortFeatures(sortfeatures) => "sortfeatures",
}

/// A trait for edits that can be applied to a layout table
pub trait TableFilter {
    /// Apply the filter to the given table
    fn apply(&self, table: &mut crate::OtlTable) -> Result<(), crate::OtlError>;

    /// Parse a TableFilter from a string argument
    fn from_str(s: &str) -> Result<Self, crate::OtlError>
    where
        Self: Sized;

    #[cfg(feature = "cli")]
    /// Get the clap argument for this filter
    fn arg() -> clap::Arg
    where
        Self: Sized;
}
