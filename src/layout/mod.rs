//! Operations over the lookup graph
//!
//! Every operation is a visitor over subtables (see [`visitor`]); the
//! mutating ones follow up with a renumbering pass so that no index is left
//! pointing at something which was removed.
pub mod alternates;
pub mod deleter;
pub mod merge;
pub mod nested;
pub(crate) mod prune;
pub mod scaler;
pub mod types;
pub mod visitor;
