#![deny(clippy::unwrap_used, clippy::expect_used)]
//! Editing the lookup graph of OpenType GSUB and GPOS tables
//!
//! A layout table is a graph held together by indices: scripts and language
//! systems select features, features list lookups, and contextual subtables
//! invoke further lookups. This crate answers questions about that graph
//! (which subtable kinds are used, which glyphs are reachable through
//! substitution, which lookups are only reached through other lookups) and
//! edits it (deleting glyphs, scaling positioning values, merging tables)
//! while keeping every index valid.
//!
//! ```no_run
//! use std::collections::BTreeSet;
//!
//! let mut gsub = otlgraph::OtlTable::load("GSUB.json")?;
//! let alternates = otlgraph::find_single_subst_alts(&gsub)?;
//! println!("{:?}", alternates.get("one"));
//! let deleted = BTreeSet::from([otlgraph::GlyphName::from("one.lf")]);
//! otlgraph::delete_glyphs(&mut gsub, &deleted)?;
//! gsub.save("GSUB-subset.json")?;
//! # Ok::<(), otlgraph::OtlError>(())
//! ```

mod error;
pub mod filters;
pub mod layout;
pub mod remap;
pub mod subtable;
mod table;

pub use crate::{
    error::OtlError,
    layout::{
        alternates::{
            find_alternate_glyphs, find_alternate_glyphs_and_features, find_single_subst_alts,
            AlternateMap, FeatureAlternate,
        },
        deleter::delete_glyphs,
        merge::{merge_features, sort_feature_list},
        nested::{find_nested_lookups, remap_nested_lookups},
        prune::PruneReport,
        scaler::scale_gpos,
        types::find_lookup_types,
    },
    subtable::{ClassDef, Coverage, GlyphName, LookupKind, SubTable},
    table::{
        Feature, FeatureIndex, FeatureRecord, LangSys, LangSysRecord, Lookup, LookupIndex,
        OtlTable, Script, ScriptRecord, SubTableId, TableTag,
    },
};
pub use write_fonts::types::Tag;
