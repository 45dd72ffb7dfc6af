//! Condensed-tree construction and cluster selection for HDBSCAN-style
//! hierarchies.
//!
//! The input is a single-linkage merge tree assembled with
//! [`MergeTreeBuilder`] or [`MergeTree::from_merges`]. [`Extractor::run`]
//! condenses it with a minimum cluster size, selects the most stable
//! non-overlapping clusters, and exports per-point assignments alongside the
//! condensed hierarchy. The individual passes are also available as methods
//! on [`MergeTree`].
#![cfg_attr(docsrs, feature(doc_cfg))]

mod builder;
mod error;
mod extractor;
mod hierarchy;
mod result;
mod tree;

#[cfg(test)]
mod test_utils;

pub use crate::{
    builder::ExtractorBuilder,
    error::{
        HierarchyError, HierarchyErrorCode, MergeTreeError, MergeTreeErrorCode, Result, Stage,
    },
    extractor::Extractor,
    hierarchy::{DEFAULT_SEQUENTIAL_CUTOFF, HierarchyConfig, SelectionMode},
    result::{ClusteringOutput, HierarchyExport, HierarchyNode, PointAssignment},
    tree::{FallenPoint, LinkageMerge, MergeNode, MergeTree, MergeTreeBuilder, NodeHandle},
};
