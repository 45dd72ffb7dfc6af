//! Condensation, stability scoring, and export over a [`MergeTree`].
//!
//! The passes run in a fixed order:
//!
//! - Condense the tree with `min_cluster_size`. A split that would create a
//!   branch smaller than the threshold is rewritten so that the small
//!   branch's points "fall out" of the parent at the scale where they would
//!   have split off. A single large branch is spliced upward into its
//!   parent. The surviving tree only branches where both sides are clusters.
//! - Score every surviving node by excess of mass and select a
//!   non-overlapping set of nodes, preferring a parent over its descendants
//!   only when the parent is strictly more stable.
//! - Export per-point assignments and the condensed hierarchy.
//!
//! Condensation forks the two child recursions when the `parallel` feature is
//! enabled. Selection and export are sequential.

mod condense;
mod export;
mod stability;

use std::num::NonZeroUsize;

use tracing::{debug, info, instrument};

use crate::{
    error::{HierarchyError, Result},
    result::{HierarchyExport, PointAssignment},
    tree::MergeTree,
};

/// Subtrees below this many points are condensed without forking.
pub const DEFAULT_SEQUENTIAL_CUTOFF: usize = 1024;

/// Chooses which selection pass runs at the root.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum SelectionMode {
    /// Score every node, the root included.
    #[default]
    Clusters,
    /// Never select the root itself, so that a dominant root cannot collapse
    /// the result into a single cluster.
    Subclusters,
}

/// Configuration for hierarchy extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HierarchyConfig {
    min_cluster_size: NonZeroUsize,
    selection_mode: SelectionMode,
    sequential_cutoff: usize,
}

impl HierarchyConfig {
    /// Creates a configuration using the provided `min_cluster_size`.
    #[must_use]
    pub const fn new(min_cluster_size: NonZeroUsize) -> Self {
        Self {
            min_cluster_size,
            selection_mode: SelectionMode::Clusters,
            sequential_cutoff: DEFAULT_SEQUENTIAL_CUTOFF,
        }
    }

    /// Overrides the selection mode.
    #[must_use]
    pub const fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    /// Overrides the subtree size below which condensation stops forking.
    #[must_use]
    pub const fn with_sequential_cutoff(mut self, cutoff: usize) -> Self {
        self.sequential_cutoff = cutoff;
        self
    }

    /// Returns the minimum cluster size.
    #[must_use]
    pub const fn min_cluster_size(&self) -> NonZeroUsize {
        self.min_cluster_size
    }

    /// Returns the selection mode.
    #[must_use]
    pub const fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Returns the sequential cutoff.
    #[must_use]
    pub const fn sequential_cutoff(&self) -> usize {
        self.sequential_cutoff
    }
}

impl MergeTree {
    /// Condenses the tree in place so that every surviving split has two
    /// branches of at least `min_cluster_size` points.
    ///
    /// # Errors
    /// Returns [`HierarchyError::MinClusterSizeTooLarge`] when the tree holds
    /// fewer than `min_cluster_size` points, and
    /// [`HierarchyError::InvariantViolation`] when the tree is malformed.
    pub fn condense(&mut self, min_cluster_size: NonZeroUsize) -> Result<()> {
        self.condense_with(&HierarchyConfig::new(min_cluster_size))
    }

    /// Condenses the tree using the threshold and cutoff from `config`.
    ///
    /// # Errors
    /// As for [`MergeTree::condense`].
    #[instrument(
        name = "hierarchy.condense",
        err,
        skip(self, config),
        fields(
            points = self.point_count(),
            min_cluster_size = config.min_cluster_size().get(),
        ),
    )]
    pub fn condense_with(&mut self, config: &HierarchyConfig) -> Result<()> {
        let min_cluster_size = self.check_threshold(config.min_cluster_size())?;
        condense::condense_tree(self.root_mut(), min_cluster_size, config.sequential_cutoff())?;
        debug!(
            surviving = self.nodes().count(),
            internal = self.internal_node_count(),
            "condensed tree"
        );
        Ok(())
    }

    /// Scores every node and selects the most stable non-overlapping nodes.
    ///
    /// Returns the aggregate stability of the selection. Running the pass
    /// again on the same tree reproduces the same selection and scores.
    ///
    /// # Errors
    /// Returns [`HierarchyError::MinClusterSizeTooLarge`] when the tree holds
    /// fewer than `min_cluster_size` points, and
    /// [`HierarchyError::InvariantViolation`] when a node below the threshold
    /// is reached, which means the tree was not condensed with this
    /// threshold.
    #[instrument(
        name = "hierarchy.select_clusters",
        err,
        skip(self),
        fields(points = self.point_count(), min_cluster_size = min_cluster_size.get()),
    )]
    pub fn select_clusters(&mut self, min_cluster_size: NonZeroUsize) -> Result<f64> {
        let threshold = self.check_threshold(min_cluster_size)?;
        let stability = stability::select_clusters(self.root_mut(), threshold)?;
        self.log_selection(stability);
        Ok(stability)
    }

    /// Like [`MergeTree::select_clusters`] but never selects the root.
    ///
    /// Both children of the root are scored as independent hierarchies.
    /// Returns their combined stability. A root without children yields no
    /// cluster.
    ///
    /// # Errors
    /// As for [`MergeTree::select_clusters`].
    #[instrument(
        name = "hierarchy.select_subclusters",
        err,
        skip(self),
        fields(points = self.point_count(), min_cluster_size = min_cluster_size.get()),
    )]
    pub fn select_subclusters(&mut self, min_cluster_size: NonZeroUsize) -> Result<f64> {
        let threshold = self.check_threshold(min_cluster_size)?;
        let stability = stability::select_subclusters(self.root_mut(), threshold)?;
        self.log_selection(stability);
        Ok(stability)
    }

    /// Runs the selection pass chosen by `mode`.
    ///
    /// # Errors
    /// As for [`MergeTree::select_clusters`].
    pub fn select(&mut self, min_cluster_size: NonZeroUsize, mode: SelectionMode) -> Result<f64> {
        match mode {
            SelectionMode::Clusters => self.select_clusters(min_cluster_size),
            SelectionMode::Subclusters => self.select_subclusters(min_cluster_size),
        }
    }

    /// Returns the number of nodes chosen by the last selection pass.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.nodes().filter(|node| node.is_selected()).count()
    }

    /// Assigns every point to its nearest selected ancestor.
    ///
    /// Clusters are numbered from `0` in preorder. Points without a selected
    /// ancestor are reported as noise. Each point carries the scale at which
    /// it detached as its confidence.
    ///
    /// # Errors
    /// Returns [`HierarchyError::InvariantViolation`] when a point is missing
    /// from the tree, reported twice, or outside `0..point_count`.
    #[instrument(name = "hierarchy.extract_assignments", err, skip(self), fields(points = self.point_count()))]
    pub fn extract_assignments(&self) -> Result<Vec<PointAssignment>> {
        let assignments = export::extract_assignments(self.root(), self.point_count())?;
        let noise = assignments.iter().filter(|a| a.is_noise()).count();
        debug!(noise, "extracted point assignments");
        Ok(assignments)
    }

    /// Flattens the condensed hierarchy for diagnostics and visualisation.
    ///
    /// # Errors
    /// As for [`MergeTree::extract_assignments`].
    #[instrument(name = "hierarchy.export", err, skip(self), fields(points = self.point_count()))]
    pub fn export_hierarchy(&self) -> Result<HierarchyExport> {
        let export = export::export_hierarchy(self.root(), self.point_count())?;
        debug!(nodes = export.nodes().len(), "exported hierarchy");
        Ok(export)
    }

    fn check_threshold(&self, min_cluster_size: NonZeroUsize) -> Result<usize> {
        let min_cluster_size = min_cluster_size.get();
        if min_cluster_size > self.point_count() {
            return Err(HierarchyError::MinClusterSizeTooLarge {
                point_count: self.point_count(),
                min_cluster_size,
            });
        }
        Ok(min_cluster_size)
    }

    fn log_selection(&self, stability: f64) {
        info!(
            clusters = self.selected_count(),
            stability, "cluster selection completed"
        );
    }
}
