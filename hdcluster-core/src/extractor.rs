//! Orchestration of the condense, select, and export passes.
//!
//! Provides the [`Extractor`] entry point which runs every pass over a
//! caller-owned [`MergeTree`], optionally inside a dedicated worker pool.

#[cfg(feature = "parallel")]
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::{
    error::Result,
    hierarchy::HierarchyConfig,
    result::ClusteringOutput,
    tree::MergeTree,
};

/// Runs hierarchy extraction with a fixed configuration.
///
/// # Examples
/// ```
/// use hdcluster_core::{ExtractorBuilder, LinkageMerge, MergeTree};
///
/// let mut tree = MergeTree::from_merges(4, &[
///     LinkageMerge::new(0, 1, 1.0),
///     LinkageMerge::new(2, 3, 1.0),
///     LinkageMerge::new(4, 5, 4.0),
/// ])?;
/// let extractor = ExtractorBuilder::new().with_min_cluster_size(2).build()?;
/// let output = extractor.run(&mut tree)?;
///
/// assert_eq!(output.cluster_count(), 2);
/// assert_eq!(output.assignments().len(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Extractor {
    config: HierarchyConfig,
    #[cfg(feature = "parallel")]
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Extractor {
    pub(crate) const fn new(config: HierarchyConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    #[cfg(feature = "parallel")]
    pub(crate) fn with_pool(mut self, pool: Option<Arc<rayon::ThreadPool>>) -> Self {
        self.pool = pool;
        self
    }

    /// Returns the configuration applied by [`Extractor::run`].
    #[must_use]
    #[rustfmt::skip]
    pub const fn config(&self) -> &HierarchyConfig { &self.config }

    /// Condenses `tree`, selects clusters, and exports the result.
    ///
    /// The tree is rewritten in place and keeps its selection afterwards.
    ///
    /// # Errors
    /// Returns [`crate::HierarchyError::MinClusterSizeTooLarge`] when the tree
    /// is smaller than the configured minimum cluster size, and
    /// [`crate::HierarchyError::InvariantViolation`] when the tree is
    /// malformed.
    #[instrument(
        name = "hierarchy.run",
        err,
        skip(self, tree),
        fields(
            points = tree.point_count(),
            min_cluster_size = self.config.min_cluster_size().get(),
            mode = ?self.config.selection_mode(),
        ),
    )]
    pub fn run(&self, tree: &mut MergeTree) -> Result<ClusteringOutput> {
        self.install(|| self.run_passes(tree))
    }

    fn run_passes(&self, tree: &mut MergeTree) -> Result<ClusteringOutput> {
        tree.condense_with(&self.config)?;
        let stability = tree.select(
            self.config.min_cluster_size(),
            self.config.selection_mode(),
        )?;
        let assignments = tree.extract_assignments()?;
        let hierarchy = tree.export_hierarchy()?;

        let cluster_count = hierarchy.selected_count();
        let output = ClusteringOutput::new(assignments, hierarchy, stability, cluster_count);
        if cluster_count == 0 {
            warn!(
                points = tree.point_count(),
                "no cluster was selected, every point is noise"
            );
        }
        info!(
            clusters = cluster_count,
            noise = output.noise_count(),
            "hierarchy extraction completed"
        );
        Ok(output)
    }

    #[cfg(feature = "parallel")]
    fn install<T: Send>(&self, op: impl FnOnce() -> T + Send) -> T {
        let Some(pool) = self.pool.as_deref() else {
            return op();
        };
        // Pool workers do not inherit the caller's subscriber or span.
        let dispatch = tracing::dispatcher::get_default(Clone::clone);
        let span = tracing::Span::current();
        pool.install(move || tracing::dispatcher::with_default(&dispatch, || span.in_scope(op)))
    }

    #[cfg(not(feature = "parallel"))]
    fn install<T>(&self, op: impl FnOnce() -> T) -> T {
        op()
    }
}
