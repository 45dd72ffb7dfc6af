//! Builder utilities for configuring [`Extractor`] instances.
//!
//! Validates the minimum cluster size and, when the `parallel` feature is
//! enabled, creates the dedicated worker pool requested through
//! [`ExtractorBuilder::with_threads`] or [`ExtractorBuilder::with_stack_size`].

use std::num::NonZeroUsize;

use crate::{
    error::{HierarchyError, Result},
    extractor::Extractor,
    hierarchy::{DEFAULT_SEQUENTIAL_CUTOFF, HierarchyConfig, SelectionMode},
};

/// Configures and constructs [`Extractor`] instances.
///
/// # Examples
/// ```
/// use hdcluster_core::{ExtractorBuilder, SelectionMode};
///
/// let extractor = ExtractorBuilder::new()
///     .with_min_cluster_size(8)
///     .with_selection_mode(SelectionMode::Subclusters)
///     .build()
///     .expect("builder configuration is valid");
/// assert_eq!(extractor.config().min_cluster_size().get(), 8);
/// assert_eq!(extractor.config().selection_mode(), SelectionMode::Subclusters);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractorBuilder {
    min_cluster_size: usize,
    selection_mode: SelectionMode,
    sequential_cutoff: usize,
    threads: Option<NonZeroUsize>,
    stack_size: Option<usize>,
}

impl Default for ExtractorBuilder {
    fn default() -> Self {
        Self {
            min_cluster_size: 5,
            selection_mode: SelectionMode::Clusters,
            sequential_cutoff: DEFAULT_SEQUENTIAL_CUTOFF,
            threads: None,
            stack_size: None,
        }
    }
}

impl ExtractorBuilder {
    /// Creates a builder populated with default parameters.
    ///
    /// # Examples
    /// ```
    /// use hdcluster_core::{ExtractorBuilder, SelectionMode};
    ///
    /// let builder = ExtractorBuilder::new();
    /// assert_eq!(builder.min_cluster_size(), 5);
    /// assert_eq!(builder.selection_mode(), SelectionMode::Clusters);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the minimum cluster size.
    #[must_use]
    pub const fn with_min_cluster_size(mut self, size: usize) -> Self {
        self.min_cluster_size = size;
        self
    }

    /// Returns the configured minimum cluster size.
    #[must_use]
    pub const fn min_cluster_size(&self) -> usize {
        self.min_cluster_size
    }

    /// Chooses whether the root may be selected.
    #[must_use]
    pub const fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    /// Returns the configured selection mode.
    #[must_use]
    pub const fn selection_mode(&self) -> SelectionMode {
        self.selection_mode
    }

    /// Sets the subtree size below which condensation runs without forking.
    #[must_use]
    pub const fn with_sequential_cutoff(mut self, cutoff: usize) -> Self {
        self.sequential_cutoff = cutoff;
        self
    }

    /// Runs extraction on a dedicated pool with `threads` workers.
    ///
    /// Ignored when the `parallel` feature is disabled.
    #[must_use]
    pub const fn with_threads(mut self, threads: NonZeroUsize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Returns the requested worker count, if any.
    #[must_use]
    pub const fn threads(&self) -> Option<NonZeroUsize> {
        self.threads
    }

    /// Sets the worker stack size in bytes for the dedicated pool.
    ///
    /// Recursion depth follows tree height, so chain-shaped trees with many
    /// points may need more than the platform default. Ignored when the
    /// `parallel` feature is disabled.
    #[must_use]
    pub const fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Returns the requested worker stack size, if any.
    #[must_use]
    pub const fn stack_size(&self) -> Option<usize> {
        self.stack_size
    }

    /// Validates the configuration and constructs an [`Extractor`].
    ///
    /// # Errors
    /// Returns [`HierarchyError::InvalidMinClusterSize`] when the minimum
    /// cluster size is zero and [`HierarchyError::ThreadPool`] when the
    /// dedicated pool cannot be created.
    ///
    /// # Examples
    /// ```
    /// use hdcluster_core::{ExtractorBuilder, HierarchyError};
    ///
    /// let err = ExtractorBuilder::new().with_min_cluster_size(0).build().unwrap_err();
    /// assert!(matches!(err, HierarchyError::InvalidMinClusterSize { got: 0 }));
    /// ```
    pub fn build(self) -> Result<Extractor> {
        let min_cluster_size = NonZeroUsize::new(self.min_cluster_size).ok_or(
            HierarchyError::InvalidMinClusterSize {
                got: self.min_cluster_size,
            },
        )?;
        let config = HierarchyConfig::new(min_cluster_size)
            .with_selection_mode(self.selection_mode)
            .with_sequential_cutoff(self.sequential_cutoff);

        let extractor = Extractor::new(config);
        #[cfg(feature = "parallel")]
        let extractor = extractor.with_pool(self.build_pool()?);
        Ok(extractor)
    }

    #[cfg(feature = "parallel")]
    fn build_pool(&self) -> Result<Option<std::sync::Arc<rayon::ThreadPool>>> {
        if self.threads.is_none() && self.stack_size.is_none() {
            return Ok(None);
        }
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|index| format!("hdcluster-{index}"));
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads.get());
        }
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        let pool = builder
            .build()
            .map_err(|error| HierarchyError::ThreadPool {
                message: std::sync::Arc::from(error.to_string()),
            })?;
        Ok(Some(std::sync::Arc::new(pool)))
    }
}
