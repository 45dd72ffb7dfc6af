//! Result types produced by hierarchy extraction.
//!
//! Provides per-point cluster assignments, the flattened condensed hierarchy,
//! and the bundle returned by [`crate::Extractor::run`].

/// Cluster membership of a single point.
///
/// # Examples
/// ```
/// use hdcluster_core::PointAssignment;
///
/// let noise = PointAssignment::noise(0.5);
/// assert!(noise.is_noise());
/// assert_eq!(noise.confidence(), 0.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PointAssignment {
    cluster: Option<usize>,
    confidence: f64,
}

impl PointAssignment {
    /// Creates an assignment to `cluster`.
    #[must_use]
    pub const fn clustered(cluster: usize, confidence: f64) -> Self {
        Self {
            cluster: Some(cluster),
            confidence,
        }
    }

    /// Creates an assignment for a point outside every selected cluster.
    #[must_use]
    pub const fn noise(confidence: f64) -> Self {
        Self {
            cluster: None,
            confidence,
        }
    }

    pub(crate) const fn new(cluster: Option<usize>, confidence: f64) -> Self {
        Self {
            cluster,
            confidence,
        }
    }

    /// Returns the cluster index, or `None` for noise.
    #[must_use]
    #[rustfmt::skip]
    pub const fn cluster(&self) -> Option<usize> { self.cluster }

    /// Returns the scale at which the point detached from its node.
    #[must_use]
    #[rustfmt::skip]
    pub const fn confidence(&self) -> f64 { self.confidence }

    /// Returns `true` when the point has no selected ancestor.
    #[must_use]
    pub const fn is_noise(&self) -> bool {
        self.cluster.is_none()
    }
}

/// One surviving node of the condensed hierarchy.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HierarchyNode {
    source_id: usize,
    parent: Option<usize>,
    size: usize,
    selected: bool,
    stability: f64,
}

impl HierarchyNode {
    pub(crate) const fn new(
        source_id: usize,
        parent: Option<usize>,
        size: usize,
        selected: bool,
        stability: f64,
    ) -> Self {
        Self {
            source_id,
            parent,
            size,
            selected,
            stability,
        }
    }

    /// Returns the merge (or point) id the node carried in the merge tree.
    #[must_use]
    #[rustfmt::skip]
    pub const fn source_id(&self) -> usize { self.source_id }

    /// Returns the export index of the parent node, or `None` for the root.
    #[must_use]
    #[rustfmt::skip]
    pub const fn parent(&self) -> Option<usize> { self.parent }

    /// Returns the number of points under the node.
    #[must_use]
    #[rustfmt::skip]
    pub const fn size(&self) -> usize { self.size }

    /// Returns whether the node was selected as a cluster.
    #[must_use]
    #[rustfmt::skip]
    pub const fn is_selected(&self) -> bool { self.selected }

    /// Returns the node's stability after selection.
    #[must_use]
    #[rustfmt::skip]
    pub const fn stability(&self) -> f64 { self.stability }
}

/// Flattened condensed hierarchy.
///
/// Nodes are indexed in preorder; `point_nodes[p]` is the index of the node
/// that point `p` fell out of, and `point_scales[p]` the scale at which it
/// did.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct HierarchyExport {
    nodes: Vec<HierarchyNode>,
    point_nodes: Vec<usize>,
    point_scales: Vec<f64>,
}

impl HierarchyExport {
    pub(crate) const fn new(
        nodes: Vec<HierarchyNode>,
        point_nodes: Vec<usize>,
        point_scales: Vec<f64>,
    ) -> Self {
        Self {
            nodes,
            point_nodes,
            point_scales,
        }
    }

    /// Returns the surviving nodes in preorder.
    #[must_use]
    #[rustfmt::skip]
    pub fn nodes(&self) -> &[HierarchyNode] { &self.nodes }

    /// Returns the node index each point fell out of.
    #[must_use]
    #[rustfmt::skip]
    pub fn point_nodes(&self) -> &[usize] { &self.point_nodes }

    /// Returns the scale at which each point fell out.
    #[must_use]
    #[rustfmt::skip]
    pub fn point_scales(&self) -> &[f64] { &self.point_scales }

    /// Counts the selected nodes.
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.selected).count()
    }
}

/// Everything produced by one [`crate::Extractor::run`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ClusteringOutput {
    assignments: Vec<PointAssignment>,
    hierarchy: HierarchyExport,
    stability: f64,
    cluster_count: usize,
}

impl ClusteringOutput {
    pub(crate) const fn new(
        assignments: Vec<PointAssignment>,
        hierarchy: HierarchyExport,
        stability: f64,
        cluster_count: usize,
    ) -> Self {
        Self {
            assignments,
            hierarchy,
            stability,
            cluster_count,
        }
    }

    /// Returns the per-point assignments indexed by point id.
    #[must_use]
    #[rustfmt::skip]
    pub fn assignments(&self) -> &[PointAssignment] { &self.assignments }

    /// Returns the flattened condensed hierarchy.
    #[must_use]
    #[rustfmt::skip]
    pub const fn hierarchy(&self) -> &HierarchyExport { &self.hierarchy }

    /// Returns the aggregate stability reported by the selection pass.
    #[must_use]
    #[rustfmt::skip]
    pub const fn stability(&self) -> f64 { self.stability }

    /// Returns the number of selected clusters.
    #[must_use]
    #[rustfmt::skip]
    pub const fn cluster_count(&self) -> usize { self.cluster_count }

    /// Counts points outside every selected cluster.
    #[must_use]
    pub fn noise_count(&self) -> usize {
        self.assignments.iter().filter(|a| a.is_noise()).count()
    }

    /// Consumes the output, returning the assignments.
    #[must_use]
    pub fn into_assignments(self) -> Vec<PointAssignment> {
        self.assignments
    }
}
