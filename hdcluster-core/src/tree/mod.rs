//! Binary merge tree produced by an external single-linkage builder.
//!
//! Each [`MergeNode`] is either an original point (a leaf of size one) or a
//! merge event joining two subtrees at some distance. Distances are stored as
//! scales (`1 / distance`), so larger scales describe finer splits.
//!
//! A node owns its children through a single boxed pair. A node therefore has
//! either two children or none; the half-linked state cannot be expressed.
//! Condensation rewrites this structure in place, moving grandchildren up and
//! dropping folded branches as it goes.

mod builder;

use crate::error::MergeTreeError;

pub use self::builder::{LinkageMerge, MergeTreeBuilder, NodeHandle};

/// A point that detached from its enclosing cluster during condensation.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FallenPoint {
    point: usize,
    scale: f64,
}

impl FallenPoint {
    pub(crate) const fn new(point: usize, scale: f64) -> Self {
        Self { point, scale }
    }

    /// Returns the identifier of the detached point.
    #[must_use]
    #[rustfmt::skip]
    pub const fn point(&self) -> usize { self.point }

    /// Returns the scale at which the point detached.
    #[must_use]
    #[rustfmt::skip]
    pub const fn scale(&self) -> f64 { self.scale }
}

#[derive(Debug)]
pub(crate) struct Children {
    pub(crate) left: MergeNode,
    pub(crate) right: MergeNode,
}

/// A node of the merge tree.
///
/// The `stability` and `selected` fields are only meaningful after one of the
/// selection passes has run.
#[derive(Debug)]
pub struct MergeNode {
    pub(crate) id: usize,
    pub(crate) size: usize,
    pub(crate) rank: usize,
    pub(crate) birth_scale: f64,
    pub(crate) death_scale: f64,
    pub(crate) fallen_points: Vec<FallenPoint>,
    pub(crate) aggregate_scale: f64,
    pub(crate) stability: f64,
    pub(crate) selected: bool,
    pub(crate) children: Option<Box<Children>>,
}

impl MergeNode {
    pub(crate) const fn leaf(point: usize) -> Self {
        Self {
            id: point,
            size: 1,
            rank: 0,
            birth_scale: 0.0,
            death_scale: 0.0,
            fallen_points: Vec::new(),
            aggregate_scale: 0.0,
            stability: 0.0,
            selected: false,
            children: None,
        }
    }

    /// Joins `a` and `b` under a new node created at `scale`.
    ///
    /// The smaller subtree becomes the left child. On equal sizes `b` goes
    /// left; downstream numbering depends on this order.
    pub(crate) fn merge(mut a: Self, mut b: Self, id: usize, scale: f64) -> Self {
        a.birth_scale = scale;
        b.birth_scale = scale;
        let size = a.size + b.size;
        let rank = a.rank.max(b.rank) + 1;
        let (left, right) = if a.size < b.size { (a, b) } else { (b, a) };
        Self {
            id,
            size,
            rank,
            birth_scale: 0.0,
            death_scale: scale,
            fallen_points: Vec::new(),
            aggregate_scale: 0.0,
            stability: 0.0,
            selected: false,
            children: Some(Box::new(Children { left, right })),
        }
    }

    /// Returns the node identifier: the point id for leaves, the merge id
    /// otherwise.
    #[must_use]
    #[rustfmt::skip]
    pub const fn id(&self) -> usize { self.id }

    /// Returns the number of original points subsumed by this node.
    #[must_use]
    #[rustfmt::skip]
    pub const fn size(&self) -> usize { self.size }

    /// Returns the height of the subtree rooted at this node.
    #[must_use]
    #[rustfmt::skip]
    pub const fn rank(&self) -> usize { self.rank }

    /// Returns the scale at which this node was absorbed by its parent, or
    /// `0.0` for the root.
    #[must_use]
    #[rustfmt::skip]
    pub const fn birth_scale(&self) -> f64 { self.birth_scale }

    /// Returns the scale at which this node's children diverge.
    #[must_use]
    #[rustfmt::skip]
    pub const fn death_scale(&self) -> f64 { self.death_scale }

    /// Returns the points that detached directly from this node.
    #[must_use]
    #[rustfmt::skip]
    pub fn fallen_points(&self) -> &[FallenPoint] { &self.fallen_points }

    /// Returns the sum of the detachment scales of [`Self::fallen_points`].
    #[must_use]
    #[rustfmt::skip]
    pub const fn aggregate_scale(&self) -> f64 { self.aggregate_scale }

    /// Returns the stability computed by the last selection pass.
    #[must_use]
    #[rustfmt::skip]
    pub const fn stability(&self) -> f64 { self.stability }

    /// Returns `true` when the last selection pass chose this node as a
    /// cluster.
    #[must_use]
    #[rustfmt::skip]
    pub const fn is_selected(&self) -> bool { self.selected }

    /// Returns `true` when the node has no children.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Returns the smaller child, if any.
    #[must_use]
    pub fn left(&self) -> Option<&Self> {
        self.children.as_deref().map(|children| &children.left)
    }

    /// Returns the larger child, if any.
    #[must_use]
    pub fn right(&self) -> Option<&Self> {
        self.children.as_deref().map(|children| &children.right)
    }

    /// Stability contributed by the points that fell out of this node.
    pub(crate) fn intrinsic_stability(&self) -> f64 {
        self.aggregate_scale - self.birth_scale * self.fallen_points.len() as f64
    }

    /// Clears the selection frontier beneath (and including) this node.
    ///
    /// Selected nodes form an antichain, so the walk stops at the first
    /// selected node on every path.
    pub(crate) fn deselect(&mut self) {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.selected {
                node.selected = false;
            } else if let Some(children) = node.children.as_deref_mut() {
                let Children { left, right } = children;
                pending.push(right);
                pending.push(left);
            }
        }
    }
}

impl Drop for MergeNode {
    fn drop(&mut self) {
        // Detach descendants onto a heap stack so that dropping a chain-shaped
        // tree does not recurse once per level.
        let Some(children) = self.children.take() else {
            return;
        };
        let mut pending = vec![children];
        while let Some(mut pair) = pending.pop() {
            pending.extend(pair.left.children.take());
            pending.extend(pair.right.children.take());
        }
    }
}

/// A complete merge tree covering points `0..point_count`.
///
/// Produced by [`MergeTreeBuilder::finish`] or [`MergeTree::from_merges`].
#[derive(Debug)]
pub struct MergeTree {
    root: MergeNode,
    point_count: usize,
}

impl MergeTree {
    pub(crate) const fn new(root: MergeNode, point_count: usize) -> Self {
        Self { root, point_count }
    }

    /// Builds a tree from a linkage script over points `0..point_count`.
    ///
    /// Each [`LinkageMerge`] refers to its operands by index: values below
    /// `point_count` name points, and `point_count + k` names the node created
    /// by the `k`-th merge. The `k`-th merge receives id `point_count + k`.
    ///
    /// # Errors
    /// Returns [`MergeTreeError::InvalidReference`] when a merge refers to a
    /// node that does not exist yet, [`MergeTreeError::DegenerateMerge`] for
    /// unusable distances, and the [`MergeTreeBuilder::finish`] errors when
    /// the script does not reduce to a single root.
    ///
    /// # Examples
    /// ```
    /// use hdcluster_core::{LinkageMerge, MergeTree};
    ///
    /// let tree = MergeTree::from_merges(3, &[
    ///     LinkageMerge::new(0, 1, 0.5),
    ///     LinkageMerge::new(3, 2, 1.0),
    /// ])?;
    /// assert_eq!(tree.point_count(), 3);
    /// assert_eq!(tree.root().id(), 4);
    /// # Ok::<(), hdcluster_core::MergeTreeError>(())
    /// ```
    pub fn from_merges(point_count: usize, merges: &[LinkageMerge]) -> Result<Self, MergeTreeError> {
        let mut builder = MergeTreeBuilder::with_capacity(point_count.saturating_mul(2));
        for point in 0..point_count {
            builder.leaf(point)?;
        }
        for (step, merge) in merges.iter().enumerate() {
            let id = point_count + step;
            let resolve = |reference: usize| {
                if reference < id {
                    Ok(NodeHandle::from_index(reference))
                } else {
                    Err(MergeTreeError::InvalidReference {
                        merge: step,
                        reference,
                    })
                }
            };
            let left = resolve(merge.left())?;
            let right = resolve(merge.right())?;
            builder.merge(left, right, id, merge.distance())?;
        }
        builder.finish()
    }

    /// Returns the root node.
    #[must_use]
    #[rustfmt::skip]
    pub const fn root(&self) -> &MergeNode { &self.root }

    /// Returns the number of original points covered by the tree.
    #[must_use]
    #[rustfmt::skip]
    pub const fn point_count(&self) -> usize { self.point_count }

    pub(crate) const fn root_mut(&mut self) -> &mut MergeNode {
        &mut self.root
    }

    /// Iterates over the surviving nodes in preorder (node, left, right).
    pub fn nodes(&self) -> impl Iterator<Item = &MergeNode> {
        let mut pending = vec![&self.root];
        std::iter::from_fn(move || {
            let node = pending.pop()?;
            if let Some(children) = node.children.as_deref() {
                pending.push(&children.right);
                pending.push(&children.left);
            }
            Some(node)
        })
    }

    /// Returns the number of surviving nodes that still have children.
    #[must_use]
    pub fn internal_node_count(&self) -> usize {
        self.nodes().filter(|node| !node.is_leaf()).count()
    }
}
