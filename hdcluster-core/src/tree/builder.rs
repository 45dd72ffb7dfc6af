//! Incremental construction of a [`MergeTree`] from linkage events.
//!
//! The builder hands out [`NodeHandle`]s for every leaf and merge. A merge
//! moves both operand subtrees into the new node, so each handle can be merged
//! at most once; later attempts are rejected rather than aliasing the subtree.
//! The builder also remembers the parent of every consumed handle, which is
//! what [`MergeTreeBuilder::root_of`] walks.

use std::collections::HashSet;

use tracing::debug;

use crate::error::MergeTreeError;

use super::{MergeNode, MergeTree};

/// Opaque reference to a node registered with a [`MergeTreeBuilder`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Returns the registration order of the node within its builder.
    #[must_use]
    #[rustfmt::skip]
    pub const fn index(self) -> usize { self.0 }
}

/// A single step of a linkage script consumed by [`MergeTree::from_merges`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkageMerge {
    left: usize,
    right: usize,
    distance: f64,
}

impl LinkageMerge {
    /// Creates a merge of the nodes referenced by `left` and `right`.
    #[must_use]
    pub const fn new(left: usize, right: usize, distance: f64) -> Self {
        Self {
            left,
            right,
            distance,
        }
    }

    /// Returns the first operand reference.
    #[must_use]
    #[rustfmt::skip]
    pub const fn left(&self) -> usize { self.left }

    /// Returns the second operand reference.
    #[must_use]
    #[rustfmt::skip]
    pub const fn right(&self) -> usize { self.right }

    /// Returns the merge distance.
    #[must_use]
    #[rustfmt::skip]
    pub const fn distance(&self) -> f64 { self.distance }
}

#[derive(Debug)]
struct Slot {
    node: Option<MergeNode>,
    parent: Option<NodeHandle>,
}

/// Assembles a merge tree bottom-up.
///
/// # Examples
/// ```
/// use hdcluster_core::MergeTreeBuilder;
///
/// let mut builder = MergeTreeBuilder::new();
/// let a = builder.leaf(0)?;
/// let b = builder.leaf(1)?;
/// let joined = builder.merge(a, b, 2, 0.5)?;
/// assert_eq!(builder.root_of(a)?, joined);
///
/// let tree = builder.finish()?;
/// assert_eq!(tree.root().size(), 2);
/// assert_eq!(tree.root().death_scale(), 2.0);
/// # Ok::<(), hdcluster_core::MergeTreeError>(())
/// ```
#[derive(Debug, Default)]
pub struct MergeTreeBuilder {
    slots: Vec<Slot>,
    points: HashSet<usize>,
    live: usize,
}

impl MergeTreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder with room for `capacity` nodes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            points: HashSet::with_capacity(capacity.div_ceil(2)),
            live: 0,
        }
    }

    /// Registers a leaf for `point`.
    ///
    /// # Errors
    /// Returns [`MergeTreeError::DuplicatePoint`] when `point` was already
    /// registered.
    pub fn leaf(&mut self, point: usize) -> Result<NodeHandle, MergeTreeError> {
        if !self.points.insert(point) {
            return Err(MergeTreeError::DuplicatePoint { point });
        }
        Ok(self.push(MergeNode::leaf(point)))
    }

    /// Joins the subtrees behind `a` and `b` at `distance`.
    ///
    /// Both handles are consumed. The new node's death scale is
    /// `1 / distance`, which also becomes the birth scale of both operands.
    ///
    /// # Errors
    /// Returns [`MergeTreeError::DegenerateMerge`] when `1 / distance` is not
    /// finite and strictly positive, [`MergeTreeError::SelfMerge`] when
    /// `a == b`, and [`MergeTreeError::UnknownHandle`] or
    /// [`MergeTreeError::AlreadyMerged`] when a handle cannot be consumed. The
    /// builder is left unchanged on error.
    pub fn merge(
        &mut self,
        a: NodeHandle,
        b: NodeHandle,
        id: usize,
        distance: f64,
    ) -> Result<NodeHandle, MergeTreeError> {
        let scale = merge_scale(id, distance)?;
        if a == b {
            return Err(MergeTreeError::SelfMerge { handle: a.0 });
        }
        self.ensure_live(a)?;
        self.ensure_live(b)?;

        let (Some(left), Some(right)) = (self.take(a), self.take(b)) else {
            return Err(MergeTreeError::AlreadyMerged { handle: a.0 });
        };
        let handle = self.push(MergeNode::merge(left, right, id, scale));
        self.live -= 2;
        for consumed in [a, b] {
            if let Some(slot) = self.slots.get_mut(consumed.0) {
                slot.parent = Some(handle);
            }
        }
        Ok(handle)
    }

    /// Follows parent links from `handle` to the top of its subtree.
    ///
    /// # Errors
    /// Returns [`MergeTreeError::UnknownHandle`] when `handle` was not issued
    /// by this builder.
    pub fn root_of(&self, handle: NodeHandle) -> Result<NodeHandle, MergeTreeError> {
        let mut current = handle;
        loop {
            let slot = self
                .slots
                .get(current.0)
                .ok_or(MergeTreeError::UnknownHandle { handle: current.0 })?;
            match slot.parent {
                Some(parent) => current = parent,
                None => return Ok(current),
            }
        }
    }

    /// Returns the node behind `handle` while it has not been merged.
    #[must_use]
    pub fn node(&self, handle: NodeHandle) -> Option<&MergeNode> {
        self.slots.get(handle.0).and_then(|slot| slot.node.as_ref())
    }

    /// Returns the number of subtrees that have not been merged yet.
    #[must_use]
    #[rustfmt::skip]
    pub const fn live_roots(&self) -> usize { self.live }

    /// Completes construction.
    ///
    /// # Errors
    /// Returns [`MergeTreeError::EmptyTree`] when no leaf was registered,
    /// [`MergeTreeError::MultipleRoots`] when more than one subtree remains
    /// unmerged, and [`MergeTreeError::PointOutOfRange`] when the point ids are
    /// not exactly `0..N`.
    pub fn finish(mut self) -> Result<MergeTree, MergeTreeError> {
        match self.live {
            0 => return Err(MergeTreeError::EmptyTree),
            1 => {}
            count => return Err(MergeTreeError::MultipleRoots { count }),
        }
        let root = self
            .slots
            .iter_mut()
            .rev()
            .find_map(|slot| slot.node.take())
            .ok_or(MergeTreeError::EmptyTree)?;

        let point_count = root.size;
        if let Some(&point) = self.points.iter().find(|&&point| point >= point_count) {
            return Err(MergeTreeError::PointOutOfRange { point, point_count });
        }
        debug!(
            points = point_count,
            nodes = self.slots.len(),
            rank = root.rank,
            "merge tree assembled"
        );
        Ok(MergeTree::new(root, point_count))
    }

    fn push(&mut self, node: MergeNode) -> NodeHandle {
        let handle = NodeHandle(self.slots.len());
        self.slots.push(Slot { node: Some(node), parent: None });
        self.live += 1;
        handle
    }

    fn ensure_live(&self, handle: NodeHandle) -> Result<(), MergeTreeError> {
        match self.slots.get(handle.0) {
            None => Err(MergeTreeError::UnknownHandle { handle: handle.0 }),
            Some(slot) if slot.node.is_none() => {
                Err(MergeTreeError::AlreadyMerged { handle: handle.0 })
            }
            Some(_) => Ok(()),
        }
    }

    fn take(&mut self, handle: NodeHandle) -> Option<MergeNode> {
        self.slots.get_mut(handle.0).and_then(|slot| slot.node.take())
    }
}

fn merge_scale(merge: usize, distance: f64) -> Result<f64, MergeTreeError> {
    let scale = distance.recip();
    if scale.is_finite() && scale > 0.0 {
        Ok(scale)
    } else {
        Err(MergeTreeError::DegenerateMerge { merge, distance })
    }
}
