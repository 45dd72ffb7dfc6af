//! In-place condensation of a merge tree.
//!
//! The traversal is children-first: both subtrees are condensed before the
//! node itself is rewritten. At that point a child below `min_cluster_size`
//! has already lost its own children, so folding it only moves its fallen
//! points (or, for a single point, the point itself) into the parent.

use crate::{
    error::{HierarchyError, Result, Stage},
    tree::{Children, FallenPoint, MergeNode},
};

pub(super) fn condense_tree(
    root: &mut MergeNode,
    min_cluster_size: usize,
    sequential_cutoff: usize,
) -> Result<()> {
    condense_node(root, min_cluster_size, sequential_cutoff)
}

fn condense_node(node: &mut MergeNode, min_cluster_size: usize, cutoff: usize) -> Result<()> {
    let Some(children) = node.children.as_deref_mut() else {
        return Ok(());
    };
    condense_children(children, node.size, min_cluster_size, cutoff)?;
    rewrite(node, min_cluster_size)
}

#[cfg(feature = "parallel")]
fn condense_children(
    children: &mut Children,
    size: usize,
    min_cluster_size: usize,
    cutoff: usize,
) -> Result<()> {
    let Children { left, right } = children;
    if size < cutoff {
        condense_node(left, min_cluster_size, cutoff)?;
        return condense_node(right, min_cluster_size, cutoff);
    }
    // The left subtree is offered to other workers; this thread takes the
    // right one and waits for both before the parent is rewritten.
    let (right_result, left_result) = rayon::join(
        || condense_node(right, min_cluster_size, cutoff),
        || condense_node(left, min_cluster_size, cutoff),
    );
    left_result?;
    right_result
}

#[cfg(not(feature = "parallel"))]
fn condense_children(
    children: &mut Children,
    _size: usize,
    min_cluster_size: usize,
    cutoff: usize,
) -> Result<()> {
    let Children { left, right } = children;
    condense_node(left, min_cluster_size, cutoff)?;
    condense_node(right, min_cluster_size, cutoff)
}

/// Rewrites `node` once both of its children are condensed.
fn rewrite(node: &mut MergeNode, min_cluster_size: usize) -> Result<()> {
    let Some(children) = node.children.take() else {
        return Ok(());
    };
    let left_small = children.left.size < min_cluster_size;
    let right_small = children.right.size < min_cluster_size;
    if !left_small && !right_small {
        node.children = Some(children);
        return Ok(());
    }

    let Children { left, right } = *children;
    match (left_small, right_small) {
        (true, true) => {
            fold(node, left)?;
            fold(node, right)?;
            node.rank = 0;
            check_death_scale(node)
        }
        (true, false) => {
            fold(node, left)?;
            splice(node, right)
        }
        _ => {
            fold(node, right)?;
            splice(node, left)
        }
    }
}

/// Moves every point of a sub-threshold `child` into `parent`.
fn fold(parent: &mut MergeNode, mut child: MergeNode) -> Result<()> {
    if !child.is_leaf() {
        return Err(HierarchyError::invariant(
            child.id,
            Stage::Condense,
            "folded branch still has children",
        ));
    }
    absorb(parent, &mut child);
    Ok(())
}

/// Replaces `parent`'s children with those of `keep` and drops the shell.
fn splice(parent: &mut MergeNode, mut keep: MergeNode) -> Result<()> {
    absorb(parent, &mut keep);
    parent.death_scale = parent.death_scale.max(keep.death_scale);
    check_death_scale(parent)?;
    parent.children = keep.children.take();
    parent.rank = parent
        .children
        .as_deref()
        .map_or(0, |children| children.left.rank.max(children.right.rank) + 1);
    Ok(())
}

fn absorb(parent: &mut MergeNode, child: &mut MergeNode) {
    if child.size == 1 {
        parent.aggregate_scale += child.birth_scale;
        parent
            .fallen_points
            .push(FallenPoint::new(child.id, child.birth_scale));
    } else {
        parent.aggregate_scale += child.aggregate_scale;
    }
    parent.fallen_points.append(&mut child.fallen_points);
}

fn check_death_scale(node: &MergeNode) -> Result<()> {
    if node.death_scale.is_finite() {
        Ok(())
    } else {
        Err(HierarchyError::invariant(
            node.id,
            Stage::Condense,
            "death scale is not finite after folding",
        ))
    }
}
