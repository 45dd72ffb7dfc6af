//! Excess-of-mass scoring and cluster selection.
//!
//! A node's own stability is the scale range its fallen points persisted
//! beyond its birth, plus the mass that survives until its children diverge.
//! A node is selected when that score beats the best score available from its
//! descendants; otherwise the descendants' score propagates upward.

use crate::{
    error::{HierarchyError, Result, Stage},
    tree::{Children, MergeNode},
};

pub(super) fn select_clusters(node: &mut MergeNode, min_cluster_size: usize) -> Result<f64> {
    ensure_condensed(node, min_cluster_size)?;
    node.selected = false;
    node.stability = node.intrinsic_stability();

    let Some(children) = node.children.as_deref_mut() else {
        node.selected = true;
        return Ok(node.stability);
    };
    let Children { left, right } = children;
    let child_stability =
        select_clusters(left, min_cluster_size)? + select_clusters(right, min_cluster_size)?;
    node.stability += node.death_scale * (left.size + right.size) as f64;

    if node.stability > child_stability {
        node.selected = true;
        left.deselect();
        right.deselect();
    } else {
        node.stability = child_stability;
    }
    Ok(node.stability)
}

pub(super) fn select_subclusters(root: &mut MergeNode, min_cluster_size: usize) -> Result<f64> {
    ensure_condensed(root, min_cluster_size)?;
    root.selected = false;
    root.stability = root.intrinsic_stability();

    let Some(children) = root.children.as_deref_mut() else {
        return Ok(0.0);
    };
    let Children { left, right } = children;
    Ok(select_clusters(left, min_cluster_size)? + select_clusters(right, min_cluster_size)?)
}

fn ensure_condensed(node: &MergeNode, min_cluster_size: usize) -> Result<()> {
    if node.size < min_cluster_size {
        return Err(HierarchyError::invariant(
            node.id,
            Stage::Select,
            "node is smaller than min_cluster_size",
        ));
    }
    Ok(())
}
