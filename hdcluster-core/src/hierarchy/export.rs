//! Read-only traversals that flatten a selected tree.
//!
//! Both walks are preorder (node, left subtree, right subtree) and use an
//! explicit stack. Every point must be reported exactly once: from the
//! fallen points of the node it detached from, or as a surviving
//! single-point leaf.

use crate::{
    error::{HierarchyError, Result, Stage},
    result::{HierarchyExport, HierarchyNode, PointAssignment},
    tree::MergeNode,
};

pub(super) fn extract_assignments(
    root: &MergeNode,
    point_count: usize,
) -> Result<Vec<PointAssignment>> {
    let mut slots = PointSlots::new(point_count);
    let mut next_cluster = 0;
    let mut pending = vec![(root, None)];

    while let Some((node, inherited)) = pending.pop() {
        let cluster = if node.selected {
            let cluster = next_cluster;
            next_cluster += 1;
            Some(cluster)
        } else {
            inherited
        };
        for fallen in &node.fallen_points {
            slots.record(
                fallen.point(),
                node.id,
                PointAssignment::new(cluster, fallen.scale()),
            )?;
        }
        match (node.left(), node.right()) {
            (Some(left), Some(right)) => {
                pending.push((right, cluster));
                pending.push((left, cluster));
            }
            _ if node.size == 1 => {
                slots.record(node.id, node.id, PointAssignment::new(cluster, node.birth_scale))?;
            }
            _ => {}
        }
    }
    slots.finish(root.id)
}

pub(super) fn export_hierarchy(root: &MergeNode, point_count: usize) -> Result<HierarchyExport> {
    let mut slots = PointSlots::new(point_count);
    let mut nodes = Vec::new();
    let mut pending = vec![(root, None)];

    while let Some((node, parent)) = pending.pop() {
        let index = nodes.len();
        nodes.push(HierarchyNode::new(
            node.id,
            parent,
            node.size,
            node.selected,
            node.stability,
        ));
        for fallen in &node.fallen_points {
            slots.record(fallen.point(), node.id, (index, fallen.scale()))?;
        }
        match (node.left(), node.right()) {
            (Some(left), Some(right)) => {
                pending.push((right, Some(index)));
                pending.push((left, Some(index)));
            }
            _ if node.size == 1 => slots.record(node.id, node.id, (index, node.birth_scale))?,
            _ => {}
        }
    }

    let (point_nodes, point_scales) = slots.finish(root.id)?.into_iter().unzip();
    Ok(HierarchyExport::new(nodes, point_nodes, point_scales))
}

/// Per-point output buffer that rejects missing and repeated points.
struct PointSlots<T> {
    slots: Vec<Option<T>>,
}

impl<T: Copy> PointSlots<T> {
    fn new(point_count: usize) -> Self {
        Self {
            slots: vec![None; point_count],
        }
    }

    fn record(&mut self, point: usize, node: usize, value: T) -> Result<()> {
        let slot = self.slots.get_mut(point).ok_or_else(|| {
            HierarchyError::invariant(
                node,
                Stage::Export,
                "point id is outside the tree's point range",
            )
        })?;
        if slot.replace(value).is_some() {
            return Err(HierarchyError::invariant(
                node,
                Stage::Export,
                "point is reported by more than one node",
            ));
        }
        Ok(())
    }

    fn finish(self, root: usize) -> Result<Vec<T>> {
        self.slots
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| {
                    HierarchyError::invariant(
                        root,
                        Stage::Export,
                        "point is missing from the condensed tree",
                    )
                })
            })
            .collect()
    }
}
