//! Naive recursive model of condensation and selection.
//!
//! Works directly on a linkage script with an index arena (node `i` is point
//! `i` or merge `i - point_count`) and applies the fold, splice, and
//! select-or-defer rules one node at a time. It shares no code with the
//! tree passes, so agreement down to the bit is meaningful.

use hdcluster_test_support::dendrograms::Dendrogram;

use crate::hierarchy::SelectionMode;

/// One node as the model sees it after condensation and selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct NodeSnapshot {
    /// Point id or merge id.
    pub id: usize,
    /// Whether the node was selected.
    pub selected: bool,
    /// Bit pattern of the node's stability.
    pub stability: u64,
    /// Fallen points in insertion order, with scale bit patterns.
    pub fallen: Vec<(usize, u64)>,
}

/// Preorder snapshot of the model tree plus the returned stability bits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct OracleResult {
    /// Surviving nodes in preorder (node, left, right).
    pub nodes: Vec<NodeSnapshot>,
    /// Bit pattern of the stability returned by the selection pass.
    pub stability: u64,
}

#[derive(Clone, Debug, Default)]
struct Node {
    size: usize,
    birth: f64,
    death: f64,
    fallen: Vec<(usize, f64)>,
    aggregate: f64,
    stability: f64,
    selected: bool,
    children: Option<(usize, usize)>,
}

/// Condenses and selects `script` with the model and snapshots the result.
pub(super) fn reference_run(
    script: &Dendrogram,
    min_cluster_size: usize,
    mode: SelectionMode,
) -> OracleResult {
    let mut arena = build(script);
    let root = arena.len() - 1;
    condense(&mut arena, root, min_cluster_size);
    let stability = match (mode, arena[root].children) {
        (SelectionMode::Clusters, _) => select(&mut arena, root),
        (SelectionMode::Subclusters, children) => {
            let node = &mut arena[root];
            node.stability = node.aggregate - node.birth * node.fallen.len() as f64;
            children.map_or(0.0, |(left, right)| {
                select(&mut arena, left) + select(&mut arena, right)
            })
        }
    };
    OracleResult {
        nodes: preorder(&arena, root),
        stability: stability.to_bits(),
    }
}

fn build(script: &Dendrogram) -> Vec<Node> {
    let mut arena: Vec<Node> = (0..script.point_count)
        .map(|_| Node {
            size: 1,
            ..Node::default()
        })
        .collect();
    for merge in &script.merges {
        let scale = merge.distance.recip();
        let (a, b) = (merge.left, merge.right);
        arena[a].birth = scale;
        arena[b].birth = scale;
        // Smaller size on the left; the second operand wins ties.
        let children = if arena[a].size < arena[b].size { (a, b) } else { (b, a) };
        arena.push(Node {
            size: arena[a].size + arena[b].size,
            death: scale,
            children: Some(children),
            ..Node::default()
        });
    }
    arena
}

fn condense(arena: &mut [Node], node: usize, min: usize) {
    let Some((left, right)) = arena[node].children else {
        return;
    };
    condense(arena, left, min);
    condense(arena, right, min);

    let (small, keep) = match (arena[left].size < min, arena[right].size < min) {
        (false, false) => return,
        (true, true) => {
            fold(arena, node, left);
            fold(arena, node, right);
            arena[node].children = None;
            return;
        }
        (true, false) => (left, right),
        (false, true) => (right, left),
    };
    fold(arena, node, small);
    let kept = std::mem::take(&mut arena[keep]);
    let parent = &mut arena[node];
    parent.fallen.extend(kept.fallen);
    parent.aggregate += kept.aggregate;
    parent.death = parent.death.max(kept.death);
    parent.children = kept.children;
}

fn fold(arena: &mut [Node], parent: usize, child: usize) {
    let folded = std::mem::take(&mut arena[child]);
    let target = &mut arena[parent];
    if folded.size == 1 {
        target.fallen.push((child, folded.birth));
        target.aggregate += folded.birth;
    } else {
        target.fallen.extend(folded.fallen);
        target.aggregate += folded.aggregate;
    }
}

fn select(arena: &mut [Node], node: usize) -> f64 {
    let own = arena[node].aggregate - arena[node].birth * arena[node].fallen.len() as f64;
    arena[node].stability = own;
    let Some((left, right)) = arena[node].children else {
        arena[node].selected = true;
        return own;
    };
    let children = select(arena, left) + select(arena, right);
    let total = own + arena[node].death * (arena[left].size + arena[right].size) as f64;
    if total > children {
        arena[node].selected = true;
        arena[node].stability = total;
        deselect(arena, left);
        deselect(arena, right);
    } else {
        arena[node].stability = children;
    }
    arena[node].stability
}

fn deselect(arena: &mut [Node], node: usize) {
    if arena[node].selected {
        arena[node].selected = false;
    } else if let Some((left, right)) = arena[node].children {
        deselect(arena, left);
        deselect(arena, right);
    }
}

fn preorder(arena: &[Node], node: usize) -> Vec<NodeSnapshot> {
    let current = &arena[node];
    let mut nodes = vec![NodeSnapshot {
        id: node,
        selected: current.selected,
        stability: current.stability.to_bits(),
        fallen: current
            .fallen
            .iter()
            .map(|&(point, scale)| (point, scale.to_bits()))
            .collect(),
    }];
    if let Some((left, right)) = current.children {
        nodes.extend(preorder(arena, left));
        nodes.extend(preorder(arena, right));
    }
    nodes
}
