//! Linkage scripts for condensation and selection tests.
//!
//! Scripts use scipy-style indexing: operands below `point_count` name
//! points, and `point_count + k` names the node produced by merge `k`.
//! Distances never decrease along a script.

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// One merge step of a [`Dendrogram`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScriptedMerge {
    /// First operand index.
    pub left: usize,
    /// Second operand index.
    pub right: usize,
    /// Linkage distance of the merge.
    pub distance: f64,
}

impl ScriptedMerge {
    /// Creates a merge step.
    #[must_use]
    pub const fn new(left: usize, right: usize, distance: f64) -> Self {
        Self {
            left,
            right,
            distance,
        }
    }
}

/// A complete linkage script reducing `point_count` points to one root.
#[derive(Clone, Debug, PartialEq)]
pub struct Dendrogram {
    /// Number of points merged by the script.
    pub point_count: usize,
    /// Merge steps in execution order.
    pub merges: Vec<ScriptedMerge>,
}

impl Dendrogram {
    /// Two mirrored groups of four points that grow one point at a time and
    /// join at distance 4.
    ///
    /// Points `0..4` and `4..8` each start with a pair at distance 1, absorb
    /// a third point at 2 and a fourth at 3.
    ///
    /// # Examples
    /// ```
    /// use hdcluster_test_support::dendrograms::Dendrogram;
    ///
    /// let script = Dendrogram::balanced_eight();
    /// assert_eq!(script.merges.len(), 7);
    /// assert_eq!(script.root_id(), 14);
    /// ```
    #[must_use]
    pub fn balanced_eight() -> Self {
        Self {
            point_count: 8,
            merges: vec![
                ScriptedMerge::new(0, 1, 1.0),
                ScriptedMerge::new(4, 5, 1.0),
                ScriptedMerge::new(8, 2, 2.0),
                ScriptedMerge::new(9, 6, 2.0),
                ScriptedMerge::new(10, 3, 3.0),
                ScriptedMerge::new(11, 7, 3.0),
                ScriptedMerge::new(12, 13, 4.0),
            ],
        }
    }

    /// A caterpillar: points `0` and `1` join at distance 1, then point `k`
    /// joins the running cluster at distance `k`.
    ///
    /// # Panics
    /// Panics when `point_count < 2`.
    #[must_use]
    pub fn chain(point_count: usize) -> Self {
        assert!(point_count >= 2, "a chain needs at least two points");
        let merges = (1..point_count)
            .map(|point| {
                let left = if point == 1 { 0 } else { point_count + point - 2 };
                ScriptedMerge::new(left, point, point as f64)
            })
            .collect();
        Self {
            point_count,
            merges,
        }
    }

    /// Separated groups: every group is merged internally with small,
    /// interleaved distances before the group roots join far apart.
    ///
    /// # Panics
    /// Panics when `groups == 0` or `group_size == 0`, or when the script
    /// would contain a single point.
    #[must_use]
    pub fn blobs(groups: usize, group_size: usize, seed: u64) -> Self {
        assert!(groups > 0 && group_size > 0, "blobs need points");
        let point_count = groups * group_size;
        assert!(point_count >= 2, "a dendrogram needs at least two points");
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut script = Recorder::new(point_count, rng.gen_range(0.05..0.2));
        let mut live: Vec<Vec<usize>> = (0..groups)
            .map(|group| (group * group_size..(group + 1) * group_size).collect())
            .collect();

        loop {
            let open: Vec<&mut Vec<usize>> =
                live.iter_mut().filter(|group| group.len() > 1).collect();
            if open.is_empty() {
                break;
            }
            let pick = rng.gen_range(0..open.len());
            let Some(group) = open.into_iter().nth(pick) else {
                break;
            };
            let step = rng.gen_range(0.0..0.05);
            let merged = script.join_random(group, &mut rng, step);
            group.push(merged);
        }

        let mut roots: Vec<usize> = live.into_iter().flatten().collect();
        script.advance(10.0);
        while roots.len() > 1 {
            let step = rng.gen_range(1.0..5.0);
            let merged = script.join_random(&mut roots, &mut rng, step);
            roots.push(merged);
        }
        script.finish()
    }

    /// Random topology over `point_count` points with occasional distance
    /// ties.
    ///
    /// # Panics
    /// Panics when `point_count < 2`.
    #[must_use]
    pub fn random(point_count: usize, seed: u64) -> Self {
        assert!(point_count >= 2, "a dendrogram needs at least two points");
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut script = Recorder::new(point_count, rng.gen_range(0.05..1.0));
        let mut live: Vec<usize> = (0..point_count).collect();
        while live.len() > 1 {
            let step = if rng.gen_bool(0.2) {
                0.0
            } else {
                rng.gen_range(0.05..1.0)
            };
            let merged = script.join_random(&mut live, &mut rng, step);
            live.push(merged);
        }
        script.finish()
    }

    /// Returns the index assigned to the final merge.
    #[must_use]
    pub const fn root_id(&self) -> usize {
        self.point_count + self.merges.len() - 1
    }
}

struct Recorder {
    point_count: usize,
    distance: f64,
    merges: Vec<ScriptedMerge>,
}

impl Recorder {
    fn new(point_count: usize, first_distance: f64) -> Self {
        Self {
            point_count,
            distance: first_distance,
            merges: Vec::with_capacity(point_count.saturating_sub(1)),
        }
    }

    fn advance(&mut self, step: f64) {
        self.distance += step;
    }

    /// Removes two random entries from `live`, merges them and returns the
    /// new node's index.
    fn join_random(&mut self, live: &mut Vec<usize>, rng: &mut SmallRng, step: f64) -> usize {
        let left = live.swap_remove(rng.gen_range(0..live.len()));
        let right = live.swap_remove(rng.gen_range(0..live.len()));
        self.merges
            .push(ScriptedMerge::new(left, right, self.distance));
        self.advance(step);
        self.point_count + self.merges.len() - 1
    }

    fn finish(self) -> Dendrogram {
        Dendrogram {
            point_count: self.point_count,
            merges: self.merges,
        }
    }
}
