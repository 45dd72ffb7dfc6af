//! Strategy builders for hierarchy property tests.

use hdcluster_test_support::dendrograms::Dendrogram;
use proptest::prelude::*;
use rand::{Rng, SeedableRng, rngs::SmallRng};

use super::types::{HierarchyFixture, TreeShape};

const MAX_RANDOM_POINTS: usize = 200;
const MAX_CHAIN_POINTS: usize = 120;
const MAX_GROUPS: usize = 6;
const MAX_GROUP_SIZE: usize = 30;
const MAX_MIN_CLUSTER_SIZE: usize = 12;

/// Generates fixtures across every [`TreeShape`].
pub(super) fn hierarchy_fixture_strategy() -> impl Strategy<Value = HierarchyFixture> {
    (any::<TreeShape>(), any::<u64>()).prop_map(|(shape, seed)| {
        let mut rng = SmallRng::seed_from_u64(seed);
        generate_fixture(shape, &mut rng)
    })
}

/// Generates a fixture for a specific shape, for targeted rstest cases.
pub(super) fn generate_fixture(shape: TreeShape, rng: &mut SmallRng) -> HierarchyFixture {
    let script = match shape {
        TreeShape::Random => Dendrogram::random(rng.gen_range(2..=MAX_RANDOM_POINTS), rng.r#gen()),
        TreeShape::Blobs => Dendrogram::blobs(
            rng.gen_range(2..=MAX_GROUPS),
            rng.gen_range(1..=MAX_GROUP_SIZE),
            rng.r#gen(),
        ),
        TreeShape::Chain => Dendrogram::chain(rng.gen_range(2..=MAX_CHAIN_POINTS)),
    };
    let min_cluster_size = rng.gen_range(1..=MAX_MIN_CLUSTER_SIZE.min(script.point_count));
    HierarchyFixture {
        shape,
        script,
        min_cluster_size,
    }
}
