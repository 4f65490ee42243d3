//! Growing whole trees with a worklist of node views.
//!
//! Exercises the search / split cycle end to end: every node's split is
//! checked against a brute-force search over that node's instances, and the
//! leaves must partition the instance set.

mod common;

use rstest::rstest;

use colforest::{
    Dataset, Entropy, FeatureType, GiniImpurity, NodeView, Parallelism, SplitColumn,
};
use common::*;

struct Leaf {
    ids: Vec<u32>,
    class: Option<u32>,
}

/// Grow until every node is pure or has no candidate split.
fn grow(
    ds: &mut Dataset,
    parallelism: Parallelism,
    mut check: impl FnMut(&NodeView<'_>),
) -> Vec<Leaf> {
    let mut leaves = Vec::new();
    let mut worklist = vec![ds.root().unwrap()];
    while let Some(node) = worklist.pop() {
        check(&node);
        let best = if node.is_pure() {
            None
        } else {
            node.find_best_feature_split(&GiniImpurity, parallelism)
                .unwrap()
        };
        match best {
            Some(best) => {
                let (left, right) = node.apply_split(best.candidate).unwrap();
                assert!(left.n_instances() > 0 && right.n_instances() > 0);
                worklist.push(left);
                worklist.push(right);
            }
            None => leaves.push(Leaf {
                ids: node.mask().in_scope_ids().collect(),
                class: node.majority_label(),
            }),
        }
    }
    leaves
}

#[rstest]
#[case(5, 60, 6, 2, Parallelism::Sequential)]
#[case(6, 90, 7, 3, Parallelism::Parallel)]
#[case(7, 30, 3, 4, Parallelism::Sequential)]
fn test_leaves_partition_instances(
    #[case] seed: u64,
    #[case] n: usize,
    #[case] n_features: usize,
    #[case] n_classes: u32,
    #[case] parallelism: Parallelism,
) {
    let mut ds = random_dataset(seed, n, n_features, n_classes);
    let raw: Vec<Vec<f32>> = ds.features().iter().map(|c| c.values().to_vec()).collect();
    let labels = ds.labels().unwrap().to_vec();
    let k = ds.n_classes();

    let leaves = grow(&mut ds, parallelism, |node| {
        let ids: Vec<u32> = node.mask().in_scope_ids().collect();
        let node_labels: Vec<u32> = ids.iter().map(|&id| labels[id as usize]).collect();

        for (feature, column) in node.columns().iter().enumerate() {
            assert_eq!(column.len(), ids.len(), "feature {feature}");

            // the window still reads the original values
            let values = column.values();
            for &id in &ids {
                assert_eq!(values[id as usize], raw[feature][id as usize]);
            }

            if column.is_redundant() {
                continue;
            }
            let node_values: Vec<f32> = ids.iter().map(|&id| raw[feature][id as usize]).collect();
            let expected = brute_force_split(&node_values, &node_labels, k, &GiniImpurity)
                .expect("non-redundant column has a boundary");
            let found = node
                .find_best_split(feature, &GiniImpurity)
                .unwrap()
                .unwrap();
            assert_eq!(found.threshold, expected.threshold);
            assert_cost_eq!(found.cost, expected.cost);
            let expected_left: Vec<u32> = expected.left.iter().map(|&i| ids[i as usize]).collect();
            assert_eq!(mask_ids(&found.left), expected_left);
        }
    });

    let mut covered: Vec<u32> = leaves.iter().flat_map(|l| l.ids.iter().copied()).collect();
    covered.sort_unstable();
    assert_eq!(covered, (0..n as u32).collect::<Vec<_>>());
}

#[test]
fn test_separable_data_gives_pure_leaves() {
    let mut ds = Dataset::sorted();
    let x: Vec<f32> = (0..40).map(|i| (i % 10) as f32 - 4.5).collect();
    let sparse: Vec<f32> = (0..40).map(|i| if i % 4 == 0 { 2.0 } else { 0.0 }).collect();
    ds.add_feature(&x, FeatureType::Ordinal, false).unwrap();
    ds.add_feature(&sparse, FeatureType::Ordinal, true).unwrap();
    let labels: Vec<f32> = x
        .iter()
        .zip(&sparse)
        .map(|(&a, &b)| if a > 0.0 || b > 0.0 { 1.0 } else { 0.0 })
        .collect();
    ds.add_labels(&labels).unwrap();
    let class_of: Vec<u32> = ds.labels().unwrap().to_vec();

    let leaves = grow(&mut ds, Parallelism::Sequential, |_| {});
    for leaf in &leaves {
        let class = leaf.class.unwrap();
        assert!(leaf.ids.iter().all(|&id| class_of[id as usize] == class));
    }
}

#[test]
fn test_entropy_and_gini_agree_on_a_clean_cut() {
    let mut ds = Dataset::sorted();
    ds.add_feature(&[0.0, 0.0, 0.0, 7.0, 8.0, 9.0], FeatureType::Ordinal, true)
        .unwrap();
    ds.add_labels(&[1.0, 1.0, 1.0, 2.0, 2.0, 2.0]).unwrap();
    let root = ds.root().unwrap();

    let gini = root.find_best_split(0, &GiniImpurity).unwrap().unwrap();
    let entropy = root.find_best_split(0, &Entropy).unwrap().unwrap();
    assert_eq!(gini.threshold, 7.0);
    assert_eq!(entropy.threshold, 7.0);
    assert_eq!(gini.left, entropy.left);
}
