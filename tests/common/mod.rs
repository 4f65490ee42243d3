//! Shared fixtures for integration tests.
//!
//! For assertion helpers, use `colforest::testing`.

#![allow(dead_code)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use colforest::{Dataset, FeatureType};

// Re-export testing utilities for convenience
#[allow(unused_imports)]
pub use colforest::assert_cost_eq;
#[allow(unused_imports)]
pub use colforest::testing::{DEFAULT_TOLERANCE, brute_force_split, mask_ids};

// =============================================================================
// Fixtures
// =============================================================================

/// Four instances with one sparse, one dense and two flag features.
///
/// Labels `[0, 1, 12, 1]` map to classes `[0, 1, 2, 1]`.
pub fn small_dataset(sorted: bool) -> Dataset {
    let mut ds = Dataset::with_sorting(sorted);
    let ordinal = [20.0, 30.0, 0.0, 0.0];
    ds.add_feature(&ordinal, FeatureType::Ordinal, true).unwrap();
    ds.add_feature(&ordinal, FeatureType::Ordinal, false).unwrap();
    ds.add_feature(&[0.0, 0.0, 1.0, 1.0], FeatureType::Flags, false)
        .unwrap();
    ds.add_feature(&[1.0, 1.0, 0.0, 0.0], FeatureType::Flags, true)
        .unwrap();
    ds.add_feature(&[1.0, 1.0, 1.0, 1.0], FeatureType::Flags, false)
        .unwrap();
    ds.add_labels(&[0.0, 1.0, 12.0, 1.0]).unwrap();
    ds
}

/// Random column with roughly `zero_rate` zeros and values drawn from a
/// small grid, so ties are common.
pub fn random_values(rng: &mut impl Rng, n: usize, zero_rate: f64) -> Vec<f32> {
    (0..n)
        .map(|_| {
            if rng.gen_bool(zero_rate) {
                0.0
            } else {
                rng.gen_range(-5i32..=5) as f32 * 0.5
            }
        })
        .collect()
}

/// Sorted dataset with `n_features` mixed columns and `n_classes` labels.
pub fn random_dataset(seed: u64, n: usize, n_features: usize, n_classes: u32) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ds = Dataset::sorted();
    for f in 0..n_features {
        match f % 3 {
            0 => {
                let values = random_values(&mut rng, n, 0.1);
                ds.add_feature(&values, FeatureType::Ordinal, false).unwrap();
            }
            1 => {
                let values = random_values(&mut rng, n, 0.6);
                ds.add_feature(&values, FeatureType::Ordinal, true).unwrap();
            }
            _ => {
                let flags: Vec<f32> = (0..n).map(|_| rng.gen_range(0..2) as f32).collect();
                ds.add_feature(&flags, FeatureType::Flags, false).unwrap();
            }
        }
    }
    let labels: Vec<f32> = (0..n).map(|_| rng.gen_range(0..n_classes) as f32).collect();
    ds.add_labels(&labels).unwrap();
    ds
}
