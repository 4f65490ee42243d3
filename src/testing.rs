//! Testing utilities for colforest.
//!
//! Assertion helpers and a brute-force reference split search used by unit
//! tests, integration tests and property tests.
//!
//! ```ignore
//! use colforest::testing::{brute_force_split, mask_ids};
//! ```

use approx::AbsDiffEq;

use crate::data::{SPLIT_EPSILON, ScopeMask};
use crate::metric::DecisionMetric;

// =============================================================================
// Constants
// =============================================================================

/// Default tolerance for comparing split costs.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// =============================================================================
// Assertions
// =============================================================================

/// Assert that two split costs are approximately equal.
///
/// # Examples
///
/// ```
/// # use colforest::assert_cost_eq;
/// assert_cost_eq!(0.5f64, 0.5f64 + 1e-12);
/// ```
#[macro_export]
macro_rules! assert_cost_eq {
    ($left:expr, $right:expr) => {
        $crate::assert_cost_eq!($left, $right, $crate::testing::DEFAULT_TOLERANCE)
    };
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val: f64 = $left;
        let right_val: f64 = $right;
        if !$crate::testing::costs_match(left_val, right_val, $tolerance) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n tolerance: `{:?}`",
                left_val, right_val, $tolerance
            );
        }
    }};
}

/// True if both costs are within `tolerance`, or both are infinite with equal sign.
pub fn costs_match(left: f64, right: f64, tolerance: f64) -> bool {
    if left.is_infinite() || right.is_infinite() {
        return left == right;
    }
    left.abs_diff_eq(&right, tolerance)
}

/// In-scope ids of a mask, ascending.
pub fn mask_ids(mask: &ScopeMask) -> Vec<u32> {
    mask.in_scope_ids().collect()
}

// =============================================================================
// Reference split search
// =============================================================================

/// Result of [`brute_force_split`].
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceSplit {
    pub threshold: f32,
    pub cost: f64,
    /// Ids with `value < threshold`, ascending.
    pub left: Vec<u32>,
}

/// Best split over every instance of a fully materialised feature.
///
/// Sorts all `(value, id)` pairs, then evaluates every boundary between
/// values at least [`SPLIT_EPSILON`] apart, keeping the first minimum.
pub fn brute_force_split<M: DecisionMetric + ?Sized>(
    values: &[f32],
    labels: &[u32],
    n_classes: usize,
    metric: &M,
) -> Option<ReferenceSplit> {
    let mut order: Vec<u32> = (0..values.len() as u32).collect();
    order.sort_by(|&a, &b| values[a as usize].total_cmp(&values[b as usize]));

    let mut global = vec![0usize; n_classes];
    for &label in labels {
        global[label as usize] += 1;
    }

    let mut partial = vec![0usize; n_classes];
    let mut best: Option<(usize, f64)> = None;
    for pos in 0..order.len().saturating_sub(1) {
        let id = order[pos] as usize;
        partial[labels[id] as usize] += 1;
        let next = values[order[pos + 1] as usize];
        if next - values[id] < SPLIT_EPSILON {
            continue;
        }
        let cost = metric.calculate(&global, &partial, values.len());
        if best.is_none_or(|(_, c)| cost < c) {
            best = Some((pos + 1, cost));
        }
    }

    best.map(|(first_right, cost)| {
        let mut left = order[..first_right].to_vec();
        left.sort_unstable();
        ReferenceSplit {
            threshold: values[order[first_right] as usize],
            cost,
            left,
        }
    })
}
