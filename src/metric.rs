//! Decision metrics scoring candidate splits.
//!
//! A metric receives the label counts of the whole node (`global`), the
//! counts on the left side of a candidate boundary (`partial`), and the
//! node's instance count. The right side is implied as `global - partial`.
//! Lower cost is better.

/// Cost function over label counts. Lower is better.
pub trait DecisionMetric: Send + Sync {
    fn calculate(&self, global: &[usize], partial: &[usize], n_instances: usize) -> f64;
}

impl<F> DecisionMetric for F
where
    F: Fn(&[usize], &[usize], usize) -> f64 + Send + Sync,
{
    #[inline]
    fn calculate(&self, global: &[usize], partial: &[usize], n_instances: usize) -> f64 {
        self(global, partial, n_instances)
    }
}

// =============================================================================
// Impurity metrics
// =============================================================================

/// Weighted Gini impurity of the two children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GiniImpurity;

/// Weighted Shannon entropy (base 2) of the two children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Entropy;

impl DecisionMetric for GiniImpurity {
    fn calculate(&self, global: &[usize], partial: &[usize], n_instances: usize) -> f64 {
        weighted_children(global, partial, n_instances, gini)
    }
}

impl DecisionMetric for Entropy {
    fn calculate(&self, global: &[usize], partial: &[usize], n_instances: usize) -> f64 {
        weighted_children(global, partial, n_instances, entropy)
    }
}

fn weighted_children<I>(global: &[usize], partial: &[usize], n_instances: usize, impurity: I) -> f64
where
    I: Fn(&mut dyn Iterator<Item = usize>, usize) -> f64,
{
    if n_instances == 0 {
        return 0.0;
    }
    let n_left: usize = partial.iter().sum();
    let n_right = n_instances.saturating_sub(n_left);

    let left = impurity(&mut partial.iter().copied(), n_left);
    let right = impurity(
        &mut global
            .iter()
            .zip(partial)
            .map(|(&g, &p)| g.saturating_sub(p)),
        n_right,
    );

    (n_left as f64 * left + n_right as f64 * right) / n_instances as f64
}

fn gini(counts: &mut dyn Iterator<Item = usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let sum_sq: f64 = counts
        .map(|c| {
            let p = c as f64 / total;
            p * p
        })
        .sum();
    1.0 - sum_sq
}

fn entropy(counts: &mut dyn Iterator<Item = usize>, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}
