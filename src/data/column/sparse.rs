//! Sparse column: explicit non-zero entries plus an implicit zero band.
//!
//! Sorted windows hold `neg_count` negative entries followed by the positive
//! ones. The `len - nnz` instances of the node without an explicit entry read
//! `0.0` and sit conceptually between the two runs, so a search walks
//! negatives, then the zero band, then positives.

use ndarray::Array1;

use super::{
    BestBoundary, Boundary, ColumnKind, FeatureColumn, SPLIT_EPSILON, SplitCandidate,
    SplitColumn, SplitContext, check_split_masks, dense, scan_sorted_run, scatter,
};
use crate::data::{DataError, ScopeMask};
use crate::metric::DecisionMetric;
use crate::sampling::Subsample;
use crate::utils::{is_homogeneous, partition_pairs};

/// Sparse scope window.
#[derive(Debug)]
pub struct SparseColumn<'a> {
    values: &'a mut [f32],
    ids: &'a mut [u32],
    /// `None` while entries are in id order.
    neg_count: Option<usize>,
    len: usize,
    id_space: usize,
    redundant: bool,
}

impl<'a> SparseColumn<'a> {
    pub(crate) fn new(
        values: &'a mut [f32],
        ids: &'a mut [u32],
        neg_count: Option<usize>,
        len: usize,
        id_space: usize,
    ) -> Self {
        let redundant = is_redundant(values, len);
        Self::with_redundancy(values, ids, neg_count, len, id_space, redundant)
    }

    pub(crate) fn with_redundancy(
        values: &'a mut [f32],
        ids: &'a mut [u32],
        neg_count: Option<usize>,
        len: usize,
        id_space: usize,
        redundant: bool,
    ) -> Self {
        debug_assert_eq!(values.len(), ids.len());
        debug_assert!(values.len() <= len);
        Self {
            values,
            ids,
            neg_count,
            len,
            id_space,
            redundant,
        }
    }

    #[inline]
    pub fn scope_values(&self) -> &[f32] {
        &*self.values
    }

    #[inline]
    pub fn ids(&self) -> &[u32] {
        &*self.ids
    }

    /// Number of leading negative entries, `None` if unsorted.
    #[inline]
    pub fn neg_count(&self) -> Option<usize> {
        self.neg_count
    }

    /// Instances of the scope reading an implicit zero.
    #[inline]
    pub fn zero_count(&self) -> usize {
        self.len.saturating_sub(self.values.len())
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.neg_count.is_some()
    }

    fn candidate(&self, ctx: &SplitContext<'_>, boundary: Boundary, cost: f64) -> SplitCandidate {
        let (left, right) = if boundary.zeros_left {
            let mut left = ctx.mask.clone();
            let mut right = ScopeMask::all_out(self.id_space);
            for &id in &self.ids[boundary.first_right..] {
                left.exclude(id);
                right.include(id);
            }
            (left, right)
        } else {
            let mut left = ScopeMask::all_out(self.id_space);
            let mut right = ctx.mask.clone();
            for &id in &self.ids[..boundary.first_right] {
                left.include(id);
                right.exclude(id);
            }
            (left, right)
        };
        SplitCandidate {
            left,
            right,
            threshold: boundary.threshold,
            cost,
        }
    }
}

impl SplitColumn for SparseColumn<'_> {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Sparse
    }

    #[inline]
    fn len(&self) -> usize {
        self.len
    }

    #[inline]
    fn is_redundant(&self) -> bool {
        self.redundant
    }

    fn find_best_split<M: DecisionMetric + ?Sized>(
        &self,
        ctx: &SplitContext<'_>,
        metric: &M,
    ) -> Result<Option<SplitCandidate>, DataError> {
        let Some(k) = self.neg_count else {
            return Err(DataError::Unsorted);
        };
        ctx.check(self.id_space)?;

        let values = &*self.values;
        let ids = &*self.ids;
        let zeros = self.zero_count();
        let mut partial = vec![0usize; ctx.label_counts.len()];
        let mut best = BestBoundary::default();

        // Negatives. The cut after the last one faces the zero band if there
        // is one, otherwise the first positive.
        scan_sorted_run(
            &values[..k],
            &ids[..k],
            ctx,
            metric,
            &mut partial,
            &mut best,
            0,
            false,
        );
        if k > 0 {
            partial[ctx.label_of(ids[k - 1])] += 1;
            let next = if zeros > 0 {
                Some(0.0)
            } else {
                values.get(k).copied()
            };
            if let Some(next) = next {
                if next - values[k - 1] >= SPLIT_EPSILON {
                    let cost = metric.calculate(ctx.label_counts, &partial, ctx.n_instances);
                    best.offer(
                        Boundary {
                            first_right: k,
                            zeros_left: false,
                            threshold: next,
                        },
                        cost,
                    );
                }
            }
        }

        // Zero band: everything except the positives is on the left.
        if zeros > 0 {
            partial.copy_from_slice(ctx.label_counts);
            for &id in &ids[k..] {
                let label = ctx.label_of(id);
                debug_assert!(partial[label] > 0, "label counts do not cover instance {id}");
                partial[label] = partial[label].saturating_sub(1);
            }
            if k < values.len() && values[k] >= SPLIT_EPSILON {
                let cost = metric.calculate(ctx.label_counts, &partial, ctx.n_instances);
                best.offer(
                    Boundary {
                        first_right: k,
                        zeros_left: true,
                        threshold: values[k],
                    },
                    cost,
                );
            }
        }

        scan_sorted_run(
            &values[k..],
            &ids[k..],
            ctx,
            metric,
            &mut partial,
            &mut best,
            k,
            true,
        );

        Ok(best
            .into_inner()
            .map(|(boundary, cost)| self.candidate(ctx, boundary, cost)))
    }

    fn split(self, left: &ScopeMask, right: &ScopeMask) -> Result<(Self, Self), DataError> {
        check_split_masks(self.id_space, left, right)?;
        let SparseColumn {
            values,
            ids,
            neg_count,
            id_space,
            ..
        } = self;

        let mid = partition_pairs(values, ids, |id| left.is_in(id));
        let left_neg = neg_count.map(|_| values[..mid].iter().filter(|&&v| v < 0.0).count());
        let right_neg = neg_count.zip(left_neg).map(|(k, l)| k - l);

        let (left_values, right_values) = values.split_at_mut(mid);
        let (left_ids, right_ids) = ids.split_at_mut(mid);
        Ok((
            SparseColumn::new(
                left_values,
                left_ids,
                left_neg,
                left.in_scope_count(),
                id_space,
            ),
            SparseColumn::new(
                right_values,
                right_ids,
                right_neg,
                right.in_scope_count(),
                id_space,
            ),
        ))
    }

    fn subsample(&self, draw: &Subsample) -> Result<FeatureColumn, DataError> {
        draw.check_id_space(self.id_space)?;
        Ok(subsample(&*self.values, &*self.ids, self.neg_count, draw))
    }

    fn values(&self) -> Array1<f32> {
        scatter(&*self.values, &*self.ids, self.id_space)
    }
}

// ============================================================================
// Storage helpers
// ============================================================================

/// Non-zero entries of `raw`, in id order or sorted by value.
pub(super) fn build(raw: &[f32], sorted: bool) -> (Vec<f32>, Vec<u32>, Option<usize>) {
    let (mut values, mut ids): (Vec<f32>, Vec<u32>) = raw
        .iter()
        .enumerate()
        .filter(|(_, v)| **v != 0.0)
        .map(|(id, &v)| (v, id as u32))
        .unzip();
    let neg_count = sorted.then(|| sort_entries(&mut values, &mut ids));
    (values, ids, neg_count)
}

/// Sort entries by value and return the number of negatives.
pub(super) fn sort_entries(values: &mut [f32], ids: &mut [u32]) -> usize {
    dense::sort_entries(values, ids);
    values.iter().take_while(|&&v| v < 0.0).count()
}

pub(super) fn is_redundant(values: &[f32], len: usize) -> bool {
    len < 2 || values.is_empty() || (values.len() >= len && is_homogeneous(values))
}

pub(super) fn subsample(
    values: &[f32],
    ids: &[u32],
    neg_count: Option<usize>,
    draw: &Subsample,
) -> FeatureColumn {
    let (new_values, new_ids) = draw.expand_pairs(values, ids);
    let neg_count = neg_count.map(|k| draw.expanded_count(&ids[..k]));
    FeatureColumn::from_sparse(new_values, new_ids, neg_count, draw.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::metric::GiniImpurity;

    fn flat(_: &[usize], _: &[usize], _: usize) -> f64 {
        1.0
    }

    fn ids_of(mask: &ScopeMask) -> Vec<u32> {
        mask.in_scope_ids().collect()
    }

    fn sparse_view<'a>(col: &'a mut FeatureColumn) -> SparseColumn<'a> {
        match col.view() {
            Column::Sparse(s) => s,
            other => panic!("expected sparse view, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_build_orders_negatives_first() {
        let mut col = FeatureColumn::sparse(&[3.0, 0.0, -1.0, 0.0, -4.0, 2.0], true).unwrap();
        let view = sparse_view(&mut col);
        assert_eq!(view.scope_values(), &[-4.0, -1.0, 2.0, 3.0]);
        assert_eq!(view.ids(), &[4, 2, 5, 0]);
        assert_eq!(view.neg_count(), Some(2));
        assert_eq!(view.zero_count(), 2);
        assert_eq!(view.len(), 6);
    }

    #[test]
    fn test_unsorted_build_keeps_negatives() {
        let mut col = FeatureColumn::sparse(&[0.0, -2.0, 5.0], false).unwrap();
        let view = sparse_view(&mut col);
        assert_eq!(view.scope_values(), &[-2.0, 5.0]);
        assert_eq!(view.ids(), &[1, 2]);
        assert_eq!(view.neg_count(), None);
    }

    #[test]
    fn test_tie_prefers_cut_before_zero_band() {
        // [-1, 0, 0, 3, 4]: every boundary costs the same.
        let mut col = FeatureColumn::sparse(&[-1.0, 0.0, 0.0, 3.0, 4.0], true).unwrap();
        let labels = [0u32, 1, 0, 1, 0];
        let counts = [3usize, 2];
        let mask = ScopeMask::all_in(5);
        let ctx = SplitContext::new(&labels, &counts, &mask);

        let best = col.view().find_best_split(&ctx, &flat).unwrap().unwrap();
        assert_eq!(best.threshold, 0.0);
        assert_eq!(best.cost, 1.0);
        assert_eq!(ids_of(&best.left), vec![0]);
        assert_eq!(ids_of(&best.right), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_cut_after_zero_band() {
        let mut col = FeatureColumn::sparse(&[0.0, 0.0, 5.0, 6.0], true).unwrap();
        let labels = [0u32, 0, 1, 1];
        let counts = [2usize, 2];
        let mask = ScopeMask::all_in(4);
        let ctx = SplitContext::new(&labels, &counts, &mask);

        let best = col.view().find_best_split(&ctx, &GiniImpurity).unwrap().unwrap();
        assert_eq!(best.threshold, 5.0);
        assert_eq!(best.cost, 0.0);
        assert_eq!(ids_of(&best.left), vec![0, 1]);
        assert_eq!(ids_of(&best.right), vec![2, 3]);
    }

    #[test]
    fn test_cut_between_negative_and_positive_without_zeros() {
        let mut col = FeatureColumn::sparse(&[-1.0, 2.0], true).unwrap();
        let labels = [0u32, 1];
        let counts = [1usize, 1];
        let mask = ScopeMask::all_in(2);
        let ctx = SplitContext::new(&labels, &counts, &mask);

        let best = col.view().find_best_split(&ctx, &GiniImpurity).unwrap().unwrap();
        assert_eq!(best.threshold, 2.0);
        assert_eq!(ids_of(&best.left), vec![0]);
        assert_eq!(ids_of(&best.right), vec![1]);
    }

    #[test]
    fn test_negatives_only() {
        let mut col = FeatureColumn::sparse(&[-2.0, -1.0], true).unwrap();
        let labels = [0u32, 1];
        let counts = [1usize, 1];
        let mask = ScopeMask::all_in(2);
        let ctx = SplitContext::new(&labels, &counts, &mask);

        let best = col.view().find_best_split(&ctx, &flat).unwrap().unwrap();
        assert_eq!(best.threshold, -1.0);
        assert_eq!(ids_of(&best.left), vec![0]);
        assert_eq!(ids_of(&best.right), vec![1]);
    }

    #[test]
    fn test_split_tracks_negatives_and_lengths() {
        let mut col = FeatureColumn::sparse(&[-1.0, 0.0, 0.0, 3.0, 4.0], true).unwrap();
        let left = ScopeMask::from_out_flags(vec![false, false, false, true, true]);
        let right = ScopeMask::from_out_flags(vec![true, true, true, false, false]);

        let (l, r) = sparse_view(&mut col).split(&left, &right).unwrap();
        assert_eq!(l.len(), 3);
        assert_eq!(l.neg_count(), Some(1));
        assert_eq!(l.zero_count(), 2);
        assert_eq!(r.len(), 2);
        assert_eq!(r.neg_count(), Some(0));
        assert_eq!(r.zero_count(), 0);
        assert_eq!(l.values().to_vec(), vec![-1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(r.values().to_vec(), vec![0.0, 0.0, 0.0, 3.0, 4.0]);
        assert!(!r.is_redundant());
    }

    #[test]
    fn test_redundancy() {
        assert!(FeatureColumn::sparse(&[0.0, 0.0], true).unwrap().is_redundant());
        assert!(FeatureColumn::sparse(&[2.0, 2.0], true).unwrap().is_redundant());
        assert!(FeatureColumn::sparse(&[3.0], true).unwrap().is_redundant());
        assert!(!FeatureColumn::sparse(&[2.0, 0.0], true).unwrap().is_redundant());
        assert!(!FeatureColumn::sparse(&[2.0, 0.0], false).unwrap().is_redundant());
    }

    #[test]
    fn test_subsample_recounts_negatives() {
        let col = FeatureColumn::sparse(&[-1.0, 2.0, 0.0], true).unwrap();
        let mut sub = col.subsample(&Subsample::from_occurrences(vec![3, 0, 1])).unwrap();
        assert_eq!(sub.len(), 4);
        assert_eq!(sub.values().to_vec(), vec![-1.0, -1.0, -1.0, 0.0]);
        let view = sparse_view(&mut sub);
        assert_eq!(view.neg_count(), Some(3));
        assert_eq!(view.zero_count(), 1);
    }

    #[test]
    fn test_subsample_keeps_unsorted_marker() {
        let col = FeatureColumn::sparse(&[-1.0, 2.0, 0.0], false).unwrap();
        let sub = col.subsample(&Subsample::from_occurrences(vec![1, 1, 1])).unwrap();
        assert!(!sub.is_sorted());
        assert_eq!(sub, col);
    }
}
