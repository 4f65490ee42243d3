//! Dense column: one `(value, id)` entry per in-scope instance.

use ndarray::Array1;

use super::{
    BestBoundary, ColumnKind, FeatureColumn, SplitCandidate, SplitColumn, SplitContext,
    check_split_masks, scan_sorted_run, scatter,
};
use crate::data::{DataError, ScopeMask};
use crate::metric::DecisionMetric;
use crate::sampling::Subsample;
use crate::utils::{is_homogeneous, partition_pairs};

/// Dense scope window.
#[derive(Debug)]
pub struct DenseColumn<'a> {
    values: &'a mut [f32],
    ids: &'a mut [u32],
    sorted: bool,
    id_space: usize,
    redundant: bool,
}

impl<'a> DenseColumn<'a> {
    pub(crate) fn new(
        values: &'a mut [f32],
        ids: &'a mut [u32],
        sorted: bool,
        id_space: usize,
    ) -> Self {
        let redundant = is_redundant(values, sorted);
        Self::with_redundancy(values, ids, sorted, id_space, redundant)
    }

    pub(crate) fn with_redundancy(
        values: &'a mut [f32],
        ids: &'a mut [u32],
        sorted: bool,
        id_space: usize,
        redundant: bool,
    ) -> Self {
        debug_assert_eq!(values.len(), ids.len());
        Self {
            values,
            ids,
            sorted,
            id_space,
            redundant,
        }
    }

    /// Values in window order.
    #[inline]
    pub fn scope_values(&self) -> &[f32] {
        &*self.values
    }

    #[inline]
    pub fn ids(&self) -> &[u32] {
        &*self.ids
    }

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }
}

impl SplitColumn for DenseColumn<'_> {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Dense
    }

    #[inline]
    fn len(&self) -> usize {
        self.values.len()
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
        if !self.sorted {
            return Err(DataError::Unsorted);
        }
        ctx.check(self.id_space)?;

        let mut partial = vec![0usize; ctx.label_counts.len()];
        let mut best = BestBoundary::default();
        scan_sorted_run(
            &*self.values,
            &*self.ids,
            ctx,
            metric,
            &mut partial,
            &mut best,
            0,
            false,
        );

        Ok(best.into_inner().map(|(boundary, cost)| {
            let (left_ids, right_ids) = self.ids.split_at(boundary.first_right);
            let mut left = ScopeMask::all_out(self.id_space);
            let mut right = ScopeMask::all_out(self.id_space);
            left_ids.iter().for_each(|&id| left.include(id));
            right_ids.iter().for_each(|&id| right.include(id));
            SplitCandidate {
                left,
                right,
                threshold: boundary.threshold,
                cost,
            }
        }))
    }

    fn split(self, left: &ScopeMask, right: &ScopeMask) -> Result<(Self, Self), DataError> {
        check_split_masks(self.id_space, left, right)?;
        let DenseColumn {
            values,
            ids,
            sorted,
            id_space,
            ..
        } = self;

        let mid = partition_pairs(values, ids, |id| left.is_in(id));
        let (left_values, right_values) = values.split_at_mut(mid);
        let (left_ids, right_ids) = ids.split_at_mut(mid);
        Ok((
            DenseColumn::new(left_values, left_ids, sorted, id_space),
            DenseColumn::new(right_values, right_ids, sorted, id_space),
        ))
    }

    fn subsample(&self, draw: &Subsample) -> Result<FeatureColumn, DataError> {
        draw.check_id_space(self.id_space)?;
        Ok(subsample(&*self.values, &*self.ids, self.sorted, draw))
    }

    fn values(&self) -> Array1<f32> {
        scatter(&*self.values, &*self.ids, self.id_space)
    }
}

// ============================================================================
// Storage helpers
// ============================================================================

/// Entries for `raw`: identity ids, optionally ordered by value.
pub(super) fn build(raw: &[f32], sorted: bool) -> (Vec<f32>, Vec<u32>) {
    let mut values = raw.to_vec();
    let mut ids: Vec<u32> = (0..raw.len() as u32).collect();
    if sorted {
        sort_entries(&mut values, &mut ids);
    }
    (values, ids)
}

/// Stable sort of `(value, id)` pairs by value.
pub(super) fn sort_entries(values: &mut [f32], ids: &mut [u32]) {
    let mut pairs: Vec<(f32, u32)> = values.iter().copied().zip(ids.iter().copied()).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    for (i, (value, id)) in pairs.into_iter().enumerate() {
        values[i] = value;
        ids[i] = id;
    }
}

pub(super) fn is_redundant(values: &[f32], sorted: bool) -> bool {
    if values.len() < 2 {
        return true;
    }
    if sorted {
        values[0] == values[values.len() - 1]
    } else {
        is_homogeneous(values)
    }
}

pub(super) fn subsample(
    values: &[f32],
    ids: &[u32],
    sorted: bool,
    draw: &Subsample,
) -> FeatureColumn {
    let (values, ids) = draw.expand_pairs(values, ids);
    FeatureColumn::from_dense(values, ids, sorted)
}
