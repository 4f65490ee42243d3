//! Binary column: the ids whose flag is `1`.

use ndarray::Array1;

use super::{ColumnKind, FeatureColumn, SplitCandidate, SplitColumn, SplitContext, check_split_masks};
use crate::data::{DataError, ScopeMask};
use crate::metric::DecisionMetric;
use crate::sampling::Subsample;
use crate::utils::partition_ids;

/// Binary flags have a single possible cut: zeros left, ones right.
const BINARY_THRESHOLD: f32 = 1.0;

/// Binary scope window.
#[derive(Debug)]
pub struct BinaryColumn<'a> {
    ids: &'a mut [u32],
    len: usize,
    id_space: usize,
    redundant: bool,
}

impl<'a> BinaryColumn<'a> {
    pub(crate) fn new(ids: &'a mut [u32], len: usize, id_space: usize) -> Self {
        let redundant = is_redundant(ids.len(), len);
        Self::with_redundancy(ids, len, id_space, redundant)
    }

    pub(crate) fn with_redundancy(
        ids: &'a mut [u32],
        len: usize,
        id_space: usize,
        redundant: bool,
    ) -> Self {
        Self {
            ids,
            len,
            id_space,
            redundant,
        }
    }

    /// Ids flagged `1` in scope.
    #[inline]
    pub fn ids(&self) -> &[u32] {
        &*self.ids
    }
}

impl SplitColumn for BinaryColumn<'_> {
    fn kind(&self) -> ColumnKind {
        ColumnKind::Binary
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
        ctx.check(self.id_space)?;
        // all zeros or all ones: one side would be empty
        if self.ids.is_empty() || self.ids.len() >= self.len {
            return Ok(None);
        }

        let mut partial = ctx.label_counts.to_vec();
        let mut left = ctx.mask.clone();
        let mut right = ScopeMask::all_out(self.id_space);
        for &id in self.ids.iter() {
            let label = ctx.label_of(id);
            debug_assert!(partial[label] > 0, "label counts do not cover instance {id}");
            partial[label] = partial[label].saturating_sub(1);
            left.exclude(id);
            right.include(id);
        }

        let cost = metric.calculate(ctx.label_counts, &partial, ctx.n_instances);
        Ok(Some(SplitCandidate {
            left,
            right,
            threshold: BINARY_THRESHOLD,
            cost,
        }))
    }

    fn split(self, left: &ScopeMask, right: &ScopeMask) -> Result<(Self, Self), DataError> {
        check_split_masks(self.id_space, left, right)?;
        let BinaryColumn { ids, id_space, .. } = self;

        let mid = partition_ids(ids, |id| left.is_in(id));
        let (left_ids, right_ids) = ids.split_at_mut(mid);
        Ok((
            BinaryColumn::new(left_ids, left.in_scope_count(), id_space),
            BinaryColumn::new(right_ids, right.in_scope_count(), id_space),
        ))
    }

    fn subsample(&self, draw: &Subsample) -> Result<FeatureColumn, DataError> {
        draw.check_id_space(self.id_space)?;
        Ok(subsample(&*self.ids, draw))
    }

    fn values(&self) -> Array1<f32> {
        scatter_ones(&*self.ids, self.id_space)
    }
}

// ============================================================================
// Storage helpers
// ============================================================================

/// Ids of the `1` flags. Anything other than 0 or 1 is rejected.
pub(super) fn build(raw: &[f32]) -> Result<Vec<u32>, DataError> {
    let mut ids = Vec::new();
    for (instance, &value) in raw.iter().enumerate() {
        if value == 1.0 {
            ids.push(instance as u32);
        } else if value != 0.0 {
            return Err(DataError::InvalidFlag { instance, value });
        }
    }
    Ok(ids)
}

pub(super) fn is_redundant(ones: usize, len: usize) -> bool {
    len < 2 || ones == 0 || ones == len
}

pub(super) fn scatter_ones(ids: &[u32], len: usize) -> Array1<f32> {
    let mut out = Array1::zeros(len);
    for &id in ids {
        out[id as usize] = 1.0;
    }
    out
}

pub(super) fn subsample(ids: &[u32], draw: &Subsample) -> FeatureColumn {
    FeatureColumn::from_binary(draw.expand_ids(ids), draw.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::metric::GiniImpurity;

    fn binary_view<'a>(col: &'a mut FeatureColumn) -> BinaryColumn<'a> {
        match col.view() {
            Column::Binary(b) => b,
            other => panic!("expected binary view, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_build_rejects_non_flags() {
        let err = FeatureColumn::binary(&[0.0, 1.0, 0.5]).unwrap_err();
        assert_eq!(
            err,
            DataError::InvalidFlag {
                instance: 2,
                value: 0.5
            }
        );
    }

    #[test]
    fn test_find_best_split_sends_ones_right() {
        let mut col = FeatureColumn::binary(&[1.0, 0.0, 0.0, 1.0]).unwrap();
        let labels = [1u32, 0, 0, 1];
        let counts = [2usize, 2];
        let mask = ScopeMask::all_in(4);
        let ctx = SplitContext::new(&labels, &counts, &mask);
        let seen = std::sync::Mutex::new(Vec::new());
        let metric = |global: &[usize], partial: &[usize], n: usize| {
            seen.lock().unwrap().push((global.to_vec(), partial.to_vec(), n));
            0.25
        };

        let best = col.view().find_best_split(&ctx, &metric).unwrap().unwrap();
        assert_eq!(best.threshold, 1.0);
        assert_eq!(best.cost, 0.25);
        assert_eq!(best.left.in_scope_ids().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(best.right.in_scope_ids().collect::<Vec<_>>(), vec![0, 3]);
        // one evaluation, partial counts are the zeros' labels
        assert_eq!(*seen.lock().unwrap(), vec![(vec![2, 2], vec![2, 0], 4)]);
    }

    #[test]
    fn test_constant_scope_has_no_split() {
        let labels = [0u32, 1, 0];
        let counts = [2usize, 1];
        let mask = ScopeMask::all_in(3);
        let ctx = SplitContext::new(&labels, &counts, &mask);
        for raw in [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]] {
            let mut col = FeatureColumn::binary(&raw).unwrap();
            let found = col.view().find_best_split(&ctx, &GiniImpurity).unwrap();
            assert_eq!(found, None);
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "label counts do not cover instance 0")]
    fn test_label_counts_must_cover_scope() {
        let mut col = FeatureColumn::binary(&[1.0, 0.0]).unwrap();
        let labels = [0u32, 1];
        let counts = [0usize, 1];
        let mask = ScopeMask::all_in(2);
        let ctx = SplitContext::new(&labels, &counts, &mask);
        let _ = col.view().find_best_split(&ctx, &GiniImpurity);
    }

    #[test]
    fn test_constant_child_scope_has_no_split() {
        // ones at 0 and 2; the left child holds only ones
        let mut col = FeatureColumn::binary(&[1.0, 0.0, 1.0, 0.0]).unwrap();
        let left = ScopeMask::from_out_flags(vec![false, true, false, true]);
        let right = ScopeMask::from_out_flags(vec![true, false, true, false]);
        let (l, r) = binary_view(&mut col).split(&left, &right).unwrap();

        let labels = [0u32, 1, 1, 0];
        let counts = [1usize, 1];
        let ctx = SplitContext::new(&labels, &counts, &left);
        assert_eq!(l.find_best_split(&ctx, &GiniImpurity).unwrap(), None);
        let ctx = SplitContext::new(&labels, &counts, &right);
        assert_eq!(r.find_best_split(&ctx, &GiniImpurity).unwrap(), None);
    }

    #[test]
    fn test_split_lengths_come_from_masks() {
        let mut col = FeatureColumn::binary(&[1.0, 0.0, 1.0, 0.0, 1.0]).unwrap();
        let left = ScopeMask::from_out_flags(vec![false, false, true, true, true]);
        let right = ScopeMask::from_out_flags(vec![true, true, false, false, false]);

        let (l, r) = binary_view(&mut col).split(&left, &right).unwrap();
        assert_eq!(l.ids(), &[0]);
        assert_eq!(l.len(), 2);
        assert!(!l.is_redundant());
        assert_eq!(r.ids(), &[2, 4]);
        assert_eq!(r.len(), 3);
        assert!(!r.is_redundant());
    }

    #[test]
    fn test_redundancy() {
        assert!(FeatureColumn::binary(&[0.0, 0.0]).unwrap().is_redundant());
        assert!(FeatureColumn::binary(&[1.0, 1.0]).unwrap().is_redundant());
        assert!(FeatureColumn::binary(&[1.0]).unwrap().is_redundant());
        assert!(!FeatureColumn::binary(&[1.0, 0.0]).unwrap().is_redundant());
    }

    #[test]
    fn test_subsample_expands_ones() {
        let col = FeatureColumn::binary(&[1.0, 0.0, 1.0]).unwrap();
        let mut sub = col.subsample(&Subsample::from_occurrences(vec![2, 0, 1])).unwrap();
        assert_eq!(sub.len(), 3);
        assert_eq!(sub.values().to_vec(), vec![1.0, 1.0, 1.0]);
        assert!(sub.is_redundant());
        assert_eq!(binary_view(&mut sub).ids(), &[0, 1, 2]);
    }
}
