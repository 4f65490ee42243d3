//! A dataset windowed to one tree node.
//!
//! # Overview
//!
//! [`NodeView`] bundles one [`Column`] view per feature with the node's
//! membership mask and per-class label counts. Searching picks the best
//! boundary over all non-redundant columns; splitting consumes the view and
//! partitions every column's window with the same pair of masks, yielding
//! the two child views.
//!
//! ```ignore
//! let mut ds = Dataset::sorted();
//! // ... add features and labels
//! let root = ds.root()?;
//! if let Some(best) = root.find_best_feature_split(&GiniImpurity, Parallelism::Sequential)? {
//!     let (left, right) = root.apply_split(best.candidate)?;
//! }
//! ```

use log::{debug, trace};
use rand::Rng;

use crate::data::column::check_mask;
use crate::data::{
    Column, DataError, Dataset, FeatureType, ScopeMask, SplitCandidate, SplitColumn,
    SplitContext,
};
use crate::metric::DecisionMetric;
use crate::sampling::{Subsample, draw_indices};
use crate::utils::Parallelism;

/// Winning split over all features of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSplit {
    pub feature: usize,
    pub candidate: SplitCandidate,
}

/// Per-class counts of the in-scope instances of `mask`.
pub fn count_labels(labels: &[u32], mask: &ScopeMask, n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for id in mask.in_scope_ids() {
        counts[labels[id as usize] as usize] += 1;
    }
    counts
}

/// Feature columns, labels and membership of one node.
#[derive(Debug)]
pub struct NodeView<'a> {
    columns: Vec<Column<'a>>,
    labels: &'a [u32],
    label_values: &'a [f32],
    feature_types: &'a [FeatureType],
    mask: ScopeMask,
    label_counts: Vec<usize>,
    sorted: bool,
}

impl<'a> NodeView<'a> {
    pub(crate) fn new(
        columns: Vec<Column<'a>>,
        labels: &'a [u32],
        label_values: &'a [f32],
        feature_types: &'a [FeatureType],
        mask: ScopeMask,
        sorted: bool,
    ) -> Result<Self, DataError> {
        check_mask(labels.len(), &mask)?;
        let label_counts = count_labels(labels, &mask, label_values.len());
        Ok(Self {
            columns,
            labels,
            label_values,
            feature_types,
            mask,
            label_counts,
            sorted,
        })
    }

    /// Instances in the node.
    #[inline]
    pub fn n_instances(&self) -> usize {
        self.mask.in_scope_count()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column<'a>] {
        &self.columns
    }

    pub fn column(&self, feature_idx: usize) -> Option<&Column<'a>> {
        self.columns.get(feature_idx)
    }

    /// Node membership over the full id space.
    pub fn mask(&self) -> &ScopeMask {
        &self.mask
    }

    pub fn labels(&self) -> &'a [u32] {
        self.labels
    }

    pub fn label_counts(&self) -> &[usize] {
        &self.label_counts
    }

    pub fn n_classes(&self) -> usize {
        self.label_counts.len()
    }

    /// True if at most one class is present.
    pub fn is_pure(&self) -> bool {
        self.label_counts.iter().filter(|&&c| c > 0).count() <= 1
    }

    /// Most frequent class, lowest id on ties. `None` for an empty node.
    pub fn majority_label(&self) -> Option<u32> {
        let mut best: Option<(usize, usize)> = None;
        for (class, &count) in self.label_counts.iter().enumerate() {
            if count > 0 && best.is_none_or(|(_, c)| count > c) {
                best = Some((class, count));
            }
        }
        best.map(|(class, _)| class as u32)
    }

    /// Label bookkeeping handed to column searches.
    pub fn context(&self) -> SplitContext<'_> {
        SplitContext {
            labels: self.labels,
            label_counts: &self.label_counts,
            n_instances: self.mask.in_scope_count(),
            mask: &self.mask,
        }
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Best split of a single feature.
    pub fn find_best_split<M: DecisionMetric + ?Sized>(
        &self,
        feature_idx: usize,
        metric: &M,
    ) -> Result<Option<SplitCandidate>, DataError> {
        let column = self
            .columns
            .get(feature_idx)
            .ok_or(DataError::FeatureOutOfRange {
                feature_idx,
                n_features: self.columns.len(),
            })?;
        column.find_best_split(&self.context(), metric)
    }

    /// Best split over every non-redundant feature.
    ///
    /// Features are searched independently (in parallel if allowed); the
    /// lowest cost wins and equal costs go to the lowest feature index.
    pub fn find_best_feature_split<M: DecisionMetric + ?Sized>(
        &self,
        metric: &M,
        parallelism: Parallelism,
    ) -> Result<Option<FeatureSplit>, DataError> {
        let ctx = self.context();
        let results = parallelism.maybe_par_map(0..self.columns.len(), |feature| {
            let column = &self.columns[feature];
            if column.is_redundant() {
                Ok(None)
            } else {
                column.find_best_split(&ctx, metric)
            }
        });

        let mut best: Option<FeatureSplit> = None;
        for (feature, result) in results.into_iter().enumerate() {
            let Some(candidate) = result? else {
                continue;
            };
            if best
                .as_ref()
                .is_none_or(|b| candidate.cost < b.candidate.cost)
            {
                best = Some(FeatureSplit { feature, candidate });
            }
        }

        if let Some(best) = &best {
            debug!(
                "best split of {} instances: feature {} at {} (cost {}, {} / {})",
                self.n_instances(),
                best.feature,
                best.candidate.threshold,
                best.candidate.cost,
                best.candidate.left_count(),
                best.candidate.right_count()
            );
        }
        Ok(best)
    }

    // =========================================================================
    // Splitting
    // =========================================================================

    /// Split every column with the same masks, consuming the node.
    ///
    /// Every instance of the node must be in scope of exactly one of `left`
    /// and `right`, and neither mask may reach outside the node.
    pub fn split_features(
        self,
        left: ScopeMask,
        right: ScopeMask,
    ) -> Result<(NodeView<'a>, NodeView<'a>), DataError> {
        let id_space = self.labels.len();
        check_mask(id_space, &left)?;
        check_mask(id_space, &right)?;
        let node = self.n_instances();
        if left.in_scope_count() + right.in_scope_count() != node {
            return Err(DataError::MaskPartition {
                node,
                left: left.in_scope_count(),
                right: right.in_scope_count(),
            });
        }
        let misplaced = (0..id_space as u32).find(|&id| {
            let sides = usize::from(left.is_in(id)) + usize::from(right.is_in(id));
            sides != usize::from(self.mask.is_in(id))
        });
        if let Some(instance) = misplaced {
            return Err(DataError::MaskOverlap {
                instance: instance as usize,
            });
        }

        let NodeView {
            columns,
            labels,
            label_values,
            feature_types,
            sorted,
            ..
        } = self;

        let mut left_columns = Vec::with_capacity(columns.len());
        let mut right_columns = Vec::with_capacity(columns.len());
        for column in columns {
            let (l, r) = column.split(&left, &right)?;
            left_columns.push(l);
            right_columns.push(r);
        }
        trace!(
            "split node of {} instances into {} / {}",
            node,
            left.in_scope_count(),
            right.in_scope_count()
        );

        let left_view = NodeView::new(left_columns, labels, label_values, feature_types, left, sorted)?;
        let right_view =
            NodeView::new(right_columns, labels, label_values, feature_types, right, sorted)?;
        Ok((left_view, right_view))
    }

    /// Split with the masks of a search result.
    pub fn apply_split(
        self,
        candidate: SplitCandidate,
    ) -> Result<(NodeView<'a>, NodeView<'a>), DataError> {
        self.split_features(candidate.left, candidate.right)
    }

    // =========================================================================
    // Sampling
    // =========================================================================

    /// Bootstrap sample of the node's instances as a standalone dataset.
    pub fn draw_random_subset<R: Rng + ?Sized>(
        &self,
        subset_size: usize,
        replacement: bool,
        rng: &mut R,
    ) -> Result<Dataset, DataError> {
        let population: Vec<u32> = self.mask.in_scope_ids().collect();
        let draws = draw_indices(&population, subset_size, replacement, rng)?;
        let draw = Subsample::from_draws(self.labels.len(), &draws)?;

        let features = self
            .columns
            .iter()
            .map(|column| column.subsample(&draw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Dataset::from_parts(
            features,
            self.feature_types.to_vec(),
            draw.remap_labels(self.labels)?,
            self.label_values.to_vec(),
            self.sorted,
        ))
    }
}
