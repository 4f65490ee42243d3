//! Feature columns and their node-scoped views.
//!
//! # Overview
//!
//! A [`FeatureColumn`] owns the backing buffers of one feature over the whole
//! instance id space. [`FeatureColumn::view`] hands out a [`Column`] over the
//! full buffer (the root scope). A view borrows a window of the buffers; the
//! window *is* the node's scope. [`SplitColumn::split`] reorders the window in
//! place and consumes the parent, returning two children that borrow disjoint
//! halves. Sibling windows never overlap and a parent cannot be used once it
//! has been split.
//!
//! Three layouts are supported:
//!
//! - [`DenseColumn`]: one `(value, id)` entry per in-scope instance.
//! - [`SparseColumn`]: explicit non-zero entries only; the rest of the node's
//!   instances hold an implicit `0.0`. When sorted, negatives precede
//!   positives and the zero band sits conceptually between them.
//! - [`BinaryColumn`]: ids of instances whose flag is `1`.
//!
//! # Split search
//!
//! Searching a sorted window walks it left to right, keeping per-class label
//! counts of everything to the left of the cursor. A boundary is evaluated
//! only between values differing by at least [`SPLIT_EPSILON`]. Ties keep the
//! earliest boundary. The threshold reported is the first value on the right,
//! so instances with `value >= threshold` belong to the right child.

mod binary;
mod dense;
mod sparse;

pub use binary::BinaryColumn;
pub use dense::DenseColumn;
pub use sparse::SparseColumn;

use ndarray::Array1;

use crate::data::{DataError, ScopeMask};
use crate::metric::DecisionMetric;
use crate::sampling::Subsample;

/// Minimum gap between adjacent sorted values for a boundary to be evaluated.
pub const SPLIT_EPSILON: f32 = 1e-16;

// ============================================================================
// Split search types
// ============================================================================

/// Physical layout of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Dense,
    Sparse,
    Binary,
}

/// Label bookkeeping for one node, shared by every column searched there.
///
/// `label_counts` must equal the per-class counts of the in-scope instances
/// of `mask`, and `n_instances` their total.
#[derive(Debug, Clone, Copy)]
pub struct SplitContext<'a> {
    /// Categorical label of every instance in the id space.
    pub labels: &'a [u32],
    /// Per-class counts of the node's instances.
    pub label_counts: &'a [usize],
    pub n_instances: usize,
    /// Node membership (`true` = out of scope).
    pub mask: &'a ScopeMask,
}

impl<'a> SplitContext<'a> {
    pub fn new(labels: &'a [u32], label_counts: &'a [usize], mask: &'a ScopeMask) -> Self {
        Self {
            labels,
            label_counts,
            n_instances: label_counts.iter().sum(),
            mask,
        }
    }

    #[inline]
    pub(crate) fn label_of(&self, id: u32) -> usize {
        self.labels[id as usize] as usize
    }

    pub(crate) fn check(&self, id_space: usize) -> Result<(), DataError> {
        if self.labels.len() != id_space {
            return Err(DataError::LabelLenMismatch {
                instances: id_space,
                labels: self.labels.len(),
            });
        }
        check_mask(id_space, self.mask)
    }
}

/// Best split found in one column.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitCandidate {
    /// Out-of-scope mask of the left child.
    pub left: ScopeMask,
    /// Out-of-scope mask of the right child.
    pub right: ScopeMask,
    /// First value on the right side.
    pub threshold: f32,
    pub cost: f64,
}

impl SplitCandidate {
    #[inline]
    pub fn left_count(&self) -> usize {
        self.left.in_scope_count()
    }

    #[inline]
    pub fn right_count(&self) -> usize {
        self.right.in_scope_count()
    }
}

// ============================================================================
// SplitColumn trait
// ============================================================================

/// Operations shared by every column layout.
pub trait SplitColumn: Sized {
    fn kind(&self) -> ColumnKind;

    /// Number of instances the column covers in its scope, implicit zeros included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if no split on this column can separate the scope's instances.
    fn is_redundant(&self) -> bool;

    /// Best boundary of this column for the node described by `ctx`.
    ///
    /// Returns `Ok(None)` when the scope has no candidate boundary.
    fn find_best_split<M: DecisionMetric + ?Sized>(
        &self,
        ctx: &SplitContext<'_>,
        metric: &M,
    ) -> Result<Option<SplitCandidate>, DataError>;

    /// Partition the scope in place. Instances in scope of `left` go to the
    /// left child, everything else to the right child.
    fn split(self, left: &ScopeMask, right: &ScopeMask) -> Result<(Self, Self), DataError>;

    /// Rebuild the scope's entries under a bootstrap draw of its instances.
    ///
    /// The draw must be taken over the column's id space.
    fn subsample(&self, draw: &Subsample) -> Result<FeatureColumn, DataError>;

    /// Value of every id in the id space; ids without an explicit entry read `0.0`.
    fn values(&self) -> Array1<f32>;
}

// ============================================================================
// Column (scope view)
// ============================================================================

/// A column windowed to one node.
#[derive(Debug)]
pub enum Column<'a> {
    Dense(DenseColumn<'a>),
    Sparse(SparseColumn<'a>),
    Binary(BinaryColumn<'a>),
}

impl Column<'_> {
    /// Ids of the explicit entries in scope, in window order.
    pub fn ids(&self) -> &[u32] {
        match self {
            Column::Dense(c) => c.ids(),
            Column::Sparse(c) => c.ids(),
            Column::Binary(c) => c.ids(),
        }
    }

    pub fn is_sorted(&self) -> bool {
        match self {
            Column::Dense(c) => c.is_sorted(),
            Column::Sparse(c) => c.is_sorted(),
            Column::Binary(_) => true,
        }
    }
}

impl SplitColumn for Column<'_> {
    fn kind(&self) -> ColumnKind {
        match self {
            Column::Dense(c) => c.kind(),
            Column::Sparse(c) => c.kind(),
            Column::Binary(c) => c.kind(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Column::Dense(c) => c.len(),
            Column::Sparse(c) => c.len(),
            Column::Binary(c) => c.len(),
        }
    }

    fn is_redundant(&self) -> bool {
        match self {
            Column::Dense(c) => c.is_redundant(),
            Column::Sparse(c) => c.is_redundant(),
            Column::Binary(c) => c.is_redundant(),
        }
    }

    fn find_best_split<M: DecisionMetric + ?Sized>(
        &self,
        ctx: &SplitContext<'_>,
        metric: &M,
    ) -> Result<Option<SplitCandidate>, DataError> {
        match self {
            Column::Dense(c) => c.find_best_split(ctx, metric),
            Column::Sparse(c) => c.find_best_split(ctx, metric),
            Column::Binary(c) => c.find_best_split(ctx, metric),
        }
    }

    fn split(self, left: &ScopeMask, right: &ScopeMask) -> Result<(Self, Self), DataError> {
        Ok(match self {
            Column::Dense(c) => {
                let (l, r) = c.split(left, right)?;
                (Column::Dense(l), Column::Dense(r))
            }
            Column::Sparse(c) => {
                let (l, r) = c.split(left, right)?;
                (Column::Sparse(l), Column::Sparse(r))
            }
            Column::Binary(c) => {
                let (l, r) = c.split(left, right)?;
                (Column::Binary(l), Column::Binary(r))
            }
        })
    }

    fn subsample(&self, draw: &Subsample) -> Result<FeatureColumn, DataError> {
        match self {
            Column::Dense(c) => c.subsample(draw),
            Column::Sparse(c) => c.subsample(draw),
            Column::Binary(c) => c.subsample(draw),
        }
    }

    fn values(&self) -> Array1<f32> {
        match self {
            Column::Dense(c) => c.values(),
            Column::Sparse(c) => c.values(),
            Column::Binary(c) => c.values(),
        }
    }
}

// ============================================================================
// FeatureColumn (owned storage)
// ============================================================================

/// Owned storage of one feature over the whole id space.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureColumn {
    data: ColumnData,
    redundant: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum ColumnData {
    Dense {
        values: Vec<f32>,
        ids: Vec<u32>,
        sorted: bool,
    },
    Sparse {
        values: Vec<f32>,
        ids: Vec<u32>,
        /// `None` while the entries are in id order.
        neg_count: Option<usize>,
        len: usize,
    },
    Binary {
        ids: Vec<u32>,
        len: usize,
    },
}

impl FeatureColumn {
    /// Dense column with one entry per value. `sorted` orders entries by value.
    pub fn dense(values: &[f32], sorted: bool) -> Result<Self, DataError> {
        check_finite(values)?;
        let (values, ids) = dense::build(values, sorted);
        Ok(Self::from_dense(values, ids, sorted))
    }

    /// Sparse column keeping only non-zero values.
    ///
    /// Unsorted columns keep entries in id order and cannot be searched until
    /// [`sort`](Self::sort) is called.
    pub fn sparse(values: &[f32], sorted: bool) -> Result<Self, DataError> {
        check_finite(values)?;
        let len = values.len();
        let (values, ids, neg_count) = sparse::build(values, sorted);
        Ok(Self::from_sparse(values, ids, neg_count, len))
    }

    /// Binary column from 0/1 flags.
    pub fn binary(values: &[f32]) -> Result<Self, DataError> {
        let ids = binary::build(values)?;
        Ok(Self::from_binary(ids, values.len()))
    }

    pub(crate) fn from_dense(values: Vec<f32>, ids: Vec<u32>, sorted: bool) -> Self {
        let redundant = dense::is_redundant(&values, sorted);
        Self {
            data: ColumnData::Dense {
                values,
                ids,
                sorted,
            },
            redundant,
        }
    }

    pub(crate) fn from_sparse(
        values: Vec<f32>,
        ids: Vec<u32>,
        neg_count: Option<usize>,
        len: usize,
    ) -> Self {
        let redundant = sparse::is_redundant(&values, len);
        Self {
            data: ColumnData::Sparse {
                values,
                ids,
                neg_count,
                len,
            },
            redundant,
        }
    }

    pub(crate) fn from_binary(ids: Vec<u32>, len: usize) -> Self {
        let redundant = binary::is_redundant(ids.len(), len);
        Self {
            data: ColumnData::Binary { ids, len },
            redundant,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match &self.data {
            ColumnData::Dense { .. } => ColumnKind::Dense,
            ColumnData::Sparse { .. } => ColumnKind::Sparse,
            ColumnData::Binary { .. } => ColumnKind::Binary,
        }
    }

    /// Number of instances, implicit zeros included.
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Dense { values, .. } => values.len(),
            ColumnData::Sparse { len, .. } | ColumnData::Binary { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        match &self.data {
            ColumnData::Dense { ids, .. }
            | ColumnData::Sparse { ids, .. }
            | ColumnData::Binary { ids, .. } => ids.len(),
        }
    }

    #[inline]
    pub fn is_redundant(&self) -> bool {
        self.redundant
    }

    /// True if split search is possible without calling [`sort`](Self::sort).
    pub fn is_sorted(&self) -> bool {
        match &self.data {
            ColumnData::Dense { sorted, .. } => *sorted,
            ColumnData::Sparse { neg_count, .. } => neg_count.is_some(),
            ColumnData::Binary { .. } => true,
        }
    }

    /// Order entries by value so the column can be searched.
    pub fn sort(&mut self) {
        match &mut self.data {
            ColumnData::Dense {
                values,
                ids,
                sorted,
            } => {
                if !*sorted {
                    dense::sort_entries(values, ids);
                    *sorted = true;
                }
            }
            ColumnData::Sparse {
                values,
                ids,
                neg_count,
                ..
            } => {
                if neg_count.is_none() {
                    *neg_count = Some(sparse::sort_entries(values, ids));
                }
            }
            ColumnData::Binary { ids, .. } => ids.sort_unstable(),
        }
    }

    /// Value of every instance, implicit zeros included.
    pub fn values(&self) -> Array1<f32> {
        match &self.data {
            ColumnData::Dense { values, ids, .. } => scatter(values, ids, values.len()),
            ColumnData::Sparse {
                values, ids, len, ..
            } => scatter(values, ids, *len),
            ColumnData::Binary { ids, len } => binary::scatter_ones(ids, *len),
        }
    }

    /// Column over the instances of a bootstrap draw.
    ///
    /// Fails with [`DataError::DrawLenMismatch`] unless the draw covers
    /// exactly [`len`](Self::len) ids.
    pub fn subsample(&self, draw: &Subsample) -> Result<FeatureColumn, DataError> {
        draw.check_id_space(self.len())?;
        let column = match &self.data {
            ColumnData::Dense {
                values,
                ids,
                sorted,
            } => dense::subsample(values, ids, *sorted, draw),
            ColumnData::Sparse {
                values,
                ids,
                neg_count,
                ..
            } => sparse::subsample(values, ids, *neg_count, draw),
            ColumnData::Binary { ids, .. } => binary::subsample(ids, draw),
        };
        Ok(column)
    }

    /// Root-scope view over the whole column.
    pub fn view(&mut self) -> Column<'_> {
        let redundant = self.redundant;
        match &mut self.data {
            ColumnData::Dense {
                values,
                ids,
                sorted,
            } => {
                let id_space = values.len();
                Column::Dense(DenseColumn::with_redundancy(
                    values, ids, *sorted, id_space, redundant,
                ))
            }
            ColumnData::Sparse {
                values,
                ids,
                neg_count,
                len,
            } => Column::Sparse(SparseColumn::with_redundancy(
                values, ids, *neg_count, *len, *len, redundant,
            )),
            ColumnData::Binary { ids, len } => {
                Column::Binary(BinaryColumn::with_redundancy(ids, *len, *len, redundant))
            }
        }
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

fn check_finite(values: &[f32]) -> Result<(), DataError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(instance) => Err(DataError::NonFiniteValue {
            instance,
            value: values[instance],
        }),
        None => Ok(()),
    }
}

pub(crate) fn check_mask(id_space: usize, mask: &ScopeMask) -> Result<(), DataError> {
    if mask.len() != id_space {
        return Err(DataError::MaskLenMismatch {
            expected: id_space,
            got: mask.len(),
        });
    }
    Ok(())
}

fn check_split_masks(id_space: usize, left: &ScopeMask, right: &ScopeMask) -> Result<(), DataError> {
    check_mask(id_space, left)?;
    check_mask(id_space, right)
}

/// Dense vector over `len` ids with `values[i]` written at `ids[i]`.
fn scatter(values: &[f32], ids: &[u32], len: usize) -> Array1<f32> {
    let mut out = Array1::zeros(len);
    for (&value, &id) in values.iter().zip(ids) {
        out[id as usize] = value;
    }
    out
}

/// Cut position inside a window.
#[derive(Debug, Clone, Copy)]
struct Boundary {
    /// Window position of the first entry on the right.
    first_right: usize,
    /// Whether the implicit zeros of a sparse window fall on the left.
    zeros_left: bool,
    threshold: f32,
}

/// Running minimum over evaluated boundaries. The first of equal costs wins.
#[derive(Debug, Default)]
struct BestBoundary {
    best: Option<(Boundary, f64)>,
}

impl BestBoundary {
    #[inline]
    fn offer(&mut self, boundary: Boundary, cost: f64) {
        if self.best.is_none_or(|(_, best)| cost < best) {
            self.best = Some((boundary, cost));
        }
    }

    fn into_inner(self) -> Option<(Boundary, f64)> {
        self.best
    }
}

/// Walk a value-sorted run, adding each entry's label to `partial` and
/// evaluating the boundary after it. The last entry is not added.
#[allow(clippy::too_many_arguments)]
fn scan_sorted_run<M: DecisionMetric + ?Sized>(
    values: &[f32],
    ids: &[u32],
    ctx: &SplitContext<'_>,
    metric: &M,
    partial: &mut [usize],
    best: &mut BestBoundary,
    base: usize,
    zeros_left: bool,
) {
    for i in 0..values.len().saturating_sub(1) {
        partial[ctx.label_of(ids[i])] += 1;
        let next = values[i + 1];
        if next - values[i] < SPLIT_EPSILON {
            continue;
        }
        let cost = metric.calculate(ctx.label_counts, partial, ctx.n_instances);
        best.offer(
            Boundary {
                first_right: base + i + 1,
                zeros_left,
                threshold: next,
            },
            cost,
        );
    }
}
