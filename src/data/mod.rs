//! Columnar training data.
//!
//! # Overview
//!
//! - [`FeatureColumn`]: owned storage of one feature (dense, sparse or binary).
//! - [`Column`]: a column windowed to one tree node, searched with
//!   [`SplitColumn::find_best_split`] and partitioned with [`SplitColumn::split`].
//! - [`ScopeMask`]: per-instance out-of-scope flags describing a node.
//! - [`Dataset`]: features plus categorical labels; [`Dataset::root`] opens
//!   the [`NodeView`] a tree grows from.

mod column;
mod dataset;
mod error;
mod mask;
mod node;

pub use column::{
    BinaryColumn, Column, ColumnKind, DenseColumn, FeatureColumn, SPLIT_EPSILON, SparseColumn,
    SplitCandidate, SplitColumn, SplitContext,
};
pub use dataset::{Dataset, FeatureType};
pub use error::DataError;
pub use mask::ScopeMask;
pub use node::{FeatureSplit, NodeView, count_labels};
