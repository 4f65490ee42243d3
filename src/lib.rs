//! colforest: columnar split search for decision-tree induction.
//!
//! Features are stored column by column as dense, sparse or binary columns.
//! A tree node is a window over each column; finding a split walks the
//! sorted window once, and applying it partitions every window in place so
//! the two children reuse the parent's storage.
//!
//! ```ignore
//! use colforest::{Dataset, FeatureType, GiniImpurity, Parallelism};
//!
//! let mut ds = Dataset::sorted();
//! ds.add_feature(&[0.0, 0.0, 3.0, 4.0], FeatureType::Ordinal, true)?;
//! ds.add_labels(&[1.0, 1.0, 2.0, 2.0])?;
//!
//! let root = ds.root()?;
//! let best = root.find_best_feature_split(&GiniImpurity, Parallelism::Sequential)?;
//! ```

pub mod data;
pub mod metric;
pub mod sampling;
pub mod testing;
pub mod utils;

pub use data::{
    Column, ColumnKind, DataError, Dataset, FeatureColumn, FeatureSplit, FeatureType, NodeView,
    ScopeMask, SplitCandidate, SplitColumn, SplitContext,
};
pub use metric::{DecisionMetric, Entropy, GiniImpurity};
pub use sampling::{BootstrapParams, Subsample};
pub use utils::Parallelism;

// Re-export approx for downstream float assertions
pub use approx;
