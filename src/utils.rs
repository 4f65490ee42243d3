//! Common utilities used across the crate.
//!
//! Parallelism configuration for column search and the stable in-place
//! partition shared by the column variants.

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// When `Parallel`, callers may fan work out over the current `rayon` pool.
/// The pool itself is owned by the caller; this is only a hint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over `iter`, in parallel if allowed. Output order matches input order.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Partitioning
// =============================================================================

/// Stable in-place partition of `(value, id)` pairs.
///
/// Pairs whose id satisfies `goes_left` are compacted to the front in their
/// original order; the rest follow, also in order. Returns the number of
/// pairs on the left.
pub(crate) fn partition_pairs<V: Copy>(
    values: &mut [V],
    ids: &mut [u32],
    mut goes_left: impl FnMut(u32) -> bool,
) -> usize {
    debug_assert_eq!(values.len(), ids.len());
    let mut right = Vec::new();
    let mut write = 0;
    for read in 0..ids.len() {
        let (value, id) = (values[read], ids[read]);
        if goes_left(id) {
            values[write] = value;
            ids[write] = id;
            write += 1;
        } else {
            right.push((value, id));
        }
    }
    for (offset, (value, id)) in right.into_iter().enumerate() {
        values[write + offset] = value;
        ids[write + offset] = id;
    }
    write
}

/// Stable in-place partition of bare ids. See [`partition_pairs`].
pub(crate) fn partition_ids(ids: &mut [u32], mut goes_left: impl FnMut(u32) -> bool) -> usize {
    let mut right = Vec::new();
    let mut write = 0;
    for read in 0..ids.len() {
        let id = ids[read];
        if goes_left(id) {
            ids[write] = id;
            write += 1;
        } else {
            right.push(id);
        }
    }
    ids[write..].copy_from_slice(&right);
    write
}

/// True if every value equals the first (exact comparison). Empty is homogeneous.
#[inline]
pub(crate) fn is_homogeneous(values: &[f32]) -> bool {
    match values.split_first() {
        Some((first, rest)) => rest.iter().all(|v| v == first),
        None => true,
    }
}
