//! Bootstrap sampling of instances.
//!
//! # Overview
//!
//! A bootstrap draw picks instance ids from a population, with or without
//! replacement. The result is summarised as a [`Subsample`]: how often each
//! original id was drawn, plus an index mapper assigning every drawn copy its
//! own id in the new, denser id space. Columns and labels are rebuilt against
//! that mapping, so they stay aligned.
//!
//! Copy `j` of original id `i` becomes `offset[i] + j`, where `offset` is the
//! prefix sum of the occurrence counts. Ascending original ids therefore map
//! to ascending new ids.

use std::ops::Range;

use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::data::DataError;

// ============================================================================
// BootstrapParams
// ============================================================================

/// Configuration for a seeded bootstrap draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapParams {
    /// Draw size as a fraction of the population. Values above 1 are allowed
    /// when drawing with replacement.
    pub rate: f32,
    /// Draw with replacement (classic bagging) or without.
    pub replacement: bool,
    /// Seed for the generator; equal seeds reproduce equal draws.
    pub seed: u64,
}

impl Default for BootstrapParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            replacement: true,
            seed: 0,
        }
    }
}

impl BootstrapParams {
    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_replacement(mut self, replacement: bool) -> Self {
        self.replacement = replacement;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of instances to draw from a population of `population`.
    pub fn subset_size(&self, population: usize) -> Result<usize, DataError> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(DataError::InvalidRate { rate: self.rate });
        }
        if population == 0 {
            return Ok(0);
        }
        Ok(((population as f64 * self.rate as f64).ceil() as usize).max(1))
    }

    /// Seeded generator for this configuration.
    pub fn rng(&self) -> Xoshiro256PlusPlus {
        Xoshiro256PlusPlus::seed_from_u64(self.seed)
    }
}

// ============================================================================
// Drawing
// ============================================================================

/// Draw `size` ids from `population`.
///
/// Without replacement this is a partial Fisher-Yates shuffle and fails if
/// `size` exceeds the population. With replacement every draw is independent.
pub fn draw_indices<R: Rng + ?Sized>(
    population: &[u32],
    size: usize,
    replacement: bool,
    rng: &mut R,
) -> Result<Vec<u32>, DataError> {
    let n = population.len();
    if replacement {
        if n == 0 {
            return if size == 0 {
                Ok(Vec::new())
            } else {
                Err(DataError::SubsetTooLarge {
                    requested: size,
                    population: 0,
                })
            };
        }
        return Ok((0..size).map(|_| population[rng.gen_range(0..n)]).collect());
    }

    if size > n {
        return Err(DataError::SubsetTooLarge {
            requested: size,
            population: n,
        });
    }
    let mut ids = population.to_vec();
    for i in 0..size {
        let j = rng.gen_range(i..n);
        ids.swap(i, j);
    }
    ids.truncate(size);
    Ok(ids)
}

// ============================================================================
// Subsample
// ============================================================================

/// Occurrence counts of a draw plus the mapping into the new id space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsample {
    occurrences: Vec<u32>,
    offsets: Vec<u32>,
    size: usize,
}

impl Subsample {
    /// Summarise `draws` over an id space of `id_space` ids.
    pub fn from_draws(id_space: usize, draws: &[u32]) -> Result<Self, DataError> {
        let mut occurrences = vec![0u32; id_space];
        for &id in draws {
            let slot = occurrences
                .get_mut(id as usize)
                .ok_or(DataError::DrawOutOfRange { id, id_space })?;
            *slot += 1;
        }
        Ok(Self::from_occurrences(occurrences))
    }

    pub fn from_occurrences(occurrences: Vec<u32>) -> Self {
        let mut offsets = Vec::with_capacity(occurrences.len());
        let mut next = 0u32;
        for &count in &occurrences {
            offsets.push(next);
            next += count;
        }
        Self {
            occurrences,
            offsets,
            size: next as usize,
        }
    }

    /// Total number of drawn copies, i.e. the new instance count.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Size of the original id space.
    #[inline]
    pub fn id_space(&self) -> usize {
        self.occurrences.len()
    }

    #[inline]
    pub fn occurrences(&self) -> &[u32] {
        &self.occurrences
    }

    /// New ids assigned to the copies of original id `id`; empty outside the id space.
    #[inline]
    pub fn new_ids(&self, id: u32) -> Range<u32> {
        match (self.offsets.get(id as usize), self.occurrences.get(id as usize)) {
            (Some(&start), Some(&count)) => start..start + count,
            _ => 0..0,
        }
    }

    /// Fails unless the draw was taken over exactly `id_space` ids.
    pub fn check_id_space(&self, id_space: usize) -> Result<(), DataError> {
        if self.id_space() != id_space {
            return Err(DataError::DrawLenMismatch {
                expected: id_space,
                got: self.id_space(),
            });
        }
        Ok(())
    }

    /// Labels indexed by new id.
    pub fn remap_labels(&self, labels: &[u32]) -> Result<Vec<u32>, DataError> {
        self.check_id_space(labels.len())?;
        let mut remapped = vec![0u32; self.size];
        for (id, &label) in labels.iter().enumerate() {
            for new_id in self.new_ids(id as u32) {
                remapped[new_id as usize] = label;
            }
        }
        Ok(remapped)
    }

    /// Number of copies of the given ids.
    pub(crate) fn expanded_count(&self, ids: &[u32]) -> usize {
        ids.iter().map(|&id| self.new_ids(id).len()).sum()
    }

    /// Repeat every pair once per copy, relabelled with the new ids.
    pub(crate) fn expand_pairs(&self, values: &[f32], ids: &[u32]) -> (Vec<f32>, Vec<u32>) {
        let capacity = self.expanded_count(ids);
        let mut new_values = Vec::with_capacity(capacity);
        let mut new_ids = Vec::with_capacity(capacity);
        for (&value, &id) in values.iter().zip(ids) {
            for new_id in self.new_ids(id) {
                new_values.push(value);
                new_ids.push(new_id);
            }
        }
        (new_values, new_ids)
    }

    /// Like [`expand_pairs`](Self::expand_pairs) for bare ids.
    pub(crate) fn expand_ids(&self, ids: &[u32]) -> Vec<u32> {
        let mut new_ids = Vec::with_capacity(self.expanded_count(ids));
        for &id in ids {
            new_ids.extend(self.new_ids(id));
        }
        new_ids
    }
}
