//! User-facing dataset: feature columns plus categorical labels.
//!
//! Labels arrive as raw floats and are remapped to dense class ids in order
//! of first occurrence; [`Dataset::true_label`] maps them back.

use std::collections::HashMap;

use log::debug;
use ndarray::ArrayView2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{DataError, FeatureColumn, NodeView, ScopeMask};
use crate::sampling::{BootstrapParams, Subsample, draw_indices};

/// How raw feature values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    /// Ordered numeric values.
    Ordinal,
    /// 0/1 indicators; always stored as a binary column.
    Flags,
}

/// Feature columns and labels over a common set of instances.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<FeatureColumn>,
    feature_types: Vec<FeatureType>,
    labels: Option<Vec<u32>>,
    label_values: Vec<f32>,
    n_instances: Option<usize>,
    sorted: bool,
}

impl Default for Dataset {
    fn default() -> Self {
        Self::new()
    }
}

impl Dataset {
    /// Dataset keeping ordinal features in instance order.
    ///
    /// Columns must be sorted with [`sort_features`](Self::sort_features)
    /// before searching for splits.
    pub fn new() -> Self {
        Self::with_sorting(false)
    }

    /// Dataset sorting every ordinal feature by value on ingestion.
    pub fn sorted() -> Self {
        Self::with_sorting(true)
    }

    pub fn with_sorting(sorted: bool) -> Self {
        Self {
            features: Vec::new(),
            feature_types: Vec::new(),
            labels: None,
            label_values: Vec::new(),
            n_instances: None,
            sorted,
        }
    }

    pub(crate) fn from_parts(
        features: Vec<FeatureColumn>,
        feature_types: Vec<FeatureType>,
        labels: Vec<u32>,
        label_values: Vec<f32>,
        sorted: bool,
    ) -> Self {
        let n_instances = Some(labels.len());
        Self {
            features,
            feature_types,
            labels: Some(labels),
            label_values,
            n_instances,
            sorted,
        }
    }

    // =========================================================================
    // Ingestion
    // =========================================================================

    /// Append one feature. `is_sparse` is ignored for flags, which always
    /// become a binary column.
    pub fn add_feature(
        &mut self,
        values: &[f32],
        feature_type: FeatureType,
        is_sparse: bool,
    ) -> Result<(), DataError> {
        let feature_idx = self.features.len();
        if let Some(expected) = self.n_instances {
            if values.len() != expected {
                return Err(DataError::InconsistentRows {
                    feature_idx,
                    expected,
                    got: values.len(),
                });
            }
        }

        let column = match feature_type {
            FeatureType::Flags => FeatureColumn::binary(values)?,
            FeatureType::Ordinal if is_sparse => FeatureColumn::sparse(values, self.sorted)?,
            FeatureType::Ordinal => FeatureColumn::dense(values, self.sorted)?,
        };
        debug!(
            "added feature {} as {:?} column ({} of {} entries stored)",
            feature_idx,
            column.kind(),
            column.nnz(),
            values.len()
        );

        self.n_instances = Some(values.len());
        self.features.push(column);
        self.feature_types.push(feature_type);
        Ok(())
    }

    /// Append every column of `data` (instances × features) as a feature.
    pub fn add_features(
        &mut self,
        data: ArrayView2<'_, f32>,
        feature_type: FeatureType,
        is_sparse: bool,
    ) -> Result<(), DataError> {
        for column in data.columns() {
            let values = column.to_vec();
            self.add_feature(&values, feature_type, is_sparse)?;
        }
        Ok(())
    }

    /// Set the labels, replacing any previous ones.
    pub fn add_labels(&mut self, values: &[f32]) -> Result<(), DataError> {
        if let Some(instances) = self.n_instances {
            if values.len() != instances {
                return Err(DataError::LabelLenMismatch {
                    instances,
                    labels: values.len(),
                });
            }
        }

        let mut ids: HashMap<u32, u32> = HashMap::new();
        let mut label_values = Vec::new();
        let labels = values
            .iter()
            .map(|&value| {
                *ids.entry(label_key(value)).or_insert_with(|| {
                    label_values.push(value);
                    (label_values.len() - 1) as u32
                })
            })
            .collect();
        debug!(
            "added {} labels over {} classes",
            values.len(),
            label_values.len()
        );

        self.n_instances = Some(values.len());
        self.labels = Some(labels);
        self.label_values = label_values;
        Ok(())
    }

    /// Sort every column by value so the dataset can be searched.
    pub fn sort_features(&mut self) {
        self.features.iter_mut().for_each(FeatureColumn::sort);
        self.sorted = true;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Number of instances, 0 before any feature or label is added.
    pub fn n_instances(&self) -> usize {
        self.n_instances.unwrap_or(0)
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    pub fn features(&self) -> &[FeatureColumn] {
        &self.features
    }

    pub fn feature(&self, feature_idx: usize) -> Option<&FeatureColumn> {
        self.features.get(feature_idx)
    }

    pub fn feature_types(&self) -> &[FeatureType] {
        &self.feature_types
    }

    /// Categorical label of every instance.
    pub fn labels(&self) -> Option<&[u32]> {
        self.labels.as_deref()
    }

    /// Original label value of each class id.
    pub fn label_values(&self) -> &[f32] {
        &self.label_values
    }

    pub fn true_label(&self, class: u32) -> Option<f32> {
        self.label_values.get(class as usize).copied()
    }

    pub fn n_classes(&self) -> usize {
        self.label_values.len()
    }

    /// Instances per class.
    pub fn label_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes()];
        for &label in self.labels.iter().flatten() {
            counts[label as usize] += 1;
        }
        counts
    }

    /// True if ordinal features are sorted on ingestion.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    // =========================================================================
    // Views and sampling
    // =========================================================================

    /// View over every instance, the root of a tree.
    pub fn root(&mut self) -> Result<NodeView<'_>, DataError> {
        let labels = self.labels.as_deref().ok_or(DataError::MissingLabels)?;
        let columns = self.features.iter_mut().map(FeatureColumn::view).collect();
        NodeView::new(
            columns,
            labels,
            &self.label_values,
            &self.feature_types,
            ScopeMask::all_in(labels.len()),
            self.sorted,
        )
    }

    /// Draw `subset_size` instances; returns their labels and every feature
    /// rebuilt over the draw.
    pub fn draw_random_instances<R: Rng + ?Sized>(
        &self,
        subset_size: usize,
        replacement: bool,
        rng: &mut R,
    ) -> Result<(Vec<u32>, Vec<FeatureColumn>), DataError> {
        let labels = self.labels.as_deref().ok_or(DataError::MissingLabels)?;
        let population: Vec<u32> = (0..labels.len() as u32).collect();
        let draws = draw_indices(&population, subset_size, replacement, rng)?;
        let draw = Subsample::from_draws(labels.len(), &draws)?;
        debug!(
            "drew {} of {} instances ({} replacement)",
            draw.len(),
            labels.len(),
            if replacement { "with" } else { "without" }
        );

        let features = self
            .features
            .iter()
            .map(|column| column.subsample(&draw))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((draw.remap_labels(labels)?, features))
    }

    /// Like [`draw_random_instances`](Self::draw_random_instances), packaged as a dataset.
    pub fn draw_random_subset<R: Rng + ?Sized>(
        &self,
        subset_size: usize,
        replacement: bool,
        rng: &mut R,
    ) -> Result<Dataset, DataError> {
        let (labels, features) = self.draw_random_instances(subset_size, replacement, rng)?;
        Ok(Dataset::from_parts(
            features,
            self.feature_types.clone(),
            labels,
            self.label_values.clone(),
            self.sorted,
        ))
    }

    /// Seeded bootstrap sample configured by `params`.
    pub fn bootstrap(&self, params: &BootstrapParams) -> Result<Dataset, DataError> {
        let size = params.subset_size(self.n_instances())?;
        self.draw_random_subset(size, params.replacement, &mut params.rng())
    }
}

/// Hash key of a label value; both zeros share a key.
fn label_key(value: f32) -> u32 {
    if value == 0.0 { 0 } else { value.to_bits() }
}
