//! Errors raised while building, searching and splitting columnar data.

/// Dataset construction, split search and bootstrap errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("inconsistent number of instances: feature {feature_idx} expected {expected}, got {got}")]
    InconsistentRows {
        feature_idx: usize,
        expected: usize,
        got: usize,
    },

    #[error("number of labels ({labels}) does not match number of instances ({instances})")]
    LabelLenMismatch { instances: usize, labels: usize },

    #[error("scope mask covers {got} instances, expected {expected}")]
    MaskLenMismatch { expected: usize, got: usize },

    #[error("draw covers {got} instances, expected {expected}")]
    DrawLenMismatch { expected: usize, got: usize },

    #[error("drawn id {id} is outside an id space of {id_space}")]
    DrawOutOfRange { id: u32, id_space: usize },

    #[error("child masks select {left} + {right} instances but the node holds {node}")]
    MaskPartition {
        node: usize,
        left: usize,
        right: usize,
    },

    #[error("instance {instance} is not assigned to exactly one child of the node")]
    MaskOverlap { instance: usize },

    #[error("flag feature value {value} at instance {instance} is not 0 or 1")]
    InvalidFlag { instance: usize, value: f32 },

    #[error("non-finite value {value} at instance {instance}")]
    NonFiniteValue { instance: usize, value: f32 },

    #[error("column is not sorted; sort it before searching for splits")]
    Unsorted,

    #[error("dataset has no labels")]
    MissingLabels,

    #[error("feature index {feature_idx} out of range ({n_features} features)")]
    FeatureOutOfRange {
        feature_idx: usize,
        n_features: usize,
    },

    #[error("cannot draw {requested} instances without replacement from {population}")]
    SubsetTooLarge { requested: usize, population: usize },

    #[error("invalid bootstrap rate {rate}; expected a finite value > 0")]
    InvalidRate { rate: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_values() {
        let err = DataError::InvalidFlag {
            instance: 3,
            value: 2.0,
        };
        assert_eq!(
            err.to_string(),
            "flag feature value 2 at instance 3 is not 0 or 1"
        );

        let err = DataError::SubsetTooLarge {
            requested: 10,
            population: 4,
        };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("4"));
    }
}
