//! Decoder contract and adapter.
//!
//! The numeric solve (matrix + cycle times → sure/unsure/negative) lives
//! outside this crate behind the [`Decoder`] trait. [`DecoderAdapter`] checks
//! the input length, forwards the call and returns the decoder's output
//! untouched. Decoder errors are never caught or defaulted.

use pooldecode_registry::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Raw decoder output.
///
/// Indices are 1-based sample positions. The three groups are expected to
/// partition `1..=columns`; see [`ClassificationResult::check_partition`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub surely_positive: Vec<usize>,
    pub possibly_positive: Vec<usize>,
    pub surely_negative: Vec<usize>,
    /// One quantity per sample in quantitative modes; absent otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimates: Option<Vec<f64>>,
}

impl ClassificationResult {
    /// Everything negative for `columns` samples.
    pub fn all_negative(columns: usize) -> Self {
        Self {
            surely_negative: (1..=columns).collect(),
            ..Default::default()
        }
    }

    pub fn has_positives(&self) -> bool {
        !self.surely_positive.is_empty() || !self.possibly_positive.is_empty()
    }

    /// Verify the three groups partition `1..=columns`.
    ///
    /// Reports the first kind of problem found: out-of-range index, an index
    /// listed twice, or indices missing from every group.
    pub fn check_partition(&self, columns: usize) -> Result<(), PartitionError> {
        let mut seen = BTreeSet::new();
        let groups = [
            ("surely_positive", &self.surely_positive),
            ("possibly_positive", &self.possibly_positive),
            ("surely_negative", &self.surely_negative),
        ];

        for (group, indices) in groups {
            for &index in indices.iter() {
                if index == 0 || index > columns {
                    return Err(PartitionError::OutOfRange {
                        group,
                        index,
                        columns,
                    });
                }
                if !seen.insert(index) {
                    return Err(PartitionError::Duplicate { index });
                }
            }
        }

        let missing: Vec<usize> = (1..=columns).filter(|i| !seen.contains(i)).collect();
        if !missing.is_empty() {
            return Err(PartitionError::Missing { indices: missing });
        }

        Ok(())
    }
}

/// Classification groups that do not partition the sample range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PartitionError {
    #[error("index {index} in {group} is outside 1..={columns}")]
    OutOfRange {
        group: &'static str,
        index: usize,
        columns: usize,
    },

    #[error("index {index} appears in more than one place")]
    Duplicate { index: usize },

    #[error("indices {indices:?} are not classified")]
    Missing { indices: Vec<usize> },
}

/// External decoding routine.
pub trait Decoder {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Classify samples from pooled cycle-time readings.
    ///
    /// `measurements.len()` equals `matrix.rows()` when called through
    /// [`DecoderAdapter`].
    fn decode(
        &self,
        matrix: &Matrix,
        measurements: &[f64],
    ) -> Result<ClassificationResult, Self::Error>;
}

impl<D: Decoder + ?Sized> Decoder for &D {
    type Error = D::Error;

    fn decode(
        &self,
        matrix: &Matrix,
        measurements: &[f64],
    ) -> Result<ClassificationResult, Self::Error> {
        (**self).decode(matrix, measurements)
    }
}

/// Adapter errors. Decoder failures pass through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError<E: std::error::Error + 'static> {
    #[error("measurement vector has {actual} entries, matrix has {expected} rows")]
    MeasurementLength { expected: usize, actual: usize },

    #[error(transparent)]
    Decoder(E),
}

/// Thin wrapper that enforces the input contract around a [`Decoder`].
#[derive(Debug, Clone)]
pub struct DecoderAdapter<D> {
    decoder: D,
}

impl<D: Decoder> DecoderAdapter<D> {
    pub fn new(decoder: D) -> Self {
        Self { decoder }
    }

    pub fn inner(&self) -> &D {
        &self.decoder
    }

    pub fn decode(
        &self,
        matrix: &Matrix,
        measurements: &[f64],
    ) -> Result<ClassificationResult, DecodeError<D::Error>> {
        if measurements.len() != matrix.rows() {
            return Err(DecodeError::MeasurementLength {
                expected: matrix.rows(),
                actual: measurements.len(),
            });
        }

        let result = self
            .decoder
            .decode(matrix, measurements)
            .map_err(DecodeError::Decoder)?;

        debug!(
            surely_positive = result.surely_positive.len(),
            possibly_positive = result.possibly_positive.len(),
            surely_negative = result.surely_negative.len(),
            estimates = result.estimates.as_ref().map(|e| e.len()),
            "Decoder returned"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("solver diverged")]
    struct Diverged;

    struct Fixed(ClassificationResult);

    impl Decoder for Fixed {
        type Error = Diverged;
        fn decode(&self, _: &Matrix, _: &[f64]) -> Result<ClassificationResult, Diverged> {
            Ok(self.0.clone())
        }
    }

    struct Failing;

    impl Decoder for Failing {
        type Error = Diverged;
        fn decode(&self, _: &Matrix, _: &[f64]) -> Result<ClassificationResult, Diverged> {
            Err(Diverged)
        }
    }

    #[test]
    fn test_adapter_returns_decoder_output_unchanged() {
        let output = ClassificationResult {
            surely_positive: vec![3],
            possibly_positive: vec![],
            surely_negative: vec![1, 2, 4],
            estimates: Some(vec![0.0, 0.0, 12.5, 0.0]),
        };
        let adapter = DecoderAdapter::new(Fixed(output.clone()));
        let matrix = Matrix::zeros(2, 4).unwrap();

        assert_eq!(adapter.decode(&matrix, &[20.0, 31.5]).unwrap(), output);
    }

    #[test]
    fn test_adapter_rejects_wrong_length() {
        let adapter = DecoderAdapter::new(Fixed(ClassificationResult::all_negative(4)));
        let matrix = Matrix::zeros(2, 4).unwrap();

        let err = adapter.decode(&matrix, &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MeasurementLength {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_adapter_propagates_decoder_error_verbatim() {
        let adapter = DecoderAdapter::new(Failing);
        let matrix = Matrix::zeros(2, 4).unwrap();

        let err = adapter.decode(&matrix, &[1.0, 2.0]).unwrap_err();
        assert_eq!(err.to_string(), "solver diverged");
        assert!(matches!(err, DecodeError::Decoder(Diverged)));
    }

    #[test]
    fn test_partition_accepts_valid_split() {
        let result = ClassificationResult {
            surely_positive: vec![2],
            possibly_positive: vec![4],
            surely_negative: vec![1, 3],
            estimates: None,
        };
        assert!(result.check_partition(4).is_ok());
        assert!(ClassificationResult::all_negative(96).check_partition(96).is_ok());
    }

    #[test]
    fn test_partition_detects_violations() {
        let overlap = ClassificationResult {
            surely_positive: vec![2],
            possibly_positive: vec![2],
            surely_negative: vec![1, 3],
            estimates: None,
        };
        assert_eq!(overlap.check_partition(3), Err(PartitionError::Duplicate { index: 2 }));

        let missing = ClassificationResult {
            surely_positive: vec![1],
            possibly_positive: vec![],
            surely_negative: vec![3],
            estimates: None,
        };
        assert_eq!(
            missing.check_partition(4),
            Err(PartitionError::Missing { indices: vec![2, 4] })
        );

        let zero_based = ClassificationResult {
            surely_positive: vec![0],
            ..Default::default()
        };
        assert!(matches!(
            zero_based.check_partition(4),
            Err(PartitionError::OutOfRange { index: 0, .. })
        ));
    }
}
