//! Test-result pipeline.
//!
//! pool size or matrix label + cycle times → registry → decoder → report.
//!
//! ## Usage
//! ```ignore
//! let results = TestResults::new(registry, my_decoder, DecodeConfig::default());
//! let outcome = results.results_for_configuration("46x96", &cycle_times)?;
//! println!("{}", outcome.report);
//! ```

use crate::compose::compose_result;
use crate::config::{ConfigError, DecodeConfig};
use crate::decoder::{ClassificationResult, DecodeError, Decoder, DecoderAdapter, PartitionError};
use pooldecode_registry::{Matrix, MatrixId, MatrixRegistry, RegistryError};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

/// One decoded test.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub matrix_id: MatrixId,
    pub classification: ClassificationResult,
    pub report: String,
}

/// Pipeline failures.
#[derive(Debug, thiserror::Error)]
pub enum RunError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Decode(DecodeError<E>),

    #[error("decoder output for {matrix_id} is not a partition of the samples: {error}")]
    Partition {
        matrix_id: MatrixId,
        error: PartitionError,
    },
}

/// Registry-backed decoding front end.
///
/// Shareable across threads when the decoder is; the registry is read-only.
pub struct TestResults<D> {
    registry: Arc<MatrixRegistry>,
    adapter: DecoderAdapter<D>,
    config: DecodeConfig,
}

impl<D: Decoder> TestResults<D> {
    pub fn new(registry: Arc<MatrixRegistry>, decoder: D, config: DecodeConfig) -> Self {
        Self {
            registry,
            adapter: DecoderAdapter::new(decoder),
            config,
        }
    }

    /// Pipeline configured from the `[decode]` table of a TOML file.
    pub fn from_config_file(
        registry: Arc<MatrixRegistry>,
        decoder: D,
        path: &Path,
    ) -> Result<Self, ConfigError> {
        let config = DecodeConfig::load(path)?;
        info!(
            path = %path.display(),
            algorithm = %config.algorithm,
            include_estimates = config.include_estimates(),
            "Decode config loaded"
        );
        Ok(Self::new(registry, decoder, config))
    }

    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<MatrixRegistry> {
        &self.registry
    }

    /// Decode a test run on the matrix named `matrix_id`.
    pub fn results_for_matrix(
        &self,
        matrix_id: &str,
        cycle_times: &[f64],
    ) -> Result<TestOutcome, RunError<D::Error>> {
        let matrix = self.registry.resolve_matrix(matrix_id)?;
        self.run(MatrixId::from(matrix_id), &matrix, cycle_times)
    }

    /// Decode a test run for a pool size such as `"46x96"`.
    pub fn results_for_configuration(
        &self,
        config: &str,
        cycle_times: &[f64],
    ) -> Result<TestOutcome, RunError<D::Error>> {
        let (matrix_id, matrix) = self.registry.resolve(config)?;
        self.run(matrix_id, &matrix, cycle_times)
    }

    fn run(
        &self,
        matrix_id: MatrixId,
        matrix: &Matrix,
        cycle_times: &[f64],
    ) -> Result<TestOutcome, RunError<D::Error>> {
        let classification = self
            .adapter
            .decode(matrix, cycle_times)
            .map_err(RunError::Decode)?;

        if self.config.verify_partition {
            if let Err(e) = classification.check_partition(matrix.columns()) {
                error!(matrix_id = %matrix_id, error = %e, "Decoder output rejected");
                return Err(RunError::Partition {
                    matrix_id,
                    error: e,
                });
            }
        }

        let report = compose_result(&classification, self.config.include_estimates());

        info!(
            matrix_id = %matrix_id,
            algorithm = %self.config.algorithm,
            surely_positive = classification.surely_positive.len(),
            possibly_positive = classification.possibly_positive.len(),
            "Test results composed"
        );

        Ok(TestOutcome {
            matrix_id,
            classification,
            report,
        })
    }
}
