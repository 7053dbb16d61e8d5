//! # Matrix Consistency Gate
//!
//! Deployment-time coherence check of the matrix registry.
//!
//! ## Checks (per registry entry)
//! - **matrix_exists**: the matrix label resolves in the Matrix Store
//! - **shape_match**: the matrix shape equals the `rows x columns` encoded in
//!   the configuration id; an unparseable id counts as a mismatch
//!
//! Every entry is inspected. Failures are aggregated into one
//! [`RegistrySetupError`] so a single run reports every misconfiguration.

use crate::{CheckResult, GateResult};
use pooldecode_registry::{MatrixId, MatrixRegistry, PoolConfigurationId};
use std::fmt;
use tracing::{error, info};

pub const GATE_NAME: &str = "MatrixConsistency";

/// One misconfigured registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The label has no matrix in the store.
    MissingMatrix {
        config: PoolConfigurationId,
        matrix_id: MatrixId,
    },
    /// The matrix exists but its shape differs from the configuration id.
    ShapeMismatch {
        config: PoolConfigurationId,
        matrix_id: MatrixId,
        expected: (usize, usize),
        actual: (usize, usize),
    },
    /// The configuration id does not encode a shape. Treated as a mismatch.
    MalformedConfiguration {
        config: PoolConfigurationId,
        matrix_id: MatrixId,
        reason: String,
    },
}

impl Violation {
    pub fn config(&self) -> &PoolConfigurationId {
        match self {
            Violation::MissingMatrix { config, .. }
            | Violation::ShapeMismatch { config, .. }
            | Violation::MalformedConfiguration { config, .. } => config,
        }
    }

    pub fn matrix_id(&self) -> &MatrixId {
        match self {
            Violation::MissingMatrix { matrix_id, .. }
            | Violation::ShapeMismatch { matrix_id, .. }
            | Violation::MalformedConfiguration { matrix_id, .. } => matrix_id,
        }
    }

    /// Shape-category violation (mismatch or malformed id).
    pub fn is_shape_mismatch(&self) -> bool {
        !matches!(self, Violation::MissingMatrix { .. })
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::MissingMatrix { config, matrix_id } => {
                write!(f, "{} -> {}: label does not exist", config, matrix_id)
            }
            Violation::ShapeMismatch {
                config,
                matrix_id,
                expected,
                actual,
            } => write!(
                f,
                "{} -> {}: Sizes don't match: expected {:?}, matrix has {:?}",
                config, matrix_id, expected, actual
            ),
            Violation::MalformedConfiguration {
                config,
                matrix_id,
                reason,
            } => write!(f, "{} -> {}: Sizes don't match: {}", config, matrix_id, reason),
        }
    }
}

/// Aggregate registry setup failure. Fatal to deployment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "Some error in matrix setup ({} violation(s)): {}",
    .violations.len(),
    join_violations(.violations)
)]
pub struct RegistrySetupError {
    pub violations: Vec<Violation>,
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl RegistrySetupError {
    /// Distinct configuration ids with at least one violation.
    pub fn failing_configurations(&self) -> Vec<&PoolConfigurationId> {
        let mut configs: Vec<_> = self.violations.iter().map(|v| v.config()).collect();
        configs.dedup();
        configs
    }
}

/// Matrix consistency gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsistencyChecker;

impl ConsistencyChecker {
    pub fn new() -> Self {
        Self
    }

    /// Inspect every entry and return the gate result.
    pub fn validate(&self, registry: &MatrixRegistry) -> GateResult {
        self.inspect(registry).0
    }

    /// Inspect every entry; fail with all violations if any entry is bad.
    pub fn enforce(&self, registry: &MatrixRegistry) -> Result<GateResult, RegistrySetupError> {
        let (result, violations) = self.inspect(registry);
        if violations.is_empty() {
            Ok(result)
        } else {
            Err(RegistrySetupError { violations })
        }
    }

    /// Gate result plus the violation list, in registry order.
    pub fn inspect(&self, registry: &MatrixRegistry) -> (GateResult, Vec<Violation>) {
        let start = std::time::Instant::now();
        let mut result = GateResult::new(GATE_NAME);
        let mut violations = Vec::new();

        info!(
            entries = registry.len(),
            "Checking that matrix sizes correspond to an actual label"
        );

        for (config, matrix_id) in registry.entries() {
            self.check_entry(registry, config, matrix_id, &mut result, &mut violations);
        }

        result.finish(start);
        result.metrics = Some(serde_json::json!({
            "entries": registry.len(),
            "matrices": registry.store().len(),
            "violations": violations.len(),
            "registry_version_hash": registry.compute_version_hash_hex(),
        }));

        if violations.is_empty() {
            info!(
                gate = GATE_NAME,
                checks_total = result.checks.len(),
                duration_ms = result.duration_ms,
                "All OK"
            );
        } else {
            error!(
                gate = GATE_NAME,
                violations = violations.len(),
                duration_ms = result.duration_ms,
                "Matrix setup has errors"
            );
        }

        (result, violations)
    }

    fn check_entry(
        &self,
        registry: &MatrixRegistry,
        config: &PoolConfigurationId,
        matrix_id: &MatrixId,
        result: &mut GateResult,
        violations: &mut Vec<Violation>,
    ) {
        let exists_name = format!("{}/matrix_exists", config);
        let shape_name = format!("{}/shape_match", config);

        let matrix = match registry.resolve_matrix(matrix_id.as_str()) {
            Ok(m) => {
                info!(config = %config, matrix_id = %matrix_id, "label exists");
                result.add_check(CheckResult::pass(
                    exists_name,
                    format!("{} {} label exists", config, matrix_id),
                ));
                Some(m)
            }
            Err(_) => {
                error!(config = %config, matrix_id = %matrix_id, "label does not exist");
                result.add_check(CheckResult::fail(
                    exists_name,
                    format!("{} {} label does not exist", config, matrix_id),
                ));
                violations.push(Violation::MissingMatrix {
                    config: config.clone(),
                    matrix_id: matrix_id.clone(),
                });
                None
            }
        };

        let expected = match config.shape() {
            Ok(shape) => shape,
            Err(e) => {
                error!(config = %config, matrix_id = %matrix_id, reason = %e.reason, "malformed configuration id");
                result.add_check(CheckResult::fail(
                    shape_name,
                    format!("{} {} Sizes don't match: {}", config, matrix_id, e.reason),
                ));
                violations.push(Violation::MalformedConfiguration {
                    config: config.clone(),
                    matrix_id: matrix_id.clone(),
                    reason: e.reason,
                });
                return;
            }
        };

        let Some(matrix) = matrix else {
            result.add_check(CheckResult::fail(
                shape_name,
                format!("{} {} Sizes not checked: matrix missing", config, matrix_id),
            ));
            return;
        };

        let actual = matrix.shape();
        let metrics = serde_json::json!({
            "expected": [expected.0, expected.1],
            "actual": [actual.0, actual.1],
        });

        if actual == expected {
            info!(config = %config, matrix_id = %matrix_id, "Sizes match");
            result.add_check(
                CheckResult::pass(shape_name, format!("{} {} Sizes match", config, matrix_id))
                    .with_metrics(metrics),
            );
        } else {
            error!(
                config = %config,
                matrix_id = %matrix_id,
                expected = ?expected,
                actual = ?actual,
                "Sizes don't match"
            );
            result.add_check(
                CheckResult::fail(
                    shape_name,
                    format!(
                        "{} {} Sizes don't match: matrix has {:?}",
                        config, matrix_id, actual
                    ),
                )
                .with_metrics(metrics),
            );
            violations.push(Violation::ShapeMismatch {
                config: config.clone(),
                matrix_id: matrix_id.clone(),
                expected,
                actual,
            });
        }
    }
}
