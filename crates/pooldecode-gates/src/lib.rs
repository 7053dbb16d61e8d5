//! # PoolDecode Gates
//!
//! Deployment gates for the matrix registry. A registry is never trusted for a
//! diagnostic run until these pass.
//!
//! ## Gates
//! - **MatrixConsistency**: every configuration points at an existing matrix
//!   whose shape matches the configuration id
//! - **RegistryApi**: lookups succeed for published keys and fail loudly,
//!   with full key listings, for everything else
//!
//! ## Usage
//! ```ignore
//! use pooldecode_gates::{at_deployment, StderrNotifier, TracingNotifier};
//!
//! let gate = at_deployment(&registry, &(TracingNotifier, StderrNotifier))?;
//! ```

pub mod api_sanity;
pub mod consistency;
pub mod deployment;

pub use api_sanity::{ApiSanityConfig, ApiSanityGate};
pub use consistency::{ConsistencyChecker, RegistrySetupError, Violation};
pub use deployment::{
    DeploymentBlocked, DeploymentNotifier, StderrNotifier, TracingNotifier, at_deployment,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gate validation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    /// Gate identifier
    pub gate: String,
    /// Overall pass/fail
    pub passed: bool,
    /// Timestamp of validation
    pub timestamp: DateTime<Utc>,
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Summary message
    pub summary: String,
    /// Validation duration in milliseconds
    pub duration_ms: u64,
    /// Gate-level metrics (registry hash, entry counts)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
}

impl GateResult {
    /// Create a new gate result.
    pub fn new(gate: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            passed: true,
            timestamp: Utc::now(),
            checks: Vec::new(),
            summary: String::new(),
            duration_ms: 0,
            metrics: None,
        }
    }

    /// Add a check result.
    pub fn add_check(&mut self, check: CheckResult) {
        if !check.passed {
            self.passed = false;
        }
        self.checks.push(check);
    }

    /// Count passed checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Count failed checks.
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Failed checks only.
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed)
    }

    /// Stamp duration and the standard summary line.
    pub(crate) fn finish(&mut self, start: std::time::Instant) {
        let duration = start.elapsed().as_millis() as u64;
        self.duration_ms = duration;
        self.summary = format!(
            "{}/{} checks passed in {}ms",
            self.passed_count(),
            self.checks.len(),
            duration
        );
    }

    /// Human-readable multi-line rendering.
    pub fn render_text(&self) -> String {
        let mut out = format!(
            "{} [{}] {}\n",
            self.gate,
            if self.passed { "PASS" } else { "FAIL" },
            self.summary
        );
        for check in &self.checks {
            out.push_str(&format!(
                "  {} {}: {}\n",
                if check.passed { "ok  " } else { "FAIL" },
                check.name,
                check.message
            ));
        }
        out
    }
}

/// One named assertion inside a gate, e.g. `46x96/shape_match`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    /// Operator-facing detail; names the configuration and label involved.
    pub message: String,
    /// Expected/actual values where the check compares something.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<serde_json::Value>,
}

impl CheckResult {
    fn new(name: impl Into<String>, passed: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            message: message.into(),
            metrics: None,
        }
    }

    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, true, message)
    }

    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, false, message)
    }

    pub fn with_metrics(mut self, metrics: serde_json::Value) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Gate artifact write failures.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("cannot write gate artifact {}: {error}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("cannot serialize gate results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Process outcome of a gate run, mapped onto the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStatus {
    /// Every gate passed; deployment may proceed.
    Passed,
    /// At least one gate failed; deployment is blocked.
    Failed,
    /// The gates could not run (missing file, bad manifest).
    Error,
}

impl GateStatus {
    pub fn from_gates(gates: &[GateResult]) -> Self {
        if gates.iter().all(|g| g.passed) {
            GateStatus::Passed
        } else {
            GateStatus::Failed
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            GateStatus::Passed => 0,
            GateStatus::Failed => 1,
            GateStatus::Error => 2,
        }
    }
}

/// Write gate results as pretty JSON (deployment audit artifact).
pub fn write_gate_results(path: &std::path::Path, results: &[GateResult]) -> Result<(), GateError> {
    let io_error = |error| GateError::Io {
        path: path.to_path_buf(),
        error,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
    }
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(path, json).map_err(io_error)?;
    tracing::info!(path = %path.display(), gates = results.len(), "Gate results written");
    Ok(())
}
