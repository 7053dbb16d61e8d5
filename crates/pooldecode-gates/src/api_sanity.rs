//! # Registry API Gate
//!
//! Exercises the lookup API the way external callers will.
//!
//! ## Checks
//! - **resolve_configuration**: every published configuration resolves
//! - **resolve_label**: every matrix label in the store resolves
//! - **unknown_configuration**: a probe id fails with `UnknownConfiguration`
//!   and the message lists every valid configuration
//! - **unknown_label**: a probe label fails with `UnknownMatrix` and the
//!   message lists every valid label

use crate::{CheckResult, GateResult};
use pooldecode_registry::{MatrixRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const GATE_NAME: &str = "RegistryApi";

/// Probe keys used for the negative-path checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSanityConfig {
    #[serde(default = "default_probe_configurations")]
    pub probe_configurations: Vec<String>,

    #[serde(default = "default_probe_labels")]
    pub probe_labels: Vec<String>,
}

fn default_probe_configurations() -> Vec<String> {
    vec!["fslkj".to_string(), "99x99".to_string()]
}

fn default_probe_labels() -> Vec<String> {
    vec!["ojlkj".to_string()]
}

impl Default for ApiSanityConfig {
    fn default() -> Self {
        Self {
            probe_configurations: default_probe_configurations(),
            probe_labels: default_probe_labels(),
        }
    }
}

/// Registry API gate validator.
pub struct ApiSanityGate {
    config: ApiSanityConfig,
}

impl ApiSanityGate {
    pub fn new(config: ApiSanityConfig) -> Self {
        Self { config }
    }

    pub fn validate(&self, registry: &MatrixRegistry) -> GateResult {
        let start = std::time::Instant::now();
        let mut result = GateResult::new(GATE_NAME);

        info!("Starting registry API checks");

        for (config, _) in registry.entries() {
            result.add_check(self.check_resolve_configuration(registry, config.as_str()));
        }

        for label in registry.store().ids() {
            result.add_check(self.check_resolve_label(registry, label.as_str()));
        }

        for probe in &self.config.probe_configurations {
            result.add_check(self.check_unknown_configuration(registry, probe));
        }

        for probe in &self.config.probe_labels {
            result.add_check(self.check_unknown_label(registry, probe));
        }

        result.finish(start);

        info!(
            gate = GATE_NAME,
            passed = result.passed,
            checks_passed = result.passed_count(),
            checks_total = result.checks.len(),
            duration_ms = result.duration_ms,
            "Registry API checks complete"
        );

        result
    }

    fn check_resolve_configuration(&self, registry: &MatrixRegistry, config: &str) -> CheckResult {
        let name = format!("resolve_configuration/{}", config);
        match registry.resolve_matrix_id(config) {
            Ok(label) => CheckResult::pass(name, format!("Label for valid size {}: {}", config, label)),
            Err(e) => CheckResult::fail(name, format!("Published size {} did not resolve: {}", config, e)),
        }
    }

    fn check_resolve_label(&self, registry: &MatrixRegistry, label: &str) -> CheckResult {
        let name = format!("resolve_label/{}", label);
        match registry.resolve_matrix(label) {
            Ok(m) => CheckResult::pass(name, format!("Shape of {}: {:?}", label, m.shape())),
            Err(e) => CheckResult::fail(name, format!("Known label {} did not resolve: {}", label, e)),
        }
    }

    fn check_unknown_configuration(&self, registry: &MatrixRegistry, probe: &str) -> CheckResult {
        let name = format!("unknown_configuration/{}", probe);
        let expected: Vec<String> = registry.entries().map(|(c, _)| c.to_string()).collect();

        if expected.iter().any(|c| c == probe) {
            return CheckResult::pass(name, format!("Probe {} is a published size; skipped", probe));
        }

        match registry.resolve_matrix_id(probe) {
            Ok(label) => CheckResult::fail(
                name,
                format!("Did not get expected error for invalid size {} (got {})", probe, label),
            ),
            Err(e @ RegistryError::UnknownConfiguration { .. }) => {
                check_enumeration(name, &e, &expected, "size")
            }
            Err(e) => CheckResult::fail(name, format!("Wrong error kind for invalid size {}: {}", probe, e)),
        }
    }

    fn check_unknown_label(&self, registry: &MatrixRegistry, probe: &str) -> CheckResult {
        let name = format!("unknown_label/{}", probe);
        let expected: Vec<String> = registry.store().ids().map(|id| id.to_string()).collect();

        if expected.iter().any(|l| l == probe) {
            return CheckResult::pass(name, format!("Probe {} is a known label; skipped", probe));
        }

        match registry.resolve_matrix(probe) {
            Ok(_) => CheckResult::fail(
                name,
                format!("Did not get expected error for invalid label {}", probe),
            ),
            Err(e @ RegistryError::UnknownMatrix { .. }) => {
                check_enumeration(name, &e, &expected, "label")
            }
            Err(e) => CheckResult::fail(name, format!("Wrong error kind for invalid label {}: {}", probe, e)),
        }
    }
}

/// The error message must quote every valid key.
fn check_enumeration(name: String, err: &RegistryError, expected: &[String], what: &str) -> CheckResult {
    let message = err.to_string();
    let missing: Vec<&String> = expected
        .iter()
        .filter(|key| !message.contains(&format!("\"{}\"", key)))
        .collect();

    if missing.is_empty() {
        CheckResult::pass(name, format!("Got expected error for invalid {}: {}", what, message))
            .with_metrics(serde_json::json!({ "listed": expected.len() }))
    } else {
        CheckResult::fail(
            name,
            format!("Error for invalid {} omits valid keys {:?}: {}", what, missing, message),
        )
    }
}
