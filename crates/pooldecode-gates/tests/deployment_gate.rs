//! Deployment gate integration test.
//!
//! Builds registries from manifest files on disk and verifies:
//! 1. A coherent registry clears both gates
//! 2. A broken registry blocks deployment with every violation reported
//! 3. Gate artifacts are written and parse back

use pooldecode_gates::{
    ApiSanityConfig, ApiSanityGate, ConsistencyChecker, DeploymentNotifier, GateResult,
    RegistrySetupError, TracingNotifier, Violation, at_deployment, write_gate_results,
};
use pooldecode_registry::{MatrixRegistry, MatrixStore};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const MATRICES: &str = r#"{
    "schema_version": "1.0.0",
    "matrices": {
        "M_2_4": [[1, 1, 0, 0], [0, 0, 1, 1]],
        "M_3_6": [[1, 0, 1, 1, 0, 1], [1, 1, 0, 1, 1, 0], [0, 1, 1, 0, 1, 1]],
        "M_bad": [[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]]
    }
}"#;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn load(dir: &Path, registry_json: &str) -> MatrixRegistry {
    let store = MatrixStore::load(&write(dir, "matrices.json", MATRICES)).unwrap();
    MatrixRegistry::load(Arc::new(store), &write(dir, "registry.json", registry_json)).unwrap()
}

#[derive(Default)]
struct CountingNotifier {
    calls: AtomicUsize,
}

impl DeploymentNotifier for CountingNotifier {
    fn notify(&self, gate: &GateResult, err: &RegistrySetupError) {
        TracingNotifier.notify(gate, err);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_coherent_registry_clears_all_gates() {
    let dir = tempfile::tempdir().unwrap();
    let registry = load(
        dir.path(),
        r#"{"schema_version": "1.0.0", "configurations": {"2x4": "M_2_4", "3x6": "M_3_6"}}"#,
    );

    let notifier = CountingNotifier::default();
    let consistency = at_deployment(&registry, &notifier).unwrap();
    let api = ApiSanityGate::new(ApiSanityConfig::default()).validate(&registry);

    assert!(consistency.passed);
    assert!(api.passed, "{}", api.render_text());
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_broken_registry_blocks_deployment() {
    let dir = tempfile::tempdir().unwrap();
    let registry = load(
        dir.path(),
        r#"{
            "schema_version": "1.0.0",
            "configurations": {
                "2x4": "M_2_4",
                "1x10": "M_bad",
                "46x96": "optimized_M_46_96_1",
                "3by6": "M_3_6"
            }
        }"#,
    );

    let notifier = CountingNotifier::default();
    let err = at_deployment(&registry, &notifier).unwrap_err().error;
    assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);

    assert_eq!(err.violations.len(), 3);
    assert!(err.violations.iter().any(|v| matches!(
        v,
        Violation::ShapeMismatch { config, actual: (1, 11), .. } if config.as_str() == "1x10"
    )));
    assert!(err.violations.iter().any(|v| matches!(
        v,
        Violation::MissingMatrix { config, .. } if config.as_str() == "46x96"
    )));
    assert!(err.violations.iter().any(|v| matches!(
        v,
        Violation::MalformedConfiguration { config, .. } if config.as_str() == "3by6"
    )));
}

#[test]
fn test_gate_artifact_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let registry = load(
        dir.path(),
        r#"{"schema_version": "1.0.0", "configurations": {"2x4": "M_2_4", "1x10": "M_bad"}}"#,
    );

    let gate = ConsistencyChecker::new().validate(&registry);
    let out = dir.path().join("gates").join("matrix_gates.json");
    write_gate_results(&out, &[gate.clone()]).unwrap();

    let parsed: Vec<GateResult> =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(parsed.len(), 1);
    assert!(!parsed[0].passed);
    assert_eq!(parsed[0].failed_count(), 1);
    assert_eq!(
        parsed[0].metrics.as_ref().unwrap()["registry_version_hash"],
        registry.compute_version_hash_hex()
    );
}
