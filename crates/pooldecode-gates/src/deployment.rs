//! Deployment hook.
//!
//! [`at_deployment`] runs the consistency gate before the registry is promoted
//! to serving. A failure is fatal: the notifier is signalled and the caller
//! gets a [`DeploymentBlocked`] it must not swallow (the `matrix-gate` binary
//! turns it into a non-zero exit).

use crate::GateResult;
use crate::consistency::{ConsistencyChecker, RegistrySetupError};
use pooldecode_registry::MatrixRegistry;
use std::io::Write;
use tracing::{error, info};

/// Operator notification channel for blocked deployments.
pub trait DeploymentNotifier {
    fn notify(&self, gate: &GateResult, err: &RegistrySetupError);
}

/// Both notifiers are signalled, left first.
impl<A: DeploymentNotifier, B: DeploymentNotifier> DeploymentNotifier for (A, B) {
    fn notify(&self, gate: &GateResult, err: &RegistrySetupError) {
        self.0.notify(gate, err);
        self.1.notify(gate, err);
    }
}

/// Emits one `error` event per violation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl DeploymentNotifier for TracingNotifier {
    fn notify(&self, gate: &GateResult, err: &RegistrySetupError) {
        for violation in &err.violations {
            error!(
                gate = %gate.gate,
                config = %violation.config(),
                matrix_id = %violation.matrix_id(),
                "{}",
                violation
            );
        }
        error!(
            gate = %gate.gate,
            violations = err.violations.len(),
            "Deployment blocked: matrix setup invalid"
        );
    }
}

/// Prints an operator banner to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrNotifier;

impl DeploymentNotifier for StderrNotifier {
    fn notify(&self, gate: &GateResult, err: &RegistrySetupError) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "********   DEPLOYMENT BLOCKED   ********");
        let _ = writeln!(stderr, "{}", gate.summary);
        for violation in &err.violations {
            let _ = writeln!(stderr, "  {}", violation);
        }
        let _ = writeln!(stderr, "****************************************");
    }
}

/// Failed deployment gate. Carries the gate result for the audit artifact.
#[derive(Debug, thiserror::Error)]
#[error("Deployment blocked: {error}")]
pub struct DeploymentBlocked {
    pub gate: GateResult,
    #[source]
    pub error: RegistrySetupError,
}

/// Run at deployment time. Any error here means: do not deploy, notify.
pub fn at_deployment(
    registry: &MatrixRegistry,
    notifier: &dyn DeploymentNotifier,
) -> Result<GateResult, DeploymentBlocked> {
    let (gate, violations) = ConsistencyChecker::new().inspect(registry);

    if violations.is_empty() {
        info!(
            version_hash = %registry.compute_version_hash_hex(),
            "Matrix registry cleared for deployment"
        );
        return Ok(gate);
    }

    let error = RegistrySetupError { violations };
    notifier.notify(&gate, &error);
    Err(DeploymentBlocked { gate, error })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pooldecode_registry::{Matrix, MatrixStore};
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingNotifier {
        calls: RefCell<Vec<usize>>,
    }

    impl DeploymentNotifier for RecordingNotifier {
        fn notify(&self, _gate: &GateResult, err: &RegistrySetupError) {
            self.calls.borrow_mut().push(err.violations.len());
        }
    }

    fn store() -> Arc<MatrixStore> {
        Arc::new(
            MatrixStore::new()
                .with_matrix("M_10_10", Matrix::zeros(10, 10).unwrap())
                .unwrap(),
        )
    }

    #[test]
    fn test_clean_registry_does_not_notify() {
        let mut registry = MatrixRegistry::new(store());
        registry.register("10x10", "M_10_10");

        let notifier = RecordingNotifier::default();
        let gate = at_deployment(&registry, &notifier).unwrap();
        assert!(gate.passed);
        assert!(notifier.calls.borrow().is_empty());
    }

    #[test]
    fn test_broken_registry_notifies_once_with_all_violations() {
        let mut registry = MatrixRegistry::new(store());
        registry.register("10x10", "M_10_10");
        registry.register("10x11", "M_10_10");
        registry.register("12x12", "M_gone");

        let notifier = RecordingNotifier::default();
        let blocked = at_deployment(&registry, &notifier).unwrap_err();
        assert_eq!(blocked.error.violations.len(), 2);
        assert!(!blocked.gate.passed);
        assert_eq!(*notifier.calls.borrow(), vec![2]);
        assert!(blocked.to_string().starts_with("Deployment blocked: Some error in matrix setup"));
    }

    #[test]
    fn test_paired_notifiers_both_fire() {
        let mut registry = MatrixRegistry::new(store());
        registry.register("12x12", "M_gone");

        let pair = (RecordingNotifier::default(), RecordingNotifier::default());
        at_deployment(&registry, &pair).unwrap_err();
        assert_eq!(*pair.0.calls.borrow(), vec![1]);
        assert_eq!(*pair.1.calls.borrow(), vec![1]);
    }
}
