//! Registry lookup integration test.
//!
//! Loads a store and registry from fixture files and verifies:
//! 1. Every registered configuration resolves to a matrix of its declared shape
//! 2. Unknown configurations and labels always fail, never default
//! 3. Error messages enumerate every valid key

use pooldecode_registry::{MatrixRegistry, MatrixStore, RegistryError};
use std::path::PathBuf;
use std::sync::Arc;

fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir).join("tests/fixtures").join(name)
}

fn load_registry() -> MatrixRegistry {
    let store = MatrixStore::load(&fixture_path("matrices.json")).expect("Failed to load store");
    MatrixRegistry::load(Arc::new(store), &fixture_path("registry.json"))
        .expect("Failed to load registry")
}

#[test]
fn test_every_configuration_resolves_to_declared_shape() {
    let registry = load_registry();
    assert_eq!(registry.len(), 3);

    for (config, label) in registry.list_configurations() {
        let matrix = registry.resolve_matrix(label.as_str()).unwrap();
        assert_eq!(matrix.shape(), config.shape().unwrap(), "config {}", config);
    }
}

#[test]
fn test_unknown_configuration_enumerates_all_sizes() {
    let registry = load_registry();
    let err = registry.resolve_matrix_id("99x99").unwrap_err();

    match &err {
        RegistryError::UnknownConfiguration { requested, valid } => {
            assert_eq!(requested, "99x99");
            assert_eq!(valid.len(), 3);
        }
        other => panic!("expected UnknownConfiguration, got {:?}", other),
    }

    let message = err.to_string();
    for config in registry.list_configurations().keys() {
        assert!(message.contains(config.as_str()), "missing {} in {}", config, message);
    }
}

#[test]
fn test_unknown_label_enumerates_all_labels() {
    let registry = load_registry();
    let err = registry.resolve_matrix("ojlkj").unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, RegistryError::UnknownMatrix { .. }));
    for label in registry.store().ids() {
        assert!(message.contains(label.as_str()));
    }
}

#[test]
fn test_lookups_are_stable_across_threads() {
    let registry = Arc::new(load_registry());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || registry.resolve("4x8").unwrap().1.shape())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (4, 8));
    }
}

#[test]
fn test_shipped_registry_manifest_matches_builtins() {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/registry.json");
    let store = Arc::new(MatrixStore::new());

    let shipped = MatrixRegistry::load(Arc::clone(&store), &path).expect("Failed to load config/registry.json");
    let builtin = MatrixRegistry::with_builtins(store);

    assert_eq!(shipped.list_configurations(), builtin.list_configurations());
    assert_eq!(shipped.compute_version_hash_hex(), builtin.compute_version_hash_hex());
}
