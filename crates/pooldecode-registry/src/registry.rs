//! Matrix Registry — binds pool configurations to matrix labels.
//!
//! ## Policy
//! Once a pool configuration is published it is never removed, and neither
//! is any matrix label. A configuration may be re-pointed at a newer matrix
//! of the same shape. Both rules are enforced through [`AppendOnlyMap`].
//!
//! ## Usage
//! ```ignore
//! let store = Arc::new(MatrixStore::load(Path::new("matrices.json"))?);
//! let registry = MatrixRegistry::with_builtins(store);
//! let label = registry.resolve_matrix_id("46x96")?;
//! let matrix = registry.resolve_matrix(label.as_str())?;
//! ```

use crate::append_only::AppendOnlyMap;
use crate::error::{ManifestError, RegistryError};
use crate::ids::{MatrixId, PoolConfigurationId};
use crate::matrix::Matrix;
use crate::store::MatrixStore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Schema version for the registry manifest.
pub const REGISTRY_SCHEMA_VERSION: &str = "1.0.0";

/// Pool configurations shipped with the system.
///
/// Edit by hand. Entries may be re-pointed but never deleted.
pub const BUILTIN_CONFIGURATIONS: &[(&str, &str)] = &[
    ("16x40", "optimized_M_16_40_ncbs"),
    ("24x60", "optimized_M_3"),
    ("46x96", "optimized_M_46_96_1"),
    ("46x192", "optimized_M_46_192_1"),
];

/// Builtin table as typed ids.
pub fn builtin_configurations() -> BTreeMap<PoolConfigurationId, MatrixId> {
    BUILTIN_CONFIGURATIONS
        .iter()
        .map(|(cfg, label)| (PoolConfigurationId::from(*cfg), MatrixId::from(*label)))
        .collect()
}

/// Pool configuration → matrix label table over an injected store.
///
/// Initialization (register/reload) must finish before concurrent reads
/// begin; afterwards the registry is shared read-only, typically as
/// `Arc<MatrixRegistry>`.
#[derive(Debug, Clone)]
pub struct MatrixRegistry {
    configurations: AppendOnlyMap<PoolConfigurationId, MatrixId>,
    store: Arc<MatrixStore>,
}

impl MatrixRegistry {
    /// Empty registry over `store`.
    pub fn new(store: Arc<MatrixStore>) -> Self {
        Self {
            configurations: AppendOnlyMap::new(),
            store,
        }
    }

    /// Registry pre-populated with [`BUILTIN_CONFIGURATIONS`].
    pub fn with_builtins(store: Arc<MatrixStore>) -> Self {
        Self::from_table(store, builtin_configurations())
    }

    /// Registry over `store` with the given table.
    pub fn from_table(
        store: Arc<MatrixStore>,
        table: BTreeMap<PoolConfigurationId, MatrixId>,
    ) -> Self {
        Self {
            configurations: table.into_iter().collect(),
            store,
        }
    }

    /// Publish a configuration or re-point an existing one.
    ///
    /// Returns the label it previously pointed to, if any.
    pub fn register(
        &mut self,
        config: impl Into<PoolConfigurationId>,
        matrix_id: impl Into<MatrixId>,
    ) -> Option<MatrixId> {
        let config = config.into();
        let matrix_id = matrix_id.into();
        let previous = self.configurations.insert(config.clone(), matrix_id.clone());

        if let Some(ref old) = previous {
            if old != &matrix_id {
                warn!(
                    config = %config,
                    old = %old,
                    new = %matrix_id,
                    "Pool configuration re-pointed to a new matrix"
                );
            }
        }

        previous
    }

    /// Replace the whole table, rejecting any table that drops a published
    /// configuration.
    pub fn reload(
        &mut self,
        table: BTreeMap<PoolConfigurationId, MatrixId>,
    ) -> Result<(), RegistryError> {
        self.configurations.replace_all(table)?;
        info!(configurations = self.configurations.len(), "Registry table reloaded");
        Ok(())
    }

    /// Independent copy of the configuration → label table.
    pub fn list_configurations(&self) -> BTreeMap<PoolConfigurationId, MatrixId> {
        self.configurations.snapshot()
    }

    /// Current label for a pool configuration.
    pub fn resolve_matrix_id(&self, config: &str) -> Result<MatrixId, RegistryError> {
        self.configurations
            .get(config)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownConfiguration {
                requested: config.to_string(),
                valid: self.configuration_strings(),
            })
    }

    /// Matrix for a label, from the backing store.
    pub fn resolve_matrix(&self, matrix_id: &str) -> Result<Arc<Matrix>, RegistryError> {
        self.store.get(matrix_id)
    }

    /// Configuration → (label, matrix) in one step.
    pub fn resolve(&self, config: &str) -> Result<(MatrixId, Arc<Matrix>), RegistryError> {
        let matrix_id = self.resolve_matrix_id(config)?;
        let matrix = self.resolve_matrix(matrix_id.as_str())?;
        Ok((matrix_id, matrix))
    }

    /// Iterate entries in sorted configuration order.
    pub fn entries(&self) -> impl Iterator<Item = (&PoolConfigurationId, &MatrixId)> {
        self.configurations.iter()
    }

    pub fn store(&self) -> &Arc<MatrixStore> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.configurations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.is_empty()
    }

    fn configuration_strings(&self) -> Vec<String> {
        self.configurations.keys().map(|k| k.to_string()).collect()
    }

    /// Load the configuration table from a JSON registry manifest.
    pub fn load(store: Arc<MatrixStore>, path: &Path) -> Result<Self, ManifestError> {
        let manifest = RegistryManifest::load(path)?;
        let registry = Self::from_table(store, manifest.configurations);

        info!(
            path = %path.display(),
            configurations = registry.len(),
            version_hash = %registry.compute_version_hash_hex(),
            "Matrix registry loaded"
        );

        Ok(registry)
    }

    /// Canonical bytes of the configuration table.
    ///
    /// Layout: u32 LE entry count, then for each entry in sorted order the
    /// configuration id and matrix label, each as u32 LE length + UTF-8.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(self.configurations.len() as u32).to_le_bytes());
        for (config, label) in self.configurations.iter() {
            write_string(&mut bytes, config.as_str());
            write_string(&mut bytes, label.as_str());
        }
        bytes
    }

    /// SHA-256 of [`canonical_bytes`](Self::canonical_bytes).
    pub fn compute_version_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        hasher.finalize().into()
    }

    /// Version hash as hex (for logs and gate artifacts).
    pub fn compute_version_hash_hex(&self) -> String {
        hex::encode(self.compute_version_hash())
    }
}

fn write_string(bytes: &mut Vec<u8>, s: &str) {
    bytes.extend_from_slice(&(s.len() as u32).to_le_bytes());
    bytes.extend_from_slice(s.as_bytes());
}

// =============================================================================
// Registry Manifest
// =============================================================================

/// On-disk registry table.
///
/// ```json
/// {
///   "schema_version": "1.0.0",
///   "configurations": { "46x96": "optimized_M_46_96_1" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryManifest {
    pub schema_version: String,
    pub configurations: BTreeMap<PoolConfigurationId, MatrixId>,
}

impl RegistryManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_json(&content, path)
    }

    pub fn from_json(json: &str, path: &Path) -> Result<Self, ManifestError> {
        let manifest: Self = serde_json::from_str(json).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        if manifest.schema_version != REGISTRY_SCHEMA_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                path: path.to_path_buf(),
                expected: REGISTRY_SCHEMA_VERSION.to_string(),
                found: manifest.schema_version,
            });
        }

        Ok(manifest)
    }
}
