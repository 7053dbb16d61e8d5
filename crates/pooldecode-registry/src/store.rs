//! Matrix Store — the MatrixId → Matrix table.
//!
//! Built explicitly at startup (from code or a JSON manifest) and injected
//! into the registry. Append-only: a MatrixId is immutable once introduced.
//!
//! ## Manifest format
//! ```json
//! {
//!   "schema_version": "1.0.0",
//!   "matrices": {
//!     "optimized_M_3": [[1, 0, 1], [0, 1, 1]]
//!   }
//! }
//! ```

use crate::append_only::AppendOnlyMap;
use crate::error::{ManifestError, RegistryError};
use crate::ids::MatrixId;
use crate::matrix::Matrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Schema version for the matrix-store manifest.
pub const MATRIX_STORE_SCHEMA_VERSION: &str = "1.0.0";

/// Read-mostly table of matrices keyed by label.
///
/// Matrices are handed out as `Arc<Matrix>`; nobody downstream copies or
/// mutates them.
#[derive(Debug, Clone, Default)]
pub struct MatrixStore {
    matrices: AppendOnlyMap<MatrixId, Arc<Matrix>>,
}

impl MatrixStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a matrix under `id`.
    ///
    /// Re-inserting an identical matrix is a no-op. Binding a different matrix
    /// to an existing id fails with [`RegistryError::MatrixRedefined`].
    pub fn insert(&mut self, id: impl Into<MatrixId>, matrix: Matrix) -> Result<(), RegistryError> {
        let id = id.into();
        if let Some(existing) = self.matrices.get(&id) {
            if **existing == matrix {
                return Ok(());
            }
            return Err(RegistryError::MatrixRedefined { id: id.to_string() });
        }

        debug!(matrix_id = %id, rows = matrix.rows(), columns = matrix.columns(), "Matrix added to store");
        self.matrices.insert(id, Arc::new(matrix));
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with_matrix(mut self, id: impl Into<MatrixId>, matrix: Matrix) -> Result<Self, RegistryError> {
        self.insert(id, matrix)?;
        Ok(self)
    }

    /// Look up a matrix by label.
    pub fn get(&self, id: &str) -> Result<Arc<Matrix>, RegistryError> {
        self.matrices
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownMatrix {
                requested: id.to_string(),
                valid: self.id_strings(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.matrices.contains_key(id)
    }

    /// Known labels in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &MatrixId> {
        self.matrices.keys()
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub(crate) fn id_strings(&self) -> Vec<String> {
        self.matrices.keys().map(|k| k.to_string()).collect()
    }

    /// Load a store from a JSON manifest file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_json(&content, path)
    }

    /// Parse a store from a JSON manifest string.
    pub fn from_json(json: &str, path: &Path) -> Result<Self, ManifestError> {
        let manifest: MatrixStoreManifest =
            serde_json::from_str(json).map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        if manifest.schema_version != MATRIX_STORE_SCHEMA_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                path: path.to_path_buf(),
                expected: MATRIX_STORE_SCHEMA_VERSION.to_string(),
                found: manifest.schema_version,
            });
        }

        let mut store = Self::new();
        for (id, rows) in manifest.matrices {
            let matrix = Matrix::from_rows(rows).map_err(|error| ManifestError::InvalidMatrix {
                path: path.to_path_buf(),
                id: id.clone(),
                error,
            })?;
            store.insert(id, matrix).map_err(|error| ManifestError::Registry {
                path: path.to_path_buf(),
                error,
            })?;
        }

        info!(
            path = %path.display(),
            matrices = store.len(),
            "Matrix store loaded"
        );

        Ok(store)
    }

    /// Serializable manifest form of the current contents.
    pub fn to_manifest(&self) -> MatrixStoreManifest {
        MatrixStoreManifest {
            schema_version: MATRIX_STORE_SCHEMA_VERSION.to_string(),
            matrices: self
                .matrices
                .iter()
                .map(|(id, m)| (id.to_string(), m.to_rows()))
                .collect(),
        }
    }
}

/// On-disk matrix-store manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixStoreManifest {
    pub schema_version: String,
    /// Rows are kept raw here so shape errors can name the offending label.
    pub matrices: BTreeMap<String, Vec<Vec<f64>>>,
}
