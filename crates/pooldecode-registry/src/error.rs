//! Registry and manifest errors.

use crate::append_only::KeyRemoval;
use crate::matrix::MatrixError;
use std::path::PathBuf;

/// Joins identifiers as `a", "b", "c` for embedding inside quotes.
pub(crate) fn quoted_list(ids: &[String]) -> String {
    ids.join("\", \"")
}

/// Lookup and mutation errors from the store and registry.
///
/// `Unknown*` messages enumerate every valid key so an operator can fix the
/// request without consulting the code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error(
        "Invalid matrix size: \"{requested}\". Correct matrix sizes are: \"{}\"",
        quoted_list(.valid)
    )]
    UnknownConfiguration {
        requested: String,
        valid: Vec<String>,
    },

    #[error(
        "Invalid matrix label: \"{requested}\". Correct matrix labels are: \"{}\"",
        quoted_list(.valid)
    )]
    UnknownMatrix {
        requested: String,
        valid: Vec<String>,
    },

    #[error("Matrix label \"{id}\" is already bound to a different matrix")]
    MatrixRedefined { id: String },

    #[error(transparent)]
    KeyRemoval(#[from] KeyRemoval),
}

/// Errors loading matrix-store or registry manifests from disk.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error loading manifest from {path}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Parse error in manifest {path}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Unsupported manifest version in {path}: expected {expected}, found {found}")]
    UnsupportedVersion {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Invalid matrix \"{id}\" in {path}: {error}")]
    InvalidMatrix {
        path: PathBuf,
        id: String,
        error: MatrixError,
    },

    #[error("Registry error in {path}: {error}")]
    Registry { path: PathBuf, error: RegistryError },
}
