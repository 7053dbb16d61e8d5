//! # PoolDecode Registry
//!
//! Matrix store and pool-size registry for pooled-sample decoding.
//!
//! ## Pieces
//! - **Matrix Store**: MatrixId → [`Matrix`], append-only, built at startup
//! - **Matrix Registry**: pool configuration (`"46x96"`) → MatrixId
//! - **Manifests**: JSON files that populate both at startup
//!
//! ## Usage
//! ```ignore
//! use pooldecode_registry::{MatrixRegistry, MatrixStore};
//!
//! let store = Arc::new(MatrixStore::load(Path::new("config/matrices.json"))?);
//! let registry = MatrixRegistry::with_builtins(store);
//! let (label, matrix) = registry.resolve("46x96")?;
//! ```

pub mod append_only;
pub mod error;
pub mod ids;
pub mod matrix;
pub mod registry;
pub mod store;

pub use append_only::{AppendOnlyMap, KeyRemoval};
pub use error::{ManifestError, RegistryError};
pub use ids::{MatrixId, PoolConfigurationId, SHAPE_SEPARATOR, ShapeParseError};
pub use matrix::{Matrix, MatrixError};
pub use registry::{
    BUILTIN_CONFIGURATIONS, MatrixRegistry, REGISTRY_SCHEMA_VERSION, RegistryManifest,
    builtin_configurations,
};
pub use store::{MATRIX_STORE_SCHEMA_VERSION, MatrixStore, MatrixStoreManifest};
