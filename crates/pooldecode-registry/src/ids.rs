//! Identifier newtypes.
//!
//! - [`PoolConfigurationId`]: human-facing pool size such as `"46x96"`
//!   (`rows x columns`, i.e. pooled tests x individual samples).
//! - [`MatrixId`]: opaque label of one concrete matrix variant, such as
//!   `"optimized_M_46_96_1"`.
//!
//! Both are plain strings on the wire. Neither is ever removed once it has
//! been handed out.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Separator between the row and column counts in a configuration id.
pub const SHAPE_SEPARATOR: char = 'x';

// =============================================================================
// Pool Configuration Id
// =============================================================================

/// Pool configuration identifier, e.g. `"46x96"`.
///
/// The encoded shape is authoritative: a matrix registered under this id
/// must have exactly `rows` rows and `columns` columns.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolConfigurationId(String);

impl PoolConfigurationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the `(rows, columns)` pair.
    ///
    /// Splits on the literal `x`. Exactly two parts are accepted and both must
    /// be integers greater than zero.
    pub fn shape(&self) -> Result<(usize, usize), ShapeParseError> {
        let parts: Vec<&str> = self.0.split(SHAPE_SEPARATOR).collect();
        if parts.len() != 2 {
            return Err(ShapeParseError::new(
                &self.0,
                format!(
                    "expected exactly one '{}' separator, found {}",
                    SHAPE_SEPARATOR,
                    parts.len().saturating_sub(1)
                ),
            ));
        }

        let rows = parse_dimension(&self.0, "rows", parts[0])?;
        let columns = parse_dimension(&self.0, "columns", parts[1])?;
        Ok((rows, columns))
    }
}

fn parse_dimension(id: &str, what: &str, raw: &str) -> Result<usize, ShapeParseError> {
    let value: usize = raw
        .parse()
        .map_err(|_| ShapeParseError::new(id, format!("{} '{}' is not an integer", what, raw)))?;
    if value == 0 {
        return Err(ShapeParseError::new(id, format!("{} must be positive", what)));
    }
    Ok(value)
}

impl fmt::Display for PoolConfigurationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for PoolConfigurationId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PoolConfigurationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for PoolConfigurationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Matrix Id
// =============================================================================

/// Opaque matrix label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatrixId(String);

impl MatrixId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatrixId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for MatrixId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for MatrixId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for MatrixId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// =============================================================================
// Errors
// =============================================================================

/// A configuration id that does not encode a valid `rows x columns` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed pool configuration \"{id}\": {reason}")]
pub struct ShapeParseError {
    pub id: String,
    pub reason: String,
}

impl ShapeParseError {
    fn new(id: &str, reason: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
