//! Dense decoding matrix.
//!
//! Rows are pooled measurement channels (tests), columns are individual
//! sample slots. Stored row-major; the shape is kept alongside the data so it
//! can be queried without scanning.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Dense row-major `f64` matrix with a fixed shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    columns: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Build from nested rows.
    ///
    /// Every row must have the same, non-zero length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, MatrixError> {
        let n_rows = rows.len();
        if n_rows == 0 {
            return Err(MatrixError::Empty);
        }
        let n_cols = rows[0].len();
        if n_cols == 0 {
            return Err(MatrixError::Empty);
        }

        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(MatrixError::Ragged {
                    row: i,
                    expected: n_cols,
                    found: row.len(),
                });
            }
            data.extend(row);
        }

        Ok(Self {
            rows: n_rows,
            columns: n_cols,
            data,
        })
    }

    /// Build from a flat row-major buffer.
    pub fn from_flat(rows: usize, columns: usize, data: Vec<f64>) -> Result<Self, MatrixError> {
        if rows == 0 || columns == 0 {
            return Err(MatrixError::Empty);
        }
        if data.len() != rows * columns {
            return Err(MatrixError::BufferLength {
                expected: rows * columns,
                found: data.len(),
            });
        }
        Ok(Self {
            rows,
            columns,
            data,
        })
    }

    /// All-zero matrix of the given shape.
    pub fn zeros(rows: usize, columns: usize) -> Result<Self, MatrixError> {
        Self::from_flat(rows, columns, vec![0.0; rows * columns])
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        Some(self.data[row * self.columns + column])
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.columns;
        Some(&self.data[start..start + self.columns])
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.columns)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Nested-row copy, the serialized form.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(|r| r.to_vec()).collect()
    }
}

impl Serialize for Matrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_rows().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<f64>>::deserialize(deserializer)?;
        Matrix::from_rows(rows).map_err(serde::de::Error::custom)
    }
}

/// Matrix construction errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    #[error("matrix must have at least one row and one column")]
    Empty,

    #[error("ragged matrix: row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("buffer length {found} does not match shape (expected {expected})")]
    BufferLength { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_shape_and_access() {
        let m = Matrix::from_rows(vec![vec![1.0, 0.0, 1.0], vec![0.0, 1.0, 1.0]]).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.get(1, 2), Some(1.0));
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.row(0), Some(&[1.0, 0.0, 1.0][..]));
        assert_eq!(m.iter_rows().count(), 2);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert_eq!(
            err,
            MatrixError::Ragged {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn test_from_rows_rejects_empty() {
        assert_eq!(Matrix::from_rows(vec![]).unwrap_err(), MatrixError::Empty);
        assert_eq!(Matrix::from_rows(vec![vec![]]).unwrap_err(), MatrixError::Empty);
    }

    #[test]
    fn test_deserialize_validates_rows() {
        let m: Matrix = serde_json::from_str("[[1, 0], [0, 1], [1, 1]]").unwrap();
        assert_eq!(m.shape(), (3, 2));

        let bad = serde_json::from_str::<Matrix>("[[1, 0], [0]]");
        assert!(bad.is_err());
    }
}
