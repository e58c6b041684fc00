//! Contiguous, immutable vector storage.
//!
//! Base and query sets are loaded elsewhere and handed over as a flat
//! row-major buffer. Rows are addressed by [`NodeId`].

use crate::error::{Error, Result};
use crate::graph::NodeId;

/// A fixed-dimension set of `f32` vectors stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSet {
    data: Vec<f32>,
    dim: usize,
}

impl VectorSet {
    /// Wraps a flat buffer of `len / dim` rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVector`] when `dim` is zero, the buffer is not a
    /// whole number of rows, or a component is not finite.
    pub fn from_flat(data: Vec<f32>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidVector("dimension must be positive".into()));
        }
        if data.len() % dim != 0 {
            return Err(Error::InvalidVector(format!(
                "buffer of {} floats is not a multiple of dimension {dim}",
                data.len()
            )));
        }
        if let Some(pos) = data.iter().position(|x| !x.is_finite()) {
            return Err(Error::InvalidVector(format!(
                "non-finite component in row {}",
                pos / dim
            )));
        }
        Ok(Self { data, dim })
    }

    /// Builds a set from individual rows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`] if rows differ in length, or any
    /// error of [`VectorSet::from_flat`].
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> Result<Self> {
        let dim = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(dim * rows.len());
        for row in rows {
            let row = row.as_ref();
            if row.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_flat(data, dim)
    }

    /// Row `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` is out of range.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &[f32] {
        let start = id as usize * self.dim;
        &self.data[start..start + self.dim]
    }

    /// Vector dimension.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Returns true if the set holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fails unless `other` has the same dimension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DimensionMismatch`].
    pub fn ensure_same_dim(&self, other: &Self) -> Result<()> {
        if self.dim != other.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: other.dim,
            });
        }
        Ok(())
    }

    /// Iterates over rows in id order.
    pub fn iter(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_and_get() {
        let set = VectorSet::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.dim(), 2);
        assert_eq!(set.get(1), &[3.0, 4.0]);
        assert_eq!(set.iter().count(), 2);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = VectorSet::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err.code(), "VGRAPH-002");
    }

    #[test]
    fn test_partial_row_rejected() {
        let err = VectorSet::from_flat(vec![1.0, 2.0, 3.0], 2).unwrap_err();
        assert_eq!(err.code(), "VGRAPH-005");
    }

    #[test]
    fn test_nan_rejected() {
        let err = VectorSet::from_flat(vec![1.0, f32::NAN], 1).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_ensure_same_dim() {
        let a = VectorSet::from_flat(vec![0.0; 4], 2).unwrap();
        let b = VectorSet::from_flat(vec![0.0; 3], 3).unwrap();

        assert!(a.ensure_same_dim(&a).is_ok());
        assert!(a.ensure_same_dim(&b).is_err());
    }
}
