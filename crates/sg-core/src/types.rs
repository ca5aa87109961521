//! Common data types for systgen

use std::fmt;

use crate::{Error, Result};

/// Class label of a generated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// Background event (written as `0`).
    Background,
    /// Signal event (written as `1`).
    Signal,
}

impl Label {
    /// Integer encoding used in `.labels` files.
    pub fn as_u8(self) -> u8 {
        match self {
            Label::Background => 0,
            Label::Signal => 1,
        }
    }

    /// Decode a label from its integer encoding.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Label::Background),
            1 => Ok(Label::Signal),
            other => Err(Error::Validation(format!("label must be 0 or 1, got {other}"))),
        }
    }

    /// `true` for [`Label::Signal`].
    pub fn is_signal(self) -> bool {
        self == Label::Signal
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Dense set of points stored row-major: `n_rows × dim`.
///
/// Every row has exactly `dim` coordinates; `dim` is always at least 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet {
    dim: usize,
    values: Vec<f64>,
}

impl PointSet {
    /// Create an empty point set with room for `n_rows` rows.
    ///
    /// # Panics
    /// Panics if `dim == 0`.
    pub fn with_capacity(dim: usize, n_rows: usize) -> Self {
        assert!(dim > 0, "PointSet dimension must be > 0");
        Self { dim, values: Vec::with_capacity(dim * n_rows) }
    }

    /// Wrap a flat row-major buffer.
    pub fn from_flat(dim: usize, values: Vec<f64>) -> Result<Self> {
        if dim == 0 {
            return Err(Error::Validation("point dimension must be > 0".into()));
        }
        if values.len() % dim != 0 {
            return Err(Error::Validation(format!(
                "flat buffer of length {} is not a multiple of dimension {}",
                values.len(),
                dim
            )));
        }
        Ok(Self { dim, values })
    }

    /// Build a point set from explicit rows, each of length `dim`.
    pub fn from_rows(dim: usize, rows: &[Vec<f64>]) -> Result<Self> {
        if dim == 0 {
            return Err(Error::Validation("point dimension must be > 0".into()));
        }
        let mut out = Self::with_capacity(dim, rows.len());
        for row in rows {
            out.push_row(row)?;
        }
        Ok(out)
    }

    /// Number of coordinates per row.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows.
    pub fn n_rows(&self) -> usize {
        self.values.len() / self.dim
    }

    /// `true` when the set holds no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.dim..(i + 1) * self.dim]
    }

    /// Mutable row `i`.
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.values[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate over rows.
    pub fn rows(&self) -> std::slice::ChunksExact<'_, f64> {
        self.values.chunks_exact(self.dim)
    }

    /// Iterate mutably over rows.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, f64> {
        self.values.chunks_exact_mut(self.dim)
    }

    /// Flat row-major view.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Mutable flat row-major view.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Append one row.
    pub fn push_row(&mut self, row: &[f64]) -> Result<()> {
        if row.len() != self.dim {
            return Err(Error::Validation(format!(
                "row has {} coordinates, expected {}",
                row.len(),
                self.dim
            )));
        }
        self.values.extend_from_slice(row);
        Ok(())
    }

    /// Append all rows of `other` (same dimension required).
    pub fn extend_from(&mut self, other: &PointSet) -> Result<()> {
        if other.dim != self.dim {
            return Err(Error::Validation(format!(
                "cannot stack point sets of dimension {} and {}",
                self.dim, other.dim
            )));
        }
        self.values.extend_from_slice(&other.values);
        Ok(())
    }

    /// New point set holding rows `indices` in that order.
    pub fn select(&self, indices: &[usize]) -> PointSet {
        let mut out = Self::with_capacity(self.dim, indices.len());
        for &i in indices {
            out.values.extend_from_slice(self.row(i));
        }
        out
    }

    /// Mean of each coordinate over all rows (`NaN` per axis when empty).
    pub fn column_means(&self) -> Vec<f64> {
        let n = self.n_rows();
        let mut sums = vec![0.0; self.dim];
        for row in self.rows() {
            for (s, &x) in sums.iter_mut().zip(row) {
                *s += x;
            }
        }
        sums.into_iter().map(|s| s / n as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_encoding() {
        assert_eq!(Label::Signal.as_u8(), 1);
        assert_eq!(Label::Background.as_u8(), 0);
        assert_eq!(Label::from_u8(1).unwrap(), Label::Signal);
        assert!(Label::from_u8(2).is_err());
        assert_eq!(Label::Signal.to_string(), "1");
    }

    #[test]
    fn test_point_set_rows_and_means() {
        let ps = PointSet::from_rows(2, &[vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        assert_eq!(ps.n_rows(), 2);
        assert_eq!(ps.row(1), &[3.0, 6.0]);
        assert_eq!(ps.column_means(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_point_set_rejects_ragged_rows() {
        assert!(PointSet::from_rows(2, &[vec![1.0, 2.0, 3.0]]).is_err());
        assert!(PointSet::from_flat(3, vec![1.0, 2.0]).is_err());
        assert!(PointSet::from_flat(0, vec![]).is_err());
    }

    #[test]
    fn test_select_and_extend() {
        let mut a = PointSet::from_rows(1, &[vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        let picked = a.select(&[2, 0]);
        assert_eq!(picked.as_slice(), &[2.0, 0.0]);

        a.extend_from(&picked).unwrap();
        assert_eq!(a.n_rows(), 5);

        let other = PointSet::with_capacity(2, 0);
        assert!(a.extend_from(&other).is_err());
    }
}
