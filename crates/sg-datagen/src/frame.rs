//! Labeled, weighted point frames.
//!
//! A [`LabeledFrame`] keeps points, labels and weights in one structure so
//! every row operation (filtering, stacking, shuffling) moves all three
//! together. Row alignment is structural, not a convention between arrays.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use sg_core::{Error, Label, PointSet, Result};

/// Points with one label and one weight per row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledFrame {
    points: PointSet,
    labels: Vec<Label>,
    weights: Vec<f64>,
}

impl LabeledFrame {
    /// Assemble a frame, checking that all columns have the same length.
    pub fn new(points: PointSet, labels: Vec<Label>, weights: Vec<f64>) -> Result<Self> {
        let n = points.n_rows();
        if labels.len() != n || weights.len() != n {
            return Err(Error::Validation(format!(
                "frame columns disagree: {} rows, {} labels, {} weights",
                n,
                labels.len(),
                weights.len()
            )));
        }
        Ok(Self { points, labels, weights })
    }

    /// Every row gets the same `label` and `weight`.
    pub fn uniform(points: PointSet, label: Label, weight: f64) -> Self {
        let n = points.n_rows();
        Self { points, labels: vec![label; n], weights: vec![weight; n] }
    }

    /// Rows of `first` followed by rows of `second`.
    pub fn stack(first: &LabeledFrame, second: &LabeledFrame) -> Result<Self> {
        let mut points = first.points.clone();
        points.extend_from(&second.points)?;
        let labels = first.labels.iter().chain(&second.labels).copied().collect();
        let weights = first.weights.iter().chain(&second.weights).copied().collect();
        Ok(Self { points, labels, weights })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// `true` when the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Coordinates per row.
    pub fn dim(&self) -> usize {
        self.points.dim()
    }

    /// Points.
    pub fn points(&self) -> &PointSet {
        &self.points
    }

    /// Labels.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Mutable weights.
    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    /// Number of rows carrying `label`.
    pub fn count(&self, label: Label) -> usize {
        self.labels.iter().filter(|&&l| l == label).count()
    }

    /// `x1..xK` column names.
    pub fn column_names(&self) -> Vec<String> {
        column_names(self.dim())
    }

    /// New frame with rows `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            points: self.points.select(indices),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            weights: indices.iter().map(|&i| self.weights[i]).collect(),
        }
    }

    /// New frame with rows `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let idx: Vec<usize> = (start..end).collect();
        self.select(&idx)
    }

    /// Keep rows whose `mask` entry is `true`.
    pub fn retain_mask(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.len() {
            return Err(Error::Validation(format!(
                "mask has {} entries for {} rows",
                mask.len(),
                self.len()
            )));
        }
        let idx: Vec<usize> =
            mask.iter().enumerate().filter_map(|(i, &keep)| keep.then_some(i)).collect();
        Ok(self.select(&idx))
    }

    /// Shuffle rows with the permutation drawn from `seed`.
    ///
    /// Two frames of equal length shuffled with the same seed receive the same
    /// permutation.
    pub fn shuffled(&self, seed: u64) -> Self {
        self.select(&shuffle_permutation(self.len(), seed))
    }
}

/// Random permutation of `0..n` drawn from `StdRng::seed_from_u64(seed)`.
pub fn shuffle_permutation(n: usize, seed: u64) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);
    idx
}

/// `x1..x{dim}`.
pub fn column_names(dim: usize) -> Vec<String> {
    (1..=dim).map(|i| format!("x{i}")).collect()
}
