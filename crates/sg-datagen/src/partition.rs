//! Weight reweighting and train / test partitioning.
//!
//! Subsets of a weighted dataset are rescaled so their per-class weight
//! totals match those of the full dataset. Test folds additionally scale the
//! signal weights by a ground-truth signal strength `mu`.

use sg_core::{Error, Label, Result};

use crate::frame::LabeledFrame;

/// Per-class weight totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTotals {
    /// Sum of signal weights.
    pub signal: f64,
    /// Sum of background weights.
    pub background: f64,
}

impl WeightTotals {
    /// Sum the weights of `frame` per class.
    pub fn of(frame: &LabeledFrame) -> Self {
        let mut t = Self { signal: 0.0, background: 0.0 };
        for (label, w) in frame.labels().iter().zip(frame.weights()) {
            match label {
                Label::Signal => t.signal += w,
                Label::Background => t.background += w,
            }
        }
        t
    }

    fn get(&self, label: Label) -> f64 {
        match label {
            Label::Signal => self.signal,
            Label::Background => self.background,
        }
    }
}

/// Rescale `frame` so its class totals equal `target`.
pub fn reweight_to(frame: &mut LabeledFrame, target: WeightTotals) -> Result<()> {
    let actual = WeightTotals::of(frame);
    let mut factors = [1.0; 2];
    for label in [Label::Background, Label::Signal] {
        factors[label.as_u8() as usize] =
            class_factor(label, frame.count(label) > 0, actual.get(label), target.get(label))?;
    }
    let labels = frame.labels().to_vec();
    for (w, label) in frame.weights_mut().iter_mut().zip(labels) {
        *w *= factors[label.as_u8() as usize];
    }
    Ok(())
}

fn class_factor(label: Label, present: bool, actual: f64, target: f64) -> Result<f64> {
    let class = if label.is_signal() { "signal" } else { "background" };
    if !present {
        if target == 0.0 {
            return Ok(1.0);
        }
        return Err(Error::Computation(format!(
            "cannot reweight: subset has no {class} rows but the target total is {target}"
        )));
    }
    if !actual.is_finite() || actual == 0.0 {
        return Err(Error::Computation(format!(
            "cannot reweight: {class} weight total is {actual}"
        )));
    }
    Ok(target / actual)
}

/// Multiply signal weights by `mu`.
pub fn apply_mu(frame: &mut LabeledFrame, mu: f64) {
    let labels = frame.labels().to_vec();
    for (w, label) in frame.weights_mut().iter_mut().zip(labels) {
        if label.is_signal() {
            *w *= mu;
        }
    }
}

/// How a frame is split into train and test folds.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionConfig {
    /// Fraction of rows in the test block.
    pub test_fraction: f64,
    /// Number of test folds, including the mu-calibration fold.
    pub n_folds: usize,
    /// Seed of the row shuffle before splitting.
    pub seed: u64,
    /// Ground-truth mu per test fold after the calibration fold. Empty means 1.0.
    pub mu: Vec<f64>,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self { test_fraction: 0.3, n_folds: 10, seed: 42, mu: Vec::new() }
    }
}

impl PartitionConfig {
    fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(Error::Validation(format!(
                "test_fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.n_folds < 2 {
            return Err(Error::Validation(format!(
                "n_folds must be >= 2 (calibration fold plus at least one test fold), got {}",
                self.n_folds
            )));
        }
        if !self.mu.is_empty() && self.mu.len() != self.n_folds - 1 {
            return Err(Error::Validation(format!(
                "expected {} mu values, got {}",
                self.n_folds - 1,
                self.mu.len()
            )));
        }
        if let Some(m) = self.mu.iter().find(|m| !m.is_finite() || **m < 0.0) {
            return Err(Error::Validation(format!("mu must be finite and >= 0, got {m}")));
        }
        Ok(())
    }

    fn mu_for(&self, fold: usize) -> f64 {
        self.mu.get(fold).copied().unwrap_or(1.0)
    }
}

/// One test fold and its ground-truth mu.
#[derive(Debug, Clone, PartialEq)]
pub struct TestFold {
    /// Reweighted rows, signal weights scaled by `mu`.
    pub frame: LabeledFrame,
    /// Ground-truth signal strength.
    pub mu: f64,
}

/// Result of [`partition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Class totals of the full input frame.
    pub reference: WeightTotals,
    /// Reweighted training rows.
    pub train: LabeledFrame,
    /// Reweighted calibration fold (no mu applied).
    pub mu_calibration: LabeledFrame,
    /// Remaining test folds.
    pub test_folds: Vec<TestFold>,
}

/// Split `frame` into a reweighted train block, a calibration fold and test folds.
///
/// Rows are shuffled with `config.seed`; the first `ceil(test_fraction * n)`
/// shuffled rows form the test block, cut into `n_folds` contiguous folds of
/// equal size with the remainder added to the last one.
pub fn partition(frame: &LabeledFrame, config: &PartitionConfig) -> Result<Partition> {
    config.validate()?;
    let n = frame.len();
    let n_test = (config.test_fraction * n as f64).ceil() as usize;
    if n_test < config.n_folds || n_test >= n {
        return Err(Error::Validation(format!(
            "{n} rows cannot be split into a train block and {} test folds with test_fraction {}",
            config.n_folds, config.test_fraction
        )));
    }

    let reference = WeightTotals::of(frame);
    log::debug!(
        "reference totals: signal {}, background {}",
        reference.signal,
        reference.background
    );
    let shuffled = frame.shuffled(config.seed);

    let mut train = shuffled.slice(n_test, n);
    reweight_to(&mut train, reference)?;

    let fold_size = n_test / config.n_folds;
    let mut folds = (0..config.n_folds).map(|k| {
        let start = k * fold_size;
        let end = if k + 1 == config.n_folds { n_test } else { start + fold_size };
        shuffled.slice(start, end)
    });

    let mut mu_calibration = folds.next().ok_or_else(|| {
        Error::Computation("partition produced no calibration fold".into())
    })?;
    reweight_to(&mut mu_calibration, reference)?;

    let mut test_folds = Vec::with_capacity(config.n_folds - 1);
    for (i, mut fold) in folds.enumerate() {
        reweight_to(&mut fold, reference)?;
        let mu = config.mu_for(i);
        apply_mu(&mut fold, mu);
        test_folds.push(TestFold { frame: fold, mu });
    }

    log::info!(
        "partitioned {} rows: {} train, {} calibration, {} test folds",
        n,
        train.len(),
        mu_calibration.len(),
        test_folds.len()
    );
    Ok(Partition { reference, train, mu_calibration, test_folds })
}
