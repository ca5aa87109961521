//! Generator settings (JSON schema) parsing.
//!
//! Settings files are the single description of how a dataset realization
//! is produced. Distributions and systematics are tagged by `name`:
//!
//! ```json
//! {
//!   "problem_dimension": 2,
//!   "total_number_of_events": 1000,
//!   "p_b": 0.5,
//!   "generator": "normal",
//!   "background_distribution": { "name": "Gaussian", "mu": [0, 0], "sigma": [1, 1] },
//!   "signal_from_background": true, "theta": 0, "L": 2, "signal_sigma_scale": 0.3,
//!   "systematics": [ { "name": "Translation", "z_magnitude": 1, "alpha": 90 } ]
//! }
//! ```
//!
//! Keys this schema does not know about (`case`, comments, ...) are kept in
//! [`GeneratorSettings::extra`] and echoed into the saved settings file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sg_core::{Error, Result};
use sg_prob::{GaussianMode, Spread};

/// Seed used for the final row shuffle unless the settings override it.
pub const DEFAULT_SHUFFLE_SEED: u64 = 33;

/// Keys the generator writes into the settings echo. They are dropped from
/// [`GeneratorSettings::extra`] so a saved settings file can be fed back in.
pub const DERIVED_KEYS: &[&str] = &[
    "number_of_signal_events",
    "number_of_background_events",
    "box_center",
    "signal_center",
    "background_center",
    "signal_center_biased",
    "background_center_biased",
    "copula_applied",
    "applied_systematics",
    "number_of_rows",
];

/// Top-level settings for one dataset realization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorSettings {
    /// Number of coordinates per event.
    pub problem_dimension: usize,
    /// Requested number of events (signal + background, before truncation).
    pub total_number_of_events: usize,
    /// Background fraction, in `(0, 1)`.
    pub p_b: f64,
    /// Gaussian draw mode.
    #[serde(default)]
    pub generator: GeneratorKind,
    /// Rotation (degrees) of the background Gaussian; the signal uses the negated angle.
    #[serde(default)]
    pub angle_rotation: f64,
    /// Background population.
    pub background_distribution: DistributionSpec,
    /// Explicit signal population (Gaussian only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_distribution: Option<DistributionSpec>,
    /// Derive the signal population from a Gaussian background.
    #[serde(default)]
    pub signal_from_background: bool,
    /// Direction (degrees) of the signal offset from the background mean.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta: Option<f64>,
    /// Distance of the signal mean from the background mean.
    #[serde(rename = "L", default, skip_serializing_if = "Option::is_none")]
    pub l: Option<f64>,
    /// Signal width relative to the background width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_sigma_scale: Option<f64>,
    /// Ordered systematic descriptors. Required (may be empty).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub systematics: Option<Vec<SystematicSpec>>,
    /// Remap background coordinates through the Gamma copula.
    #[serde(default)]
    pub apply_copula: bool,
    /// Copula Gamma shape.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    /// Copula Gamma location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    /// Sampling seed. Drawn from entropy (and recorded) when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Seed of the final row shuffle.
    #[serde(default = "default_shuffle_seed")]
    pub shuffle_seed: u64,
    /// Whether the biased populations are fresh draws or copies of the originals.
    #[serde(default)]
    pub biased_sampling: BiasedSampling,
    /// Initial per-event weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Unrecognized keys, carried through to the settings echo.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_shuffle_seed() -> u64 {
    DEFAULT_SHUFFLE_SEED
}

fn default_weight() -> f64 {
    1.0
}

/// Gaussian generator mode as spelled in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Per-axis normal draws.
    #[default]
    Normal,
    /// Correlated multivariate draws.
    Multivariate,
}

impl From<GeneratorKind> for GaussianMode {
    fn from(kind: GeneratorKind) -> Self {
        match kind {
            GeneratorKind::Normal => GaussianMode::Normal,
            GeneratorKind::Multivariate => GaussianMode::Multivariate,
        }
    }
}

/// How the biased populations are sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasedSampling {
    /// Independent second draw of each population.
    #[default]
    Independent,
    /// Reuse the original draws (the biased set differs only by systematics).
    Shared,
}

/// Population distribution descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum DistributionSpec {
    /// Normal population.
    Gaussian {
        /// Mean vector.
        mu: Vec<f64>,
        /// Per-axis standard deviations or a full covariance matrix.
        sigma: SigmaSpec,
    },
    /// Per-axis Gamma population.
    Gamma {
        /// Shape.
        k: f64,
        /// Scale.
        #[serde(alias = "_theta_")]
        theta: f64,
    },
}

impl DistributionSpec {
    /// Name as spelled in settings.
    pub fn name(&self) -> &'static str {
        match self {
            DistributionSpec::Gaussian { .. } => "Gaussian",
            DistributionSpec::Gamma { .. } => "Gamma",
        }
    }
}

/// Gaussian spread as written in settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SigmaSpec {
    /// One standard deviation per axis.
    PerAxis(Vec<f64>),
    /// Full covariance matrix.
    Covariance(Vec<Vec<f64>>),
}

impl From<&SigmaSpec> for Spread {
    fn from(s: &SigmaSpec) -> Self {
        match s {
            SigmaSpec::PerAxis(v) => Spread::PerAxis(v.clone()),
            SigmaSpec::Covariance(m) => Spread::Covariance(m.clone()),
        }
    }
}

/// Systematic descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum SystematicSpec {
    /// Shift by `z_magnitude` in direction `alpha` (degrees) in the `(x1, x2)` plane.
    Translation {
        /// Shift length.
        z_magnitude: f64,
        /// Shift direction in degrees.
        alpha: f64,
    },
    /// Scale `x1`, `x2` by `scaling_factor` (only when `> 1`).
    Scaling {
        /// Scale factor.
        scaling_factor: f64,
    },
    /// Rotate the `(x1, x2)` plane by `rotation_degree` (only when `!= 0`).
    Rotation {
        /// Angle in degrees.
        rotation_degree: f64,
    },
    /// Keep only events inside a cube of side `box_l` around the signal mean (only when `> 1`).
    Box {
        /// Side length.
        box_l: f64,
    },
}

impl GeneratorSettings {
    /// Parse settings from a JSON string.
    ///
    /// Schema violations (unknown distribution or systematic names, missing
    /// required keys) are reported as [`Error::Config`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid settings: {e}")))
    }

    /// Read and parse a settings file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Signal fraction `p_s = 1 - p_b`, rounded to 5 decimals.
    pub fn p_s(&self) -> f64 {
        ((1.0 - self.p_b) * 1e5).round() / 1e5
    }

    /// `(n_signal, n_background)` derived by truncation.
    ///
    /// The sum may fall short of `total_number_of_events` by one event.
    pub fn event_counts(&self) -> (usize, usize) {
        let n = self.total_number_of_events as f64;
        ((n * self.p_s()) as usize, (n * self.p_b) as usize)
    }

    /// Check scalar fields. Distribution and systematic parameters are
    /// validated when the generator loads them.
    pub fn validate(&self) -> Result<()> {
        if self.problem_dimension == 0 {
            return Err(Error::Validation("problem_dimension must be > 0".into()));
        }
        if self.total_number_of_events == 0 {
            return Err(Error::Validation("total_number_of_events must be > 0".into()));
        }
        if !self.p_b.is_finite() || self.p_b <= 0.0 || self.p_b >= 1.0 {
            return Err(Error::Validation(format!("p_b must be in (0, 1), got {}", self.p_b)));
        }
        if !self.angle_rotation.is_finite() {
            return Err(Error::Validation("angle_rotation must be finite".into()));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(Error::Validation(format!(
                "weight must be finite and > 0, got {}",
                self.weight
            )));
        }
        Ok(())
    }

    /// Drop derived keys that a previously saved settings echo may carry.
    pub(crate) fn strip_derived_keys(&mut self) {
        for key in DERIVED_KEYS {
            self.extra.remove(*key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BENCHMARK: &str = r#"{
        "case": 1,
        "problem_dimension": 2,
        "total_number_of_events": 1000,
        "p_b": 0.5,
        "theta": 0,
        "L": 2,
        "generator": "normal",
        "background_distribution": { "name": "Gaussian", "mu": [0, 0], "sigma": [1, 1] },
        "signal_from_background": true,
        "signal_sigma_scale": 0.3,
        "systematics": [ { "name": "Translation", "z_magnitude": 1, "alpha": 90 } ],
        "train_comment": ""
    }"#;

    #[test]
    fn test_parse_benchmark_settings() {
        let s = GeneratorSettings::from_json_str(BENCHMARK).unwrap();
        assert_eq!(s.problem_dimension, 2);
        assert_eq!(s.l, Some(2.0));
        assert_eq!(s.generator, GeneratorKind::Normal);
        assert_eq!(s.shuffle_seed, DEFAULT_SHUFFLE_SEED);
        assert_eq!(s.biased_sampling, BiasedSampling::Independent);
        assert_eq!(s.weight, 1.0);
        assert_eq!(
            s.systematics.as_deref(),
            Some(&[SystematicSpec::Translation { z_magnitude: 1.0, alpha: 90.0 }][..])
        );
        assert_eq!(s.extra.get("case"), Some(&serde_json::json!(1)));
        assert!(s.extra.contains_key("train_comment"));
        s.validate().unwrap();
    }

    #[test]
    fn test_gamma_theta_alias_and_covariance() {
        let s = GeneratorSettings::from_json_str(
            r#"{
                "problem_dimension": 2, "total_number_of_events": 10, "p_b": 0.3,
                "background_distribution": { "name": "Gamma", "k": 2, "_theta_": 0.5 },
                "signal_distribution": { "name": "Gaussian", "mu": [1, 1], "sigma": [[1, 0.2], [0.2, 1]] },
                "systematics": []
            }"#,
        )
        .unwrap();
        assert_eq!(s.background_distribution, DistributionSpec::Gamma { k: 2.0, theta: 0.5 });
        match s.signal_distribution {
            Some(DistributionSpec::Gaussian { sigma: SigmaSpec::Covariance(ref c), .. }) => {
                assert_eq!(c[0][1], 0.2)
            }
            ref other => panic!("unexpected signal spec: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_distribution_is_config_error() {
        let json = BENCHMARK.replace(r#""name": "Gaussian""#, r#""name": "Poisson""#);
        assert!(matches!(GeneratorSettings::from_json_str(&json), Err(Error::Config(_))));
    }

    #[test]
    fn test_event_counts_truncate() {
        let mut s = GeneratorSettings::from_json_str(BENCHMARK).unwrap();
        assert_eq!(s.event_counts(), (500, 500));

        s.total_number_of_events = 1001;
        s.p_b = 0.3;
        let (ns, nb) = s.event_counts();
        assert_eq!((ns, nb), (700, 300));
        assert!(ns + nb <= 1001);
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let mut s = GeneratorSettings::from_json_str(BENCHMARK).unwrap();
        s.p_b = 1.0;
        assert!(s.validate().is_err());
        s.p_b = 0.5;
        s.problem_dimension = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_round_trip_keeps_extra_and_renames() {
        let s = GeneratorSettings::from_json_str(BENCHMARK).unwrap();
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["L"], serde_json::json!(2.0));
        assert_eq!(v["case"], serde_json::json!(1));
        assert_eq!(v["systematics"][0]["name"], "Translation");
        assert!(v.get("seed").is_none());
    }

    proptest! {
        #[test]
        fn prop_event_counts_lose_at_most_one(total in 1usize..10_000_000, k in 1u32..100_000) {
            let mut s = GeneratorSettings::from_json_str(BENCHMARK).unwrap();
            s.total_number_of_events = total;
            s.p_b = k as f64 / 1e5;
            prop_assert!(s.validate().is_ok());
            let (ns, nb) = s.event_counts();
            prop_assert!(ns + nb <= total, "{} + {} > {}", ns, nb, total);
            prop_assert!(total - (ns + nb) < 2, "{} + {} vs {}", ns, nb, total);
        }
    }
}
