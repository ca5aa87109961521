//! Signal / background dataset generator.
//!
//! A [`DataGenerator`] is built from validated [`GeneratorSettings`] and
//! produces two aligned frames per run: the *original* draw and a *biased*
//! draw with the configured systematics applied. The generator is
//! deterministic given `seed` and `shuffle_seed`.

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use sg_core::{Error, Label, PointSet, Result};
use sg_prob::{Gamma, GammaCopula, Gaussian, GaussianMode, PointSampler, Spread};

use crate::frame::LabeledFrame;
use crate::io::{self, ArtifactPaths};
use crate::settings::{BiasedSampling, DistributionSpec, GeneratorSettings};
use crate::systematics::SystematicChain;

/// Settings echo written next to a dataset: the input settings plus the
/// quantities derived while generating.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationReport {
    /// Input settings, with `seed` set to the seed actually used.
    #[serde(flatten)]
    pub settings: GeneratorSettings,
    /// Signal events drawn.
    pub number_of_signal_events: usize,
    /// Background events drawn.
    pub number_of_background_events: usize,
    /// Center of the box systematic (the signal mean).
    pub box_center: Vec<f64>,
    /// Mean of the original signal draw.
    pub signal_center: Vec<f64>,
    /// Mean of the original background draw (after the copula, if any).
    pub background_center: Vec<f64>,
    /// Mean of the biased signal draw after point systematics.
    pub signal_center_biased: Vec<f64>,
    /// Mean of the biased background draw after point systematics.
    pub background_center_biased: Vec<f64>,
    /// Whether the copula remap was applied to the background.
    pub copula_applied: bool,
    /// Systematics applied, in order.
    pub applied_systematics: Vec<String>,
    /// Rows in each frame after the box filter.
    pub number_of_rows: usize,
}

/// Output of [`DataGenerator::generate_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedData {
    /// Original (unbiased) frame.
    pub original: LabeledFrame,
    /// Biased frame, same length as `original`.
    pub biased: LabeledFrame,
    /// Settings echo with derived fields.
    pub report: GenerationReport,
}

/// Generator of original / biased dataset pairs.
#[derive(Debug, Clone)]
pub struct DataGenerator {
    settings: GeneratorSettings,
    background: PointSampler,
    signal: Gaussian,
    chain: SystematicChain,
    copula: Option<GammaCopula>,
    box_center: Vec<f64>,
    data: Option<GeneratedData>,
}

impl DataGenerator {
    /// Validate `settings` and load distributions and systematics.
    ///
    /// Nothing is drawn or written here; every configuration error surfaces
    /// before the first sample.
    pub fn new(mut settings: GeneratorSettings) -> Result<Self> {
        settings.validate()?;
        settings.strip_derived_keys();
        let dim = settings.problem_dimension;
        let mode = GaussianMode::from(settings.generator);

        let specs = settings.systematics.clone().ok_or_else(|| {
            Error::Config("settings must contain a `systematics` list (may be empty)".into())
        })?;

        let background = load_background(
            &settings.background_distribution,
            dim,
            mode,
            settings.angle_rotation,
        )?;
        let signal = load_signal(&settings, dim, mode)?;
        let box_center = signal.mean().to_vec();
        let chain = SystematicChain::from_specs(&specs, &box_center, dim)?;
        let copula = usable_copula(&settings);

        log::info!(
            "loaded {} background, Gaussian signal, systematics {:?}",
            background.name(),
            chain.names()
        );
        Ok(Self { settings, background, signal, chain, copula, box_center, data: None })
    }

    /// Settings this generator was built from.
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Signal mean, used as the box center.
    pub fn box_center(&self) -> &[f64] {
        &self.box_center
    }

    /// Configured systematics.
    pub fn systematics(&self) -> &SystematicChain {
        &self.chain
    }

    /// Draw a new original / biased pair, replacing any previous one.
    pub fn generate_data(&mut self) -> Result<&GeneratedData> {
        let dim = self.settings.problem_dimension;
        let (n_signal, n_background) = self.settings.event_counts();
        let seed = self.settings.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        log::info!(
            "generating {n_signal} signal and {n_background} background events (seed {seed})"
        );

        let signal = self.signal.generate_points(n_signal, dim, &mut rng)?;
        let mut background = self.background.generate_points(n_background, dim, &mut rng)?;
        let (biased_signal, mut biased_background) = match self.settings.biased_sampling {
            BiasedSampling::Independent => (
                self.signal.generate_points(n_signal, dim, &mut rng)?,
                self.background.generate_points(n_background, dim, &mut rng)?,
            ),
            BiasedSampling::Shared => (signal.clone(), background.clone()),
        };

        let copula_applied = match &self.copula {
            Some(c) => {
                c.remap(&mut background);
                c.remap(&mut biased_background);
                true
            }
            None => {
                if self.settings.apply_copula {
                    log::warn!(
                        "copula parameters (alpha {:?}, beta {:?}) are not usable, skipping the copula",
                        self.settings.alpha,
                        self.settings.beta
                    );
                }
                false
            }
        };

        let signal_center = signal.column_means();
        let background_center = background.column_means();

        let biased_signal = self.chain.apply(&biased_signal)?;
        let biased_background = self.chain.apply(&biased_background)?;
        let signal_center_biased = biased_signal.column_means();
        let background_center_biased = biased_background.column_means();

        let weight = self.settings.weight;
        let mut original = stack(signal, background, weight)?;
        let mut biased = stack(biased_signal, biased_background, weight)?;

        if let Some(b) = self.chain.box_filter() {
            (original, biased) = b.apply_systematics(&original, &biased)?;
            log::debug!("box filter kept {} rows", original.len());
        }

        let shuffle_seed = self.settings.shuffle_seed;
        let original = original.shuffled(shuffle_seed);
        let biased = biased.shuffled(shuffle_seed);

        let mut settings = self.settings.clone();
        settings.seed = Some(seed);
        let report = GenerationReport {
            settings,
            number_of_signal_events: n_signal,
            number_of_background_events: n_background,
            box_center: self.box_center.clone(),
            signal_center,
            background_center,
            signal_center_biased,
            background_center_biased,
            copula_applied,
            applied_systematics: self.chain.names().into_iter().map(String::from).collect(),
            number_of_rows: original.len(),
        };

        Ok(&*self.data.insert(GeneratedData { original, biased, report }))
    }

    /// The last generated dataset.
    pub fn get_data(&self) -> Result<&GeneratedData> {
        self.data
            .as_ref()
            .ok_or_else(|| Error::State("data is not generated; call generate_data first".into()))
    }

    /// Write the last generated dataset under `directory`.
    ///
    /// See [`crate::io`] for the layout. `file_index` suffixes every file stem.
    pub fn save_data(&self, directory: &Path, file_index: Option<usize>) -> Result<ArtifactPaths> {
        let data = self.get_data()?;
        io::save_dataset(directory, &data.original, &data.biased, &data.report, file_index)
    }
}

fn stack(signal: PointSet, background: PointSet, weight: f64) -> Result<LabeledFrame> {
    LabeledFrame::stack(
        &LabeledFrame::uniform(signal, Label::Signal, weight),
        &LabeledFrame::uniform(background, Label::Background, weight),
    )
}

fn load_background(
    spec: &DistributionSpec,
    dim: usize,
    mode: GaussianMode,
    angle: f64,
) -> Result<PointSampler> {
    match spec {
        DistributionSpec::Gaussian { mu, sigma } => {
            Ok(PointSampler::Gaussian(gaussian(mu.clone(), sigma.into(), dim, mode, angle)?))
        }
        DistributionSpec::Gamma { k, theta } => Ok(PointSampler::Gamma(Gamma::new(*k, *theta)?)),
    }
}

fn load_signal(settings: &GeneratorSettings, dim: usize, mode: GaussianMode) -> Result<Gaussian> {
    let angle = -settings.angle_rotation;
    let derived_from = match (&settings.background_distribution, settings.signal_from_background) {
        (DistributionSpec::Gaussian { mu, sigma }, true) => Some((mu, sigma)),
        _ => None,
    };
    let Some((mu_b, sigma_b)) = derived_from else {
        return match &settings.signal_distribution {
            Some(DistributionSpec::Gaussian { mu, sigma }) => {
                gaussian(mu.clone(), sigma.into(), dim, mode, angle)
            }
            Some(other) => Err(Error::Config(format!(
                "signal_distribution must be Gaussian, got {}",
                other.name()
            ))),
            None if settings.signal_from_background => Err(Error::Config(format!(
                "signal_from_background needs a Gaussian background, got {}",
                settings.background_distribution.name()
            ))),
            None => Err(Error::Config(
                "either signal_distribution or signal_from_background must be set".into(),
            )),
        };
    };

    let theta = required(settings.theta, "theta")?;
    let l = required(settings.l, "L")?;
    let scale = required(settings.signal_sigma_scale, "signal_sigma_scale")?;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Validation(format!("signal_sigma_scale must be > 0, got {scale}")));
    }

    let t = theta.to_radians();
    let mut mu_s = mu_b.clone();
    for (m, d) in mu_s.iter_mut().zip([l * t.cos(), l * t.sin()]) {
        *m += d;
    }
    let spread = Spread::from(sigma_b).scaled(scale);
    gaussian(mu_s, spread, dim, mode, angle)
}

fn gaussian(
    mu: Vec<f64>,
    spread: Spread,
    dim: usize,
    mode: GaussianMode,
    angle: f64,
) -> Result<Gaussian> {
    if mu.len() != dim {
        return Err(Error::Validation(format!(
            "Gaussian mu has {} entries, problem_dimension is {dim}",
            mu.len()
        )));
    }
    Gaussian::new(mu, spread, mode, angle)
}

fn required(v: Option<f64>, key: &str) -> Result<f64> {
    let v = v.ok_or_else(|| {
        Error::Config(format!("signal_from_background requires `{key}` in settings"))
    })?;
    if !v.is_finite() {
        return Err(Error::Validation(format!("`{key}` must be finite, got {v}")));
    }
    Ok(v)
}

/// The copula, when requested and both parameters are present, non-zero and valid.
fn usable_copula(settings: &GeneratorSettings) -> Option<GammaCopula> {
    if !settings.apply_copula {
        return None;
    }
    match (settings.alpha, settings.beta) {
        (Some(alpha), Some(beta)) if alpha != 0.0 && beta != 0.0 => {
            GammaCopula::new(alpha, beta).ok()
        }
        _ => None,
    }
}
