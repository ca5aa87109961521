//! Ready-made settings.

use crate::settings::{
    BiasedSampling, DEFAULT_SHUFFLE_SEED, DistributionSpec, GeneratorKind, GeneratorSettings,
    SigmaSpec, SystematicSpec,
};

/// The 2-D benchmark configuration.
///
/// Background `N([0, 0], [1, 1])`, signal derived at `L = 2` along `x1` with
/// width `0.3`, and a single Translation of `z_magnitude` along `x2`.
pub fn benchmark_settings(
    case: u32,
    total_number_of_events: usize,
    p_b: f64,
    z_magnitude: f64,
) -> GeneratorSettings {
    let mut extra = serde_json::Map::new();
    extra.insert("case".into(), case.into());
    extra.insert("train_comment".into(), "".into());
    extra.insert("test_comment".into(), "".into());

    GeneratorSettings {
        problem_dimension: 2,
        total_number_of_events,
        p_b,
        generator: GeneratorKind::Normal,
        angle_rotation: 0.0,
        background_distribution: DistributionSpec::Gaussian {
            mu: vec![0.0, 0.0],
            sigma: SigmaSpec::PerAxis(vec![1.0, 1.0]),
        },
        signal_distribution: None,
        signal_from_background: true,
        theta: Some(0.0),
        l: Some(2.0),
        signal_sigma_scale: Some(0.3),
        systematics: Some(vec![SystematicSpec::Translation { z_magnitude, alpha: 90.0 }]),
        apply_copula: false,
        alpha: None,
        beta: None,
        seed: None,
        shuffle_seed: DEFAULT_SHUFFLE_SEED,
        biased_sampling: BiasedSampling::Independent,
        weight: 1.0,
        extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_matches_parsed_json() {
        let parsed = GeneratorSettings::from_json_str(
            r#"{
                "case": 3,
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
                "train_comment": "",
                "test_comment": ""
            }"#,
        )
        .unwrap();
        assert_eq!(benchmark_settings(3, 1000, 0.5, 1.0), parsed);
    }
}
