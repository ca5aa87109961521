//! Probability building blocks for systgen.
//!
//! This crate hosts the numeric pieces the generator composes:
//! - population samplers (Gaussian, Gamma)
//! - normal CDF / Gamma quantile helpers
//! - the Gaussian-to-Gamma copula remap
//! - plane rotations of the first two axes

pub mod copula;
pub mod gamma;
pub mod geometry;
pub mod normal;
pub mod sampler;

pub use copula::GammaCopula;
pub use sampler::{Gamma, Gaussian, GaussianMode, PointSampler, Spread};
