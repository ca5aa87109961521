//! # sg-datagen
//!
//! Signal / background dataset generation with systematics.
//!
//! This crate provides:
//! - typed generator settings (JSON)
//! - the [`DataGenerator`]: sampling, copula remap, systematics, shuffling
//! - dataset artifacts on disk (CSV points, labels, weights, settings echo)
//! - weight reweighting and train / test fold partitioning

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Labeled, weighted frames of points.
pub mod frame;
/// The dataset generator.
pub mod generator;
/// Reading and writing dataset artifacts.
pub mod io;
/// Reweighting and partitioning of weighted datasets.
pub mod partition;
/// Ready-made settings.
pub mod presets;
/// Settings schema.
pub mod settings;
/// Systematic operators and their chain.
pub mod systematics;

pub use frame::LabeledFrame;
pub use generator::{DataGenerator, GeneratedData, GenerationReport};
pub use io::ArtifactPaths;
pub use partition::{Partition, PartitionConfig, TestFold, WeightTotals, partition};
pub use presets::benchmark_settings;
pub use settings::{GeneratorSettings, SystematicSpec};
pub use systematics::{PointTransform, SystematicChain};
