//! Dataset artifacts on disk.
//!
//! Layout of a generated dataset rooted at `D`:
//!
//! ```text
//! D/train/data/train.csv          header x1..xK
//! D/train/labels/train.labels     one 0/1 per line, no trailing newline
//! D/train/weights/train.weights   one weight per line
//! D/test/{data,labels,weights}/test.*
//! D/settings/settings.json
//! ```
//!
//! With a file index `i` the stems become `train_<i>`, `test_<i>` and
//! `settings_<i>`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sg_core::{Error, Label, PointSet, Result};

use crate::frame::{LabeledFrame, column_names};
use crate::partition::Partition;

/// Files written by one `save_data` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Original points.
    pub train_data: PathBuf,
    /// Original labels.
    pub train_labels: PathBuf,
    /// Original weights.
    pub train_weights: PathBuf,
    /// Biased points.
    pub test_data: PathBuf,
    /// Biased labels.
    pub test_labels: PathBuf,
    /// Biased weights.
    pub test_weights: PathBuf,
    /// Settings echo.
    pub settings: PathBuf,
}

impl ArtifactPaths {
    /// Paths under `root` for an optional `file_index`.
    pub fn new(root: &Path, file_index: Option<usize>) -> Self {
        let stem = |base: &str| match file_index {
            Some(i) => format!("{base}_{i}"),
            None => base.to_string(),
        };
        let train = stem("train");
        let test = stem("test");
        Self {
            train_data: root.join("train/data").join(format!("{train}.csv")),
            train_labels: root.join("train/labels").join(format!("{train}.labels")),
            train_weights: root.join("train/weights").join(format!("{train}.weights")),
            test_data: root.join("test/data").join(format!("{test}.csv")),
            test_labels: root.join("test/labels").join(format!("{test}.labels")),
            test_weights: root.join("test/weights").join(format!("{test}.weights")),
            settings: root.join("settings").join(format!("{}.json", stem("settings"))),
        }
    }
}

/// Create `root` (warning when it is missing) and `subdirs` below it.
pub fn ensure_dirs(root: &Path, subdirs: &[&str]) -> Result<()> {
    if !root.exists() {
        log::warn!("directory {} does not exist, creating it", root.display());
        fs::create_dir_all(root)?;
    }
    for sub in subdirs {
        fs::create_dir_all(root.join(sub))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

/// Write `points` as CSV with an `x1..xK` header.
pub fn write_points_csv(path: &Path, points: &PointSet) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(column_names(points.dim()))?;
    for row in points.rows() {
        wtr.write_record(row.iter().map(|x| x.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write labels as newline-joined `0`/`1`, without a trailing newline.
pub fn write_labels(path: &Path, labels: &[Label]) -> Result<()> {
    let body: Vec<String> = labels.iter().map(|l| l.to_string()).collect();
    fs::write(path, body.join("\n"))?;
    Ok(())
}

/// Write one weight per line, without a trailing newline.
pub fn write_weights(path: &Path, weights: &[f64]) -> Result<()> {
    let body: Vec<String> = weights.iter().map(|w| w.to_string()).collect();
    fs::write(path, body.join("\n"))?;
    Ok(())
}

/// Write `value` as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

fn write_frame(frame: &LabeledFrame, data: &Path, labels: &Path, weights: &Path) -> Result<()> {
    write_points_csv(data, frame.points())?;
    write_labels(labels, frame.labels())?;
    write_weights(weights, frame.weights())
}

/// Write an original/biased pair and its settings echo under `root`.
pub fn save_dataset<T: Serialize>(
    root: &Path,
    original: &LabeledFrame,
    biased: &LabeledFrame,
    settings: &T,
    file_index: Option<usize>,
) -> Result<ArtifactPaths> {
    ensure_dirs(
        root,
        &[
            "train/data",
            "train/labels",
            "train/weights",
            "test/data",
            "test/labels",
            "test/weights",
            "settings",
        ],
    )?;
    let paths = ArtifactPaths::new(root, file_index);
    write_frame(original, &paths.train_data, &paths.train_labels, &paths.train_weights)?;
    write_frame(biased, &paths.test_data, &paths.test_labels, &paths.test_weights)?;
    write_json(&paths.settings, settings)?;
    log::info!(
        "saved {} train and {} test rows under {}",
        original.len(),
        biased.len(),
        root.display()
    );
    Ok(paths)
}

/// Write a [`Partition`] under `root`.
///
/// Train goes to `train/*/data.*`, the mu-calibration fold to
/// `test/*/data_mu_calc.*` and test fold `i` to `test/*/data_<i>.*` with its
/// ground-truth mu in `test/settings/data_<i>.json`.
pub fn save_partition(root: &Path, partition: &Partition) -> Result<()> {
    ensure_dirs(
        root,
        &[
            "train/data",
            "train/labels",
            "train/weights",
            "train/settings",
            "test/data",
            "test/labels",
            "test/weights",
            "test/settings",
        ],
    )?;
    let split = |side: &str, stem: &str| {
        (
            root.join(side).join("data").join(format!("{stem}.csv")),
            root.join(side).join("labels").join(format!("{stem}.labels")),
            root.join(side).join("weights").join(format!("{stem}.weights")),
        )
    };

    let (d, l, w) = split("train", "data");
    write_frame(&partition.train, &d, &l, &w)?;
    write_json(
        &root.join("train/settings/data.json"),
        &serde_json::json!({ "ground_truth_mu": 1.0 }),
    )?;

    let (d, l, w) = split("test", "data_mu_calc");
    write_frame(&partition.mu_calibration, &d, &l, &w)?;

    for (i, fold) in partition.test_folds.iter().enumerate() {
        let stem = format!("data_{i}");
        let (d, l, w) = split("test", &stem);
        write_frame(&fold.frame, &d, &l, &w)?;
        write_json(
            &root.join("test/settings").join(format!("{stem}.json")),
            &serde_json::json!({ "ground_truth_mu": fold.mu }),
        )?;
    }
    log::info!(
        "saved partition under {}: {} train rows, {} test folds",
        root.display(),
        partition.train.len(),
        partition.test_folds.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Read a headed CSV of numeric columns.
pub fn read_points_csv(path: &Path) -> Result<PointSet> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let dim = rdr.headers()?.len();
    if dim == 0 {
        return Err(Error::Validation(format!("{} has no columns", path.display())));
    }
    let mut points = PointSet::with_capacity(dim, 0);
    let mut row = Vec::with_capacity(dim);
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        row.clear();
        for field in record.iter() {
            let v = field.trim().parse::<f64>().map_err(|e| {
                Error::Validation(format!("{}: row {}: bad value {:?}: {e}", path.display(), i + 1, field))
            })?;
            row.push(v);
        }
        points.push_row(&row)?;
    }
    Ok(points)
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect())
}

/// Read a `.labels` file.
pub fn read_labels(path: &Path) -> Result<Vec<Label>> {
    read_lines(path)?
        .iter()
        .map(|l| {
            let v = l.parse::<u8>().map_err(|e| {
                Error::Validation(format!("{}: bad label {:?}: {e}", path.display(), l))
            })?;
            Label::from_u8(v)
        })
        .collect()
}

/// Read a `.weights` file.
pub fn read_weights(path: &Path) -> Result<Vec<f64>> {
    read_lines(path)?
        .iter()
        .map(|l| {
            l.parse::<f64>().map_err(|e| {
                Error::Validation(format!("{}: bad weight {:?}: {e}", path.display(), l))
            })
        })
        .collect()
}

/// Load a frame from its data, labels and (optional) weights files.
///
/// Without a weights file every row gets `default_weight`.
pub fn read_frame(
    data: &Path,
    labels: &Path,
    weights: Option<&Path>,
    default_weight: f64,
) -> Result<LabeledFrame> {
    let points = read_points_csv(data)?;
    let labels = read_labels(labels)?;
    let weights = match weights {
        Some(p) => read_weights(p)?,
        None => vec![default_weight; labels.len()],
    };
    LabeledFrame::new(points, labels, weights)
}
