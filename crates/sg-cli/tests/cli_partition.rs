use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_systgen"))
}

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("systgen_cli_partition_{}_{}_{}", std::process::id(), nanos, name));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

/// 500 rows, alternating labels, weights 1..=4 cycling.
fn write_dataset(dir: &PathBuf) -> (PathBuf, PathBuf, PathBuf) {
    std::fs::create_dir_all(dir).unwrap();
    let data = dir.join("data.csv");
    let labels = dir.join("data.labels");
    let weights = dir.join("data.weights");

    let mut csv = String::from("x1,x2\n");
    let mut lab = Vec::new();
    let mut w = Vec::new();
    for i in 0..500 {
        csv.push_str(&format!("{},{}\n", i, -(i as f64) / 10.0));
        lab.push(if i % 2 == 0 { "1" } else { "0" }.to_string());
        w.push(format!("{}", 1 + i % 4));
    }
    std::fs::write(&data, csv).unwrap();
    std::fs::write(&labels, lab.join("\n")).unwrap();
    std::fs::write(&weights, w.join("\n")).unwrap();
    (data, labels, weights)
}

fn sum_weights(path: PathBuf) -> f64 {
    std::fs::read_to_string(path).unwrap().lines().map(|l| l.parse::<f64>().unwrap()).sum()
}

#[test]
fn partition_writes_train_calibration_and_folds() {
    let dir = tmp_dir("folds");
    let (data, labels, weights) = write_dataset(&dir);
    let root = dir.join("input_data");

    let out = run(&[
        "partition",
        "--data",
        data.to_string_lossy().as_ref(),
        "--labels",
        labels.to_string_lossy().as_ref(),
        "--weights",
        weights.to_string_lossy().as_ref(),
        "--output-dir",
        root.to_string_lossy().as_ref(),
        "--folds",
        "3",
        "--mu",
        "1.0",
        "2.0",
    ]);
    assert!(out.status.success(), "partition failed, stderr={}", String::from_utf8_lossy(&out.stderr));

    let v: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout should be valid JSON");
    assert_eq!(v["train_rows"].as_u64(), Some(350));
    assert_eq!(v["mu_calc_rows"].as_u64(), Some(50));
    assert_eq!(v["test_folds"].as_array().map(|a| a.len()), Some(2));

    assert!(root.join("train/data/data.csv").exists());
    assert!(root.join("train/settings/data.json").exists());
    assert!(root.join("test/data/data_mu_calc.csv").exists());
    assert!(root.join("test/labels/data_1.labels").exists());

    let fold_settings: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(root.join("test/settings/data_1.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(fold_settings["ground_truth_mu"].as_f64(), Some(2.0));

    // Every reweighted block carries the full dataset's total weight (mu = 1).
    let total: f64 = (0..500).map(|i| (1 + i % 4) as f64).sum();
    let train = sum_weights(root.join("train/weights/data.weights"));
    let cal = sum_weights(root.join("test/weights/data_mu_calc.weights"));
    let fold0 = sum_weights(root.join("test/weights/data_0.weights"));
    assert!((train - total).abs() < 1e-6 * total, "train total {}", train);
    assert!((cal - total).abs() < 1e-6 * total, "calibration total {}", cal);
    assert!((fold0 - total).abs() < 1e-6 * total, "fold 0 total {}", fold0);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn partition_rejects_wrong_mu_count() {
    let dir = tmp_dir("bad_mu");
    let (data, labels, _) = write_dataset(&dir);
    let out = run(&[
        "partition",
        "--data",
        data.to_string_lossy().as_ref(),
        "--labels",
        labels.to_string_lossy().as_ref(),
        "--output-dir",
        dir.join("out").to_string_lossy().as_ref(),
        "--folds",
        "3",
        "--mu",
        "1.5",
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("mu"));
    std::fs::remove_dir_all(&dir).unwrap();
}
