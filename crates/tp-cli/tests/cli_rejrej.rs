use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tp_core::{Flavor, NdArray};
use tp_store::{schema, ArrayStore, Dataset};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tagperf"))
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

/// Smooth exponential discriminant planes; every cell is positive so all
/// rejections stay finite.
fn fill_planes(store: &mut ArrayStore, tagger: &str, falloffs: [f64; 3]) {
    let n = 16;
    let flavors = [Flavor::B, Flavor::C, Flavor::U];
    for (flavor, falloff) in flavors.into_iter().zip(falloffs) {
        let mut data = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                data.push(1000.0 * (-((i + j) as f64) / falloff).exp());
            }
        }
        store.insert(
            &schema::hist_path(flavor, "ctag", "all", tagger),
            Dataset::new(NdArray::new(vec![n, n], data).unwrap()),
        );
    }
}

fn write_input(path: &Path) {
    let mut store = ArrayStore::in_memory();
    fill_planes(&mut store, "gaia", [1.5, 8.0, 1.0]);
    fill_planes(&mut store, "jfc", [2.0, 6.0, 1.2]);
    store.save_to(path).unwrap();
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("missing artifact {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("artifact should be valid JSON")
}

#[test]
fn rejrej_writes_grid_and_ratio_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hists.json");
    let cache = dir.path().join("cache.json");
    let plots = dir.path().join("plots");
    write_input(&input);

    let out = run(&[
        "rejrej",
        input.to_string_lossy().as_ref(),
        "--cache",
        cache.to_string_lossy().as_ref(),
        "-o",
        plots.to_string_lossy().as_ref(),
    ]);
    assert!(
        out.status.success(),
        "rejrej should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    assert!(cache.exists(), "cache file should be written");

    for tagger in ["gaia", "jfc"] {
        let v = read_json(&plots.join(format!("rejrej-{tagger}.json")));
        assert_eq!(v["tagger"], tagger);
        assert_eq!(v["x_values"].as_array().unwrap().len(), 100);
        assert_eq!(v["y_values"].as_array().unwrap().len(), 100);
        assert_eq!(v["efficiency_grid"].as_array().unwrap().len(), 100);
    }

    // gaia sorts first, so it is the default ratio reference
    let ratio = read_json(&plots.join("rejrej-ratio-jfc.json"));
    assert_eq!(ratio["num_tagger"], "gaia");
    assert_eq!(ratio["denom_tagger"], "jfc");
}

#[test]
fn second_run_reuses_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hists.json");
    let cache = dir.path().join("cache.json");
    let plots = dir.path().join("plots");
    write_input(&input);

    let args = [
        "rejrej".to_string(),
        input.to_string_lossy().into_owned(),
        "--cache".to_string(),
        cache.to_string_lossy().into_owned(),
        "-o".to_string(),
        plots.to_string_lossy().into_owned(),
    ];
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let first = run(&args);
    assert!(first.status.success());
    let cached_bytes = std::fs::read(&cache).unwrap();

    let second = run(&args);
    assert!(
        second.status.success(),
        "cached rerun should succeed, stderr={}",
        String::from_utf8_lossy(&second.stderr)
    );
    assert_eq!(std::fs::read(&cache).unwrap(), cached_bytes, "cache must not be rewritten");
}

#[test]
fn tagger_subset_skips_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("hists.json");
    let cache = dir.path().join("cache.json");
    let plots = dir.path().join("plots");
    write_input(&input);

    let out = run(&[
        "rejrej",
        input.to_string_lossy().as_ref(),
        "--cache",
        cache.to_string_lossy().as_ref(),
        "-o",
        plots.to_string_lossy().as_ref(),
        "--taggers",
        "jfc",
    ]);
    assert!(out.status.success());
    assert!(plots.join("rejrej-jfc.json").exists());
    assert!(!plots.join("rejrej-gaia.json").exists());
}

#[test]
fn missing_input_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&[
        "rejrej",
        dir.path().join("nope.json").to_string_lossy().as_ref(),
        "--cache",
        dir.path().join("cache.json").to_string_lossy().as_ref(),
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("nope.json"), "error should name the input, got: {stderr}");
}
