use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Run the binary with its config directory pointed inside `home`.
fn fapiao(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("fapiao").unwrap();
    cmd.env("HOME", home).env("XDG_CONFIG_HOME", home.join("config"));
    cmd
}

#[test]
fn config_path_reports_missing_file() {
    let home = TempDir::new().unwrap();

    fapiao(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file"))
        .stdout(predicate::str::contains("fapiao config init"));
}

#[test]
fn config_init_then_get_and_set() {
    let home = TempDir::new().unwrap();

    fapiao(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));

    fapiao(home.path())
        .args(["config", "get", "ocr.language"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"chi_sim\""));

    fapiao(home.path())
        .args(["config", "set", "extraction.strategy", "whole_text"])
        .assert()
        .success();

    fapiao(home.path())
        .args(["config", "get", "extraction.strategy"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"whole_text\""));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let home = TempDir::new().unwrap();

    fapiao(home.path()).args(["config", "init"]).assert().success();
    fapiao(home.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn config_set_rejects_ill_typed_value() {
    let home = TempDir::new().unwrap();

    fapiao(home.path())
        .args(["config", "set", "qr.timeout_ms", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value for qr.timeout_ms"));
}

#[test]
fn batch_without_matches_fails() {
    let home = TempDir::new().unwrap();
    let pattern = format!("{}/*.png", home.path().display());

    fapiao(home.path())
        .args(["batch", &pattern])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn batch_unreadable_entry_does_not_abort_reading() {
    let home = TempDir::new().unwrap();
    let scans = home.path().join("scans");
    std::fs::create_dir(&scans).unwrap();
    image::GrayImage::from_pixel(32, 32, image::Luma([255u8]))
        .save(scans.join("a.png"))
        .unwrap();
    std::fs::create_dir(scans.join("b.png")).unwrap();
    let models = home.path().join("models");
    std::fs::create_dir(&models).unwrap();

    let pattern = format!("{}/*.png", scans.display());
    fapiao(home.path())
        .arg("batch")
        .arg(&pattern)
        .arg("--data-path")
        .arg(&models)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Found 2 files"))
        .stderr(predicate::str::contains("Failed to load OCR engine"))
        .stderr(predicate::str::contains("Error: Is a directory").not());
}

#[test]
fn process_missing_input_fails() {
    let home = TempDir::new().unwrap();

    fapiao(home.path())
        .current_dir(home.path())
        .args(["process", "missing.png"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_without_models_reports_engine_error() {
    let home = TempDir::new().unwrap();
    let models = home.path().join("models");
    std::fs::create_dir(&models).unwrap();

    let input = home.path().join("scan.png");
    image::GrayImage::from_pixel(32, 32, image::Luma([255u8]))
        .save(&input)
        .unwrap();

    fapiao(home.path())
        .arg("process")
        .arg(&input)
        .arg("--data-path")
        .arg(&models)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load OCR engine"));
}
