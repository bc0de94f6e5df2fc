use std::{fs, path::PathBuf};

use tempfile::tempdir;

use schemata_cli::{Args, run};

/// Collects all .toml scenario files from a directory
fn collect_scenarios(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("toml")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

/// Scenarios live at the workspace root, not in the crate
fn scenarios_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("scenarios")
}

fn run_scenario(name: &str, output: &std::path::Path) -> String {
    let args = Args {
        input: scenarios_dir().join(name).to_string_lossy().to_string(),
        output: output.to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
    };
    run(&args).unwrap_or_else(|err| panic!("{name} failed: {err}"));
    fs::read_to_string(output).expect("report written")
}

#[test]
fn e2e_smoke_test_scenarios() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let scenarios = collect_scenarios(scenarios_dir());
    assert!(!scenarios.is_empty(), "No scenarios found in scenarios/");

    let mut failed = Vec::new();

    for path in &scenarios {
        let output_filename = format!("{}.txt", path.file_stem().unwrap().to_string_lossy());
        let output_path = temp_dir.path().join(output_filename);

        let args = Args {
            input: path.to_string_lossy().to_string(),
            output: output_path.to_string_lossy().to_string(),
            config: None,
            log_level: "off".to_string(),
        };

        match run(&args) {
            Ok(()) => {
                let report = fs::read_to_string(&output_path).unwrap_or_default();
                if report.is_empty() {
                    failed.push((path.clone(), "empty report".to_string()));
                }
            }
            Err(e) => failed.push((path.clone(), e.to_string())),
        }
    }

    if !failed.is_empty() {
        eprintln!("\nScenarios that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} scenario(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_paste_copies_are_numbered() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let report = run_scenario("paste_copies.toml", &temp_dir.path().join("paste.txt"));

    assert!(report.contains("table orders ()"));
    assert!(report.contains("table orders_copy ()"));
    assert!(report.contains("table orders_copy_1 ()"));
    assert!(report.contains("  Pasted 1 figure(s)"));
}

#[test]
fn e2e_undo_restores_connection() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let report = run_scenario("shop_connections.toml", &temp_dir.path().join("shop.txt"));

    assert!(report.contains("connection "));
    assert!(report.contains("  Undo Delete"));
}

#[test]
fn e2e_cascade_keeps_declined_routines() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let report = run_scenario("catalog_cascade.toml", &temp_dir.path().join("cascade.txt"));

    let (catalog, status) = report.split_once("status\n").expect("status section");
    assert!(catalog.contains("routine charge"));
    assert!(!catalog.contains("routine group billing"));
    assert!(!catalog.contains("customers"));
    assert!(!catalog.contains("orders_customer_fk"));
    assert!(status.contains("Deleted table customers"));
}

#[test]
fn e2e_missing_scenario_is_io_error() {
    let temp_dir = tempdir().expect("Failed to create temp directory");
    let args = Args {
        input: temp_dir.path().join("missing.toml").to_string_lossy().to_string(),
        output: temp_dir.path().join("out.txt").to_string_lossy().to_string(),
        config: None,
        log_level: "off".to_string(),
    };

    let err = run(&args).unwrap_err();
    assert_eq!(err.code(), "S006");
}
