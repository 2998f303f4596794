use std::fs;
use std::path::Path;

use cog_tools::generate::{self, GeneratorConfig, RunSummary};
use cog_tools::IdPolicy;
use tempfile::TempDir;

fn write_fixtures(dir: &TempDir, csv: &str, template: &str) -> (std::path::PathBuf, std::path::PathBuf) {
    let csv_path = dir.path().join("metadata_values.csv");
    fs::write(&csv_path, csv).unwrap();
    let template_path = dir.path().join("template_cog.xml");
    fs::write(&template_path, template).unwrap();
    (csv_path, template_path)
}

fn config(dir: &TempDir, csv: &Path, template: &Path) -> GeneratorConfig {
    GeneratorConfig {
        directory: dir.path().to_path_buf(),
        csv: csv.to_path_buf(),
        template: template.to_path_buf(),
        enrich: false,
        id_policy: IdPolicy::FileName,
        keep_going: false,
    }
}

#[test]
fn test_matched_raster_gets_sidecar_unmatched_is_skipped() {
    let dir = TempDir::new().unwrap();
    // Plain variant never opens the rasters, empty files are enough.
    fs::write(dir.path().join("a.tif"), b"").unwrap();
    fs::write(dir.path().join("b.tif"), b"").unwrap();

    let (csv, template) = write_fixtures(
        &dir,
        "fileIdentifier,title\na.tif,Scene A\n",
        "<meta><id>{{ fileIdentifier }}</id><title>{{ title }}</title></meta>",
    );

    let summary = generate::run(&config(&dir, &csv, &template)).unwrap();
    assert_eq!(
        summary,
        RunSummary {
            generated: 1,
            skipped: 1,
            failed: 0
        }
    );

    let sidecar = fs::read_to_string(dir.path().join("a.tif.xml")).unwrap();
    assert!(sidecar.contains("a.tif"));
    assert!(sidecar.contains("Scene A"));
    assert!(!dir.path().join("b.tif.xml").exists());
}

#[test]
fn test_rasters_in_subdirectories_are_found() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/c.tif"), b"").unwrap();

    let (csv, template) = write_fixtures(
        &dir,
        "fileIdentifier,title\nc.tif,Scene C\n",
        "<meta>{{ title }}</meta>",
    );

    let summary = generate::run(&config(&dir, &csv, &template)).unwrap();
    assert_eq!(summary.generated, 1);
    assert!(dir.path().join("nested/c.tif.xml").exists());
}

#[test]
fn test_stem_policy_matches_extensionless_identifiers() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("scene.tif"), b"").unwrap();

    let (csv, template) = write_fixtures(
        &dir,
        "fileIdentifier,title\nscene,Scene\n",
        "<meta>{{ fileIdentifier }}</meta>",
    );

    let mut cfg = config(&dir, &csv, &template);
    cfg.id_policy = IdPolicy::Stem;

    let summary = generate::run(&cfg).unwrap();
    assert_eq!(summary.generated, 1);

    let sidecar = fs::read_to_string(dir.path().join("scene.xml")).unwrap();
    assert!(sidecar.contains("scene"));
}

#[test]
fn test_rerun_overwrites_existing_sidecar() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.tif"), b"").unwrap();
    fs::write(dir.path().join("a.tif.xml"), "stale").unwrap();

    let (csv, template) = write_fixtures(
        &dir,
        "fileIdentifier,title\na.tif,Fresh\n",
        "<meta>{{ title }}</meta>",
    );

    generate::run(&config(&dir, &csv, &template)).unwrap();
    let sidecar = fs::read_to_string(dir.path().join("a.tif.xml")).unwrap();
    assert_eq!(sidecar, "<meta>Fresh</meta>");
}

#[test]
fn test_enrich_aborts_on_unreadable_raster_by_default() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.tif"), b"not a tiff").unwrap();

    let (csv, template) = write_fixtures(
        &dir,
        "fileIdentifier,title\nbroken.tif,Broken\n",
        "<meta>{{ title }}</meta>",
    );

    let mut cfg = config(&dir, &csv, &template);
    cfg.enrich = true;

    assert!(generate::run(&cfg).is_err());
}

#[test]
fn test_enrich_with_keep_going_records_the_failure_and_continues() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("broken.tif"), b"not a tiff").unwrap();
    fs::write(dir.path().join("unmatched.tif"), b"").unwrap();

    let (csv, template) = write_fixtures(
        &dir,
        "fileIdentifier,title\nbroken.tif,Broken\n",
        "<meta>{{ title }}</meta>",
    );

    let mut cfg = config(&dir, &csv, &template);
    cfg.enrich = true;
    cfg.keep_going = true;

    let summary = generate::run(&cfg).unwrap();
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.generated, 0);
    assert!(!dir.path().join("broken.tif.xml").exists());
}

#[test]
fn test_missing_template_is_fatal() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.tif"), b"").unwrap();

    let csv_path = dir.path().join("metadata_values.csv");
    fs::write(&csv_path, "fileIdentifier\na.tif\n").unwrap();

    let cfg = config(&dir, &csv_path, &dir.path().join("missing_template.xml"));
    assert!(generate::run(&cfg).is_err());
}
