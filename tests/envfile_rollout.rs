use std::fs;
use std::path::Path;

use shipwright::config::{DistroPreference, EnvFileConfig};
use shipwright::envfile;

fn config() -> EnvFileConfig {
    EnvFileConfig {
        suite: "qiime2".to_string(),
        env_dir: "environment-files".to_string(),
        branch_prefix: "env-file-".to_string(),
        distro_preferences: vec![DistroPreference {
            preferred: "moshpit".to_string(),
            fallback: "metagenome".to_string(),
        }],
    }
}

fn write_env(dir: &Path, name: &str, release: &str) {
    let body = format!(
        "name: env-{release}\nchannels:\n  - https://packages.example.com/{release}/core/passed/\ndependencies:\n  - demo-core=={release}.0\n",
    );
    fs::write(dir.join(name), body).unwrap();
}

#[test]
fn discovery_ignores_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    write_env(dir.path(), "alpha-qiime2-amplicon-2025.7.yml", "2025.7");
    fs::write(dir.path().join("README.md"), "docs").unwrap();
    fs::write(dir.path().join("alpha-other-amplicon-2025.7.yml"), "x").unwrap();
    fs::write(dir.path().join("alpha-qiime2-amplicon-latest.yml"), "x").unwrap();

    let infos = envfile::discover(dir.path(), "qiime2").unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].plugin, "alpha");
    assert_eq!(infos[0].release, "2025.7");
}

#[test]
fn selection_spans_plugins_at_latest_release() {
    let dir = tempfile::tempdir().unwrap();
    write_env(dir.path(), "alpha-qiime2-amplicon-2025.4.yml", "2025.4");
    write_env(dir.path(), "alpha-qiime2-amplicon-2025.7.yml", "2025.7");
    write_env(dir.path(), "q2-beta-qiime2-moshpit-2025.7.yml", "2025.7");
    write_env(dir.path(), "q2-beta-qiime2-metagenome-2025.7.yml", "2025.7");

    let infos = envfile::discover(dir.path(), "qiime2").unwrap();
    let selected = envfile::select_latest(&infos, &config().distro_preferences);

    let picks: Vec<_> = selected
        .iter()
        .map(|i| (i.plugin.as_str(), i.distribution.as_str(), i.release.as_str()))
        .collect();
    assert_eq!(
        picks,
        vec![
            ("alpha", "amplicon", "2025.7"),
            ("q2-beta", "moshpit", "2025.7"),
        ]
    );
}

#[test]
fn numeric_release_ordering_wins() {
    let dir = tempfile::tempdir().unwrap();
    write_env(dir.path(), "alpha-qiime2-amplicon-2025.9.yml", "2025.9");
    write_env(dir.path(), "alpha-qiime2-amplicon-2025.10.yml", "2025.10");

    let infos = envfile::discover(dir.path(), "qiime2").unwrap();
    let selected = envfile::select_latest(&infos, &[]);
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].release, "2025.10");
}

#[test]
fn write_next_replaces_release_token_throughout() {
    let dir = tempfile::tempdir().unwrap();
    write_env(dir.path(), "alpha-qiime2-amplicon-2025.7.yml", "2025.7");

    let infos = envfile::discover(dir.path(), "qiime2").unwrap();
    let new_path = envfile::write_next(&infos[0], &config(), "2025.8").unwrap();

    assert_eq!(
        new_path.file_name().unwrap().to_str().unwrap(),
        "alpha-qiime2-amplicon-2025.8.yml"
    );

    let body = fs::read_to_string(&new_path).unwrap();
    assert!(body.contains("name: env-2025.8"));
    assert!(body.contains("https://packages.example.com/2025.8/core/passed/"));
    assert!(body.contains("demo-core==2025.8.0"));
    assert!(!body.contains("2025.7"));

    // The source file is untouched.
    let original = fs::read_to_string(dir.path().join("alpha-qiime2-amplicon-2025.7.yml")).unwrap();
    assert!(original.contains("2025.7"));
}

#[test]
fn write_next_refuses_existing_destination() {
    let dir = tempfile::tempdir().unwrap();
    write_env(dir.path(), "alpha-qiime2-amplicon-2025.7.yml", "2025.7");
    write_env(dir.path(), "alpha-qiime2-amplicon-2025.8.yml", "2025.8");

    let infos = envfile::discover(dir.path(), "qiime2").unwrap();
    let latest_07 = infos.iter().find(|i| i.release == "2025.7").unwrap();

    assert!(envfile::write_next(latest_07, &config(), "2025.8").is_err());
}
