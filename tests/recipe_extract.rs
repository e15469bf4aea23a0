use std::fs;

use shipwright::config::{ChannelConfig, PinConfig, RecipeConfig};
use shipwright::recipe::{self, RepositoryManifest};
use shipwright::seed::{PinSet, SeedEnvironment};

const RECIPE: &str = r#"{% set name = "demo-pipeline" %}
package:
  name: demo-pipeline
  version: 2025.8.0

requirements:
  host:
    - pip
  run:
    - python >=3.9
    - demo-core {{ demo_epoch }}
    - demo-utils {{ demo_epoch }}
    - bowtie2 {{ bowtie2 }}
    - samtools

test:
  requires:
    - pytest
"#;

const MANIFEST: &str = r#"repositories:
  - name: demo-core
    url: https://example.com/demo/demo-core
  - name: demo-utils
    url: https://example.com/demo/demo-utils
  - name: unrelated
    url: https://example.com/demo/unrelated
"#;

fn recipe_config() -> RecipeConfig {
    RecipeConfig {
        path: "recipe/meta.yaml".to_string(),
        epoch_placeholder: "demo_epoch".to_string(),
        managed_prefixes: vec!["demo-".to_string()],
        required_package: "demo-cli".to_string(),
        static_pins: vec![PinConfig {
            name: "bowtie2".to_string(),
            version: "2.5.1".to_string(),
        }],
    }
}

fn channel_config() -> ChannelConfig {
    ChannelConfig {
        template: "https://packages.example.com/{channel_version}/{distro}/passed/".to_string(),
        extra_channels: vec!["conda-forge".to_string(), "defaults".to_string()],
        environment_name: "conda-env".to_string(),
    }
}

fn manifest() -> RepositoryManifest {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("repositories.yaml");
    fs::write(&path, MANIFEST).unwrap();
    RepositoryManifest::load(&path).unwrap()
}

#[test]
fn extracts_environment_and_repo_urls() {
    let extraction = recipe::extract(
        RECIPE,
        "staging",
        "2025.8.0",
        &manifest(),
        &PinSet::new(None, &recipe_config().static_pins),
        &recipe_config(),
        &channel_config(),
    )
    .unwrap();

    assert_eq!(
        extraction.environment.dependencies,
        vec![
            "python >=3.9",
            "demo-core==2025.8.0*",
            "demo-utils==2025.8.0*",
            "bowtie2==2.5.1",
            "samtools",
            "demo-cli",
        ]
    );

    assert_eq!(
        extraction.environment.channels,
        vec![
            "https://packages.example.com/2025.8/staging/passed/",
            "conda-forge",
            "defaults",
        ]
    );

    assert_eq!(extraction.managed, vec!["demo-core", "demo-utils"]);
    assert_eq!(
        extraction.repo_urls,
        vec![
            "git+https://example.com/demo/demo-core.git",
            "git+https://example.com/demo/demo-utils.git",
        ]
    );
}

#[test]
fn required_package_is_not_duplicated() {
    let recipe = "\
requirements:
  run:
    - demo-cli {{ demo_epoch }}
";
    let extraction = recipe::extract(
        recipe,
        "core",
        "2025.8.0",
        &manifest(),
        &PinSet::new(None, &[]),
        &recipe_config(),
        &channel_config(),
    )
    .unwrap();

    assert_eq!(extraction.environment.dependencies, vec!["demo-cli==2025.8.0*"]);
}

#[test]
fn seed_environment_overrides_static_pins() {
    let seed = SeedEnvironment::parse("dependencies:\n  - bowtie2==2.5.4\n").unwrap();
    let pins = PinSet::new(Some(seed), &recipe_config().static_pins);

    let extraction = recipe::extract(
        "requirements:\n  run:\n    - bowtie2 {{ bowtie2 }}\n",
        "core",
        "2025.8.0",
        &manifest(),
        &pins,
        &recipe_config(),
        &channel_config(),
    )
    .unwrap();

    assert!(extraction
        .environment
        .dependencies
        .contains(&"bowtie2==2.5.4".to_string()));
}

#[test]
fn unknown_placeholder_fails_extraction() {
    let result = recipe::extract(
        "requirements:\n  run:\n    - tool {{ mystery }}\n",
        "core",
        "2025.8.0",
        &manifest(),
        &PinSet::new(None, &[]),
        &recipe_config(),
        &channel_config(),
    );

    assert!(result.is_err());
}

#[test]
fn environment_serializes_in_field_order() {
    let extraction = recipe::extract(
        "requirements:\n  run:\n    - samtools\n",
        "core",
        "2025.8.0",
        &manifest(),
        &PinSet::new(None, &[]),
        &recipe_config(),
        &channel_config(),
    )
    .unwrap();

    let yaml = extraction.environment.to_yaml().unwrap();
    let name_pos = yaml.find("name:").unwrap();
    let channels_pos = yaml.find("channels:").unwrap();
    let deps_pos = yaml.find("dependencies:").unwrap();
    assert!(name_pos < channels_pos && channels_pos < deps_pos);
}
