//! Recipe dependency extraction.
//!
//! Reads the runtime dependency list out of a templated package recipe
//! (`meta.yaml`), resolves template placeholders against the release tag and
//! the pin set, and assembles the generated environment definition plus the
//! source-repository URL list for managed packages.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{ChannelConfig, RecipeConfig};
use crate::error::{Error, Result};
use crate::seed::PinSet;
use crate::utils::io;

/// Generated environment definition document.
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentDefinition {
    pub name: String,
    pub channels: Vec<String>,
    pub dependencies: Vec<String>,
}

impl EnvironmentDefinition {
    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self)
            .map_err(|e| Error::internal_unexpected(format!("serialize environment: {}", e)))
    }
}

/// Repository manifest mapping managed package names to their source repos.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryManifest {
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub url: String,
}

impl RepositoryManifest {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::manifest_not_found(path.display().to_string()));
        }
        let content = io::read_file(path, "read repository manifest")?;
        serde_yml::from_str(&content)
            .map_err(|e| Error::validation_invalid_yaml("parse repository manifest", e))
    }

    pub fn url_for(&self, name: &str) -> Option<&str> {
        self.repositories
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.url.as_str())
    }
}

/// Result of a full extraction run.
#[derive(Debug, Clone, Serialize)]
pub struct Extraction {
    pub environment: EnvironmentDefinition,
    /// Managed package names, recipe order
    pub managed: Vec<String>,
    /// `git+<url>.git` lines for managed packages present in the manifest
    pub repo_urls: Vec<String>,
}

/// Pull the runtime dependency specs out of recipe content.
///
/// Templated recipes are not always valid YAML, so this parses YAML first and
/// falls back to scanning the `run:` block line by line. Specs are normalized:
/// list markers and indentation stripped, empty lines dropped.
pub fn run_dependencies(content: &str) -> Vec<String> {
    if let Ok(doc) = serde_yml::from_str::<serde_yml::Value>(content) {
        if let Some(run) = doc
            .get("requirements")
            .and_then(|r| r.get("run"))
            .and_then(|r| r.as_sequence())
        {
            return run
                .iter()
                .filter_map(|d| d.as_str())
                .map(normalize_spec)
                .filter(|s| !s.is_empty())
                .collect();
        }
    }

    scan_run_block(content)
}

/// Line-scanner fallback for recipes that fail YAML parsing.
fn scan_run_block(content: &str) -> Vec<String> {
    let section_heading = Regex::new(r"^\s*[A-Za-z0-9_-]+:").expect("static regex");
    let run_heading = Regex::new(r"^\s*run:").expect("static regex");

    let mut deps = Vec::new();
    let mut inside_run = false;

    for line in content.lines() {
        if run_heading.is_match(line) {
            inside_run = true;
            continue;
        }

        if inside_run {
            let has_content = line.chars().any(|c| c.is_ascii_alphanumeric());
            if !has_content || section_heading.is_match(line) {
                break;
            }

            let spec = normalize_spec(line);
            if !spec.is_empty() {
                deps.push(spec);
            }
        }
    }

    deps
}

/// Strip the list marker and surrounding whitespace from a dependency line.
fn normalize_spec(line: &str) -> String {
    let trimmed = line.trim();
    trimmed.strip_prefix('-').unwrap_or(trimmed).trim().to_string()
}

/// Resolve `{{ name }}` placeholders in a dependency spec.
///
/// The epoch placeholder swallows everything after it and becomes
/// `==<version_tag>*`; other known placeholders become `==<pin>`. An unknown
/// placeholder is an error naming it.
pub fn substitute_placeholders(
    spec: &str,
    version_tag: &str,
    epoch_placeholder: &str,
    pins: &PinSet,
) -> Result<String> {
    let placeholder = Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("static regex");

    let mut result = spec.to_string();
    loop {
        let Some(caps) = placeholder.captures(&result) else {
            break;
        };
        let full = caps.get(0).expect("match exists");
        let name = caps.get(1).expect("group exists").as_str().to_string();

        if name == epoch_placeholder {
            // Everything from the placeholder on (trailing pins, build
            // expressions) collapses into the epoch constraint.
            let prefix = result[..full.start()].trim_end().to_string();
            result = format!("{}=={}*", prefix, version_tag);
            continue;
        }

        let Some(version) = pins.resolve(&name) else {
            return Err(Error::validation_invalid_argument(
                "recipe",
                format!("No pin available for placeholder '{}' in '{}'", name, spec),
                None,
            )
            .with_hint("Provide a seed environment with --seed or add a static pin to shipwright.json"));
        };

        let range = full.range();
        let prefix = result[..range.start].trim_end().to_string();
        let suffix = result[range.end..].to_string();
        result = format!("{}=={}{}", prefix, version, suffix);
    }

    Ok(result)
}

/// First token of a spec with any version constraint stripped.
pub fn package_name(spec: &str) -> &str {
    let token = spec.split_whitespace().next().unwrap_or("");
    token
        .split(['=', '<', '>', '!'])
        .next()
        .unwrap_or("")
}

/// Channel version is the first two dot-separated components of the tag
/// (e.g. 2025.8 from 2025.8.0). Shorter tags pass through unchanged.
pub fn channel_version(version_tag: &str) -> String {
    version_tag
        .split('.')
        .take(2)
        .collect::<Vec<_>>()
        .join(".")
}

/// Full extraction pipeline over recipe content.
pub fn extract(
    content: &str,
    distro: &str,
    version_tag: &str,
    manifest: &RepositoryManifest,
    pins: &PinSet,
    recipe_config: &RecipeConfig,
    channel_config: &ChannelConfig,
) -> Result<Extraction> {
    let mut dependencies = Vec::new();
    let mut managed = Vec::new();

    for spec in run_dependencies(content) {
        let resolved =
            substitute_placeholders(&spec, version_tag, &recipe_config.epoch_placeholder, pins)?;

        let name = package_name(&resolved);
        if recipe_config
            .managed_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
        {
            managed.push(name.to_string());
        }

        dependencies.push(resolved);
    }

    let required = &recipe_config.required_package;
    if !required.is_empty() && !dependencies.iter().any(|d| d.contains(required.as_str())) {
        dependencies.push(required.clone());
    }

    let channel = channel_config
        .template
        .replace("{channel_version}", &channel_version(version_tag))
        .replace("{distro}", distro);

    let mut channels = vec![channel];
    channels.extend(channel_config.extra_channels.iter().cloned());

    let repo_urls = managed
        .iter()
        .filter_map(|name| manifest.url_for(name))
        .map(|url| format!("git+{}.git", url))
        .collect();

    Ok(Extraction {
        environment: EnvironmentDefinition {
            name: channel_config.environment_name.clone(),
            channels,
            dependencies,
        },
        managed,
        repo_urls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PinConfig;
    use crate::seed::SeedEnvironment;

    fn pins() -> PinSet {
        PinSet::new(
            None,
            &[PinConfig {
                name: "bowtie2".to_string(),
                version: "2.5.1".to_string(),
            }],
        )
    }

    #[test]
    fn run_dependencies_parses_valid_yaml() {
        let recipe = "\
package:
  name: demo
requirements:
  run:
    - python
    - demo-core {{ demo_epoch }}
";
        let deps = run_dependencies(recipe);
        assert_eq!(deps, vec!["python", "demo-core {{ demo_epoch }}"]);
    }

    #[test]
    fn scanner_handles_templated_header() {
        // A templating directive up top makes the document invalid YAML.
        let recipe = "\
{% set version = \"1.0\" %}
package:
  name: demo
requirements:
  host:
    - pip
  run:
    - python
    - demo-core {{ demo_epoch }}
  build:
    - setuptools
";
        let deps = run_dependencies(recipe);
        assert_eq!(deps, vec!["python", "demo-core {{ demo_epoch }}"]);
    }

    #[test]
    fn scanner_stops_at_blank_line() {
        let recipe = "\
{% invalid %}
requirements:
  run:
    - python

    - unreachable
";
        assert_eq!(run_dependencies(recipe), vec!["python"]);
    }

    #[test]
    fn epoch_placeholder_swallows_trailing_constraint() {
        let result = substitute_placeholders(
            "demo-core {{ demo_epoch }} # comment",
            "2025.8.0",
            "demo_epoch",
            &pins(),
        )
        .unwrap();
        assert_eq!(result, "demo-core==2025.8.0*");
    }

    #[test]
    fn named_placeholder_resolves_to_pin() {
        let result =
            substitute_placeholders("bowtie2 {{ bowtie2 }}", "2025.8.0", "demo_epoch", &pins())
                .unwrap();
        assert_eq!(result, "bowtie2==2.5.1");
    }

    #[test]
    fn seed_pin_overrides_static_pin() {
        let seed = SeedEnvironment::parse("dependencies:\n  - bowtie2==2.5.4\n").unwrap();
        let pins = PinSet::new(
            Some(seed),
            &[PinConfig {
                name: "bowtie2".to_string(),
                version: "2.5.1".to_string(),
            }],
        );
        let result =
            substitute_placeholders("bowtie2 {{ bowtie2 }}", "2025.8.0", "demo_epoch", &pins)
                .unwrap();
        assert_eq!(result, "bowtie2==2.5.4");
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = substitute_placeholders("tool {{ mystery }}", "2025.8.0", "demo_epoch", &pins())
            .unwrap_err();
        assert!(err.message.contains("Invalid argument"));
    }

    #[test]
    fn package_name_strips_constraints() {
        assert_eq!(package_name("demo-core==2025.8.0*"), "demo-core");
        assert_eq!(package_name("python >=3.9"), "python");
        assert_eq!(package_name("plain"), "plain");
        assert_eq!(package_name(""), "");
    }

    #[test]
    fn channel_version_takes_two_components() {
        assert_eq!(channel_version("2025.8.0"), "2025.8");
        assert_eq!(channel_version("2025.8"), "2025.8");
        assert_eq!(channel_version("2025"), "2025");
    }
}
