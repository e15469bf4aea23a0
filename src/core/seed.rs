//! Seed-environment loading and pin resolution.
//!
//! A seed environment is an upstream-published environment definition that pins
//! dependency versions for a release. Named recipe placeholders resolve against
//! these pins first, then against the configured static pins.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::config::PinConfig;
use crate::error::{Error, Result};
use crate::utils::io;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name -> version pins parsed from a seed environment definition.
#[derive(Debug, Clone, Default)]
pub struct SeedEnvironment {
    pins: HashMap<String, String>,
}

impl SeedEnvironment {
    /// Load a seed environment from a local path or an HTTP(S) URL.
    pub fn load(source: &str) -> Result<Self> {
        let content = if source.starts_with("http://") || source.starts_with("https://") {
            fetch(source)?
        } else {
            let path = Path::new(source);
            if !path.exists() {
                return Err(Error::seed_not_found(source));
            }
            io::read_file(path, "read seed environment")?
        };

        Self::parse(&content)
    }

    /// Parse pins from the `dependencies` list of an environment definition.
    ///
    /// String entries of the form `name==version`, `name=version`, or
    /// `name==version=build` contribute a pin; bare names and nested maps
    /// (e.g. `pip:` sub-lists) are ignored. First occurrence wins.
    pub fn parse(content: &str) -> Result<Self> {
        let doc: serde_yml::Value = serde_yml::from_str(content)
            .map_err(|e| Error::validation_invalid_yaml("parse seed environment", e))?;

        let mut pins = HashMap::new();

        if let Some(deps) = doc.get("dependencies").and_then(|d| d.as_sequence()) {
            for entry in deps {
                let Some(spec) = entry.as_str() else {
                    continue;
                };
                if let Some((name, version)) = split_pin(spec) {
                    pins.entry(name.to_string()).or_insert_with(|| version.to_string());
                }
            }
        }

        Ok(Self { pins })
    }

    pub fn pin(&self, name: &str) -> Option<&str> {
        self.pins.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

/// Split a dependency spec into (name, version), dropping any build string.
fn split_pin(spec: &str) -> Option<(&str, &str)> {
    let spec = spec.trim();
    let (name, rest) = match spec.split_once("==") {
        Some(parts) => parts,
        None => spec.split_once('=')?,
    };

    let name = name.trim();
    let version = rest.split('=').next().unwrap_or("").trim();
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name, version))
}

fn fetch(url: &str) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("shipwright/{}", VERSION))
        .timeout(Duration::from_secs(10))
        .build()
        .map_err(|e| Error::internal_io(e.to_string(), Some("create HTTP client".to_string())))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| Error::api_request_failed(format!("GET {}", url), e))?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|e| Error::api_request_failed(format!("read body from {}", url), e))?;

    if !status.is_success() {
        return Err(Error::api_error_status(status.as_u16(), body, url));
    }

    Ok(body)
}

/// Pin lookup combining a seed environment with configured static pins.
/// Seed pins take precedence.
#[derive(Debug, Clone, Default)]
pub struct PinSet {
    seed: Option<SeedEnvironment>,
    static_pins: HashMap<String, String>,
}

impl PinSet {
    pub fn new(seed: Option<SeedEnvironment>, static_pins: &[PinConfig]) -> Self {
        Self {
            seed,
            static_pins: static_pins
                .iter()
                .map(|p| (p.name.clone(), p.version.clone()))
                .collect(),
        }
    }

    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.seed
            .as_ref()
            .and_then(|s| s.pin(name))
            .or_else(|| self.static_pins.get(name).map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "\
name: seed-env
channels:
  - conda-forge
dependencies:
  - python=3.10
  - bowtie2==2.5.4
  - samtools==1.20=h50ea8bc_1
  - pip
  - pip:
      - some-wheel==1.0
";

    #[test]
    fn parse_collects_string_pins() {
        let seed = SeedEnvironment::parse(SEED).unwrap();
        assert_eq!(seed.pin("python"), Some("3.10"));
        assert_eq!(seed.pin("bowtie2"), Some("2.5.4"));
    }

    #[test]
    fn parse_drops_build_strings() {
        let seed = SeedEnvironment::parse(SEED).unwrap();
        assert_eq!(seed.pin("samtools"), Some("1.20"));
    }

    #[test]
    fn parse_ignores_bare_names_and_maps() {
        let seed = SeedEnvironment::parse(SEED).unwrap();
        assert_eq!(seed.pin("pip"), None);
        assert_eq!(seed.pin("some-wheel"), None);
        assert_eq!(seed.len(), 3);
    }

    #[test]
    fn first_occurrence_wins() {
        let seed = SeedEnvironment::parse(
            "dependencies:\n  - tool==1.0\n  - tool==2.0\n",
        )
        .unwrap();
        assert_eq!(seed.pin("tool"), Some("1.0"));
    }

    #[test]
    fn pinset_prefers_seed_over_static() {
        let seed = SeedEnvironment::parse("dependencies:\n  - bowtie2==2.5.4\n").unwrap();
        let pins = PinSet::new(
            Some(seed),
            &[
                PinConfig {
                    name: "bowtie2".to_string(),
                    version: "2.5.1".to_string(),
                },
                PinConfig {
                    name: "spades".to_string(),
                    version: "4.0.0".to_string(),
                },
            ],
        );
        assert_eq!(pins.resolve("bowtie2"), Some("2.5.4"));
        assert_eq!(pins.resolve("spades"), Some("4.0.0"));
        assert_eq!(pins.resolve("unknown"), None);
    }
}
