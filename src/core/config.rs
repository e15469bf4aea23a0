use serde::{Deserialize, Serialize};
use std::fs;

use crate::paths;

/// Root configuration structure for shipwright.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ShipwrightConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// All configurable defaults that can be overridden via shipwright.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_hosting")]
    pub hosting: HostingConfig,

    #[serde(default = "default_channel")]
    pub channel: ChannelConfig,

    #[serde(default = "default_recipe")]
    pub recipe: RecipeConfig,

    #[serde(default = "default_tags")]
    pub tags: TagsConfig,

    #[serde(default = "default_envfile")]
    pub envfile: EnvFileConfig,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            hosting: default_hosting(),
            channel: default_channel(),
            recipe: default_recipe(),
            tags: default_tags(),
            envfile: default_envfile(),
        }
    }
}

/// Hosting-platform API access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostingConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

/// Package channel layout for generated environment definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// URL template; `{channel_version}` and `{distro}` are expanded
    #[serde(default = "default_channel_template")]
    pub template: String,

    #[serde(default = "default_extra_channels")]
    pub extra_channels: Vec<String>,

    #[serde(default = "default_environment_name")]
    pub environment_name: String,
}

/// Recipe parsing and placeholder resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeConfig {
    #[serde(default = "default_recipe_path")]
    pub path: String,

    /// Placeholder whose value is the release epoch (expands to `==<tag>*`)
    #[serde(default = "default_epoch_placeholder")]
    pub epoch_placeholder: String,

    /// Package name prefixes considered part of the managed ecosystem
    #[serde(default = "default_managed_prefixes")]
    pub managed_prefixes: Vec<String>,

    /// CLI package appended to every environment when absent
    #[serde(default = "default_required_package")]
    pub required_package: String,

    /// Fallback pins for named placeholders when no seed environment is given
    #[serde(default = "default_static_pins")]
    pub static_pins: Vec<PinConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinConfig {
    pub name: String,
    pub version: String,
}

/// Tag retrieval and CI export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsConfig {
    /// Substring marking a development tag
    #[serde(default = "default_dev_marker")]
    pub dev_marker: String,

    /// Environment variable naming the CI env file to append exports to
    #[serde(default = "default_ci_env_var")]
    pub ci_env_var: String,

    #[serde(default = "default_dev_export_key")]
    pub dev_export_key: String,

    #[serde(default = "default_stable_export_key")]
    pub stable_export_key: String,
}

/// Environment-file naming and rollout behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvFileConfig {
    /// Fixed token separating plugin name from distribution in filenames
    #[serde(default = "default_suite")]
    pub suite: String,

    #[serde(default = "default_env_dir")]
    pub env_dir: String,

    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,

    /// When both exist for a plugin, the preferred distribution wins
    #[serde(default = "default_distro_preferences")]
    pub distro_preferences: Vec<DistroPreference>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistroPreference {
    pub preferred: String,
    pub fallback: String,
}

// =============================================================================
// Default value functions (match upstream pipeline behavior)
// =============================================================================

fn default_hosting() -> HostingConfig {
    HostingConfig {
        api_base: default_api_base(),
        token_env: default_token_env(),
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_channel() -> ChannelConfig {
    ChannelConfig {
        template: default_channel_template(),
        extra_channels: default_extra_channels(),
        environment_name: default_environment_name(),
    }
}

fn default_channel_template() -> String {
    "https://packages.qiime2.org/qiime2/{channel_version}/{distro}/passed/".to_string()
}

fn default_extra_channels() -> Vec<String> {
    vec![
        "conda-forge".to_string(),
        "bioconda".to_string(),
        "defaults".to_string(),
    ]
}

fn default_environment_name() -> String {
    "conda-env".to_string()
}

fn default_recipe() -> RecipeConfig {
    RecipeConfig {
        path: default_recipe_path(),
        epoch_placeholder: default_epoch_placeholder(),
        managed_prefixes: default_managed_prefixes(),
        required_package: default_required_package(),
        static_pins: default_static_pins(),
    }
}

fn default_recipe_path() -> String {
    "conda-recipe/meta.yaml".to_string()
}

fn default_epoch_placeholder() -> String {
    "qiime2_epoch".to_string()
}

fn default_managed_prefixes() -> Vec<String> {
    vec!["q2-".to_string(), "q2cli".to_string(), "qiime2".to_string()]
}

fn default_required_package() -> String {
    "q2cli".to_string()
}

fn default_static_pins() -> Vec<PinConfig> {
    vec![
        PinConfig {
            name: "bowtie2".to_string(),
            version: "2.5.1".to_string(),
        },
        PinConfig {
            name: "pysam".to_string(),
            version: "0.22.1".to_string(),
        },
        PinConfig {
            name: "spades".to_string(),
            version: "4.0.0".to_string(),
        },
    ]
}

fn default_tags() -> TagsConfig {
    TagsConfig {
        dev_marker: default_dev_marker(),
        ci_env_var: default_ci_env_var(),
        dev_export_key: default_dev_export_key(),
        stable_export_key: default_stable_export_key(),
    }
}

fn default_dev_marker() -> String {
    "dev0".to_string()
}

fn default_ci_env_var() -> String {
    "GITHUB_ENV".to_string()
}

fn default_dev_export_key() -> String {
    "LATEST_DEV_TAG".to_string()
}

fn default_stable_export_key() -> String {
    "LATEST_STABLE_TAG".to_string()
}

fn default_envfile() -> EnvFileConfig {
    EnvFileConfig {
        suite: default_suite(),
        env_dir: default_env_dir(),
        branch_prefix: default_branch_prefix(),
        distro_preferences: default_distro_preferences(),
    }
}

fn default_suite() -> String {
    "qiime2".to_string()
}

fn default_env_dir() -> String {
    "environment-files".to_string()
}

fn default_branch_prefix() -> String {
    "env-file-".to_string()
}

fn default_distro_preferences() -> Vec<DistroPreference> {
    vec![DistroPreference {
        preferred: "moshpit".to_string(),
        fallback: "metagenome".to_string(),
    }]
}

// =============================================================================
// Loading functions
// =============================================================================

/// Load defaults, merging file config with built-in defaults.
/// If shipwright.json is missing or invalid, silently returns built-in defaults.
pub fn load_defaults() -> Defaults {
    load_config().defaults
}

/// Load the full shipwright.json config, falling back to defaults on any error.
pub fn load_config() -> ShipwrightConfig {
    load_config_from_file().unwrap_or_default()
}

fn load_config_from_file() -> crate::Result<ShipwrightConfig> {
    let path = paths::shipwright_json()?;

    if !path.exists() {
        return Err(crate::Error::internal_unexpected("shipwright.json not found"));
    }

    let content = fs::read_to_string(&path).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("read {}", path.display())))
    })?;

    let config: ShipwrightConfig = serde_json::from_str(&content).map_err(|e| {
        crate::Error::validation_invalid_json(e, Some("parse shipwright.json".to_string()))
    })?;

    Ok(config)
}

/// Save config to shipwright.json file (creates if missing).
pub fn save_config(config: &ShipwrightConfig) -> crate::Result<()> {
    let path = paths::shipwright_json()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("create {}", parent.display())))
        })?;
    }

    let content = serde_json::to_string_pretty(config).map_err(|e| {
        crate::Error::internal_json(e.to_string(), Some("serialize shipwright.json".to_string()))
    })?;

    fs::write(&path, content).map_err(|e| {
        crate::Error::internal_io(e.to_string(), Some(format!("write {}", path.display())))
    })?;

    Ok(())
}

/// Check if shipwright.json file exists
pub fn config_exists() -> bool {
    paths::shipwright_json()
        .map(|p| p.exists())
        .unwrap_or(false)
}

/// Delete shipwright.json file (reset to defaults)
pub fn reset_config() -> crate::Result<bool> {
    let path = paths::shipwright_json()?;

    if path.exists() {
        fs::remove_file(&path).map_err(|e| {
            crate::Error::internal_io(e.to_string(), Some(format!("delete {}", path.display())))
        })?;
        Ok(true)
    } else {
        Ok(false)
    }
}

/// Get the path to shipwright.json (for display purposes)
pub fn config_path() -> crate::Result<String> {
    Ok(paths::shipwright_json()?.display().to_string())
}

/// Get built-in defaults (ignoring any file config)
pub fn builtin_defaults() -> Defaults {
    Defaults::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults_match_pipeline_constants() {
        let d = builtin_defaults();
        assert_eq!(d.hosting.api_base, "https://api.github.com");
        assert_eq!(d.tags.dev_marker, "dev0");
        assert_eq!(d.envfile.branch_prefix, "env-file-");
        assert!(d.channel.template.contains("{channel_version}"));
        assert!(d.channel.template.contains("{distro}"));
    }

    #[test]
    fn partial_config_fills_remaining_defaults() {
        let json = r#"{ "defaults": { "envfile": { "suite": "acme" } } }"#;
        let config: ShipwrightConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.defaults.envfile.suite, "acme");
        assert_eq!(config.defaults.envfile.env_dir, "environment-files");
        assert_eq!(config.defaults.tags.dev_marker, "dev0");
    }
}
