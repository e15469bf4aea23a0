//! Version-control tag retrieval and CI export.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::HostClient;
use crate::config::TagsConfig;
use crate::error::{Error, Result};
use crate::utils::{io, parser};

#[derive(Debug, Clone, Deserialize)]
struct Tag {
    name: String,
}

/// Latest development and stable tags for a repository.
#[derive(Debug, Clone, Serialize)]
pub struct TagSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_dev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_stable: Option<String>,
    pub total: usize,
}

/// List tag names for `owner/repo`, newest first (API order).
pub fn fetch(client: &HostClient, slug: &str) -> Result<Vec<String>> {
    let (owner, repo) = parser::split_slug(slug).ok_or_else(|| {
        Error::validation_invalid_argument(
            "repo",
            format!("'{}' is not an owner/repo slug", slug),
            Some(vec![slug.to_string()]),
        )
    })?;

    let value = client.get(&format!("/repos/{}/{}/tags", owner, repo))?;
    let tags: Vec<Tag> = serde_json::from_value(value)
        .map_err(|e| Error::internal_json(e.to_string(), Some("parse tag list".to_string())))?;

    Ok(tags.into_iter().map(|t| t.name).collect())
}

/// Split tags into dev/stable by the configured marker and pick the latest of
/// each. API order is preserved, so "latest" is the first in each category.
pub fn split(tags: &[String], dev_marker: &str) -> TagSummary {
    let latest_dev = tags.iter().find(|t| t.contains(dev_marker)).cloned();
    let latest_stable = tags.iter().find(|t| !t.contains(dev_marker)).cloned();

    TagSummary {
        latest_dev,
        latest_stable,
        total: tags.len(),
    }
}

/// Append `KEY=value` lines for present tags to a CI environment file.
/// Returns the keys that were written.
pub fn export(summary: &TagSummary, path: &Path, config: &TagsConfig) -> Result<Vec<String>> {
    let mut exported = Vec::new();
    let mut lines = String::new();

    if let Some(dev) = &summary.latest_dev {
        lines.push_str(&format!("{}={}\n", config.dev_export_key, dev));
        exported.push(config.dev_export_key.clone());
    }
    if let Some(stable) = &summary.latest_stable {
        lines.push_str(&format!("{}={}\n", config.stable_export_key, stable));
        exported.push(config.stable_export_key.clone());
    }

    if !lines.is_empty() {
        io::append_file(path, &lines, "append CI env file")?;
    }

    Ok(exported)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builtin_defaults;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn split_picks_first_of_each_category() {
        let summary = split(
            &tags(&["2025.8.0.dev0", "2025.7.0", "2025.7.0.dev0", "2025.6.0"]),
            "dev0",
        );
        assert_eq!(summary.latest_dev.as_deref(), Some("2025.8.0.dev0"));
        assert_eq!(summary.latest_stable.as_deref(), Some("2025.7.0"));
        assert_eq!(summary.total, 4);
    }

    #[test]
    fn split_handles_missing_categories() {
        let summary = split(&tags(&["2025.7.0"]), "dev0");
        assert_eq!(summary.latest_dev, None);
        assert_eq!(summary.latest_stable.as_deref(), Some("2025.7.0"));

        let summary = split(&[], "dev0");
        assert_eq!(summary.latest_dev, None);
        assert_eq!(summary.latest_stable, None);
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn export_appends_only_present_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_env");

        let summary = TagSummary {
            latest_dev: None,
            latest_stable: Some("2025.7.0".to_string()),
            total: 1,
        };
        let exported = export(&summary, &path, &builtin_defaults().tags).unwrap();
        assert_eq!(exported, vec!["LATEST_STABLE_TAG".to_string()]);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "LATEST_STABLE_TAG=2025.7.0\n"
        );
    }

    #[test]
    fn export_writes_nothing_for_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_env");

        let summary = TagSummary {
            latest_dev: None,
            latest_stable: None,
            total: 0,
        };
        let exported = export(&summary, &path, &builtin_defaults().tags).unwrap();
        assert!(exported.is_empty());
        assert!(!path.exists());
    }
}
