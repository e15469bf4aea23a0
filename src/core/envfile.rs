//! Environment-file discovery and regeneration.
//!
//! Environment files are named `<plugin>-<suite>-<distribution>-<release>.yml`.
//! The plugin name may itself contain dashes; the suite token anchors the
//! split. Release tokens are `major.minor` and order numerically.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::{DistroPreference, EnvFileConfig};
use crate::error::{Error, Result};
use crate::utils::{io, parser};

pub const FILENAME_SUFFIX: &str = ".yml";

/// Numerically ordered `major.minor` release token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReleaseToken {
    pub major: u32,
    pub minor: u32,
}

impl FromStr for ReleaseToken {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        let (major, minor) = s.split_once('.').ok_or(())?;
        if major.is_empty() || minor.is_empty() {
            return Err(());
        }
        Ok(Self {
            major: major.parse().map_err(|_| ())?,
            minor: minor.parse().map_err(|_| ())?,
        })
    }
}

impl std::fmt::Display for ReleaseToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Parsed view of one environment file.
#[derive(Debug, Clone, Serialize)]
pub struct EnvFileInfo {
    pub path: PathBuf,
    pub plugin: String,
    pub distribution: String,
    pub release: String,
}

impl EnvFileInfo {
    pub fn release_token(&self) -> ReleaseToken {
        // Discovery only admits files whose release token parsed.
        self.release.parse().unwrap_or(ReleaseToken { major: 0, minor: 0 })
    }

    /// Filename this file would have at a different release.
    pub fn filename_for(&self, suite: &str, release: &str) -> String {
        format!(
            "{}-{}-{}-{}{}",
            self.plugin, suite, self.distribution, release, FILENAME_SUFFIX
        )
    }
}

/// Parse `<plugin>-<suite>-<distribution>-<release>.yml`; None when the name
/// doesn't fit the scheme or the release token is malformed.
pub fn parse_filename(path: &Path, suite: &str) -> Option<EnvFileInfo> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(FILENAME_SUFFIX)?;

    let anchor = format!("-{}-", suite);
    let (plugin, rest) = stem.split_once(&anchor)?;
    let (distribution, release) = rest.split_once('-')?;

    if plugin.is_empty() || distribution.is_empty() {
        return None;
    }
    release.parse::<ReleaseToken>().ok()?;

    Some(EnvFileInfo {
        path: path.to_path_buf(),
        plugin: plugin.to_string(),
        distribution: distribution.to_string(),
        release: release.to_string(),
    })
}

/// Glob the env directory for candidate files.
pub fn discover(env_dir: &Path, suite: &str) -> Result<Vec<EnvFileInfo>> {
    let pattern = env_dir
        .join(format!("*-{}-*-*{}", suite, FILENAME_SUFFIX))
        .to_string_lossy()
        .to_string();

    let paths = glob::glob(&pattern).map_err(|e| {
        Error::validation_invalid_argument("envDir", format!("Bad glob pattern: {}", e), None)
    })?;

    let mut infos: Vec<EnvFileInfo> = paths
        .filter_map(|entry| entry.ok())
        .filter_map(|path| parse_filename(&path, suite))
        .collect();

    infos.sort_by(|a, b| compare_infos(a, b));
    Ok(infos)
}

fn compare_infos(a: &EnvFileInfo, b: &EnvFileInfo) -> Ordering {
    a.plugin
        .cmp(&b.plugin)
        .then_with(|| a.distribution.cmp(&b.distribution))
        .then_with(|| a.release_token().cmp(&b.release_token()))
}

/// Keep the env files belonging to the most recent release, one per
/// `(plugin, distribution)`, applying distribution preference pairs: when both
/// the preferred and fallback distribution exist for a plugin, the fallback is
/// dropped. Result is deterministically ordered.
pub fn select_latest(
    infos: &[EnvFileInfo],
    preferences: &[DistroPreference],
) -> Vec<EnvFileInfo> {
    let mut latest: Option<ReleaseToken> = None;
    let mut group: BTreeMap<(String, String), EnvFileInfo> = BTreeMap::new();

    for info in infos {
        let token = info.release_token();
        match latest {
            Some(current) if token < current => continue,
            Some(current) if token == current => {
                group.insert((info.plugin.clone(), info.distribution.clone()), info.clone());
            }
            _ => {
                latest = Some(token);
                group.clear();
                group.insert((info.plugin.clone(), info.distribution.clone()), info.clone());
            }
        }
    }

    let mut selected: Vec<EnvFileInfo> = group
        .values()
        .filter(|info| {
            !preferences.iter().any(|pref| {
                info.distribution == pref.fallback
                    && group.contains_key(&(info.plugin.clone(), pref.preferred.clone()))
            })
        })
        .cloned()
        .collect();

    selected.sort_by(compare_infos);
    selected
}

/// Copy the latest file to the new release's filename, replacing every
/// occurrence of the old release token in the body. Refuses to overwrite.
pub fn write_next(latest: &EnvFileInfo, config: &EnvFileConfig, new_release: &str) -> Result<PathBuf> {
    let new_name = latest.filename_for(&config.suite, new_release);
    let new_path = latest
        .path
        .parent()
        .map(|p| p.join(&new_name))
        .unwrap_or_else(|| PathBuf::from(&new_name));

    if new_path.exists() {
        return Err(Error::validation_invalid_argument(
            "newRelease",
            format!("Destination env file already exists: {}", new_path.display()),
            None,
        ));
    }

    let content = io::read_file(&latest.path, "read env file")?;
    let (updated, _count) = parser::replace_token(&content, &latest.release, new_release);
    io::write_file(&new_path, &updated, "write env file")?;

    Ok(new_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Vec<DistroPreference> {
        vec![DistroPreference {
            preferred: "moshpit".to_string(),
            fallback: "metagenome".to_string(),
        }]
    }

    fn info(name: &str) -> EnvFileInfo {
        parse_filename(Path::new(name), "qiime2").unwrap()
    }

    #[test]
    fn parse_filename_splits_on_suite_anchor() {
        let info = info("q2-dwq2-qiime2-tiny-2025.7.yml");
        assert_eq!(info.plugin, "q2-dwq2");
        assert_eq!(info.distribution, "tiny");
        assert_eq!(info.release, "2025.7");
    }

    #[test]
    fn parse_filename_rejects_bad_release() {
        assert!(parse_filename(Path::new("p-qiime2-amplicon-notarelease.yml"), "qiime2").is_none());
        assert!(parse_filename(Path::new("p-qiime2-amplicon-2025.7.0.yml"), "qiime2").is_none());
        assert!(parse_filename(Path::new("p-amplicon-2025.7.yml"), "qiime2").is_none());
        assert!(parse_filename(Path::new("p-qiime2-2025.7.yml"), "qiime2").is_none());
    }

    #[test]
    fn release_tokens_order_numerically() {
        let a: ReleaseToken = "2025.9".parse().unwrap();
        let b: ReleaseToken = "2025.10".parse().unwrap();
        assert!(b > a);
    }

    #[test]
    fn select_latest_keeps_only_newest_release() {
        let infos = vec![
            info("alpha-qiime2-amplicon-2025.4.yml"),
            info("alpha-qiime2-amplicon-2025.7.yml"),
            info("beta-qiime2-amplicon-2025.7.yml"),
            info("beta-qiime2-amplicon-2024.10.yml"),
        ];
        let selected = select_latest(&infos, &prefs());
        let names: Vec<_> = selected
            .iter()
            .map(|i| (i.plugin.as_str(), i.release.as_str()))
            .collect();
        assert_eq!(names, vec![("alpha", "2025.7"), ("beta", "2025.7")]);
    }

    #[test]
    fn select_latest_prefers_configured_distribution() {
        let infos = vec![
            info("alpha-qiime2-moshpit-2025.7.yml"),
            info("alpha-qiime2-metagenome-2025.7.yml"),
            info("beta-qiime2-metagenome-2025.7.yml"),
        ];
        let selected = select_latest(&infos, &prefs());
        let pairs: Vec<_> = selected
            .iter()
            .map(|i| (i.plugin.as_str(), i.distribution.as_str()))
            .collect();
        // alpha keeps moshpit only; beta has no moshpit so metagenome stays
        assert_eq!(
            pairs,
            vec![("alpha", "moshpit"), ("beta", "metagenome")]
        );
    }

    #[test]
    fn filename_for_rewrites_release() {
        let info = info("q2-dwq2-qiime2-tiny-2025.7.yml");
        assert_eq!(
            info.filename_for("qiime2", "2025.8"),
            "q2-dwq2-qiime2-tiny-2025.8.yml"
        );
    }
}
