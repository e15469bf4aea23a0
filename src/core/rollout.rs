//! Multi-repo environment-file rollout.
//!
//! For each target repository: discover the latest environment files, branch
//! off the base branch, write the next release's files, commit, and optionally
//! push and open a pull request. One repository's failure never aborts the
//! others; every repo reports an outcome.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::EnvFileConfig;
use crate::envfile::{self, EnvFileInfo};
use crate::error::{Error, Result};
use crate::git;
use crate::log_status;
use crate::utils::validation;

#[derive(Debug, Clone)]
pub struct RolloutOptions {
    pub new_release: String,
    pub base_branch: String,
    pub push: bool,
    pub force_push: bool,
    pub create_pr: bool,
    pub pr_org: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoStatus {
    Updated,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoOutcome {
    pub path: String,
    pub status: RepoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub created_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
}

impl RepoOutcome {
    fn skipped(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.display().to_string(),
            status: RepoStatus::Skipped,
            reason: Some(reason.into()),
            created_files: Vec::new(),
            branch: None,
            pr_url: None,
        }
    }

    fn failed(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.display().to_string(),
            status: RepoStatus::Failed,
            reason: Some(reason.into()),
            created_files: Vec::new(),
            branch: None,
            pr_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RolloutReport {
    pub new_release: String,
    pub branch: String,
    pub repos: Vec<RepoOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pr_urls: Vec<String>,
}

/// Run the rollout across all repository paths.
pub fn run(
    repo_paths: &[String],
    options: &RolloutOptions,
    config: &EnvFileConfig,
) -> Result<RolloutReport> {
    validation::require_release_token(&options.new_release)?;

    if options.create_pr && !git::gh_available() {
        return Err(Error::pr_create_failed(
            "-",
            "'gh' CLI not found on PATH",
        )
        .with_hint("Install the hosting CLI or drop --create-pr"));
    }

    let branch = format!("{}{}", config.branch_prefix, options.new_release);

    let mut repos = Vec::new();
    let mut pr_urls = Vec::new();

    for raw_path in repo_paths {
        let expanded = shellexpand::tilde(raw_path).to_string();
        let repo = match PathBuf::from(&expanded).canonicalize() {
            Ok(path) => path,
            Err(_) => {
                log_status!("rollout", "[SKIP] Not a directory: {}", raw_path);
                repos.push(RepoOutcome::skipped(Path::new(raw_path), "not a directory"));
                continue;
            }
        };

        let outcome = process_repo(&repo, &branch, options, config);
        if let Some(url) = &outcome.pr_url {
            pr_urls.push(url.clone());
        }
        repos.push(outcome);
    }

    if options.create_pr {
        if pr_urls.is_empty() {
            log_status!("rollout", "No PRs were created.");
        } else {
            log_status!("rollout", "Created {} PR(s):", pr_urls.len());
            for url in &pr_urls {
                log_status!("rollout", "  {}", url);
            }
        }
    }

    Ok(RolloutReport {
        new_release: options.new_release.clone(),
        branch,
        repos,
        pr_urls,
    })
}

fn process_repo(
    repo: &Path,
    branch: &str,
    options: &RolloutOptions,
    config: &EnvFileConfig,
) -> RepoOutcome {
    if !repo.is_dir() {
        log_status!("rollout", "[SKIP] Not a directory: {}", repo.display());
        return RepoOutcome::skipped(repo, "not a directory");
    }
    if !git::is_git_repo(repo) {
        log_status!("rollout", "[SKIP] Not a git repository: {}", repo.display());
        return RepoOutcome::skipped(repo, "not a git repository");
    }

    let env_dir = repo.join(&config.env_dir);
    if !env_dir.is_dir() {
        log_status!(
            "rollout",
            "[SKIP] Missing '{}/' in {}",
            config.env_dir,
            repo.display()
        );
        return RepoOutcome::skipped(repo, format!("missing '{}/' directory", config.env_dir));
    }

    let discovered = match envfile::discover(&env_dir, &config.suite) {
        Ok(infos) => infos,
        Err(e) => return RepoOutcome::failed(repo, e.to_string()),
    };
    let latest = envfile::select_latest(&discovered, &config.distro_preferences);
    if latest.is_empty() {
        log_status!("rollout", "[SKIP] No matching env files in {}", env_dir.display());
        return RepoOutcome::skipped(repo, "no matching env files");
    }

    // Plan before touching the work tree: existing destinations are skipped.
    let planned: Vec<&EnvFileInfo> = latest
        .iter()
        .filter(|info| {
            let destination =
                env_dir.join(info.filename_for(&config.suite, &options.new_release));
            if destination.exists() {
                log_status!(
                    "rollout",
                    "[SKIP] Destination env file already exists: {}",
                    destination.display()
                );
                false
            } else {
                true
            }
        })
        .collect();

    if planned.is_empty() {
        log_status!(
            "rollout",
            "[SKIP] All env files for release {} already exist in {}",
            options.new_release,
            env_dir.display()
        );
        return RepoOutcome::skipped(repo, "all env files already exist");
    }

    let Some(remote) = git::primary_remote(repo) else {
        return RepoOutcome::failed(repo, Error::git_no_remotes(repo.display().to_string()).to_string());
    };

    let repo_slug = git::remote_url(repo, &remote).and_then(|url| git::slug_from_url(&url));
    if options.create_pr && repo_slug.is_none() {
        return RepoOutcome::failed(repo, "remote URL is not a recognized hosting URL");
    }

    let fork_owner = repo_slug
        .as_deref()
        .and_then(|slug| slug.split_once('/'))
        .map(|(owner, _)| owner.to_string());
    let repo_name = repo_slug
        .as_deref()
        .and_then(|slug| slug.split_once('/'))
        .map(|(_, name)| name.to_string());

    let target_slug = match (&options.pr_org, &repo_name, &repo_slug) {
        (Some(org), Some(name), _) => Some(format!("{}/{}", org, name)),
        (Some(_), None, _) => {
            return RepoOutcome::failed(repo, "cannot determine repository name for --pr-org");
        }
        (None, _, slug) => slug.clone(),
    };

    let head_spec = match &fork_owner {
        Some(owner) => format!("{}:{}", owner, branch),
        None => branch.to_string(),
    };

    // Make sure the feature branch starts from an up-to-date base.
    git::fetch_quiet(repo, &remote, &options.base_branch);
    if let Err(e) = git::checkout(repo, &options.base_branch) {
        return RepoOutcome::failed(
            repo,
            format!("failed to checkout base branch '{}': {}", options.base_branch, e),
        );
    }
    git::pull_ff_only_quiet(repo, &remote, &options.base_branch);

    let outcome = update_on_branch(
        repo,
        branch,
        &planned,
        options,
        config,
        &remote,
        target_slug.as_deref(),
        &head_spec,
    );

    // Always land back on the base branch, even after a failure.
    match git::checkout(repo, &options.base_branch) {
        Ok(()) => log_status!(
            "rollout",
            "Switched back to base branch '{}' in {}",
            options.base_branch,
            repo.display()
        ),
        Err(e) => log_status!(
            "rollout",
            "Failed to switch back to base branch '{}' in {}: {}",
            options.base_branch,
            repo.display(),
            e
        ),
    }

    outcome
}

#[allow(clippy::too_many_arguments)]
fn update_on_branch(
    repo: &Path,
    branch: &str,
    planned: &[&EnvFileInfo],
    options: &RolloutOptions,
    config: &EnvFileConfig,
    remote: &str,
    target_slug: Option<&str>,
    head_spec: &str,
) -> RepoOutcome {
    if git::branch_exists(repo, branch) {
        log_status!(
            "rollout",
            "Branch '{}' already exists in {}; checking it out...",
            branch,
            repo.display()
        );
        if let Err(e) = git::checkout(repo, branch) {
            return RepoOutcome::failed(repo, format!("failed to checkout branch: {}", e));
        }
    } else {
        log_status!(
            "rollout",
            "Creating and checking out new branch '{}' in {}...",
            branch,
            repo.display()
        );
        if let Err(e) = git::checkout_new_branch(repo, branch) {
            return RepoOutcome::failed(repo, format!("failed to create branch: {}", e));
        }
    }

    let mut created = Vec::new();
    for info in planned {
        match envfile::write_next(info, config, &options.new_release) {
            Ok(path) => {
                log_status!("rollout", "Wrote new env file: {}", path.display());
                created.push(path);
            }
            Err(e) => log_status!("rollout", "[SKIP] {}", e),
        }
    }

    if created.is_empty() {
        log_status!("rollout", "[SKIP] No new env files were generated for {}", repo.display());
        return RepoOutcome::skipped(repo, "no new env files were generated");
    }

    let rel_files: Vec<String> = created
        .iter()
        .map(|path| {
            path.strip_prefix(repo)
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_else(|_| path.to_string_lossy().to_string())
        })
        .collect();

    let message = format!(
        "Add {} env file(s) for release {}",
        rel_files.len(),
        options.new_release
    );
    if let Err(e) = git::add_and_commit(repo, &rel_files, &message) {
        return RepoOutcome::failed(repo, format!("failed to commit: {}", e));
    }
    log_status!("rollout", "Committed {} with message: {}", rel_files.join(", "), message);

    if options.push || options.create_pr {
        if let Err(e) = git::push_upstream(repo, remote, branch, options.force_push) {
            return RepoOutcome::failed(repo, format!("failed to push branch: {}", e));
        }
        log_status!(
            "rollout",
            "Pushed{} branch '{}' to {} for {}",
            if options.force_push { " (force)" } else { "" },
            branch,
            remote,
            repo.display()
        );
    }

    let mut pr_url = None;
    if options.create_pr {
        let Some(slug) = target_slug else {
            return RepoOutcome::failed(repo, "no target repository slug for PR");
        };
        let title = format!("MAINT: add env file for release {}", options.new_release);
        let body = format!(
            "This PR adds a new environment file for release {}.\n\n\
             Generated from the latest env file in '{}/' by updating the release token.",
            options.new_release, config.env_dir
        );

        match git::gh_create_pr(repo, slug, &options.base_branch, head_spec, &title, &body) {
            Ok(url) => {
                log_status!("rollout", "Created PR: {}", url);
                pr_url = Some(url);
            }
            Err(e) => {
                log_status!("rollout", "Failed to create PR in {}: {}", repo.display(), e);
            }
        }
    }

    let created_names: Vec<String> = created
        .iter()
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .collect();
    log_status!(
        "rollout",
        "[OK] Updated {} -> [{}] on branch {}",
        repo.display(),
        created_names.join(", "),
        branch
    );

    RepoOutcome {
        path: repo.display().to_string(),
        status: RepoStatus::Updated,
        reason: None,
        created_files: rel_files,
        branch: Some(branch.to_string()),
        pr_url,
    }
}
