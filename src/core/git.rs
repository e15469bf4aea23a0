//! Git and `gh` primitives used by the rollout pipeline.

use std::path::Path;

use crate::error::{Error, Result};
use crate::utils::{command, parser};

/// Check whether a path is inside a git work tree.
pub fn is_git_repo(path: &Path) -> bool {
    command::succeeded_in(
        &path.to_string_lossy(),
        "git",
        &["rev-parse", "--is-inside-work-tree"],
    )
}

/// Check whether a local branch (or any ref) resolves.
pub fn branch_exists(repo: &Path, branch: &str) -> bool {
    command::succeeded_in(
        &repo.to_string_lossy(),
        "git",
        &["rev-parse", "--verify", branch],
    )
}

pub fn checkout(repo: &Path, reference: &str) -> Result<()> {
    command::run_in(
        &repo.to_string_lossy(),
        "git",
        &["checkout", reference],
        "git checkout",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

pub fn checkout_new_branch(repo: &Path, branch: &str) -> Result<()> {
    command::run_in(
        &repo.to_string_lossy(),
        "git",
        &["checkout", "-b", branch],
        "git checkout -b",
    )
    .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Fetch a refspec from a remote. Best-effort: missing refspecs are fine.
pub fn fetch_quiet(repo: &Path, remote: &str, refspec: &str) {
    let _ = command::run_in_optional(
        &repo.to_string_lossy(),
        "git",
        &["fetch", remote, refspec],
    );
}

/// Fast-forward pull. Best-effort: diverged or upstream-less branches are fine.
pub fn pull_ff_only_quiet(repo: &Path, remote: &str, branch: &str) {
    let _ = command::run_in_optional(
        &repo.to_string_lossy(),
        "git",
        &["pull", "--ff-only", remote, branch],
    );
}

pub fn push_upstream(repo: &Path, remote: &str, branch: &str, force: bool) -> Result<()> {
    let mut args = vec!["push"];
    if force {
        args.push("--force-with-lease");
    }
    args.extend(["-u", remote, branch]);

    command::run_in(&repo.to_string_lossy(), "git", &args, "git push")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Stage the given paths (relative to the repo root) and commit.
pub fn add_and_commit(repo: &Path, files: &[String], message: &str) -> Result<()> {
    let dir = repo.to_string_lossy();

    let mut add_args = vec!["add"];
    add_args.extend(files.iter().map(String::as_str));
    command::run_in(&dir, "git", &add_args, "git add")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;

    command::run_in(&dir, "git", &["commit", "-m", message], "git commit")
        .map_err(|e| Error::git_command_failed(e.to_string()))?;
    Ok(())
}

/// Pick the remote to operate against: `upstream` wins, then `origin`, then
/// the first listed remote. None when the repo has no remotes.
pub fn primary_remote(repo: &Path) -> Option<String> {
    let stdout = command::run_in_optional(&repo.to_string_lossy(), "git", &["remote"])?;
    let remotes: Vec<&str> = parser::lines(&stdout).map(str::trim).collect();

    if remotes.is_empty() {
        return None;
    }
    if remotes.contains(&"upstream") {
        return Some("upstream".to_string());
    }
    if remotes.contains(&"origin") {
        return Some("origin".to_string());
    }
    Some(remotes[0].to_string())
}

pub fn remote_url(repo: &Path, remote: &str) -> Option<String> {
    command::run_in_optional(
        &repo.to_string_lossy(),
        "git",
        &["config", &format!("remote.{}.url", remote)],
    )
}

/// Extract `owner/repo` from a hosting remote URL.
///
/// Supports `git@host:owner/repo.git`, `https://host/owner/repo.git`, and
/// `https://host/owner/repo`.
pub fn slug_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }

    let owner_repo = if let Some(rest) = url.strip_prefix("git@") {
        rest.split_once(':').map(|(_, path)| path)?
    } else if let Some(idx) = url.find("://") {
        let after_scheme = &url[idx + 3..];
        after_scheme.split_once('/').map(|(_, path)| path)?
    } else {
        return None;
    };

    let owner_repo = owner_repo.strip_suffix(".git").unwrap_or(owner_repo);
    let mut parts = owner_repo.split('/');
    let owner = parts.next()?;
    let repo = parts.next()?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }

    Some(format!("{}/{}", owner, repo))
}

/// Whether the `gh` CLI is available for PR creation.
pub fn gh_available() -> bool {
    command::available("gh")
}

/// Create a pull request via the `gh` CLI; returns the PR URL.
pub fn gh_create_pr(
    repo: &Path,
    target_slug: &str,
    base: &str,
    head: &str,
    title: &str,
    body: &str,
) -> Result<String> {
    let capture = command::capture_in(
        &repo.to_string_lossy(),
        "gh",
        &[
            "pr",
            "create",
            "--repo",
            target_slug,
            "--base",
            base,
            "--head",
            head,
            "--title",
            title,
            "--body",
            body,
        ],
        "gh pr create",
    )
    .map_err(|e| Error::pr_create_failed(target_slug, e.to_string()))?;

    if !capture.success {
        return Err(Error::pr_create_failed(target_slug, capture.error_text()));
    }

    // gh prints the PR URL as the last stdout line on success.
    capture
        .stdout
        .trim()
        .lines()
        .last()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .ok_or_else(|| Error::pr_create_failed(target_slug, "no URL in gh output"))
}
