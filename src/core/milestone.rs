//! Hosting-platform milestone management across repositories.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::api::HostClient;
use crate::error::{Error, Result};
use crate::log_status;
use crate::utils::parser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneAction {
    Create,
    Edit,
    Close,
}

impl MilestoneAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneAction::Create => "create",
            MilestoneAction::Edit => "edit",
            MilestoneAction::Close => "close",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MilestoneOptions {
    pub action: MilestoneAction,
    pub title: String,
    pub due: Option<String>,
    pub description: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoResult {
    Applied,
    DryRun,
    NotFound,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneOutcome {
    pub repo: String,
    pub result: RepoResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MilestoneReport {
    pub action: MilestoneAction,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<String>,
    pub dry_run: bool,
    pub repos: Vec<MilestoneOutcome>,
}

/// Convert a `YYYYMMDDhhmmss` due date to RFC 3339 UTC.
pub fn convert_due_date(due: &str) -> Result<String> {
    let parsed = NaiveDateTime::parse_from_str(due, "%Y%m%d%H%M%S").map_err(|_| {
        Error::validation_invalid_argument(
            "due",
            format!(
                "'{}' must be in format YYYYMMDDhhmmss, e.g. 20250630123000",
                due
            ),
            Some(vec![due.to_string()]),
        )
    })?;

    Ok(parsed.format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

/// Apply the milestone action to every repo slug.
pub fn run(
    client: &HostClient,
    repo_slugs: &[String],
    options: &MilestoneOptions,
) -> Result<MilestoneReport> {
    let due_on = options.due.as_deref().map(convert_due_date).transpose()?;

    let mut repos = Vec::new();
    for slug in repo_slugs {
        let slug = slug.trim();
        if parser::split_slug(slug).is_none() {
            repos.push(MilestoneOutcome {
                repo: slug.to_string(),
                result: RepoResult::Failed,
                number: None,
                detail: Some("not an owner/repo slug".to_string()),
            });
            continue;
        }
        repos.push(apply(client, slug, options, due_on.as_deref()));
    }

    Ok(MilestoneReport {
        action: options.action,
        title: options.title.clone(),
        due_on,
        dry_run: options.dry_run,
        repos,
    })
}

fn apply(
    client: &HostClient,
    slug: &str,
    options: &MilestoneOptions,
    due_on: Option<&str>,
) -> MilestoneOutcome {
    let list_endpoint = format!("/repos/{}/milestones", slug);

    let (endpoint, method_is_patch, payload, number) = match options.action {
        MilestoneAction::Create => {
            let mut payload = Map::new();
            payload.insert("title".to_string(), json!(options.title));
            if let Some(due) = due_on {
                payload.insert("due_on".to_string(), json!(due));
            }
            if let Some(desc) = &options.description {
                payload.insert("description".to_string(), json!(desc));
            }
            (list_endpoint.clone(), false, Value::Object(payload), None)
        }
        MilestoneAction::Edit | MilestoneAction::Close => {
            let number = match find_by_title(client, &list_endpoint, &options.title) {
                Ok(Some(number)) => number,
                Ok(None) => {
                    log_status!(
                        "milestone",
                        "[{}] Milestone '{}' not found.",
                        slug,
                        options.title
                    );
                    return MilestoneOutcome {
                        repo: slug.to_string(),
                        result: RepoResult::NotFound,
                        number: None,
                        detail: Some(
                            Error::milestone_not_found(options.title.clone()).to_string(),
                        ),
                    };
                }
                Err(e) => {
                    return MilestoneOutcome {
                        repo: slug.to_string(),
                        result: RepoResult::Failed,
                        number: None,
                        detail: Some(e.to_string()),
                    };
                }
            };

            let mut payload = Map::new();
            if options.action == MilestoneAction::Edit {
                if let Some(due) = due_on {
                    payload.insert("due_on".to_string(), json!(due));
                }
                if let Some(desc) = &options.description {
                    payload.insert("description".to_string(), json!(desc));
                }
            } else {
                payload.insert("state".to_string(), json!("closed"));
            }

            (
                format!("{}/{}", list_endpoint, number),
                true,
                Value::Object(payload),
                Some(number),
            )
        }
    };

    if options.dry_run {
        log_status!(
            "milestone",
            "[DRY RUN] Would {} {} with {}",
            if method_is_patch { "PATCH" } else { "POST" },
            endpoint,
            payload
        );
        return MilestoneOutcome {
            repo: slug.to_string(),
            result: RepoResult::DryRun,
            number,
            detail: None,
        };
    }

    let response = if method_is_patch {
        client.patch(&endpoint, &payload)
    } else {
        client.post(&endpoint, &payload)
    };

    match response {
        Ok(value) => {
            let title = value
                .get("title")
                .and_then(|t| t.as_str())
                .unwrap_or(&options.title);
            let number = value.get("number").and_then(|n| n.as_u64()).or(number);
            log_status!("milestone", "[{}] Success: {}", slug, title);
            MilestoneOutcome {
                repo: slug.to_string(),
                result: RepoResult::Applied,
                number,
                detail: None,
            }
        }
        Err(e) => {
            log_status!("milestone", "[{}] Failed: {}", slug, e);
            MilestoneOutcome {
                repo: slug.to_string(),
                result: RepoResult::Failed,
                number,
                detail: Some(e.to_string()),
            }
        }
    }
}

/// Look up a milestone number by exact title.
fn find_by_title(client: &HostClient, endpoint: &str, title: &str) -> Result<Option<u64>> {
    let value = client.get(endpoint)?;
    let Some(milestones) = value.as_array() else {
        return Err(Error::internal_json(
            "milestone list is not an array",
            Some(endpoint.to_string()),
        ));
    };

    Ok(milestones
        .iter()
        .find(|m| m.get("title").and_then(|t| t.as_str()) == Some(title))
        .and_then(|m| m.get("number").and_then(|n| n.as_u64())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_date_converts_to_rfc3339() {
        assert_eq!(
            convert_due_date("20250630123000").unwrap(),
            "2025-06-30T12:30:00Z"
        );
    }

    #[test]
    fn due_date_rejects_malformed_input() {
        assert!(convert_due_date("2025-06-30").is_err());
        assert!(convert_due_date("20251340123000").is_err());
        assert!(convert_due_date("").is_err());
    }

    #[test]
    fn dry_run_create_touches_no_network() {
        let client = HostClient::new(&crate::config::builtin_defaults().hosting).unwrap();
        let options = MilestoneOptions {
            action: MilestoneAction::Create,
            title: "2025.8".to_string(),
            due: Some("20250630123000".to_string()),
            description: None,
            dry_run: true,
        };

        let report = run(
            &client,
            &["acme/widgets".to_string(), "bad-slug".to_string()],
            &options,
        )
        .unwrap();

        assert_eq!(report.due_on.as_deref(), Some("2025-06-30T12:30:00Z"));
        assert_eq!(report.repos[0].result, RepoResult::DryRun);
        assert_eq!(report.repos[1].result, RepoResult::Failed);
    }
}
