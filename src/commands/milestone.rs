use clap::{Args, Subcommand};
use serde::Serialize;

use shipwright::api::HostClient;
use shipwright::config;
use shipwright::milestone::{self, MilestoneAction, MilestoneOptions, MilestoneReport};

use super::CmdResult;

#[derive(Args)]
pub struct MilestoneArgs {
    #[command(subcommand)]
    command: MilestoneCommand,
}

#[derive(Args)]
struct SharedArgs {
    /// Milestone title
    #[arg(long)]
    title: String,

    /// Comma-separated list of repositories (owner/repo)
    #[arg(long, value_name = "SLUGS")]
    repos: String,

    /// Due date (format: YYYYMMDDhhmmss)
    #[arg(long)]
    due: Option<String>,

    /// Milestone description
    #[arg(long)]
    desc: Option<String>,

    /// Log the request without calling the API
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum MilestoneCommand {
    /// Create a milestone in each repository
    Create(SharedArgs),
    /// Edit an existing milestone, located by title
    Edit(SharedArgs),
    /// Close an existing milestone, located by title
    Close(SharedArgs),
}

#[derive(Serialize)]
pub struct MilestoneOutput {
    command: String,
    #[serde(flatten)]
    report: MilestoneReport,
}

pub fn run(args: MilestoneArgs, _global: &super::GlobalArgs) -> CmdResult<MilestoneOutput> {
    let (action, shared) = match args.command {
        MilestoneCommand::Create(shared) => (MilestoneAction::Create, shared),
        MilestoneCommand::Edit(shared) => (MilestoneAction::Edit, shared),
        MilestoneCommand::Close(shared) => (MilestoneAction::Close, shared),
    };

    let defaults = config::load_defaults();
    let client = HostClient::new(&defaults.hosting)?;

    // Writes need credentials; a dry run does not.
    if !shared.dry_run {
        client.require_token(&defaults.hosting.token_env)?;
    }

    let repos: Vec<String> = shared
        .repos
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if repos.is_empty() {
        return Err(shipwright::Error::validation_missing_argument(vec![
            "repos".to_string(),
        ]));
    }

    let options = MilestoneOptions {
        action,
        title: shared.title,
        due: shared.due,
        description: shared.desc,
        dry_run: shared.dry_run,
    };

    let report = milestone::run(&client, &repos, &options)?;

    Ok((
        MilestoneOutput {
            command: format!("milestone.{}", action.as_str()),
            report,
        },
        0,
    ))
}
