use clap::{Args, Subcommand};
use serde::Serialize;

use shipwright::config;
use shipwright::rollout::{self, RolloutOptions, RolloutReport};

use super::CmdResult;

#[derive(Args)]
pub struct EnvfileArgs {
    #[command(subcommand)]
    command: EnvfileCommand,
}

#[derive(Subcommand)]
enum EnvfileCommand {
    /// Generate next-release env files across repositories
    Update {
        /// Paths to one or more repositories (relative or absolute)
        #[arg(required = true)]
        repos: Vec<String>,

        /// New release token (e.g. 2025.8)
        #[arg(long)]
        new_release: String,

        /// Base branch to branch off of
        #[arg(long, default_value = "main")]
        base_branch: String,

        /// Push the created/updated branch to the primary remote
        #[arg(long)]
        push: bool,

        /// Use --force-with-lease when pushing the branch
        #[arg(long)]
        force_push: bool,

        /// Create a pull request (requires the 'gh' CLI)
        #[arg(long)]
        create_pr: bool,

        /// Override the PR target organization/owner
        #[arg(long, value_name = "ORG")]
        pr_org: Option<String>,
    },
}

#[derive(Serialize)]
pub struct EnvfileUpdateOutput {
    command: String,
    base_branch: String,
    push: bool,
    create_pr: bool,
    #[serde(flatten)]
    report: RolloutReport,
}

pub fn run(args: EnvfileArgs, _global: &super::GlobalArgs) -> CmdResult<EnvfileUpdateOutput> {
    match args.command {
        EnvfileCommand::Update {
            repos,
            new_release,
            base_branch,
            push,
            force_push,
            create_pr,
            pr_org,
        } => {
            let defaults = config::load_defaults();

            let options = RolloutOptions {
                new_release,
                base_branch: base_branch.clone(),
                push,
                force_push,
                create_pr,
                pr_org,
            };

            let report = rollout::run(&repos, &options, &defaults.envfile)?;

            Ok((
                EnvfileUpdateOutput {
                    command: "envfile.update".to_string(),
                    base_branch,
                    push,
                    create_pr,
                    report,
                },
                0,
            ))
        }
    }
}
