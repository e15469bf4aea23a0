use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use shipwright::api::HostClient;
use shipwright::tags::{self, TagSummary};
use shipwright::{config, Error};

use super::CmdResult;

#[derive(Args)]
pub struct TagsArgs {
    #[command(subcommand)]
    command: TagsCommand,
}

#[derive(Subcommand)]
enum TagsCommand {
    /// Fetch the latest development and stable tags for a repository
    Latest {
        /// Repository slug (owner/repo)
        repo: String,

        /// Substring marking development tags (defaults to the configured marker)
        #[arg(long)]
        marker: Option<String>,

        /// Append KEY=value exports to the CI env file named by the
        /// configured environment variable
        #[arg(long)]
        export: bool,

        /// Append exports to this file instead (implies --export)
        #[arg(long, value_name = "PATH")]
        env_file: Option<PathBuf>,
    },
}

#[derive(Serialize)]
pub struct TagsLatestOutput {
    command: String,
    repo: String,
    marker: String,
    #[serde(flatten)]
    summary: TagSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    env_file: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    exported: Vec<String>,
}

pub fn run(args: TagsArgs, _global: &super::GlobalArgs) -> CmdResult<TagsLatestOutput> {
    match args.command {
        TagsCommand::Latest {
            repo,
            marker,
            export,
            env_file,
        } => {
            let defaults = config::load_defaults();
            let marker = marker.unwrap_or_else(|| defaults.tags.dev_marker.clone());

            let client = HostClient::new(&defaults.hosting)?;
            let all_tags = tags::fetch(&client, &repo)?;
            let summary = tags::split(&all_tags, &marker);

            if let Some(dev) = &summary.latest_dev {
                shipwright::log_status!("tags", "latest-dev-tag={}", dev);
            }
            if let Some(stable) = &summary.latest_stable {
                shipwright::log_status!("tags", "latest-stable-tag={}", stable);
            }

            let target = match env_file {
                Some(path) => Some(path),
                None if export => {
                    let var = &defaults.tags.ci_env_var;
                    let value = std::env::var(var).map_err(|_| {
                        Error::validation_invalid_argument(
                            "export",
                            format!("environment variable {} is not set", var),
                            None,
                        )
                        .with_hint("Pass --env-file to export outside of CI")
                    })?;
                    Some(PathBuf::from(value))
                }
                None => None,
            };

            let (env_file, exported) = match target {
                Some(path) => {
                    let exported = tags::export(&summary, &path, &defaults.tags)?;
                    (Some(path.display().to_string()), exported)
                }
                None => (None, Vec::new()),
            };

            Ok((
                TagsLatestOutput {
                    command: "tags.latest".to_string(),
                    repo,
                    marker,
                    summary,
                    env_file,
                    exported,
                },
                0,
            ))
        }
    }
}
