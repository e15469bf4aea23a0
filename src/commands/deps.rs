use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};

use shipwright::recipe::{self, RepositoryManifest};
use shipwright::seed::{PinSet, SeedEnvironment};
use shipwright::{config, io};

use super::CmdResult;

#[derive(Args)]
pub struct DepsArgs {
    #[command(subcommand)]
    command: DepsCommand,
}

#[derive(Subcommand)]
enum DepsCommand {
    /// Extract runtime dependencies from a recipe into an environment definition
    Extract {
        /// Distribution name (e.g. "core", "staging")
        #[arg(long)]
        distro: String,

        /// Release version tag (e.g. 2025.8.0)
        #[arg(long)]
        version_tag: String,

        /// Path to the repository manifest YAML
        #[arg(long, value_name = "PATH")]
        repositories: PathBuf,

        /// Path to the recipe template (defaults to the configured path)
        #[arg(long, value_name = "PATH")]
        recipe: Option<PathBuf>,

        /// Seed environment (local path or URL) for placeholder pins
        #[arg(long, value_name = "SOURCE")]
        seed: Option<String>,

        /// Output path for the environment definition
        #[arg(long, value_name = "PATH", default_value = "environment.yml")]
        output: PathBuf,

        /// Output path for the source-repo URL list
        #[arg(long, value_name = "PATH", default_value = "repo-urls.txt")]
        repo_urls: PathBuf,
    },
}

#[derive(Serialize)]
pub struct DepsExtractOutput {
    command: String,
    distro: String,
    version_tag: String,
    channel_version: String,
    environment_file: String,
    repo_urls_file: String,
    dependency_count: usize,
    managed: Vec<String>,
    repo_urls: Vec<String>,
    seed_pins: usize,
}

pub fn run(args: DepsArgs, _global: &super::GlobalArgs) -> CmdResult<DepsExtractOutput> {
    match args.command {
        DepsCommand::Extract {
            distro,
            version_tag,
            repositories,
            recipe: recipe_arg,
            seed,
            output,
            repo_urls,
        } => {
            let defaults = config::load_defaults();

            let recipe_path =
                recipe_arg.unwrap_or_else(|| PathBuf::from(&defaults.recipe.path));
            if !recipe_path.exists() {
                return Err(shipwright::Error::recipe_not_found(
                    recipe_path.display().to_string(),
                ));
            }
            let content = io::read_file(&recipe_path, "read recipe")?;

            let manifest = RepositoryManifest::load(&repositories)?;

            let seed_env = seed.as_deref().map(SeedEnvironment::load).transpose()?;
            let seed_pins = seed_env.as_ref().map(|s| s.len()).unwrap_or(0);
            let pins = PinSet::new(seed_env, &defaults.recipe.static_pins);

            let extraction = recipe::extract(
                &content,
                &distro,
                &version_tag,
                &manifest,
                &pins,
                &defaults.recipe,
                &defaults.channel,
            )?;

            io::write_file(
                &output,
                &extraction.environment.to_yaml()?,
                "write environment definition",
            )?;
            write_repo_urls(&repo_urls, &extraction.repo_urls)?;

            shipwright::log_status!(
                "deps",
                "Extracted {} dependencies ({} managed) for {} {}",
                extraction.environment.dependencies.len(),
                extraction.managed.len(),
                distro,
                version_tag
            );

            Ok((
                DepsExtractOutput {
                    command: "deps.extract".to_string(),
                    channel_version: recipe::channel_version(&version_tag),
                    distro,
                    version_tag,
                    environment_file: output.display().to_string(),
                    repo_urls_file: repo_urls.display().to_string(),
                    dependency_count: extraction.environment.dependencies.len(),
                    managed: extraction.managed,
                    repo_urls: extraction.repo_urls,
                    seed_pins,
                },
                0,
            ))
        }
    }
}

fn write_repo_urls(path: &Path, urls: &[String]) -> shipwright::Result<()> {
    let mut content = urls.join("\n");
    content.push('\n');
    io::write_file(path, &content, "write repo URL list")
}
