use clap::{Parser, Subcommand};

use commands::GlobalArgs;

mod commands;
mod output;
mod tty;

use commands::{config, deps, envfile, milestone, tags};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "shipwright")]
#[command(version = VERSION)]
#[command(about = "CLI for release-engineering automation across a plugin distribution ecosystem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract dependencies from a package recipe
    Deps(deps::DepsArgs),
    /// Fetch git tags from the hosting API
    Tags(tags::TagsArgs),
    /// Regenerate per-release environment files across repositories
    Envfile(envfile::EnvfileArgs),
    /// Manage hosting-platform milestones across repositories
    #[command(visible_alias = "milestones")]
    Milestone(milestone::MilestoneArgs),
    /// Manage global shipwright configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let global = GlobalArgs {};
    let (json_result, exit_code) = commands::run_json(cli.command, &global);

    output::print_json_result(json_result).ok();

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
