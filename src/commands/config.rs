use clap::{Args, Subcommand};
use serde::Serialize;

use shipwright::config::{self, Defaults};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration (file overrides merged with defaults)
    Show,
    /// Print the config file path
    Path,
    /// Delete the config file, restoring built-in defaults
    Reset,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum ConfigOutput {
    Show(ConfigShowOutput),
    Path(ConfigPathOutput),
    Reset(ConfigResetOutput),
}

#[derive(Serialize)]
pub struct ConfigShowOutput {
    command: String,
    path: String,
    exists: bool,
    defaults: Defaults,
}

#[derive(Serialize)]
pub struct ConfigPathOutput {
    command: String,
    path: String,
    exists: bool,
}

#[derive(Serialize)]
pub struct ConfigResetOutput {
    command: String,
    path: String,
    removed: bool,
}

pub fn run(args: ConfigArgs, _global: &super::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show => Ok((
            ConfigOutput::Show(ConfigShowOutput {
                command: "config.show".to_string(),
                path: config::config_path()?,
                exists: config::config_exists(),
                defaults: config::load_defaults(),
            }),
            0,
        )),
        ConfigCommand::Path => Ok((
            ConfigOutput::Path(ConfigPathOutput {
                command: "config.path".to_string(),
                path: config::config_path()?,
                exists: config::config_exists(),
            }),
            0,
        )),
        ConfigCommand::Reset => {
            let removed = config::reset_config()?;
            Ok((
                ConfigOutput::Reset(ConfigResetOutput {
                    command: "config.reset".to_string(),
                    path: config::config_path()?,
                    removed,
                }),
                0,
            ))
        }
    }
}
