pub type CmdResult<T> = shipwright::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod config;
pub mod deps;
pub mod envfile;
pub mod milestone;
pub mod tags;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (shipwright::Result<serde_json::Value>, i32) {
    crate::tty::status("shipwright is working...");

    match command {
        crate::Commands::Deps(args) => dispatch!(args, global, deps),
        crate::Commands::Tags(args) => dispatch!(args, global, tags),
        crate::Commands::Envfile(args) => dispatch!(args, global, envfile),
        crate::Commands::Milestone(args) => dispatch!(args, global, milestone),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
