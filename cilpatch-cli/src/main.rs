mod app;
mod commands;
mod exit;
mod output;

use clap::Parser;

use crate::{
    app::{Cli, Command},
    exit::{CliResult, ExitCode},
};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures
            let code = if e.use_stderr() {
                ExitCode::InvalidArguments
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            std::process::exit(code.code());
        }
    };

    // Engine debug logs on stderr with --verbose; RUST_LOG overrides
    let level = if cli.global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("cilpatch", level)
        .filter_module("cilpatch_cli", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let result: CliResult = match &cli.command {
        Command::Publicize { path, output } => {
            commands::publicize::run(path, output.as_deref(), &cli.global)
        }
        Command::Patch { path, output, mode } => {
            commands::patch::run(path, output.as_deref(), mode, &cli.global)
        }
    };

    if let Err(failure) = result {
        eprintln!("{:#}", failure.error);
        std::process::exit(failure.code.code());
    }
}
