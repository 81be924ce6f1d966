use clap::Parser;
use pilot::cli::{Cli, Commands};
use pilot::logging::init_logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.command.is_some());

    let config = match cli.load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            return ExitCode::FAILURE;
        }
    };
    let settings = cli.resolve_settings(&config);

    match cli.command {
        Some(Commands::Run(args)) => pilot::cli::run(args, &settings),
        None => match pilot::tui::run(settings) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
    }
}
