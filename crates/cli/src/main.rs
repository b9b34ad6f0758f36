use std::process::ExitCode;

use clap::Parser;
use log::{error, LevelFilter};
use meshbridge::Registry;

mod args;
mod commands;

use args::{Args, Commands};

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let registry = Registry::global();
    let mut stdout = std::io::stdout().lock();
    let result = match args.command {
        Commands::List => commands::list_command(registry, &mut stdout).map(|()| true),
        Commands::Run(args) => commands::run_command(registry, args, &mut stdout),
        Commands::Stl(args) => commands::stl_command(registry, args, &mut stdout),
    };
    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
