// Entrypoint for the CLI application.
// - Keeps `main` small: set up logging, parse arguments, hand off to `cli::run`.
// - Errors are printed once here and turned into a non-zero exit status.

use clap::Parser;
use cliscore::cli::{self, Cli};

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_filter = if cli.verbose { "cliscore=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
