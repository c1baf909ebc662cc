mod cli;
mod config;

use clap::Parser;
use colored::*;

use cli::Cli;

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = cli::run(cli).await {
        eprintln!("{} {:#}", "Error:".bright_red().bold(), err);
        std::process::exit(1);
    }
}
