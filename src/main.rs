use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use skymark::cli::args::{Cli, Commands};
use skymark::cli::commands;
use skymark::config::Config;
use skymark::error::SkymarkError;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), SkymarkError> {
    let cli = Cli::parse();
    let config = Config::load()?;
    let format = cli.output;

    let output = match cli.command {
        Commands::Login(args) => commands::login(&config, &args.email, &args.password, format)?,
        Commands::Logout => commands::logout(&config, format)?,
        Commands::Whoami => commands::whoami(&config, format)?,
        Commands::Search(args) => commands::search(&config, &args, format)?,
        Commands::Asset { nasa_id } => commands::asset(&config, &nasa_id, format)?,
        Commands::Annotate(args) => commands::annotate(&config, args.command, format)?,
        Commands::Vote(args) => commands::vote(&config, args.command, format)?,
        Commands::Consensus { image_id } => commands::consensus(&config, &image_id, format)?,
        Commands::Suggest(args) => {
            commands::suggest(&config, &args.image_id, args.save, format)?
        }
        Commands::Storage(args) => commands::storage(&config, args.command, format)?,
        Commands::Sync(args) => commands::sync(&config, args.command, format)?,
        Commands::Queue => {
            skymark::tui::run(&config)?;
            String::new()
        }
        Commands::Completions { shell } => commands::completions(shell)?,
    };

    if !output.is_empty() {
        println!("{}", output);
    }
    Ok(())
}
