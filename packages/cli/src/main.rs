mod commands;
mod loader;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{init, inspect, migrate, validate, InitArgs, InspectArgs, MigrateArgs, ValidateArgs};

/// Funnel CLI - Check, migrate and inspect funnel documents
#[derive(Parser, Debug)]
#[command(name = "funnel")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default funnel.config.json
    Init(InitArgs),

    /// Audit funnel files against the nesting rules
    Validate(ValidateArgs),

    /// Rewrite a funnel file in the current sectioned format
    Migrate(MigrateArgs),

    /// Print the section, column and block tree of a funnel
    Inspect(InspectArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => fail(anyhow::anyhow!("Cannot get current directory: {}", err)),
    };

    let result = match cli.command {
        Command::Init(args) => init(args, &cwd),
        Command::Validate(args) => validate(args, &cwd),
        Command::Migrate(args) => migrate(args, &cwd),
        Command::Inspect(args) => inspect(args, &cwd),
    };

    if let Err(err) = result {
        fail(err);
    }
}

fn fail(err: anyhow::Error) -> ! {
    eprintln!();
    eprintln!("{} {:#}", "Error:".red().bold(), err);
    eprintln!();
    std::process::exit(1);
}
