use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use funnel_editor::StoredFunnel;
use std::fs;
use std::path::{Path, PathBuf};

use crate::loader::load_funnel;

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Funnel file to migrate
    pub input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write the persistence record shape (content and settings as JSON strings)
    #[arg(long)]
    pub record: bool,
}

pub fn migrate(args: MigrateArgs, cwd: &Path) -> Result<()> {
    let input = cwd.join(&args.input);
    let loaded = load_funnel(&input)?;
    let rendered = render(&loaded.funnel, args.record)?;

    let Some(output) = args.output else {
        println!("{}", rendered);
        return Ok(());
    };

    let output = cwd.join(output);
    fs::write(&output, rendered).with_context(|| format!("Cannot write {}", output.display()))?;

    if loaded.migrated {
        println!(
            "{} Migrated legacy content of {} into {} section(s)",
            "✓".green(),
            args.input.display(),
            loaded.funnel.sections().len()
        );
    } else {
        println!("{} {} was already sectioned, rewrote it as-is", "✓".green(), args.input.display());
    }
    println!("   Output: {}", output.display());

    Ok(())
}

fn render(funnel: &funnel_model::Funnel, record: bool) -> Result<String> {
    if record {
        let stored = StoredFunnel::from_funnel(funnel)?;
        Ok(serde_json::to_string_pretty(&stored)?)
    } else {
        Ok(serde_json::to_string_pretty(funnel)?)
    }
}
