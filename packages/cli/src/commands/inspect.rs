use anyhow::Result;
use clap::Args;
use colored::Colorize;
use funnel_model::{Block, Funnel};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use crate::loader::load_funnel;

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Funnel file to inspect
    pub input: PathBuf,

    /// Show block content as JSON
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn inspect(args: InspectArgs, cwd: &Path) -> Result<()> {
    let loaded = load_funnel(&cwd.join(&args.input))?;
    let funnel = &loaded.funnel;

    println!("{} {}", "Funnel:".bright_blue().bold(), funnel.name.bright_white());
    if let Some(id) = funnel.id {
        println!("   Id:       {}", id);
    }
    if let Some(description) = &funnel.description {
        println!("   About:    {}", description);
    }
    println!("   Status:   {:?}{}", funnel.status, if funnel.is_published { " (live)" } else { "" });
    println!(
        "   Contents: {} section(s), {} block(s)",
        funnel.sections().len(),
        funnel.content.blocks().len()
    );
    if loaded.migrated {
        println!("   {} loaded from the legacy flat format", "note".blue().bold());
    }
    println!();

    print!("{}", render_tree(funnel, args.verbose));
    Ok(())
}

/// Indented outline of sections, columns and nested blocks
fn render_tree(funnel: &Funnel, verbose: bool) -> String {
    let mut out = String::new();

    for (index, section) in funnel.sections().iter().enumerate() {
        let _ = writeln!(out, "§{} {} [{}]", index + 1, section.id, section.layout.as_str());

        for column in &section.columns {
            let _ = writeln!(out, "  ▌{} {}%", column.id, column.width);
            for block in &column.blocks {
                write_block(&mut out, block, 2, verbose);
            }
        }
    }

    out
}

fn write_block(out: &mut String, block: &Block, depth: usize, verbose: bool) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{}- {} {}", indent, block.block_type().as_str(), block.id);
    if verbose {
        let _ = write!(out, " {}", block.content.to_json());
    }
    out.push('\n');

    for child in block.children() {
        write_block(out, child, depth + 1, verbose);
    }
}
