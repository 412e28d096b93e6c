use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use funnel_editor::{BlockPatch, EditSession, EditorConfig, DEFAULT_CONFIG_NAME};
use funnel_model::{BlockType, Funnel, SectionLayout};
use std::fs;
use std::path::Path;

const STARTER_FILE: &str = "funnel.json";

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Also write a starter funnel.json
    #[arg(short, long)]
    pub starter: bool,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = EditorConfig::path_in(cwd);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing funnel project...".bright_blue().bold());

    let config = EditorConfig::default();
    let config_json = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, config_json)
        .with_context(|| format!("Cannot write {}", config_path.display()))?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    if args.starter {
        let starter_path = cwd.join(STARTER_FILE);
        if starter_path.exists() && !args.force {
            println!("  {} Kept existing {}", "⚠️".yellow(), STARTER_FILE);
        } else {
            let funnel = starter_funnel(config)?;
            fs::write(&starter_path, serde_json::to_string_pretty(&funnel)?)
                .with_context(|| format!("Cannot write {}", starter_path.display()))?;
            println!("  {} Created {}", "✓".green(), STARTER_FILE);
        }
    }

    println!();
    println!("{}", "✅ Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {}", DEFAULT_CONFIG_NAME);
    println!("  2. Run: funnel validate .");

    Ok(())
}

/// Hero section above a two-column signup section
fn starter_funnel(config: EditorConfig) -> Result<Funnel> {
    let mut session = EditSession::new(Funnel::new("My First Funnel"), config);

    let hero = session.add_section(SectionLayout::Single, None);
    let hero_column = first_column(&session, &hero)?;
    if let Some(headline) = session.add_block(&hero_column, BlockType::Text, None)? {
        session.update_block(&headline, &BlockPatch::field("text", "Welcome"));
    }
    session.add_block(&hero_column, BlockType::Image, None)?;

    let signup = session.add_section(SectionLayout::TwoColumn, None);
    let columns: Vec<String> = session
        .sections()
        .iter()
        .filter(|section| section.id == signup)
        .flat_map(|section| section.columns.iter().map(|column| column.id.clone()))
        .collect();

    if let [left, right] = columns.as_slice() {
        session.add_block(left, BlockType::Text, None)?;
        if let Some(form) = session.add_block(right, BlockType::Form, None)? {
            session.add_child_block(&form, BlockType::Button)?;
        }
    }

    Ok(session.funnel().clone())
}

fn first_column(session: &EditSession, section_id: &str) -> Result<String> {
    session
        .sections()
        .iter()
        .find(|section| section.id == section_id)
        .and_then(|section| section.columns.first())
        .map(|column| column.id.clone())
        .context("New section has no columns")
}
