use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use funnel_rules::{validate_funnel, Diagnostic, DiagnosticLevel, ValidateOptions};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::loader::{collect_files, load_funnel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Funnel file or directory to validate
    pub input: PathBuf,

    /// Also run the advisory rules (minimum children, duplicate ids, column widths)
    #[arg(long)]
    pub strict: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Findings for one file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileReport {
    file: String,
    migrated: bool,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

pub fn validate(args: ValidateArgs, cwd: &Path) -> Result<()> {
    let input = cwd.join(&args.input);
    let files = collect_files(&input)?;

    if args.format == OutputFormat::Text {
        println!("🔍 {} Funnel validator", "Starting".green().bold());
        println!("   Input: {}", args.input.display());
        if input.is_dir() {
            println!("   Found {} funnel files", files.len());
        }
        println!();
    }

    let mut reports = Vec::with_capacity(files.len());
    for file in &files {
        reports.push(check_file(file, args.strict));
    }

    let total_errors: usize = reports.iter().map(|r| r.errors.len()).sum();
    let total_warnings: usize = reports.iter().map(|r| r.warnings.len()).sum();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => {
            for report in &reports {
                print_report(report);
            }

            println!(
                "✨ {} Validation complete!",
                if total_errors > 0 {
                    "Done".red().bold()
                } else {
                    "Done".green().bold()
                }
            );
            println!("   Files checked: {}", reports.len());

            if total_errors > 0 {
                println!("   {} {}", "Errors:".red(), total_errors);
            }
            if total_warnings > 0 {
                println!("   {} {}", "Warnings:".yellow(), total_warnings);
            }
            if total_errors == 0 && total_warnings == 0 {
                println!("   {} No issues found!", "✓".green());
            }
        }
    }

    if total_errors > 0 {
        return Err(anyhow!("{} structural error(s) found", total_errors));
    }

    Ok(())
}

fn check_file(path: &Path, strict: bool) -> FileReport {
    let file = path.display().to_string();

    let loaded = match load_funnel(path) {
        Ok(loaded) => loaded,
        Err(err) => {
            return FileReport {
                file,
                migrated: false,
                errors: vec![Diagnostic::error("load", format!("{:#}", err))],
                warnings: Vec::new(),
            }
        }
    };

    let options = if strict {
        ValidateOptions::strict()
    } else {
        ValidateOptions::default()
    };
    let report = validate_funnel(&loaded.funnel.content, options);
    tracing::debug!(file = %file, errors = report.errors.len(), warnings = report.warnings.len(), "Validated");

    FileReport {
        file,
        migrated: loaded.migrated,
        errors: report.errors,
        warnings: report.warnings,
    }
}

fn print_report(report: &FileReport) {
    if report.errors.is_empty() && report.warnings.is_empty() {
        println!("{} {}", "✓".green(), report.file);
        return;
    }

    println!("{}", report.file);
    if report.migrated {
        println!("  {} legacy content, run `funnel migrate` to upgrade", "note".blue().bold());
    }

    for diagnostic in report.errors.iter().chain(&report.warnings) {
        let level = match diagnostic.level {
            DiagnosticLevel::Error => "error".red().bold(),
            DiagnosticLevel::Warning => "warning".yellow().bold(),
        };

        match &diagnostic.target_id {
            Some(target) => println!("  {} [{}] {} ({})", level, diagnostic.rule, diagnostic.message, target),
            None => println!("  {} [{}] {}", level, diagnostic.rule, diagnostic.message),
        }

        if let Some(suggestion) = &diagnostic.suggestion {
            println!("    {} {}", "💡".dimmed(), suggestion.dimmed());
        }
    }

    println!();
}
