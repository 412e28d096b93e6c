//! Reading funnel files from disk
//!
//! Accepted shapes:
//! - a funnel document `{ "name", "content": {...}, "settings": {...}, ... }`
//! - a persistence record, where `content` and `settings` are JSON strings
//! - a bare content payload `{ "sections": [...] }`
//! - legacy flat content `{ "blocks": [...] }`, bare or as a funnel's content

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use funnel_model::{Funnel, FunnelContent, FunnelSettings, IdGenerator};
use serde_json::Value;
use walkdir::WalkDir;

/// A funnel read from disk
#[derive(Debug)]
pub struct LoadedFunnel {
    pub funnel: Funnel,

    /// Content was in the legacy flat format
    pub migrated: bool,
}

pub fn load_funnel(path: &Path) -> Result<LoadedFunnel> {
    let source = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let mut ids = IdGenerator::new(&path.display().to_string());
    parse_funnel(&source, &fallback_name(path), &mut ids)
}

pub fn parse_funnel(source: &str, fallback_name: &str, ids: &mut IdGenerator) -> Result<LoadedFunnel> {
    let mut value: Value = serde_json::from_str(source).context("File is not valid JSON")?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("Expected a JSON object at the top level"))?;

    if !object.contains_key("name") {
        let migrated = is_legacy(&value);
        let mut funnel = Funnel::new(fallback_name);
        funnel.content = FunnelContent::parse_lenient(source, ids);
        return Ok(LoadedFunnel { funnel, migrated });
    }

    let content = object.remove("content").unwrap_or(Value::Null);
    let settings = object.remove("settings");
    let mut funnel: Funnel = serde_json::from_value(value).context("Invalid funnel document")?;

    let content_source = match content {
        Value::String(source) => source,
        Value::Null => String::new(),
        other => other.to_string(),
    };
    let migrated = serde_json::from_str::<Value>(&content_source)
        .map(|content| is_legacy(&content))
        .unwrap_or(false);
    funnel.content = FunnelContent::parse_lenient(&content_source, ids);

    funnel.settings = match settings {
        Some(Value::String(source)) => FunnelSettings::parse_lenient(&source),
        Some(settings) => FunnelSettings::parse_lenient(&settings.to_string()),
        None => FunnelSettings::default(),
    };

    Ok(LoadedFunnel { funnel, migrated })
}

/// Expand a file or directory argument into funnel files
pub fn collect_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }

    if !input.is_dir() {
        return Err(anyhow!("Input path does not exist: {}", input.display()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        let is_json = path.extension().map(|e| e == "json").unwrap_or(false);
        let is_config = path
            .file_name()
            .map(|name| name == funnel_editor::DEFAULT_CONFIG_NAME)
            .unwrap_or(false);

        if path.is_file() && is_json && !is_config {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn is_legacy(content: &Value) -> bool {
    content.get("sections").is_none() && content.get("blocks").is_some()
}

fn fallback_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
