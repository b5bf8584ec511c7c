use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use readiness_core::config::{Config, GuidanceBackend, WarnLevel};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Validate the config for common mistakes
    Validate,

    /// Show the effective configuration
    Show,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Show => show(root, json),
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate(root);

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let catalog = config.load_catalog(root)?;
    let bands = config.bands(&catalog)?;

    if json {
        return print_json(&serde_json::json!({
            "config": config,
            "cutoffs": bands.cutoffs(),
        }));
    }

    println!("Project:  {}", config.project.name);
    match &config.catalog {
        Some(path) => println!("Catalog:  {} ({} questions)", path.display(), catalog.len()),
        None => println!("Catalog:  built-in ({} questions)", catalog.len()),
    }
    let cutoffs = bands.cutoffs();
    println!(
        "Cutoffs:  {} {} {} {}{}",
        cutoffs[0],
        cutoffs[1],
        cutoffs[2],
        cutoffs[3],
        if config.readiness.cutoffs.is_some() { " (configured)" } else { "" }
    );
    println!("Server:   {}:{}", config.server.host, config.server.port);
    match &config.guidance {
        GuidanceBackend::Rubric => println!("Guidance: rubric"),
        GuidanceBackend::ChatCompletions {
            base_url,
            model,
            api_key_env,
            fallback,
            ..
        } => {
            println!("Guidance: chat_completions {model} at {base_url}");
            println!("          key from ${api_key_env}, fallback {}", if *fallback { "on" } else { "off" });
        }
    }
    Ok(())
}
