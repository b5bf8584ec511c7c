use anyhow::Context;
use readiness_core::{config::Config, paths, repository};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    println!("Initializing readiness in: {}", root.display());

    repository::init_dirs(root).context("failed to create .readiness directories")?;

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        Config::new(&project_name)
            .save(root)
            .context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
    } else {
        println!("  exists:  {}", paths::CONFIG_FILE);
    }

    println!("\nNext: readiness start --name <business> --industry <industry> --size <size> --location <location>");
    Ok(())
}
