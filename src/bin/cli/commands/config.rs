use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run_show(app: &App, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "configPath": app.config_path.to_string_lossy(),
                "collectionPath": app.config.collection_path().to_string_lossy(),
                "config": app.config,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("# {}", app.config_path.display());
            print!("{}", toml::to_string_pretty(&app.config)?);
        }
    }
    Ok(())
}

/// Write the effective configuration to the config path
pub fn run_init(app: &App, force: bool) -> Result<()> {
    if app.config_path.exists() && !force {
        println!(
            "Config already exists at {} (use --force to overwrite)",
            app.config_path.display()
        );
        return Ok(());
    }
    app.config
        .save(&app.config_path)
        .context("Failed to write config")?;
    println!("Wrote {}", app.config_path.display());
    Ok(())
}
