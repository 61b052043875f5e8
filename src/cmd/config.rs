//! Configuration view and validation commands: `dealboard config`.

use anyhow::Result;
use dealboard::config::{DealboardConfig, DealboardToml, ENV_API_TOKEN};

use super::super::ConfigCommands;

fn print_toml(toml: &DealboardToml) {
    println!("[api]");
    println!("  base_url = \"{}\"", toml.api.base_url);
    match &toml.api.token {
        Some(_) => println!("  token = \"********\""),
        None => println!("  token = (unset, {} not set either)", ENV_API_TOKEN),
    }
    println!("  page_size = {}", toml.api.page_size);
    println!("  timeout_secs = {}", toml.api.timeout_secs);
    println!();
    println!("[gesture]");
    println!("  activation_distance = {}", toml.gesture.activation_distance);
    println!();
    println!("[server]");
    println!("  port = {}", toml.server.port);
    println!("  dev = {}", toml.server.dev);
    println!();
    println!("[logging]");
    println!("  format = \"{}\"", toml.logging.format);
    if let Some(dir) = &toml.logging.log_dir {
        println!("  log_dir = \"{}\"", dir.display());
    }
    println!();
}

pub fn cmd_config(config: &DealboardConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = &config.path;

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Dealboard Configuration");
            println!("=======================");
            println!();
            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No dealboard.toml found at {}", config_path.display());
                println!("Using defaults. Run 'dealboard config init' to create one.");
            }
            println!();
            println!("Effective values (with env/CLI overrides):");
            println!();
            print_toml(&config.toml);
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            let warnings = config.toml.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("dealboard.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            DealboardToml::default().save(config_path)?;

            println!("Created dealboard.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [api] base_url, token, page_size");
            println!("  - [gesture] activation_distance");
            println!("  - [server] port, dev");
            println!();
        }
    }

    Ok(())
}
