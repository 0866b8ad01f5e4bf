//! Config command - create and inspect configuration

use crate::config::{write_example_config, UserConfig, PROJECT_CONFIG_FILE};
use anyhow::{Context, Result};
use clap::Subcommand;
use console::style;
use std::path::Path;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write an example config (user config unless --project)
    Init {
        /// Write ./narratological.toml instead of the user config
        #[arg(long)]
        project: bool,
    },

    /// Print the effective configuration with API keys masked
    Show,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Init { project } => {
            let path = if project {
                let path = Path::new(PROJECT_CONFIG_FILE).to_path_buf();
                write_example_config(&path)?;
                path
            } else {
                UserConfig::init_user_config()?
            };
            println!(
                "{} Config at {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
            Ok(())
        }
        ConfigCommand::Show => {
            let config = UserConfig::load()?;
            let rendered = toml::to_string_pretty(&config.redacted())
                .context("Failed to serialize configuration")?;
            match UserConfig::user_config_path() {
                Some(path) => println!("# user config: {}", path.display()),
                None => println!("# user config: unavailable"),
            }
            println!("# project config: {PROJECT_CONFIG_FILE}\n");
            print!("{rendered}");
            Ok(())
        }
    }
}
