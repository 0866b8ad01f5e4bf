//! CLI command definitions and handlers

mod config;
mod diagnose;
mod studies;

use crate::compendium::{load_compendium, Compendium};
use crate::config::UserConfig;
use crate::llm::{build_provider, LlmProvider, ProviderKind};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Narratological - structural diagnostics for scripts and stories
#[derive(Parser, Debug)]
#[command(name = "narratological")]
#[command(
    version,
    about = "Structural diagnostics for screenplays and beat maps",
    long_about = "Narratological scores how tightly a story is built: causal binding \
(BUT/THEREFORE versus AND THEN), scene reorderability, scene necessity and information \
economy, and checks scripts against the diagnostic questions of narratological studies.\n\n\
Input is a screenplay text file or a pre-annotated beat map JSON.",
    after_help = "\
Examples:
  narratological diagnose all script.txt                 Full battery, text report
  narratological diagnose all beats.json --format json   JSON for scripting
  narratological diagnose causal beats.json --target 0.9 Only causal binding
  narratological diagnose framework script.txt pixar     One study's questions
  narratological studies list                            Studies in the compendium
  narratological config init                             Write an example config"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Path to the studies compendium JSON
    #[arg(long, global = true, env = "NARRATOLOGICAL_COMPENDIUM")]
    pub compendium: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run diagnostic tests on a script or beat map
    Diagnose {
        #[command(subcommand)]
        command: diagnose::DiagnoseCommand,
    },

    /// Browse the studies compendium
    Studies {
        #[command(subcommand)]
        command: studies::StudiesCommand,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommand,
    },
}

/// LLM provider selection shared by the diagnose commands
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// LLM provider: ollama, anthropic, openai, mock, none (default: config, then ollama)
    #[arg(
        long,
        short = 'p',
        long_help = "LLM provider: ollama, anthropic, openai, mock, none (default: config, then ollama)\n\n\
            `mock` answers offline with the smallest valid response: information economy \
            scores 0%, so overall health reads Critical. Use it to exercise the pipeline, \
            not to judge a script."
    )]
    pub provider: Option<String>,

    /// Model name (default depends on provider)
    #[arg(long, short = 'm')]
    pub model: Option<String>,

    /// Custom endpoint for OpenAI-compatible servers
    #[arg(long)]
    pub base_url: Option<String>,
}

impl ProviderArgs {
    fn build(&self, config: &UserConfig) -> Result<Option<Arc<dyn LlmProvider>>> {
        let name = self.provider.as_deref().unwrap_or_else(|| config.provider());
        let kind: ProviderKind = name.parse()?;
        Ok(build_provider(
            kind,
            self.model.clone(),
            self.base_url.clone(),
            config,
        )?)
    }
}

/// Compendium path from the flag, then from config
fn compendium_path(flag: Option<&Path>, config: &UserConfig) -> Option<PathBuf> {
    flag.map(Path::to_path_buf).or_else(|| config.compendium.clone())
}

/// Load the compendium, failing when no path is configured
fn require_compendium(flag: Option<&Path>, config: &UserConfig) -> Result<Compendium> {
    let path = compendium_path(flag, config).context(
        "No compendium configured. Pass --compendium <PATH> or set `compendium` in narratological.toml",
    )?;
    Ok(load_compendium(&path)?)
}

pub fn run(cli: Cli) -> Result<()> {
    let compendium = cli.compendium.as_deref();
    match cli.command {
        Commands::Diagnose { command } => {
            let config = UserConfig::load()?;
            diagnose::run(command, compendium, &config)
        }
        Commands::Studies { command } => {
            let config = UserConfig::load()?;
            studies::run(command, compendium, &config)
        }
        Commands::Config { command } => config::run(command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_diagnose_all_flags_parse() {
        let cli = Cli::try_parse_from([
            "narratological",
            "--log-level",
            "debug",
            "diagnose",
            "all",
            "beats.json",
            "--format",
            "json",
            "--study",
            "pixar",
            "--study",
            "bergman",
            "--no-framework",
            "--provider",
            "none",
        ])
        .unwrap();
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::Diagnose { .. }));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        assert!(Cli::try_parse_from(["narratological", "--log-level", "loud", "config", "show"]).is_err());
    }

    #[test]
    fn test_compendium_flag_wins_over_config() {
        let config = UserConfig {
            compendium: Some(PathBuf::from("from-config.json")),
            ..Default::default()
        };
        assert_eq!(
            compendium_path(Some(Path::new("flag.json")), &config),
            Some(PathBuf::from("flag.json"))
        );
        assert_eq!(
            compendium_path(None, &config),
            Some(PathBuf::from("from-config.json"))
        );
        assert_eq!(compendium_path(None, &UserConfig::default()), None);
    }

    #[test]
    fn test_provider_args_default_to_config() {
        let config = UserConfig {
            llm: crate::config::LlmSettings {
                provider: Some("none".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(ProviderArgs::default().build(&config).unwrap().is_none());

        let mock = ProviderArgs {
            provider: Some("mock".into()),
            ..Default::default()
        };
        assert_eq!(mock.build(&config).unwrap().unwrap().name(), "mock");
    }

    #[test]
    fn test_provider_help_warns_about_mock_scores() {
        let mut cli = Cli::command();
        let all = cli
            .find_subcommand_mut("diagnose")
            .and_then(|d| d.find_subcommand_mut("all"))
            .unwrap();
        let provider = all.get_arguments().find(|a| a.get_id() == "provider").unwrap();
        let help = provider.get_long_help().unwrap().to_string();
        assert!(help.contains("`mock`"));
        assert!(help.contains("Critical"));
    }
}
