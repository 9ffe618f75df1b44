//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod card;
pub mod context;
pub mod inspect;
pub mod profile_list;
pub mod settings;
pub mod theme_list;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::cli::card::{generate_cards, CardRequest};
use crate::cli::inspect::inspect_card;
use crate::cli::profile_list::list_profile;
use crate::cli::settings::{SettingError, SettingRegistry};
use crate::cli::theme_list::list_themes;
use crate::core::config::data::{path_display, Config};
use crate::model::Uid;
use crate::utils::logging::init_logging;

#[derive(Parser)]
#[command(name = "relicard")]
#[command(about = "Render Honkai: Star Rail character build cards from public profile APIs")]
#[command(
    long_about = "Relicard fetches a player's showcase from public profile providers, \
normalizes the different provider schemas into one character model, and renders a \
fixed-layout PNG build card with the portrait, total stats, light cone and relics.\n\n\
Environment Variables:\n\
  RELICARD_CONFIG   Path to an alternative config.toml\n\
  RELICARD_LOG      tracing filter directives (e.g. relicard=debug)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Append logs to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render build cards for one or more UIDs
    Card {
        /// Player UIDs
        #[arg(required = true)]
        uids: Vec<Uid>,
        /// Character index in the profile (see `relicard profile`)
        #[arg(short = 'c', long, default_value_t = 0)]
        character: usize,
        /// Output directory, or file name when a single UID is given
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Ignore the profile cache
        #[arg(long)]
        refresh: bool,
        /// Theme id for this run
        #[arg(long)]
        theme: Option<String>,
        /// Write the PNG as base64 to stdout
        #[arg(long, conflicts_with = "output")]
        base64: bool,
        /// Maximum concurrent lookups
        #[arg(long, default_value_t = 4)]
        jobs: usize,
    },
    /// Show the normalized characters of a profile
    Profile {
        uid: Uid,
        /// Print the normalized profile as JSON
        #[arg(long)]
        json: bool,
        /// Ignore the profile cache
        #[arg(long)]
        refresh: bool,
    },
    /// List available card themes
    Themes,
    /// Read the metadata embedded in a rendered card
    Inspect { path: PathBuf },
    /// Set configuration values
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
    /// Profile cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Delete cached profiles (all, or one UID)
    Clear {
        #[arg(long)]
        uid: Option<Uid>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.verbose, args.log.as_deref())?;
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let config_path = Config::resolve_path(args.config.as_deref());
    let config = Config::load_from_path(&config_path)?;

    match args.command {
        Commands::Card {
            uids,
            character,
            output,
            refresh,
            theme,
            base64,
            jobs,
        } => {
            let request = CardRequest {
                uids,
                character,
                output,
                force_refresh: refresh,
                base64,
                jobs,
            };
            generate_cards(&config, theme.as_deref(), request).await
        }
        Commands::Profile { uid, json, refresh } => list_profile(&config, uid, json, refresh).await,
        Commands::Themes => list_themes(&config),
        Commands::Inspect { path } => inspect_card(&path),
        Commands::Set { key, value } => run_set(&config_path, &config, key, value),
        Commands::Unset { key } => run_unset(&config_path, &key),
        Commands::Cache {
            action: CacheAction::Clear { uid },
        } => {
            let cache = context::profile_cache(&config);
            let removed = cache.clear(uid)?;
            println!(
                "✅ Removed {} cached profile(s) from {}",
                removed,
                path_display(cache.dir())
            );
            Ok(())
        }
    }
}

fn run_set(
    config_path: &Path,
    config: &Config,
    key: Option<String>,
    value: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let registry = SettingRegistry::new();
    let Some(key) = key else {
        println!("Settings ({}):", path_display(config_path));
        for line in registry.describe(config) {
            println!("{line}");
        }
        return Ok(());
    };

    let result = registry.get(&key).and_then(|handler| {
        let mut updated = config.clone();
        let message = handler.set(&value, &mut updated)?;
        updated
            .save_to_path(config_path)
            .map_err(|err| SettingError::Save(err.to_string()))?;
        Ok(message)
    });
    report(result)
}

fn run_unset(config_path: &Path, key: &str) -> Result<(), Box<dyn Error>> {
    let registry = SettingRegistry::new();
    let result = registry.get(key).and_then(|handler| {
        let mut message = String::new();
        Config::mutate_at(config_path, |config| {
            message = handler.unset(config);
            Ok(())
        })
        .map_err(|err| SettingError::Save(err.to_string()))?;
        Ok(message)
    });
    report(result)
}

fn report(result: Result<String, SettingError>) -> Result<(), Box<dyn Error>> {
    match result {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => {
            err.print();
            std::process::exit(1);
        }
    }
}
