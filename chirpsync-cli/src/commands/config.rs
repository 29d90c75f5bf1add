//! `chirpsync config` - show or create the configuration file.

use clap::{Args, Subcommand};

use chirpsync::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Arguments for `chirpsync config`.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration.
    Show,
    /// Create the default config file if missing, printing its path.
    Init,
    /// Print the config file path.
    Path,
}

/// Executes the config subcommand.
pub fn execute(args: ConfigArgs) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Show => {
            let config = ConfigFile::load()?;
            println!("account.user_id     = {}", config.account.user_id);
            println!("account.screen_name = {}", config.account.screen_name);
            println!("sync.interval_secs  = {}", config.sync.interval_secs);
            println!("sync.enabled        = {}", config.sync.enabled);
            println!("sync.retry_drain    = {}", config.sync.retry_drain.code());
            println!("logging.directory   = {}", config.logging.directory.display());
            println!("logging.file        = {}", config.logging.file);
        }
        ConfigAction::Init => {
            let path = ConfigFile::ensure_exists()?;
            println!("Config file: {}", path.display());
        }
        ConfigAction::Path => {
            println!("{}", config_file_path().display());
        }
    }
    Ok(())
}
