//! Settings → INI serialization.

use super::settings::ConfigFile;

/// Renders a configuration as INI text with explanatory comments.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    format!(
        "# chirpsync configuration\n\
         \n\
         [account]\n\
         # Remote user id of the account to sync.\n\
         user_id = {user_id}\n\
         screen_name = {screen_name}\n\
         \n\
         [sync]\n\
         # Seconds between automatic updates.\n\
         interval_secs = {interval_secs}\n\
         enabled = {enabled}\n\
         # when-idle (inherited behavior) or eager.\n\
         retry_drain = {retry_drain}\n\
         \n\
         [logging]\n\
         directory = {directory}\n\
         file = {file}\n",
        user_id = config.account.user_id,
        screen_name = config.account.screen_name,
        interval_secs = config.sync.interval_secs,
        enabled = config.sync.enabled,
        retry_drain = config.sync.retry_drain.code(),
        directory = config.logging.directory.display(),
        file = config.logging.file,
    )
}
