//! INI → settings parsing.

use ini::Ini;

use super::file::ConfigFileError;
use super::settings::{AccountSection, ConfigFile, LoggingSection, SyncSection};
use crate::settings::RetryDrainPolicy;

/// Parses a loaded INI document into a [`ConfigFile`], falling back to
/// defaults for missing sections or keys.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    Ok(ConfigFile {
        account: parse_account(ini)?,
        sync: parse_sync(ini)?,
        logging: parse_logging(ini),
    })
}

fn parse_account(ini: &Ini) -> Result<AccountSection, ConfigFileError> {
    let mut section = AccountSection::default();
    let Some(props) = ini.section(Some("account")) else {
        return Ok(section);
    };

    if let Some(raw) = props.get("user_id") {
        section.user_id = raw.parse().map_err(|_| invalid("account", "user_id", raw))?;
    }
    if let Some(name) = props.get("screen_name") {
        section.screen_name = name.to_string();
    }
    Ok(section)
}

fn parse_sync(ini: &Ini) -> Result<SyncSection, ConfigFileError> {
    let mut section = SyncSection::default();
    let Some(props) = ini.section(Some("sync")) else {
        return Ok(section);
    };

    if let Some(raw) = props.get("interval_secs") {
        section.interval_secs = raw
            .parse()
            .map_err(|_| invalid("sync", "interval_secs", raw))?;
    }
    if let Some(raw) = props.get("enabled") {
        section.enabled = raw.parse().map_err(|_| invalid("sync", "enabled", raw))?;
    }
    if let Some(raw) = props.get("retry_drain") {
        section.retry_drain = RetryDrainPolicy::from_code(raw);
    }
    Ok(section)
}

fn parse_logging(ini: &Ini) -> LoggingSection {
    let mut section = LoggingSection::default();
    let Some(props) = ini.section(Some("logging")) else {
        return section;
    };

    if let Some(dir) = props.get("directory") {
        section.directory = dir.into();
    }
    if let Some(file) = props.get("file") {
        section.file = file.to_string();
    }
    section
}

fn invalid(section: &str, key: &str, value: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(content: &str) -> Ini {
        Ini::load_from_str(content).unwrap()
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = parse_ini(&load("")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_full_document() {
        let config = parse_ini(&load(
            "[account]\n\
             user_id = 42\n\
             screen_name = tester\n\
             [sync]\n\
             interval_secs = 120\n\
             enabled = false\n\
             retry_drain = eager\n\
             [logging]\n\
             directory = /tmp/logs\n\
             file = sync.log\n",
        ))
        .unwrap();

        assert_eq!(config.account.user_id, 42);
        assert_eq!(config.account.screen_name, "tester");
        assert_eq!(config.sync.interval_secs, 120);
        assert!(!config.sync.enabled);
        assert_eq!(config.sync.retry_drain, RetryDrainPolicy::Eager);
        assert_eq!(config.logging.file, "sync.log");
    }

    #[test]
    fn test_invalid_interval_is_an_error() {
        let result = parse_ini(&load("[sync]\ninterval_secs = soon\n"));
        assert!(matches!(
            result,
            Err(ConfigFileError::InvalidValue { ref key, .. }) if key == "interval_secs"
        ));
    }

    #[test]
    fn test_unknown_retry_drain_falls_back() {
        let config = parse_ini(&load("[sync]\nretry_drain = sometime\n")).unwrap();
        assert_eq!(config.sync.retry_drain, RetryDrainPolicy::WhenIdle);
    }
}
