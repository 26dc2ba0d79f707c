use dementia_domain::error::{Error, Result};

use super::AppConfig;

/// Fail-fast validation of a loaded [`AppConfig`], mirroring the reference
/// workspace's convention of a dedicated validation pass after deserializing
/// application settings.
pub fn validate(config: &AppConfig) -> Result<()> {
    validate_database(config)?;
    validate_session(config)?;
    Ok(())
}

fn validate_database(config: &AppConfig) -> Result<()> {
    if config.database.url.is_empty() {
        return Err(Error::validation("database.url cannot be empty"));
    }
    if config.database.min_connections == 0 {
        return Err(Error::validation("database.min_connections cannot be 0"));
    }
    if config.database.max_connections < config.database.min_connections {
        return Err(Error::validation(
            "database.max_connections cannot be less than database.min_connections",
        ));
    }
    if config.database.statement_timeout_secs == 0 {
        return Err(Error::validation(
            "database.statement_timeout_secs cannot be 0",
        ));
    }
    Ok(())
}

fn validate_session(config: &AppConfig) -> Result<()> {
    if config.session.idle_cutoff_secs <= 0 {
        return Err(Error::validation("session.idle_cutoff_secs must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_max_connections_below_min() {
        let mut config = AppConfig::default();
        config.database.min_connections = 10;
        config.database.max_connections = 2;
        let err = validate(&config).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn rejects_non_positive_idle_cutoff() {
        let mut config = AppConfig::default();
        config.session.idle_cutoff_secs = 0;
        let err = validate(&config).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn default_config_is_valid() {
        validate(&AppConfig::default()).unwrap();
    }
}
