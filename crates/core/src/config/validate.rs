use super::{AuthMethod, Config, ConfigError};

/// Validate cross-field constraints that serde defaults cannot express.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if config.orchestrator.status_ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.status_ttl_secs must be greater than zero".to_string(),
        ));
    }

    if config.live.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "live.poll_interval_ms must be greater than zero".to_string(),
        ));
    }

    if config.live.max_stream_secs == 0 {
        return Err(ConfigError::ValidationError(
            "live.max_stream_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[auth]
method = "none"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_api_key_method_requires_key() {
        let mut config = base_config();
        config.auth.method = AuthMethod::ApiKey;
        config.auth.api_key = None;
        assert!(validate_config(&config).is_err());

        config.auth.api_key = Some("k".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = base_config();
        config.live.poll_interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_status_ttl_rejected() {
        let mut config = base_config();
        config.orchestrator.status_ttl_secs = 0;
        assert!(validate_config(&config).is_err());
    }
}
