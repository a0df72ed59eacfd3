use std::str::FromStr;
use tracing::warn;

use crate::application::file_security::FileValidationConfig;
use crate::application::sanitization::SanitizationConfig;
use crate::domain::value_objects::Environment;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub environment: Environment,
    /// Ignore an injected distributed limiter and count locally only
    pub disable_distributed_rate_limit: bool,
    /// 0 disables the background purge; eviction then stays lazy
    pub rate_limit_sweep_interval_secs: u64,
    pub max_upload_size: u64,
    pub allow_executables: bool,
    pub form_max_depth: usize,
    pub form_max_string_length: usize,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Unknown names map to production, the most restrictive environment
fn parse_environment(raw: &str) -> Environment {
    Environment::from_str(raw).unwrap_or_else(|e| {
        warn!(error = %e, "Unrecognized APP_ENV, assuming production");
        Environment::Production
    })
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            environment: Environment::Development,
            disable_distributed_rate_limit: false,
            rate_limit_sweep_interval_secs: 0,
            max_upload_size: 10 * 1024 * 1024,
            allow_executables: false,
            form_max_depth: 10,
            form_max_string_length: 50_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            environment: std::env::var("APP_ENV")
                .map(|v| parse_environment(&v))
                .unwrap_or(defaults.environment),
            disable_distributed_rate_limit: env_flag("RATE_LIMIT_DISABLE_DISTRIBUTED"),
            rate_limit_sweep_interval_secs: env_or(
                "RATE_LIMIT_SWEEP_INTERVAL_SECS",
                defaults.rate_limit_sweep_interval_secs,
            ),
            max_upload_size: env_or("MAX_UPLOAD_SIZE", defaults.max_upload_size),
            allow_executables: env_flag("ALLOW_EXECUTABLES"),
            form_max_depth: env_or("FORM_MAX_DEPTH", defaults.form_max_depth),
            form_max_string_length: env_or(
                "FORM_MAX_STRING_LENGTH",
                defaults.form_max_string_length,
            ),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_addr.is_empty() {
            return Err("LISTEN_ADDR cannot be empty".to_string());
        }

        if self.rate_limit_sweep_interval_secs != 0 && self.rate_limit_sweep_interval_secs < 10 {
            return Err(
                "RATE_LIMIT_SWEEP_INTERVAL_SECS must be 0 or at least 10 seconds".to_string(),
            );
        }

        if self.max_upload_size == 0 {
            return Err("MAX_UPLOAD_SIZE must be greater than 0".to_string());
        }
        if usize::try_from(self.max_upload_size).is_err() {
            return Err("MAX_UPLOAD_SIZE does not fit in memory on this platform".to_string());
        }

        if self.form_max_depth == 0 || self.form_max_depth > 64 {
            return Err("FORM_MAX_DEPTH must be between 1 and 64".to_string());
        }

        if self.form_max_string_length == 0 {
            return Err("FORM_MAX_STRING_LENGTH must be greater than 0".to_string());
        }

        Ok(())
    }

    pub fn sanitization_config(&self) -> SanitizationConfig {
        SanitizationConfig::new()
            .with_max_depth(self.form_max_depth)
            .with_max_string_length(self.form_max_string_length)
    }

    pub fn file_validation_config(&self) -> FileValidationConfig {
        FileValidationConfig::new()
            .with_max_size(self.max_upload_size)
            .with_allow_executables(self.allow_executables)
    }

    /// HTTP body limit; uploads are buffered, so this bounds memory per request
    pub fn max_body_size(&self) -> usize {
        usize::try_from(self.max_upload_size).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.max_body_size(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_unknown_environment_is_production() {
        assert_eq!(parse_environment("staging"), Environment::Production);
        assert_eq!(parse_environment("test"), Environment::Test);
    }

    #[test]
    fn test_sweep_interval_floor() {
        let config = Config {
            rate_limit_sweep_interval_secs: 5,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            rate_limit_sweep_interval_secs: 10,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_limits_must_be_positive() {
        let config = Config {
            max_upload_size: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            form_max_depth: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_engine_configs_follow_settings() {
        let config = Config {
            form_max_depth: 4,
            form_max_string_length: 100,
            max_upload_size: 2048,
            allow_executables: true,
            ..Config::default()
        };
        let sanitization = config.sanitization_config();
        assert_eq!(sanitization.max_depth, 4);
        assert_eq!(sanitization.max_string_length, 100);

        let files = config.file_validation_config();
        assert_eq!(files.max_size, 2048);
        assert!(files.allow_executables);
    }
}
