//! Configuration loader.

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist. Parse and expansion errors are still reported.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        let mut result = content.to_string();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.cadence`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SeedValue;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.scheduler.workers.len(), 3);
    }

    #[test]
    fn test_load_basic_config() {
        let content = r#"
            [server]
            host = "0.0.0.0"
            port = 3000
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_load_scheduler_config() {
        let content = r#"
            [scheduler]
            execution_retention = 50

            [scheduler.default_retry]
            max_retries = 5
            retry_delay_ms = 250
            backoff_multiplier = 1.5

            [[scheduler.workers]]
            id = "w1"
            name = "Only Worker"
            max_concurrent_jobs = 1

            [[scheduler.jobs]]
            name = "Ping"
            command = "http://localhost:9000/ping"
            schedule = { mode = "minutes", value = 10 }

            [[scheduler.jobs]]
            name = "Nightly"
            command = "http://localhost:9000/nightly"
            priority = "low"
            schedule = { mode = "daily", value = "02:30" }
            enabled = false
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.scheduler.execution_retention, 50);
        assert_eq!(config.scheduler.default_retry.max_retries, 5);
        assert_eq!(config.scheduler.workers.len(), 1);
        assert_eq!(config.scheduler.workers[0].max_concurrent_jobs, 1);
        assert!(config.scheduler.workers[0].active);
        assert_eq!(config.scheduler.jobs.len(), 2);
        assert_eq!(config.scheduler.jobs[0].schedule.value, SeedValue::Number(10));
        assert_eq!(
            config.scheduler.jobs[1].schedule.value,
            SeedValue::Text("02:30".to_string())
        );
        assert!(!config.scheduler.jobs[1].enabled);
        assert!(config.scheduler.jobs[0].enabled);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]").unwrap();
        writeln!(file, "port = 5000").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/cadence.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config =
            ConfigLoader::load_or_default(Path::new("/nonexistent/path/cadence.toml")).unwrap();
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_load_or_default_keeps_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid = [unclosed").unwrap();
        assert!(ConfigLoader::load_or_default(file.path()).is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("CADENCE_TEST_CONFIG_VAR", "test_value");
        }
        let content = "value = \"${CADENCE_TEST_CONFIG_VAR}\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert!(expanded.contains("test_value"));
        unsafe {
            std::env::remove_var("CADENCE_TEST_CONFIG_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_CADENCE_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/logs");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/logs"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/var/log/cadence";
        assert_eq!(ConfigLoader::expand_path(path), path);
    }

    #[test]
    fn test_shipped_default_config() {
        let config = ConfigLoader::load_str(include_str!("../../../config/default.toml")).unwrap();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.scheduler.workers.len(), 3);
        assert_eq!(config.scheduler.jobs.len(), 2);

        let posts = &config.scheduler.jobs[1];
        assert_eq!(posts.name, "Get Posts");
        assert_eq!(
            posts.schedule.value,
            crate::schema::SeedValue::Text("12:02".to_string())
        );
        assert_eq!(posts.retry_policy.as_ref().unwrap().backoff_multiplier, 1.5);
        assert!(crate::ConfigValidator::validate(&config).is_valid());
    }
}
