
    use super::*;
    use crate::schema::{JobSeed, RetryPolicyConfig, SeedSchedule, SeedValue, WorkerConfig};

    fn seed(name: &str, command: &str) -> JobSeed {
        JobSeed {
            name: name.to_string(),
            command: command.to_string(),
            schedule: SeedSchedule {
                mode: "minutes".to_string(),
                value: SeedValue::Number(5),
            },
            priority: None,
            dependencies: Vec::new(),
            retry_policy: None,
            enabled: true,
        }
    }

    #[test]
    fn test_validate_default_config() {
        let config = Config::default();
        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_validate_invalid_port() {
        let mut config = Config::default();
        config.server.port = 0;

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.path == "server.port"));
    }

    #[test]
    fn test_validate_empty_host() {
        let mut config = Config::default();
        config.server.host = String::new();

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "server.host"));
    }

    #[test]
    fn test_validate_zero_retention() {
        let mut config = Config::default();
        config.scheduler.execution_retention = 0;

        let result = ConfigValidator::validate(&config);
        assert!(result
            .errors
            .iter()
            .any(|e| e.path == "scheduler.execution_retention"));
    }

    #[test]
    fn test_validate_backoff_below_one() {
        let mut config = Config::default();
        config.scheduler.default_retry.backoff_multiplier = 0.5;

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_nan_backoff() {
        let mut config = Config::default();
        config.scheduler.default_retry.backoff_multiplier = f64::NAN;

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_validate_high_max_retries_warning() {
        let mut config = Config::default();
        config.scheduler.default_retry = RetryPolicyConfig {
            max_retries: 50,
            ..Default::default()
        };

        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert!(!result.warnings.is_empty());
    }

    #[test]
    fn test_validate_no_workers() {
        let mut config = Config::default();
        config.scheduler.workers.clear();

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.path == "scheduler.workers"));
    }

    #[test]
    fn test_validate_duplicate_worker_ids() {
        let mut config = Config::default();
        config.scheduler.workers = vec![
            WorkerConfig::new("w", "A", 1),
            WorkerConfig::new("w", "B", 1),
        ];

        let result = ConfigValidator::validate(&config);
        assert!(result
            .errors
            .iter()
            .any(|e| e.message.contains("Duplicate worker id")));
    }

    #[test]
    fn test_validate_zero_capacity_worker() {
        let mut config = Config::default();
        config.scheduler.workers = vec![WorkerConfig::new("w", "A", 0)];

        let result = ConfigValidator::validate(&config);
        assert!(result
            .errors
            .iter()
            .any(|e| e.path == "scheduler.workers[0].max_concurrent_jobs"));
    }

    #[test]
    fn test_validate_all_workers_inactive_warning() {
        let mut config = Config::default();
        for worker in &mut config.scheduler.workers {
            worker.active = false;
        }

        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.path == "scheduler.workers"));
    }

    #[test]
    fn test_validate_seed_jobs() {
        let mut config = Config::default();
        config.scheduler.jobs = vec![
            seed("", "http://localhost/a"),
            seed("No command", ""),
            seed("Shell", "echo hi"),
        ];

        let result = ConfigValidator::validate(&config);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().any(|e| e.path == "scheduler.jobs[0].name"));
        assert!(result.errors.iter().any(|e| e.path == "scheduler.jobs[1].command"));
        assert!(result.warnings.iter().any(|w| w.path == "scheduler.jobs[2].command"));
    }

    #[test]
    fn test_validation_result_add_error() {
        let mut result = ValidationResult::default();
        assert!(result.is_valid());
        result.add_error(ValidationError::new("path", "message"));
        assert!(!result.is_valid());
    }
