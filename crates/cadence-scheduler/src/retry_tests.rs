
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.retry_delay, 1000);
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_backoff_sequence() {
        let policy = RetryPolicy::new(3, 1000, 2.0);

        assert_eq!(
            policy.on_failure(0),
            RetryDecision::Retry {
                retry_count: 1,
                delay: Duration::from_millis(1000)
            }
        );
        assert_eq!(
            policy.on_failure(1),
            RetryDecision::Retry {
                retry_count: 2,
                delay: Duration::from_millis(2000)
            }
        );
        assert_eq!(policy.on_failure(2), RetryDecision::GiveUp { retry_count: 3 });
    }

    #[test]
    fn test_fractional_multiplier() {
        let policy = RetryPolicy::new(4, 1000, 1.5);
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(1000));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(1500));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(2250));
    }

    #[test]
    fn test_zero_retries_gives_up_immediately() {
        let policy = RetryPolicy::new(0, 1000, 2.0);
        assert_eq!(policy.on_failure(0), RetryDecision::GiveUp { retry_count: 0 });
    }

    #[test]
    fn test_single_attempt_budget() {
        let policy = RetryPolicy::new(1, 1000, 2.0);
        assert_eq!(policy.on_failure(0), RetryDecision::GiveUp { retry_count: 1 });
    }

    #[test]
    fn test_terminal_count_never_exceeds_budget() {
        let policy = RetryPolicy::new(2, 10, 2.0);
        for carried in 0..10 {
            let decision = policy.on_failure(carried);
            assert!(decision.retry_count() <= policy.max_retries.max(carried + 1));
            if let RetryDecision::GiveUp { retry_count } = decision {
                assert!(retry_count <= policy.max_retries);
            }
        }
    }

    #[test]
    fn test_validate() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert!(RetryPolicy::new(3, 1000, 0.5).validate().is_err());
        assert!(RetryPolicy::new(3, 1000, f64::NAN).validate().is_err());
        assert!(RetryPolicy::new(3, 1000, f64::INFINITY).validate().is_err());
    }

    #[test]
    fn test_from_config() {
        let config = cadence_config::RetryPolicyConfig {
            max_retries: 2,
            retry_delay_ms: 5000,
            backoff_multiplier: 1.5,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy, RetryPolicy::new(2, 5000, 1.5));
    }

    #[test]
    fn test_serde_camel_case() {
        let policy: RetryPolicy = serde_json::from_str(
            r#"{"maxRetries": 2, "retryDelay": 1000, "backoffMultiplier": 1.5}"#,
        )
        .unwrap();
        assert_eq!(policy, RetryPolicy::new(2, 1000, 1.5));

        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["retryDelay"], 1000);
    }
