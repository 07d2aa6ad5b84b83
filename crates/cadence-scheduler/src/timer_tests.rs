
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use crate::clock::ManualClock;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn retry(id: &str, job_id: &str, due_secs: i64) -> PendingRetry {
        PendingRetry {
            id: id.to_string(),
            job_id: job_id.to_string(),
            retry_count: 1,
            due_at: start() + chrono::Duration::seconds(due_secs),
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_install_cron_replaces_previous() {
        let mut registry = TimerRegistry::new();
        let first = registry.install_cron("a", "*/5 * * * *");
        let second = registry.install_cron("a", "*/10 * * * *");

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(registry.cron_job_ids(), vec!["a".to_string()]);
    }

    #[test]
    fn test_cancel_cron() {
        let mut registry = TimerRegistry::new();
        let token = registry.install_cron("a", "*/5 * * * *");
        assert!(registry.has_cron("a"));

        assert!(registry.cancel_cron("a"));
        assert!(token.is_cancelled());
        assert!(!registry.has_cron("a"));
        assert!(!registry.cancel_cron("a"));
    }

    #[test]
    fn test_retry_bookkeeping() {
        let mut registry = TimerRegistry::new();
        let t1 = registry.add_retry(retry("r1", "a", 20));
        let t2 = registry.add_retry(retry("r2", "a", 10));
        let t3 = registry.add_retry(retry("r3", "b", 5));

        let due: Vec<_> = registry
            .pending_retries()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(due, vec!["r3", "r2", "r1"]);

        assert_eq!(registry.cancel_retries_for("a"), 2);
        assert!(t1.is_cancelled());
        assert!(t2.is_cancelled());
        assert!(!t3.is_cancelled());

        assert_eq!(registry.take_retry("r3").unwrap().job_id, "b");
        assert!(registry.take_retry("r3").is_none());
        assert!(registry.take_retry("r1").is_none());
    }

    #[test]
    fn test_cancel_all() {
        let mut registry = TimerRegistry::new();
        let cron = registry.install_cron("a", "*/5 * * * *");
        let retry_token = registry.add_retry(retry("r1", "a", 1));

        registry.cancel_all();
        assert!(cron.is_cancelled());
        assert!(retry_token.is_cancelled());
        assert!(registry.cron_job_ids().is_empty());
        assert!(registry.pending_retries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cron_loop_fires_on_ticks() {
        let clock = Arc::new(ManualClock::new(start()));
        let fired = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();
        let expression = CronExpression::parse("*/1 * * * *").unwrap();

        let counter = fired.clone();
        spawn_cron_loop("a".to_string(), expression, clock.clone(), token.clone(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        for tick in 1..=3 {
            clock.advance(chrono::Duration::seconds(60));
            tokio::time::advance(Duration::from_secs(60)).await;
            settle().await;
            assert_eq!(fired.load(Ordering::SeqCst), tick);
        }

        token.cancel();
        clock.advance(chrono::Duration::seconds(300));
        tokio::time::advance(Duration::from_secs(300)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cron_loop_stops_when_fire_declines() {
        let clock = Arc::new(ManualClock::new(start()));
        let fired = Arc::new(AtomicUsize::new(0));
        let expression = CronExpression::parse("*/1 * * * *").unwrap();

        let counter = fired.clone();
        spawn_cron_loop(
            "a".to_string(),
            expression,
            clock.clone(),
            CancellationToken::new(),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            },
        );

        for _ in 0..3 {
            clock.advance(chrono::Duration::seconds(60));
            tokio::time::advance(Duration::from_secs(60)).await;
            settle().await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_delayed_runs_after_delay() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        spawn_delayed(Duration::from_millis(1000), CancellationToken::new(), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        settle().await;

        tokio::time::advance(Duration::from_millis(999)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_delayed_cancelled() {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let token = CancellationToken::new();
        spawn_delayed(Duration::from_millis(1000), token.clone(), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        token.cancel();
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
