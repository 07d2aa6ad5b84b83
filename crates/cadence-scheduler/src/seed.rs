//! Startup job seeding from configuration.

use std::collections::HashMap;

use tracing::{info, warn};

use cadence_config::{JobSeed, SeedValue};

use crate::definition::{CronSchedule, JobView, NewJob, ScheduleValue};
use crate::error::SchedulerError;
use crate::retry::RetryPolicy;
use crate::scheduler::JobScheduler;

/// Convert a seed into a create request.
///
/// Seed dependencies name other seeds; `resolve` maps a seed name to the id
/// of the job already created for it.
pub fn new_job_from_seed<F>(seed: &JobSeed, resolve: F) -> Result<NewJob, SchedulerError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = match &seed.schedule.value {
        SeedValue::Number(n) => ScheduleValue::Number(*n),
        SeedValue::Text(s) => ScheduleValue::Text(s.clone()),
    };

    let dependencies = seed
        .dependencies
        .iter()
        .map(|name| {
            resolve(name).ok_or_else(|| SchedulerError::UnknownDependency {
                job_id: seed.name.clone(),
                dependency: name.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut job = NewJob::new(
        &seed.name,
        CronSchedule::new(&seed.schedule.mode, value),
        &seed.command,
    )
    .with_dependencies(dependencies)
    .with_enabled(seed.enabled);

    if let Some(priority) = &seed.priority {
        job = job.with_priority(priority.parse()?);
    }
    if let Some(policy) = &seed.retry_policy {
        job = job.with_retry_policy(RetryPolicy::from(policy));
    }
    Ok(job)
}

/// Create every seed job in order. Invalid seeds are logged and skipped.
pub fn seed_jobs(scheduler: &JobScheduler, seeds: &[JobSeed]) -> Vec<JobView> {
    let mut ids_by_name: HashMap<String, String> = HashMap::new();
    let mut created = Vec::new();

    for seed in seeds {
        let result = new_job_from_seed(seed, |name| ids_by_name.get(name).cloned())
            .and_then(|job| scheduler.create_job(job));

        match result {
            Ok(view) => {
                info!(job_id = %view.id(), "Seeded job {}", seed.name);
                ids_by_name.insert(seed.name.clone(), view.id().to_string());
                created.push(view);
            }
            Err(e) => warn!("Skipping seed job {}: {}", seed.name, e),
        }
    }

    created
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_config::{RetryPolicyConfig, SeedSchedule};

    use crate::definition::JobPriority;
    use crate::test_support::harness;

    fn seed(name: &str, mode: &str, value: SeedValue) -> JobSeed {
        JobSeed {
            name: name.to_string(),
            command: format!("http://seed.local/{name}"),
            schedule: SeedSchedule {
                mode: mode.to_string(),
                value,
            },
            priority: None,
            dependencies: Vec::new(),
            retry_policy: None,
            enabled: true,
        }
    }

    #[test]
    fn test_seed_conversion() {
        let mut s = seed("Log todos", "minutes", SeedValue::Number(20));
        s.priority = Some("high".to_string());
        s.retry_policy = Some(RetryPolicyConfig {
            max_retries: 3,
            retry_delay_ms: 5000,
            backoff_multiplier: 2.0,
        });

        let job = new_job_from_seed(&s, |_| None).unwrap();
        assert_eq!(job.cron_schedule, CronSchedule::minutes(20));
        assert_eq!(job.priority, Some(JobPriority::High));
        assert_eq!(job.retry_policy, Some(RetryPolicy::new(3, 5000, 2.0)));
        assert_eq!(job.enabled, Some(true));
    }

    #[test]
    fn test_seed_bad_priority() {
        let mut s = seed("a", "minutes", SeedValue::Number(5));
        s.priority = Some("urgent".to_string());
        assert!(new_job_from_seed(&s, |_| None).is_err());
    }

    #[tokio::test]
    async fn test_seed_jobs_resolves_names_and_skips_invalid() {
        let h = harness();
        let mut dependent = seed("Get Posts", "daily", SeedValue::Text("12:02".to_string()));
        dependent.dependencies = vec!["Log todos".to_string()];
        let mut dangling = seed("Orphan", "minutes", SeedValue::Number(5));
        dangling.dependencies = vec!["Nobody".to_string()];

        let seeds = vec![
            seed("Log todos", "minutes", SeedValue::Number(20)),
            dependent,
            seed("Broken", "minutes", SeedValue::Number(90)),
            dangling,
        ];

        let created = seed_jobs(&h.scheduler, &seeds);
        assert_eq!(created.len(), 2);
        assert_eq!(
            created[1].definition.dependencies,
            vec![created[0].id().to_string()]
        );
        assert_eq!(h.scheduler.list_jobs().len(), 2);
    }
}
