//! Dependency gate and dependency graph validation.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::SchedulerError;
use crate::execution::{ExecutionStatus, ExecutionTracker, JobExecution};

/// Whether every dependency's most recent execution completed.
///
/// A dependency that never ran is unsatisfied. An empty list is always
/// satisfied.
pub fn is_satisfied(dependencies: &[String], executions: &ExecutionTracker) -> bool {
    dependencies.iter().all(|dependency| {
        most_recent(executions.for_job(dependency))
            .is_some_and(|e| e.status == ExecutionStatus::Completed)
    })
}

/// Latest execution by start time. A missing start time counts as the
/// epoch and, on equal start times, the earliest recorded wins.
pub fn most_recent<'a>(
    executions: impl Iterator<Item = &'a JobExecution>,
) -> Option<&'a JobExecution> {
    executions.fold(None, |best, candidate| match best {
        Some(current) if start_key(current) >= start_key(candidate) => Some(current),
        _ => Some(candidate),
    })
}

fn start_key(execution: &JobExecution) -> DateTime<Utc> {
    execution.start_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Reject unknown dependencies and cycles for `job_id` with the candidate
/// dependency list `dependencies`.
///
/// `lookup` returns the stored dependencies of other jobs, or `None` for
/// ids that do not exist.
pub fn validate_dependencies<'a, F>(
    job_id: &str,
    dependencies: &'a [String],
    lookup: F,
) -> Result<(), SchedulerError>
where
    F: Fn(&str) -> Option<&'a [String]>,
{
    for dependency in dependencies {
        if dependency != job_id && lookup(dependency).is_none() {
            return Err(SchedulerError::UnknownDependency {
                job_id: job_id.to_string(),
                dependency: dependency.clone(),
            });
        }
    }

    let graph = Graph {
        job_id,
        candidate: dependencies,
        lookup: &lookup,
    };
    let mut visited = HashSet::new();
    let mut path = vec![job_id.to_string()];
    if graph.reaches(job_id, &mut visited, &mut path) {
        return Err(SchedulerError::DependencyCycle(path));
    }
    Ok(())
}

struct Graph<'g, 'a, F> {
    job_id: &'g str,
    candidate: &'a [String],
    lookup: &'g F,
}

impl<'a, F> Graph<'_, 'a, F>
where
    F: Fn(&str) -> Option<&'a [String]>,
{
    fn edges(&self, id: &str) -> &'a [String] {
        if id == self.job_id {
            self.candidate
        } else {
            (self.lookup)(id).unwrap_or(&[])
        }
    }

    /// Depth-first search from `from` back to the job under validation.
    fn reaches(&self, from: &str, visited: &mut HashSet<String>, path: &mut Vec<String>) -> bool {
        for next in self.edges(from) {
            path.push(next.clone());
            if next == self.job_id {
                return true;
            }
            if visited.insert(next.clone()) && self.reaches(next, visited, path) {
                return true;
            }
            path.pop();
        }
        false
    }
}

#[cfg(test)]
#[path = "dependency_tests.rs"]
mod tests;
