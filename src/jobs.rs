//! Scheduled jobs. A single minute-tick loop owns every recurring duty;
//! each job's last-run time, run count and last error live in one
//! process-wide registry keyed by job name instead of ad hoc
//! module-level state.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serenity::all::Context;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::time::{Duration, sleep};

use crate::bot::{self, BotState};
use crate::db;
use crate::errors::BotError;
use crate::roles;
use crate::stats;

pub const STATS_REFRESH: &str = "stats_refresh";
pub const CHALLENGE_POST: &str = "challenge_post";
pub const SOLUTION_POST: &str = "solution_post";
pub const WEEKLY_RESET: &str = "weekly_reset";
pub const ROTATION_REMINDER: &str = "rotation_reminder";

#[derive(Debug, Clone, Default)]
pub struct JobStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub runs: u64,
    pub last_error: Option<String>,
}

#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<&'static str, JobStatus>>,
}

impl JobRegistry {
    pub fn global() -> &'static JobRegistry {
        static REGISTRY: OnceLock<JobRegistry> = OnceLock::new();
        REGISTRY.get_or_init(JobRegistry::default)
    }

    pub fn record(&self, name: &'static str, at: DateTime<Utc>, error: Option<String>) {
        let mut jobs = self.jobs.lock().expect("job registry poisoned");
        let status = jobs.entry(name).or_default();
        status.last_run = Some(at);
        status.runs += 1;
        status.last_error = error;
    }

    pub fn last_run(&self, name: &str) -> Option<DateTime<Utc>> {
        let jobs = self.jobs.lock().expect("job registry poisoned");
        jobs.get(name).and_then(|status| status.last_run)
    }

    /// Stable-ordered view for the diagnostics command.
    pub fn snapshot(&self) -> Vec<(&'static str, JobStatus)> {
        let jobs = self.jobs.lock().expect("job registry poisoned");
        let mut entries: Vec<_> = jobs
            .iter()
            .map(|(name, status)| (*name, status.clone()))
            .collect();
        entries.sort_by_key(|(name, _)| *name);
        entries
    }
}

/// When a job fires. `hour: None` means every hour (an hourly job).
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub minute: u32,
    pub hour: Option<u32>,
    pub weekday: Option<Weekday>,
}

/// True when `now` matches the schedule and the job hasn't already run
/// this minute (the tick loop can fire more than once per minute after
/// a slow job).
pub fn is_due(schedule: Schedule, now: DateTime<Utc>, last_run: Option<DateTime<Utc>>) -> bool {
    if now.minute() != schedule.minute {
        return false;
    }
    if schedule.hour.is_some_and(|hour| now.hour() != hour) {
        return false;
    }
    if schedule.weekday.is_some_and(|day| now.weekday() != day) {
        return false;
    }

    // Minute-granularity dedup.
    last_run.is_none_or(|last| last.timestamp() / 60 != now.timestamp() / 60)
}

async fn run_job<F>(name: &'static str, job: F)
where
    F: Future<Output = anyhow::Result<()>>,
{
    let started = Utc::now();
    log::info!("Running job '{name}'...");

    let error = match job.await {
        Ok(()) => None,
        Err(err) => {
            log::error!("Job '{name}' failed: {err:#}");
            Some(format!("{err:#}"))
        }
    };

    JobRegistry::global().record(name, started, error);
}

fn due(name: &'static str, schedule: Schedule, now: DateTime<Utc>) -> bool {
    is_due(schedule, now, JobRegistry::global().last_run(name))
}

/// The scheduler loop, spawned once from the `ready` event. Jobs run
/// sequentially within a tick; solution generation is the exception,
/// spawned off so its latency never holds up the loop.
pub async fn run_scheduler(ctx: Context, state: Arc<BotState>) {
    log::info!("Scheduler started.");

    loop {
        sleep(Duration::from_secs(60 - u64::from(Utc::now().second()))).await;
        let now = Utc::now();

        if due(STATS_REFRESH, Schedule { minute: 0, hour: None, weekday: None }, now) {
            let delay = state.config.refresh_delay;
            run_job(STATS_REFRESH, async {
                let refreshed = stats::refresh_all(delay).await?;
                log::info!("Stats refresh complete: {refreshed} accounts.");
                Ok(())
            })
            .await;
        }

        let challenge_at =
            Schedule { minute: 0, hour: Some(state.config.challenge_hour), weekday: None };
        if due(CHALLENGE_POST, challenge_at, now) {
            run_job(CHALLENGE_POST, async {
                // A manual $question earlier in the day is not a failure.
                match bot::post_challenge_flow(&ctx, &state, None).await {
                    Ok(_) | Err(BotError::AlreadyPosted) => Ok(()),
                    Err(err) => Err(err.into()),
                }
            })
            .await;
        }

        let solution_at =
            Schedule { minute: 0, hour: Some(state.config.solution_hour), weekday: None };
        if due(SOLUTION_POST, solution_at, now) {
            // Generation takes tens of seconds per language; don't stall
            // the tick loop on it.
            let ctx = ctx.clone();
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                run_job(SOLUTION_POST, async {
                    match bot::post_solution_flow(&ctx, &state).await {
                        Ok(_)
                        | Err(BotError::AlreadyPosted)
                        | Err(BotError::NoChallengeToday) => Ok(()),
                        Err(err) => Err(err.into()),
                    }
                })
                .await;
            });
        }

        let reset_at = Schedule { minute: 0, hour: Some(0), weekday: Some(Weekday::Mon) };
        if due(WEEKLY_RESET, reset_at, now) {
            let ctx = ctx.clone();
            run_job(WEEKLY_RESET, async move {
                let reset = db::accounts::reset_weekly_counts()?;
                log::info!("Weekly reset: zeroed {reset} accounts.");
                for guild_id in ctx.cache.guilds() {
                    roles::reconcile_all(&ctx, guild_id).await?;
                }
                Ok(())
            })
            .await;
        }

        let reminder_at = Schedule { minute: 0, hour: Some(10), weekday: Some(Weekday::Wed) };
        if due(ROTATION_REMINDER, reminder_at, now) {
            run_job(ROTATION_REMINDER, async {
                bot::send_rotation_reminder(&ctx, &state).await?;
                Ok(())
            })
            .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn hourly_job_fires_on_the_hour_only() {
        let hourly = Schedule { minute: 0, hour: None, weekday: None };
        assert!(is_due(hourly, at(2026, 8, 24, 13, 0), None));
        assert!(!is_due(hourly, at(2026, 8, 24, 13, 30), None));
    }

    #[test]
    fn weekly_job_checks_weekday_and_hour() {
        // 2026-08-24 is a Monday.
        let reset = Schedule { minute: 0, hour: Some(0), weekday: Some(Weekday::Mon) };
        assert!(is_due(reset, at(2026, 8, 24, 0, 0), None));
        assert!(!is_due(reset, at(2026, 8, 25, 0, 0), None));
        assert!(!is_due(reset, at(2026, 8, 24, 10, 0), None));
    }

    #[test]
    fn job_does_not_refire_within_a_minute() {
        let hourly = Schedule { minute: 0, hour: None, weekday: None };
        let now = at(2026, 8, 24, 13, 0);
        assert!(!is_due(hourly, now, Some(now)));
        assert!(is_due(hourly, at(2026, 8, 24, 14, 0), Some(now)));
    }

    #[test]
    fn registry_tracks_runs_and_errors() {
        let registry = JobRegistry::default();
        let first = at(2026, 8, 24, 13, 0);
        registry.record("demo", first, None);
        registry.record("demo", at(2026, 8, 24, 14, 0), Some(String::from("boom")));

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.len(), 1);
        let (name, status) = &snapshot[0];
        assert_eq!(*name, "demo");
        assert_eq!(status.runs, 2);
        assert_eq!(status.last_error.as_deref(), Some("boom"));
        assert!(status.last_run.unwrap() > first);
    }
}
