use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tokio::signal;

use crate::activity::SECS_PER_DAY;
use crate::checker::Checker;
use crate::config::{CheckConfig, Config};

/// A daily wall-clock time, read in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub hour: u8,
    pub min: u8,
}

impl FromStr for Trigger {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .with_context(|| format!("expected HH:MM, got '{s}'"))?;
        let hour: u8 = h.parse().with_context(|| format!("bad hour in '{s}'"))?;
        let min: u8 = m.parse().with_context(|| format!("bad minute in '{s}'"))?;
        if hour > 23 || min > 59 {
            anyhow::bail!("time out of range: '{s}'");
        }
        Ok(Self { hour, min })
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.min)
    }
}

impl Trigger {
    /// Next firing strictly after `now`.
    pub fn next_fire(&self, offset_minutes: i32, now: DateTime<Utc>) -> DateTime<Utc> {
        let day_secs = i64::from(self.hour) * 3600 + i64::from(self.min) * 60;
        let offset = i64::from(offset_minutes) * 60;
        // Work in "local" seconds so day truncation happens at local midnight.
        let local_now = now.timestamp() + offset;
        let today_start = local_now - local_now.rem_euclid(SECS_PER_DAY);
        let mut fire = today_start + day_secs;
        if fire <= local_now {
            fire += SECS_PER_DAY;
        }
        now + Duration::seconds(fire - local_now)
    }
}

struct Job {
    check: CheckConfig,
    triggers: Vec<Trigger>,
}

impl Job {
    fn next_fire(&self, offset_minutes: i32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.triggers
            .iter()
            .map(|t| t.next_fire(offset_minutes, now))
            .min()
    }
}

pub struct Scheduler {
    checker: Arc<Checker>,
    jobs: Vec<Job>,
    offset_minutes: i32,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(config: &Config, checker: Arc<Checker>) -> Result<Self> {
        let jobs = config
            .checks
            .iter()
            .map(|c| {
                Ok(Job {
                    triggers: c.parsed_triggers()?,
                    check: c.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            checker,
            jobs,
            offset_minutes: config.utc_offset_minutes,
            run_on_start: config.run_on_start,
        })
    }

    async fn run_checks(&self, checks: &[&CheckConfig]) {
        let now = Utc::now();
        for check in checks {
            let outcome = self.checker.run(check, now).await;
            tracing::info!("Check '{}' finished: {outcome}", check.name);
        }
    }

    /// Runs `checks`, returning false if Ctrl-C arrived first.
    async fn run_or_stop(&self, checks: &[&CheckConfig]) -> bool {
        tokio::select! {
            _ = self.run_checks(checks) => true,
            _ = signal::ctrl_c() => false,
        }
    }

    pub async fn start(&self) -> Result<()> {
        if self.run_on_start {
            let all: Vec<_> = self.jobs.iter().map(|j| &j.check).collect();
            if !self.run_or_stop(&all).await {
                tracing::info!("Shutting down scheduler");
                return Ok(());
            }
        }

        let mut from = Utc::now();
        loop {
            let Some((at, due)) = next_batch(&self.jobs, self.offset_minutes, from) else {
                tracing::info!("No triggers configured, scheduler exiting");
                return Ok(());
            };
            let names: Vec<_> = due.iter().map(|c| c.name.as_str()).collect();
            tracing::info!("Next run at {at} for {}", names.join(", "));

            let wait = (at - Utc::now()).to_std().unwrap_or_default();
            let ran = tokio::select! {
                _ = tokio::time::sleep(wait) => self.run_or_stop(&due).await,
                _ = signal::ctrl_c() => false,
            };
            if !ran {
                tracing::info!("Shutting down scheduler");
                return Ok(());
            }
            from = resume_after(at, Utc::now());
        }
    }
}

/// Earliest upcoming firing and the checks due at that instant.
fn next_batch(
    jobs: &[Job],
    offset_minutes: i32,
    now: DateTime<Utc>,
) -> Option<(DateTime<Utc>, Vec<&CheckConfig>)> {
    let at = jobs
        .iter()
        .filter_map(|j| j.next_fire(offset_minutes, now))
        .min()?;
    let due = jobs
        .iter()
        .filter(|j| j.next_fire(offset_minutes, now) == Some(at))
        .map(|j| &j.check)
        .collect();
    Some((at, due))
}

/// Where to look for the next batch once the one at `at` has run. The sleep
/// runs on the monotonic clock, so the wall clock may read earlier than `at`.
fn resume_after(at: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    now.max(at)
}
