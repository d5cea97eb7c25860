use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinSet;

use crate::activity::{self, ActivityReport, SubjectActivity};
use crate::config::{CheckConfig, CheckMode};
use crate::digest;
use crate::leetcode::{DailyTargetSource, SubmissionSource};
use crate::notify::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The problem of the day could not be fetched; nothing was evaluated.
    Skipped,
    AllSatisfied,
    Notified,
    NotifyFailed,
}

impl RunOutcome {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Skipped | Self::NotifyFailed)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Skipped => "skipped",
            Self::AllSatisfied => "nothing to report",
            Self::Notified => "notification sent",
            Self::NotifyFailed => "notification failed",
        };
        f.write_str(s)
    }
}

pub struct Checker {
    subjects: Vec<String>,
    submissions: Arc<dyn SubmissionSource>,
    targets: Arc<dyn DailyTargetSource>,
    notifier: Box<dyn Notifier>,
}

impl Checker {
    pub fn new(
        subjects: Vec<String>,
        submissions: Arc<dyn SubmissionSource>,
        targets: Arc<dyn DailyTargetSource>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            subjects,
            submissions,
            targets,
            notifier,
        }
    }

    /// Fetch every subject concurrently. Failures become empty event lists.
    async fn gather(&self) -> Vec<SubjectActivity> {
        let mut set = JoinSet::new();
        for (idx, subject) in self.subjects.iter().enumerate() {
            let source = self.submissions.clone();
            let subject = subject.clone();
            set.spawn(async move {
                let events = source.recent_solves(&subject).await;
                (idx, subject, events)
            });
        }

        let mut activity: Vec<SubjectActivity> = self
            .subjects
            .iter()
            .map(|s| SubjectActivity::new(s.clone(), Vec::new()))
            .collect();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((idx, _, Ok(events))) => {
                    tracing::debug!("{}: {} recent solves", activity[idx].subject, events.len());
                    activity[idx].events = events;
                }
                Ok((_, subject, Err(e))) => {
                    tracing::warn!("Treating {subject} as having no data: {e:#}");
                }
                Err(e) => tracing::warn!("Submission fetch task failed: {e}"),
            }
        }
        activity
    }

    pub async fn run(&self, check: &CheckConfig, now: DateTime<Utc>) -> RunOutcome {
        tracing::info!("Running check '{}' ({:?})", check.name, check.mode);

        let (report, target) = match check.mode {
            CheckMode::DailyTarget => {
                let target = match self.targets.daily_target().await {
                    Ok(t) => t,
                    Err(e) => {
                        tracing::error!("Skipping '{}', could not fetch POTD: {e:#}", check.name);
                        return RunOutcome::Skipped;
                    }
                };
                tracing::info!("POTD {}: {} ({})", target.date, target.title, target.difficulty);
                let activity = self.gather().await;
                let statuses = activity::evaluate_daily_target(&activity, &target.slug, now);
                for s in &statuses {
                    tracing::info!("{} solved today: {}", s.subject, s.solved_today);
                }
                (ActivityReport::Daily(statuses), Some(target))
            }
            CheckMode::Inactivity => {
                let activity = self.gather().await;
                let statuses = activity::evaluate_inactivity(&activity, now, check.lookback_days);
                for s in &statuses {
                    tracing::info!("{}: {:?}", s.subject, s.state);
                }
                (ActivityReport::Inactivity(statuses), None)
            }
        };

        let unsatisfied = report.unsatisfied();
        if unsatisfied.is_empty() {
            tracing::info!("All subjects are on track");
        } else {
            tracing::info!("Needs a nudge: {}", unsatisfied.join(", "));
        }

        let Some(email) = digest::render(
            &report,
            target.as_ref(),
            check.lookback_days,
            check.notify_when_done,
        ) else {
            return RunOutcome::AllSatisfied;
        };

        match self.notifier.send(&email).await {
            Ok(()) => {
                tracing::info!("Sent '{}' via {}", email.subject, self.notifier.name());
                RunOutcome::Notified
            }
            Err(e) => {
                tracing::error!("Failed to send via {}: {e:#}", self.notifier.name());
                RunOutcome::NotifyFailed
            }
        }
    }
}
