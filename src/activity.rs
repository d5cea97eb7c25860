use chrono::{DateTime, Utc};

pub const SECS_PER_DAY: i64 = 86_400;

/// One accepted submission: which problem, and when (epoch seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveEvent {
    pub problem: String,
    pub solved_at: i64,
}

/// Recent solves of one tracked subject. An empty list means "no data",
/// whether the subject never solved anything or the fetch failed.
#[derive(Debug, Clone, Default)]
pub struct SubjectActivity {
    pub subject: String,
    pub events: Vec<SolveEvent>,
}

impl SubjectActivity {
    pub fn new(subject: impl Into<String>, events: Vec<SolveEvent>) -> Self {
        Self {
            subject: subject.into(),
            events,
        }
    }

    pub fn last_solved(&self) -> Option<i64> {
        self.events.iter().map(|e| e.solved_at).max()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStatus {
    pub subject: String,
    pub solved_today: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inactivity {
    Active,
    Inactive { days: i64 },
    /// No solve on record at all.
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactivityStatus {
    pub subject: String,
    pub state: Inactivity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityReport {
    Daily(Vec<DailyStatus>),
    Inactivity(Vec<InactivityStatus>),
}

impl ActivityReport {
    /// Subjects that still need a nudge, in report order.
    pub fn unsatisfied(&self) -> Vec<&str> {
        match self {
            Self::Daily(statuses) => statuses
                .iter()
                .filter(|s| !s.solved_today)
                .map(|s| s.subject.as_str())
                .collect(),
            Self::Inactivity(statuses) => statuses
                .iter()
                .filter(|s| s.state != Inactivity::Active)
                .map(|s| s.subject.as_str())
                .collect(),
        }
    }

    pub fn all_satisfied(&self) -> bool {
        self.unsatisfied().is_empty()
    }
}

/// UTC midnight of `now`'s calendar date, moved back `days_back` whole days.
pub fn midnight(now: DateTime<Utc>, days_back: u32) -> i64 {
    let secs = now.timestamp();
    secs - secs.rem_euclid(SECS_PER_DAY) - i64::from(days_back) * SECS_PER_DAY
}

pub fn evaluate_daily_target(
    activity: &[SubjectActivity],
    target: &str,
    now: DateTime<Utc>,
) -> Vec<DailyStatus> {
    let boundary = midnight(now, 0);
    activity
        .iter()
        .map(|a| DailyStatus {
            subject: a.subject.clone(),
            solved_today: a
                .events
                .iter()
                .any(|e| e.solved_at >= boundary && e.problem == target),
        })
        .collect()
}

pub fn evaluate_inactivity(
    activity: &[SubjectActivity],
    now: DateTime<Utc>,
    lookback_days: u32,
) -> Vec<InactivityStatus> {
    let today = midnight(now, 0);
    let cutoff = midnight(now, lookback_days);
    activity
        .iter()
        .map(|a| {
            let state = match a.last_solved() {
                None => Inactivity::Never,
                // Strictly before the cutoff; a solve exactly on it is active.
                Some(last) if last < cutoff => Inactivity::Inactive {
                    days: today.saturating_sub(last).div_euclid(SECS_PER_DAY),
                },
                Some(_) => Inactivity::Active,
            };
            InactivityStatus {
                subject: a.subject.clone(),
                state,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const TARGET: &str = "two-sum";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()
    }

    fn event(problem: &str, solved_at: i64) -> SolveEvent {
        SolveEvent {
            problem: problem.to_string(),
            solved_at,
        }
    }

    fn single(subject: &str, events: Vec<SolveEvent>) -> Vec<SubjectActivity> {
        vec![SubjectActivity::new(subject, events)]
    }

    #[test]
    fn test_midnight_truncates_utc_day() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap().timestamp();
        assert_eq!(midnight(now(), 0), expected);
        assert_eq!(midnight(now(), 3), expected - 3 * SECS_PER_DAY);
    }

    #[test]
    fn test_midnight_at_exact_boundary() {
        let at = Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap();
        assert_eq!(midnight(at, 0), at.timestamp());
    }

    #[test]
    fn test_midnight_before_epoch() {
        let at = Utc.with_ymd_and_hms(1969, 12, 31, 23, 0, 0).unwrap();
        assert_eq!(midnight(at, 0), -SECS_PER_DAY);
    }

    #[test]
    fn test_daily_empty_events_unsolved() {
        let statuses = evaluate_daily_target(&single("alice", vec![]), TARGET, now());
        assert_eq!(statuses.len(), 1);
        assert!(!statuses[0].solved_today);
    }

    #[test]
    fn test_daily_solve_one_second_before_boundary_is_yesterday() {
        let m = midnight(now(), 0);
        let activity = single("alice", vec![event(TARGET, m - 1)]);
        let statuses = evaluate_daily_target(&activity, TARGET, now());
        assert!(!statuses[0].solved_today);
    }

    #[test]
    fn test_daily_solve_at_boundary_counts() {
        let m = midnight(now(), 0);
        let activity = single("alice", vec![event(TARGET, m)]);
        let statuses = evaluate_daily_target(&activity, TARGET, now());
        assert!(statuses[0].solved_today);
    }

    #[test]
    fn test_daily_solve_after_boundary_counts() {
        let m = midnight(now(), 0);
        let statuses =
            evaluate_daily_target(&single("alice", vec![event(TARGET, m + 10)]), TARGET, now());
        assert!(statuses[0].solved_today);
    }

    #[test]
    fn test_daily_other_problem_today_does_not_count() {
        let m = midnight(now(), 0);
        let events = vec![event("add-two-numbers", m + 60), event(TARGET, m - 60)];
        let statuses = evaluate_daily_target(&single("alice", events), TARGET, now());
        assert!(!statuses[0].solved_today);
    }

    #[test]
    fn test_daily_preserves_subject_order() {
        let m = midnight(now(), 0);
        let activity = vec![
            SubjectActivity::new("bob", vec![event(TARGET, m + 5)]),
            SubjectActivity::new("alice", vec![]),
        ];
        let statuses = evaluate_daily_target(&activity, TARGET, now());
        assert_eq!(statuses[0].subject, "bob");
        assert!(statuses[0].solved_today);
        assert_eq!(statuses[1].subject, "alice");
        assert!(!statuses[1].solved_today);
    }

    #[test]
    fn test_inactivity_empty_events_never() {
        let statuses = evaluate_inactivity(&single("alice", vec![]), now(), 0);
        assert_eq!(statuses[0].state, Inactivity::Never);
        let statuses = evaluate_inactivity(&single("alice", vec![]), now(), 3);
        assert_eq!(statuses[0].state, Inactivity::Never);
    }

    #[test]
    fn test_inactivity_three_subjects() {
        let m = midnight(now(), 0);
        let activity = vec![
            SubjectActivity::new("ghost", vec![]),
            SubjectActivity::new("stale", vec![event("a", m - 2 * SECS_PER_DAY)]),
            SubjectActivity::new("busy", vec![event("b", m + 100)]),
        ];
        let statuses = evaluate_inactivity(&activity, now(), 0);
        assert_eq!(statuses[0].state, Inactivity::Never);
        assert_eq!(statuses[1].state, Inactivity::Inactive { days: 2 });
        assert_eq!(statuses[2].state, Inactivity::Active);

        let report = ActivityReport::Inactivity(statuses);
        assert_eq!(report.unsatisfied(), vec!["ghost", "stale"]);
    }

    #[test]
    fn test_inactivity_solve_on_cutoff_is_active() {
        let cutoff = midnight(now(), 3);
        let statuses =
            evaluate_inactivity(&single("alice", vec![event("a", cutoff)]), now(), 3);
        assert_eq!(statuses[0].state, Inactivity::Active);

        let statuses =
            evaluate_inactivity(&single("alice", vec![event("a", cutoff - 1)]), now(), 3);
        assert_eq!(statuses[0].state, Inactivity::Inactive { days: 3 });
    }

    #[test]
    fn test_inactivity_uses_latest_event() {
        let m = midnight(now(), 0);
        let events = vec![
            event("a", m - 10 * SECS_PER_DAY),
            event("b", m - SECS_PER_DAY / 2),
            event("c", m - 5 * SECS_PER_DAY),
        ];
        let statuses = evaluate_inactivity(&single("alice", events), now(), 0);
        // Last solve was yesterday afternoon: less than a whole day before midnight.
        assert_eq!(statuses[0].state, Inactivity::Inactive { days: 0 });
    }

    #[test]
    fn test_inactive_implies_before_cutoff() {
        let m = midnight(now(), 0);
        let offsets = [-9, -4, -3, -2, -1, 0, 1];
        for lookback in [0u32, 1, 3, 7] {
            let cutoff = midnight(now(), lookback);
            for day in offsets {
                for shift in [-1, 0, 1] {
                    let last = m + day * SECS_PER_DAY + shift;
                    let statuses =
                        evaluate_inactivity(&single("s", vec![event("p", last)]), now(), lookback);
                    match statuses[0].state {
                        Inactivity::Inactive { days } => {
                            assert!(last < cutoff);
                            assert!(days >= i64::from(lookback));
                        }
                        Inactivity::Active => assert!(last >= cutoff),
                        Inactivity::Never => panic!("subject has events"),
                    }
                }
            }
        }
    }

    #[test]
    fn test_inactivity_extreme_timestamps_do_not_overflow() {
        let statuses = evaluate_inactivity(&single("alice", vec![event("a", i64::MIN)]), now(), 0);
        assert_eq!(
            statuses[0].state,
            Inactivity::Inactive {
                days: i64::MAX.div_euclid(SECS_PER_DAY)
            }
        );

        let statuses = evaluate_inactivity(&single("alice", vec![event("a", i64::MAX)]), now(), 0);
        assert_eq!(statuses[0].state, Inactivity::Active);

        let statuses =
            evaluate_daily_target(&single("alice", vec![event(TARGET, i64::MIN)]), TARGET, now());
        assert!(!statuses[0].solved_today);
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let m = midnight(now(), 0);
        let activity = vec![
            SubjectActivity::new("a", vec![event(TARGET, m + 1)]),
            SubjectActivity::new("b", vec![event("x", m - 4 * SECS_PER_DAY)]),
        ];
        assert_eq!(
            evaluate_daily_target(&activity, TARGET, now()),
            evaluate_daily_target(&activity, TARGET, now())
        );
        assert_eq!(
            evaluate_inactivity(&activity, now(), 3),
            evaluate_inactivity(&activity, now(), 3)
        );
    }

    #[test]
    fn test_daily_report_unsatisfied() {
        let report = ActivityReport::Daily(vec![
            DailyStatus {
                subject: "a".into(),
                solved_today: true,
            },
            DailyStatus {
                subject: "b".into(),
                solved_today: false,
            },
        ]);
        assert_eq!(report.unsatisfied(), vec!["b"]);
        assert!(!report.all_satisfied());
    }
}
