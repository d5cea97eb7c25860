use crate::activity::{ActivityReport, DailyStatus, Inactivity, InactivityStatus};
use crate::leetcode::DailyTarget;
use crate::notify::Email;

pub fn daily_reminder(target: &DailyTarget, statuses: &[DailyStatus]) -> Email {
    let pending: Vec<_> = statuses
        .iter()
        .filter(|s| !s.solved_today)
        .map(|s| s.subject.as_str())
        .collect();

    let mut body = String::from("Hey there!\n\nToday's LeetCode problem of the day:\n\n");
    body.push_str(&format!("📌 Title: {}\n", target.title));
    body.push_str(&format!("⚡ Difficulty: {}\n", target.difficulty));
    body.push_str(&format!("🔗 Link: {}\n", target.link));
    body.push_str("\nStill unsolved by:\n");
    for subject in &pending {
        body.push_str(&format!("  - {subject}\n"));
    }
    body.push_str("\nSolve it before the day is over!\n\n🚀 Happy coding!\n");

    Email {
        subject: format!("⚡ Solve today's LeetCode problem: {}", target.title),
        body,
    }
}

pub fn daily_done(target: &DailyTarget) -> Email {
    Email {
        subject: "✅ Problem of the day done, rest up!".to_string(),
        body: format!(
            "Great job!\n\nToday's LeetCode problem of the day ({}) is already solved.\n\
             No need to do it again. Enjoy the rest of the day 😎\n",
            target.title
        ),
    }
}

pub fn inactivity_alert(statuses: &[InactivityStatus], lookback_days: u32) -> Email {
    let mut body = String::from("Hey there!\n\nSome people have not been solving on LeetCode:\n\n");
    for status in statuses {
        match status.state {
            Inactivity::Active => {}
            Inactivity::Inactive { days: 0 } => {
                body.push_str(&format!("😡 {}: nothing solved today\n", status.subject));
            }
            Inactivity::Inactive { days } => {
                body.push_str(&format!(
                    "😡 {}: nothing solved for {}\n",
                    status.subject,
                    plural_days(days)
                ));
            }
            Inactivity::Never => {
                body.push_str(&format!(
                    "😡 {}: no recent accepted submissions\n",
                    status.subject
                ));
            }
        }
    }
    body.push_str("\n🚀 Start coding again today!\n");

    let subject = if lookback_days == 0 {
        "Time to get back to LeetCode 😡".to_string()
    } else {
        format!("Nothing solved in {} 😡", plural_days(i64::from(lookback_days)))
    };
    Email { subject, body }
}

/// Email for a report, if it calls for one.
pub fn render(
    report: &ActivityReport,
    target: Option<&DailyTarget>,
    lookback_days: u32,
    notify_when_done: bool,
) -> Option<Email> {
    match (report, target) {
        (ActivityReport::Daily(statuses), Some(target)) => {
            if !report.all_satisfied() {
                Some(daily_reminder(target, statuses))
            } else if notify_when_done {
                Some(daily_done(target))
            } else {
                None
            }
        }
        (ActivityReport::Daily(_), None) => None,
        (ActivityReport::Inactivity(statuses), _) => {
            (!report.all_satisfied()).then(|| inactivity_alert(statuses, lookback_days))
        }
    }
}

fn plural_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}
