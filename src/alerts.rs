use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, TimeZone};

use crate::error::AlertError;
use crate::models::{
    Alert, AlertKind, AlertPriority, AlertSummary, InternStatus, RosterEntry,
};

/// Largest number of remaining days that still counts as "ending soon".
pub const ENDING_SOON_DAYS: i64 = 3;
/// At or below this many remaining days an ending-soon alert is high priority.
pub const HIGH_PRIORITY_DAYS: i64 = 1;

/// Derives deadline alerts for every active intern in `roster`.
///
/// `now` is reduced to its calendar date in its own time zone before any
/// arithmetic, so any instant within the same day yields identical output.
/// Alerts keep the relative order of their source entries.
pub fn compute_alerts<Tz: TimeZone>(
    roster: &[RosterEntry],
    now: &DateTime<Tz>,
) -> Result<Vec<Alert>, AlertError> {
    compute_alerts_on(roster, now.date_naive())
}

pub fn compute_alerts_on(
    roster: &[RosterEntry],
    today: NaiveDate,
) -> Result<Vec<Alert>, AlertError> {
    let mut alerts = Vec::new();

    for entry in roster {
        if entry.status != InternStatus::Active {
            continue;
        }

        let end_date = parse_end_date(&entry.end_date, &entry.id)?;
        let remaining = days_left(end_date, today);

        if let Some((kind, priority)) = classify(remaining) {
            alerts.push(Alert {
                id: alert_id(&entry.id, kind),
                intern_id: entry.id.clone(),
                intern_name: entry.name.clone(),
                department_name: entry.department_name.clone(),
                end_date: entry.end_date.clone(),
                days_left: remaining,
                status: kind,
                priority,
            });
        }
    }

    tracing::debug!(
        roster = roster.len(),
        alerts = alerts.len(),
        %today,
        "computed deadline alerts"
    );
    Ok(alerts)
}

pub fn parse_end_date(raw: &str, intern_id: &str) -> Result<NaiveDate, AlertError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| AlertError::MalformedDate {
        intern_id: intern_id.to_string(),
        value: raw.to_string(),
    })
}

/// Whole calendar days from `today` until `end_date`; negative once it has passed.
pub fn days_left(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

pub fn classify(days_left: i64) -> Option<(AlertKind, AlertPriority)> {
    match days_left {
        d if d < 0 => Some((AlertKind::Overdue, AlertPriority::High)),
        d if d <= HIGH_PRIORITY_DAYS => Some((AlertKind::EndingSoon, AlertPriority::High)),
        d if d <= ENDING_SOON_DAYS => Some((AlertKind::EndingSoon, AlertPriority::Medium)),
        _ => None,
    }
}

pub fn alert_id(intern_id: &str, kind: AlertKind) -> String {
    match kind {
        AlertKind::Overdue => format!("alert_overdue_{intern_id}"),
        AlertKind::EndingSoon | AlertKind::Completed => format!("alert_{intern_id}"),
    }
}

/// Badge counts for `alerts`; anything whose id is not in `read` counts as unread.
pub fn summarize(alerts: &[Alert], read: &HashSet<String>) -> AlertSummary {
    let mut summary = AlertSummary {
        total: alerts.len(),
        ..AlertSummary::default()
    };

    for alert in alerts {
        match alert.status {
            AlertKind::EndingSoon => summary.ending_soon += 1,
            AlertKind::Overdue => summary.overdue += 1,
            AlertKind::Completed => {}
        }
        if alert.priority == AlertPriority::High {
            summary.high_priority += 1;
        }
        if !read.contains(&alert.id) {
            summary.unread += 1;
        }
    }

    summary
}

/// Drops alerts whose id the caller has already marked as handled.
pub fn without_dismissed(alerts: Vec<Alert>, dismissed: &HashSet<String>) -> Vec<Alert> {
    alerts
        .into_iter()
        .filter(|alert| !dismissed.contains(&alert.id))
        .collect()
}

fn plural_days(days: i64) -> String {
    if days == 1 {
        "1 day".to_string()
    } else {
        format!("{days} days")
    }
}

impl Alert {
    pub fn title(&self) -> &'static str {
        match self.status {
            AlertKind::EndingSoon => "Training Ending Soon",
            AlertKind::Overdue => "Training Overdue",
            AlertKind::Completed => "Training Handled",
        }
    }

    pub fn message(&self) -> String {
        match self.status {
            AlertKind::Overdue => format!(
                "{}'s training in {} is {} overdue",
                self.intern_name,
                self.department_name,
                plural_days(self.days_left.abs())
            ),
            AlertKind::EndingSoon | AlertKind::Completed => format!(
                "{}'s training in {} ends in {}",
                self.intern_name,
                self.department_name,
                plural_days(self.days_left)
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, FixedOffset, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn entry(id: &str, offset_days: i64, status: InternStatus) -> RosterEntry {
        RosterEntry {
            id: id.to_string(),
            name: format!("Intern {id}"),
            department_name: "Finance".to_string(),
            end_date: (today() + Duration::days(offset_days)).format("%Y-%m-%d").to_string(),
            status,
        }
    }

    fn active(id: &str, offset_days: i64) -> RosterEntry {
        entry(id, offset_days, InternStatus::Active)
    }

    #[test]
    fn three_days_out_is_medium_and_four_is_silent() {
        let alerts = compute_alerts_on(&[active("a", 3), active("b", 4)], today()).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].intern_id, "a");
        assert_eq!(alerts[0].status, AlertKind::EndingSoon);
        assert_eq!(alerts[0].priority, AlertPriority::Medium);
        assert_eq!(alerts[0].days_left, 3);
    }

    #[test]
    fn priority_flips_between_one_and_two_days() {
        let alerts = compute_alerts_on(&[active("a", 1), active("b", 2)], today()).unwrap();
        assert_eq!(alerts[0].priority, AlertPriority::High);
        assert_eq!(alerts[1].priority, AlertPriority::Medium);
        assert!(alerts.iter().all(|a| a.status == AlertKind::EndingSoon));
    }

    #[test]
    fn deadline_today_is_high_priority_ending_soon() {
        let alerts = compute_alerts_on(&[active("a", 0)], today()).unwrap();
        assert_eq!(alerts[0].days_left, 0);
        assert_eq!(alerts[0].status, AlertKind::EndingSoon);
        assert_eq!(alerts[0].priority, AlertPriority::High);
        assert_eq!(alerts[0].id, "alert_a");
    }

    #[test]
    fn past_deadline_is_overdue_and_high() {
        let alerts = compute_alerts_on(&[active("a", -2)], today()).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].status, AlertKind::Overdue);
        assert_eq!(alerts[0].priority, AlertPriority::High);
        assert_eq!(alerts[0].days_left, -2);
        assert_eq!(alerts[0].id, "alert_overdue_a");
    }

    #[test]
    fn inactive_interns_never_alert() {
        let roster = vec![
            entry("done", 1, InternStatus::Completed),
            entry("gone", -5, InternStatus::Terminated),
        ];
        assert!(compute_alerts_on(&roster, today()).unwrap().is_empty());
    }

    #[test]
    fn alerts_follow_roster_order() {
        let roster = vec![active("A", -4), active("B", 2), active("C", 30), active("D", -1)];
        let alerts = compute_alerts_on(&roster, today()).unwrap();
        let ids: Vec<&str> = alerts.iter().map(|a| a.intern_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "D"]);
    }

    #[test]
    fn same_calendar_day_gives_identical_output() {
        let roster = vec![active("a", -1), active("b", 0), active("c", 3)];
        let morning = Utc.with_ymd_and_hms(2026, 10, 16, 0, 5, 0).unwrap();
        let night = Utc.with_ymd_and_hms(2026, 10, 16, 23, 59, 59).unwrap();

        let first = compute_alerts(&roster, &morning).unwrap();
        let second = compute_alerts(&roster, &night).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&compute_alerts(&roster, &morning).unwrap()).unwrap()
        );
    }

    #[test]
    fn calendar_day_is_taken_in_the_callers_zone() {
        let roster = vec![active("a", 1)];
        // 2026-10-16 22:00 UTC is already 2026-10-17 in UTC+5.
        let east = FixedOffset::east_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 17, 3, 0, 0)
            .unwrap();
        let alerts = compute_alerts(&roster, &east).unwrap();
        assert_eq!(alerts[0].days_left, 0);
    }

    #[test]
    fn roster_is_left_untouched() {
        let roster = vec![active("a", -3), active("b", 10)];
        let before = roster.clone();
        let _ = compute_alerts_on(&roster, today()).unwrap();
        assert_eq!(roster, before);
    }

    #[test]
    fn alert_ids_are_stable_per_kind() {
        assert_eq!(alert_id("42", AlertKind::EndingSoon), "alert_42");
        assert_eq!(alert_id("42", AlertKind::Overdue), "alert_overdue_42");
        assert_eq!(alert_id("42", AlertKind::Overdue), alert_id("42", AlertKind::Overdue));
    }

    #[test]
    fn malformed_end_date_names_the_intern() {
        let mut bad = active("b", 1);
        bad.end_date = "2026-13-40".to_string();
        let roster = vec![active("a", 1), bad];

        let err = compute_alerts_on(&roster, today()).unwrap_err();
        match err {
            AlertError::MalformedDate { intern_id, value } => {
                assert_eq!(intern_id, "b");
                assert_eq!(value, "2026-13-40");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_dates_on_inactive_entries_are_not_inspected() {
        let mut bad = entry("x", 0, InternStatus::Completed);
        bad.end_date = "not a date".to_string();
        assert!(compute_alerts_on(&[bad], today()).unwrap().is_empty());
    }

    #[test]
    fn empty_roster_is_not_an_error() {
        assert!(compute_alerts_on(&[], today()).unwrap().is_empty());
    }

    #[test]
    fn summary_counts_kinds_and_priorities() {
        let roster = vec![active("a", -1), active("b", 1), active("c", 3)];
        let summary = summarize(&compute_alerts_on(&roster, today()).unwrap(), &HashSet::new());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.overdue, 1);
        assert_eq!(summary.ending_soon, 2);
        assert_eq!(summary.high_priority, 2);
        assert_eq!(summary.unread, 3);
    }

    #[test]
    fn reading_an_alert_keeps_it_listed_but_lowers_unread() {
        let roster = vec![active("a", -1), active("b", 1)];
        let alerts = compute_alerts_on(&roster, today()).unwrap();
        let read: HashSet<String> = ["alert_overdue_a".to_string()].into_iter().collect();

        let summary = summarize(&alerts, &read);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.unread, 1);

        let everything_read: HashSet<String> = alerts.iter().map(|a| a.id.clone()).collect();
        assert_eq!(summarize(&alerts, &everything_read).unread, 0);
        assert_eq!(without_dismissed(alerts, &HashSet::new()).len(), 2);
    }

    #[test]
    fn dismissed_alerts_are_filtered_in_order() {
        let roster = vec![active("a", -1), active("b", 1), active("c", 3)];
        let alerts = compute_alerts_on(&roster, today()).unwrap();
        let dismissed: HashSet<String> = ["alert_b".to_string()].into_iter().collect();

        let remaining = without_dismissed(alerts, &dismissed);
        let ids: Vec<&str> = remaining.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["alert_overdue_a", "alert_c"]);
    }

    #[test]
    fn dismissing_ending_soon_does_not_hide_later_overdue() {
        let dismissed: HashSet<String> = ["alert_a".to_string()].into_iter().collect();
        let later = today() + Duration::days(5);
        let alerts = compute_alerts_on(&[active("a", 1)], later).unwrap();
        assert_eq!(without_dismissed(alerts, &dismissed).len(), 1);
    }

    #[test]
    fn messages_use_singular_for_one_day() {
        let roster = vec![active("a", 1), active("b", -1), active("c", 2)];
        let alerts = compute_alerts_on(&roster, today()).unwrap();
        assert_eq!(alerts[0].title(), "Training Ending Soon");
        assert_eq!(alerts[0].message(), "Intern a's training in Finance ends in 1 day");
        assert_eq!(alerts[1].title(), "Training Overdue");
        assert_eq!(alerts[1].message(), "Intern b's training in Finance is 1 day overdue");
        assert_eq!(alerts[2].message(), "Intern c's training in Finance ends in 2 days");
    }
}
