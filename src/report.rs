use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{Alert, AlertKind, AlertSummary};

pub fn build_report(
    department: Option<&str>,
    today: NaiveDate,
    alerts: &[Alert],
    summary: &AlertSummary,
) -> String {
    let mut output = String::new();
    let department_label = department.unwrap_or("all departments");

    let _ = writeln!(output, "# Training Deadline Report");
    let _ = writeln!(
        output,
        "Generated for {} as of {}",
        department_label, today
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- {} open alerts", summary.total);
    let _ = writeln!(output, "- {} overdue", summary.overdue);
    let _ = writeln!(output, "- {} ending soon", summary.ending_soon);
    let _ = writeln!(output, "- {} high priority", summary.high_priority);
    let _ = writeln!(output, "- {} unread", summary.unread);

    write_section(&mut output, "Overdue", AlertKind::Overdue, alerts);
    write_section(&mut output, "Ending Soon", AlertKind::EndingSoon, alerts);

    output
}

fn write_section(output: &mut String, heading: &str, kind: AlertKind, alerts: &[Alert]) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {heading}");

    let mut listed = 0usize;
    for alert in alerts.iter().filter(|alert| alert.status == kind) {
        let _ = writeln!(
            output,
            "- [{}] {} (end date {})",
            alert.priority,
            alert.message(),
            alert.end_date
        );
        listed += 1;
    }

    if listed == 0 {
        let _ = writeln!(output, "No interns in this state.");
    }
}
