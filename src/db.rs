use std::collections::HashSet;
use std::io::Read;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::alerts;
use crate::models::{InternStatus, RosterEntry};

/// A validated intern row ready to be written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIntern {
    pub id: String,
    pub name: String,
    pub email: String,
    pub department_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: NaiveDate,
    pub status: InternStatus,
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("schema migrations applied");
    Ok(())
}

/// Loads the demo roster with end dates relative to `today`.
pub async fn seed(pool: &PgPool, today: NaiveDate) -> anyhow::Result<()> {
    let interns = vec![
        (
            "1",
            "Sarah Johnson",
            "sarah.johnson@email.com",
            "Information Technology",
            -90,
            3,
            InternStatus::Active,
        ),
        (
            "2",
            "Michael Chen",
            "michael.chen@email.com",
            "Finance",
            -90,
            2,
            InternStatus::Active,
        ),
        (
            "3",
            "Emily Davis",
            "emily.davis@email.com",
            "Human Resources",
            -120,
            -10,
            InternStatus::Completed,
        ),
        (
            "4",
            "James Wilson",
            "james.wilson@email.com",
            "Marketing",
            -95,
            -1,
            InternStatus::Active,
        ),
        (
            "5",
            "Priya Raman",
            "priya.raman@email.com",
            "Legal",
            -30,
            45,
            InternStatus::Active,
        ),
    ];

    for (id, name, email, department, start_offset, end_offset, status) in interns {
        let intern = NewIntern {
            id: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            department_name: department.to_string(),
            start_date: Some(today + Duration::days(start_offset)),
            end_date: today + Duration::days(end_offset),
            status,
        };
        upsert_intern(pool, &intern).await?;
    }

    tracing::info!(%today, "seed roster written");
    Ok(())
}

async fn upsert_intern<'e, E>(executor: E, intern: &NewIntern) -> anyhow::Result<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO internship_alerts.interns
        (id, full_name, email, department_name, start_date, end_date, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (id) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            email = EXCLUDED.email,
            department_name = EXCLUDED.department_name,
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            status = EXCLUDED.status
        "#,
    )
    .bind(&intern.id)
    .bind(&intern.name)
    .bind(&intern.email)
    .bind(&intern.department_name)
    .bind(intern.start_date)
    .bind(intern.end_date)
    .bind(intern.status.as_str())
    .execute(executor)
    .await
    .with_context(|| format!("failed to write intern {}", intern.id))?;
    Ok(())
}

/// Parses and validates a roster CSV. The first bad row aborts with its line number.
pub fn parse_roster_csv<R: Read>(input: R) -> anyhow::Result<Vec<NewIntern>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        id: Option<String>,
        name: String,
        email: Option<String>,
        department_name: Option<String>,
        start_date: Option<String>,
        end_date: String,
        status: Option<String>,
    }

    fn non_empty(value: Option<String>) -> Option<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    let mut reader = csv::Reader::from_reader(input);
    let mut interns = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = result.with_context(|| format!("line {line}: unreadable row"))?;

        let name = row.name.trim().to_string();
        anyhow::ensure!(!name.is_empty(), "line {line}: name must not be empty");

        let id = non_empty(row.id).unwrap_or_else(|| Uuid::new_v4().to_string());
        let end_date = alerts::parse_end_date(&row.end_date, &id)
            .with_context(|| format!("line {line}: invalid end_date"))?;
        let start_date = match non_empty(row.start_date) {
            Some(raw) => Some(
                NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                    .with_context(|| format!("line {line}: invalid start_date {raw:?}"))?,
            ),
            None => None,
        };
        if let Some(start) = start_date {
            anyhow::ensure!(
                start <= end_date,
                "line {line}: start_date {start} is after end_date {end_date}"
            );
        }
        let status = match non_empty(row.status) {
            Some(raw) => raw
                .parse::<InternStatus>()
                .with_context(|| format!("line {line}: invalid status"))?,
            None => InternStatus::Active,
        };

        interns.push(NewIntern {
            id,
            name,
            email: non_empty(row.email).unwrap_or_default(),
            department_name: non_empty(row.department_name).unwrap_or_default(),
            start_date,
            end_date,
            status,
        });
    }

    Ok(interns)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let interns = parse_roster_csv(file)?;

    let mut tx = pool.begin().await?;
    for intern in &interns {
        upsert_intern(&mut *tx, intern).await?;
    }
    tx.commit().await?;

    tracing::info!(path = %csv_path.display(), count = interns.len(), "roster imported");
    Ok(interns.len())
}

/// Reads the roster in insertion order with a single statement.
pub async fn fetch_roster(
    pool: &PgPool,
    department: Option<&str>,
) -> anyhow::Result<Vec<RosterEntry>> {
    let mut query = String::from(
        "SELECT id, full_name, department_name, \
         to_char(end_date, 'YYYY-MM-DD') AS end_date, status \
         FROM internship_alerts.interns",
    );

    if department.is_some() {
        query.push_str(" WHERE department_name = $1");
    }
    query.push_str(" ORDER BY seq");

    let mut rows = sqlx::query(&query);
    if let Some(value) = department {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut roster = Vec::with_capacity(records.len());

    for row in records {
        let status: String = row.get("status");
        roster.push(RosterEntry {
            id: row.get("id"),
            name: row.get("full_name"),
            department_name: row.get("department_name"),
            end_date: row.get("end_date"),
            status: status.parse()?,
        });
    }

    tracing::debug!(entries = roster.len(), department, "roster snapshot loaded");
    Ok(roster)
}

pub async fn set_status(
    pool: &PgPool,
    intern_id: &str,
    status: InternStatus,
) -> anyhow::Result<()> {
    let result = sqlx::query("UPDATE internship_alerts.interns SET status = $1 WHERE id = $2")
        .bind(status.as_str())
        .bind(intern_id)
        .execute(pool)
        .await?;

    anyhow::ensure!(result.rows_affected() > 0, "no intern with id {intern_id}");
    tracing::info!(intern_id, %status, "intern status changed");
    Ok(())
}

/// Records an alert as handled. Returns false if it was already dismissed.
pub async fn dismiss_alert(pool: &PgPool, alert_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO internship_alerts.dismissed_alerts (alert_id)
        VALUES ($1)
        ON CONFLICT (alert_id) DO NOTHING
        "#,
    )
    .bind(alert_id)
    .execute(pool)
    .await?;

    let inserted = result.rows_affected() > 0;
    tracing::info!(alert_id, inserted, "alert dismissed");
    Ok(inserted)
}

/// Makes a dismissed alert visible again. Returns false if it was not dismissed.
pub async fn restore_alert(pool: &PgPool, alert_id: &str) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM internship_alerts.dismissed_alerts WHERE alert_id = $1")
        .bind(alert_id)
        .execute(pool)
        .await?;

    let removed = result.rows_affected() > 0;
    tracing::info!(alert_id, removed, "alert restored");
    Ok(removed)
}

pub async fn fetch_dismissed(pool: &PgPool) -> anyhow::Result<HashSet<String>> {
    let rows = sqlx::query("SELECT alert_id FROM internship_alerts.dismissed_alerts")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| row.get::<String, _>("alert_id"))
        .collect())
}

/// Marks alerts as seen without hiding them. Returns how many were newly marked.
pub async fn mark_read(pool: &PgPool, alert_ids: &[String]) -> anyhow::Result<u64> {
    let result = sqlx::query(
        r#"
        INSERT INTO internship_alerts.read_alerts (alert_id)
        SELECT UNNEST($1::text[])
        ON CONFLICT (alert_id) DO NOTHING
        "#,
    )
    .bind(alert_ids)
    .execute(pool)
    .await?;

    tracing::info!(requested = alert_ids.len(), marked = result.rows_affected(), "alerts read");
    Ok(result.rows_affected())
}

pub async fn fetch_read(pool: &PgPool) -> anyhow::Result<HashSet<String>> {
    let rows = sqlx::query("SELECT alert_id FROM internship_alerts.read_alerts")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| row.get::<String, _>("alert_id"))
        .collect())
}
