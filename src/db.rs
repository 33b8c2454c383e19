use anyhow::Context;
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{AbsenceRecord, LeaveStatus};
use crate::normalize::{parse_row, LeaveRow};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

async fn upsert_employee(
    pool: &PgPool,
    full_name: &str,
    email: &str,
    manager_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO team_absence.employees (id, full_name, email, manager_id)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name,
            manager_id = COALESCE(EXCLUDED.manager_id, team_absence.employees.manager_id)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(full_name)
    .bind(email)
    .bind(manager_id)
    .fetch_one(pool)
    .await?
    .get("id");

    Ok(id)
}

/// Creates the manager if missing; an existing row keeps its name.
const ENSURE_MANAGER_SQL: &str = r#"
    INSERT INTO team_absence.employees (id, full_name, email, manager_id)
    VALUES ($1, $2, $2, NULL)
    ON CONFLICT (email) DO UPDATE
    SET email = team_absence.employees.email
    RETURNING id
"#;

async fn ensure_manager(pool: &PgPool, manager_email: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(ENSURE_MANAGER_SQL)
        .bind(Uuid::new_v4())
        .bind(manager_email)
        .fetch_one(pool)
        .await?
        .get("id");

    Ok(id)
}

/// Inserts a request unless its source key is already present.
async fn insert_leave(
    pool: &PgPool,
    employee_id: Uuid,
    record: &AbsenceRecord,
    source_key: &str,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO team_absence.leave_requests
        (id, employee_id, start_date, end_date, created_at, status, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(employee_id)
    .bind(record.start_date)
    .bind(record.end_date)
    .bind(record.created_at)
    .bind(record.status.as_str())
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn seed(pool: &PgPool, today: NaiveDate) -> anyhow::Result<usize> {
    let manager_id = upsert_employee(pool, "Dana Okafor", "dana.okafor@hrplus.example", None).await?;

    let this_monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    // (weeks back, day offset from Monday, notice days, status)
    let reports: Vec<(&str, &str, Vec<(i64, i64, i64, LeaveStatus)>)> = vec![
        (
            "Avery Lee",
            "avery.lee@hrplus.example",
            vec![
                (1, 0, 0, LeaveStatus::Approved),
                (3, 0, 1, LeaveStatus::Approved),
                (5, 0, 1, LeaveStatus::Approved),
                (8, 0, 0, LeaveStatus::Approved),
                (11, 2, 14, LeaveStatus::Approved),
                (15, 0, 0, LeaveStatus::Approved),
            ],
        ),
        (
            "Jules Moreno",
            "jules.moreno@hrplus.example",
            vec![
                (0, 4, 10, LeaveStatus::Pending),
                (2, 4, 12, LeaveStatus::Approved),
                (6, 4, 21, LeaveStatus::Approved),
                (9, 1, 30, LeaveStatus::Approved),
            ],
        ),
        (
            "Kiara Patel",
            "kiara.patel@hrplus.example",
            vec![
                (1, 2, 30, LeaveStatus::Approved),
                (12, 3, 45, LeaveStatus::Approved),
            ],
        ),
        (
            "Sam Whitfield",
            "sam.whitfield@hrplus.example",
            vec![(18, 1, 60, LeaveStatus::Rejected)],
        ),
    ];

    let mut inserted = 0usize;
    for (name, email, leave) in reports {
        let employee_id = upsert_employee(pool, name, email, Some(manager_id)).await?;

        for (index, (weeks_back, day_offset, notice_days, status)) in leave.into_iter().enumerate() {
            let start_date = this_monday - Duration::weeks(weeks_back) + Duration::days(day_offset);
            let created_at: DateTime<Utc> = (start_date - Duration::days(notice_days))
                .and_time(NaiveTime::from_hms_opt(9, 0, 0).context("invalid time")?)
                .and_utc();
            let record = AbsenceRecord {
                employee_id: employee_id.to_string(),
                employee_name: name.to_string(),
                start_date,
                end_date: start_date,
                created_at,
                status,
            };
            let source_key = format!("seed-{email}-{index:02}");
            if insert_leave(pool, employee_id, &record, &source_key).await? {
                inserted += 1;
            }
        }
    }

    Ok(inserted)
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    pub duplicates: usize,
    pub skipped: usize,
}

pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    manager_email: &str,
) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let manager_id = ensure_manager(pool, manager_email).await?;
    let mut summary = ImportSummary::default();

    for (index, result) in reader.deserialize::<LeaveRow>().enumerate() {
        let row = result.with_context(|| format!("malformed CSV row {}", index + 1))?;
        let record = match parse_row(&row) {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(row = index + 1, %err, "skipping leave row");
                summary.skipped += 1;
                continue;
            }
        };

        let email = row
            .employee_email
            .as_deref()
            .unwrap_or(record.employee_id.as_str());
        let employee_id =
            upsert_employee(pool, &record.employee_name, email, Some(manager_id)).await?;
        let source_key = row.source_key.clone().unwrap_or_else(|| {
            format!(
                "import-{}-{}-{}",
                record.employee_id,
                record.start_date,
                record.created_at.timestamp()
            )
        });

        if insert_leave(pool, employee_id, &record, &source_key).await? {
            summary.inserted += 1;
        } else {
            summary.duplicates += 1;
        }
    }

    Ok(summary)
}

pub async fn fetch_team_records(
    pool: &PgPool,
    manager_email: &str,
    since_date: NaiveDate,
) -> anyhow::Result<Vec<AbsenceRecord>> {
    let rows = sqlx::query(
        r#"
        SELECT e.id AS employee_id, e.full_name, l.start_date, l.end_date, l.created_at, l.status
        FROM team_absence.leave_requests l
        JOIN team_absence.employees e ON e.id = l.employee_id
        JOIN team_absence.employees m ON m.id = e.manager_id
        WHERE m.email = $1 AND l.start_date >= $2
        ORDER BY l.start_date DESC
        "#,
    )
    .bind(manager_email)
    .bind(since_date)
    .fetch_all(pool)
    .await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let employee_id: Uuid = row.get("employee_id");
        let status: String = row.get("status");
        let Some(status) = LeaveStatus::parse(&status) else {
            tracing::warn!(%employee_id, %status, "skipping leave request with unknown status");
            continue;
        };

        records.push(AbsenceRecord {
            employee_id: employee_id.to_string(),
            employee_name: row.get("full_name"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            created_at: row.get("created_at"),
            status,
        });
    }

    Ok(records)
}

pub async fn count_direct_reports(pool: &PgPool, manager_email: &str) -> anyhow::Result<usize> {
    let count: i64 = sqlx::query(
        r#"
        SELECT COUNT(*) AS reports
        FROM team_absence.employees e
        JOIN team_absence.employees m ON m.id = e.manager_id
        WHERE m.email = $1
        "#,
    )
    .bind(manager_email)
    .fetch_one(pool)
    .await?
    .get("reports");

    Ok(usize::try_from(count)?)
}
