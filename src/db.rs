use std::collections::HashMap;

use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{
    derive_initials, Group, GroupKind, Roster, SchoolGroup, SchoolGroupType, Student,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Loads groups, students and school groups as one snapshot, in insertion order.
pub async fn fetch_roster(pool: &PgPool) -> anyhow::Result<Roster> {
    let mut tx = pool.begin().await?;

    let group_rows = sqlx::query(
        "SELECT id, name, kind FROM roster_dashboard.groups ORDER BY position",
    )
    .fetch_all(&mut *tx)
    .await?;

    let mut groups = Vec::with_capacity(group_rows.len());
    for row in group_rows {
        let kind: String = row.get("kind");
        groups.push(Group {
            id: row.get("id"),
            name: row.get("name"),
            kind: kind
                .parse::<GroupKind>()
                .with_context(|| format!("group {} has an invalid kind", row.get::<String, _>("id")))?,
        });
    }

    let membership_rows = sqlx::query(
        "SELECT student_id, group_id FROM roster_dashboard.student_groups \
         ORDER BY student_id, position, group_id",
    )
    .fetch_all(&mut *tx)
    .await?;

    let mut memberships: HashMap<String, Vec<String>> = HashMap::new();
    for row in membership_rows {
        memberships
            .entry(row.get("student_id"))
            .or_default()
            .push(row.get("group_id"));
    }

    let student_rows = sqlx::query(
        r#"
        SELECT id, first_name, last_name, initials, status, is_online,
               lessons_complete, help_requests, submissions, tasks,
               last_submission_at, last_help_request_at
        FROM roster_dashboard.students
        ORDER BY position
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    let mut students = Vec::with_capacity(student_rows.len());
    for row in student_rows {
        let id: String = row.get("id");
        students.push(Student {
            group_ids: memberships.remove(&id).unwrap_or_default(),
            id,
            first_name: row.get("first_name"),
            last_name: row.get("last_name"),
            initials: row.get("initials"),
            status: row.get("status"),
            is_online: row.get("is_online"),
            lessons_complete: count(&row, "lessons_complete"),
            help_requests: count(&row, "help_requests"),
            submissions: count(&row, "submissions"),
            tasks: count(&row, "tasks"),
            last_submission_at: row.get("last_submission_at"),
            last_help_request_at: row.get("last_help_request_at"),
        });
    }

    let school_group_rows = sqlx::query(
        r#"
        SELECT id, name, group_type, student_count, members, is_mine
        FROM roster_dashboard.school_groups
        ORDER BY position
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    let mut school_groups = Vec::with_capacity(school_group_rows.len());
    for row in school_group_rows {
        let group_type: String = row.get("group_type");
        school_groups.push(SchoolGroup {
            id: row.get("id"),
            name: row.get("name"),
            group_type: group_type.parse::<SchoolGroupType>()?,
            student_count: count(&row, "student_count"),
            members: row.get("members"),
            is_mine: row.get("is_mine"),
        });
    }

    tx.commit().await?;

    info!(
        students = students.len(),
        groups = groups.len(),
        school_groups = school_groups.len(),
        "roster loaded from database"
    );

    Ok(Roster {
        groups,
        students,
        school_groups,
    })
}

fn count(row: &PgRow, column: &str) -> u32 {
    let value: Option<i32> = row.get(column);
    value.and_then(|v| u32::try_from(v).ok()).unwrap_or(0)
}

#[derive(Debug, serde::Deserialize)]
pub struct CsvStudentRow {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub initials: Option<String>,
    pub status: Option<String>,
    pub is_online: Option<bool>,
    pub lessons_complete: Option<u32>,
    pub help_requests: Option<u32>,
    pub submissions: Option<u32>,
    pub tasks: Option<u32>,
    pub last_submission_at: Option<DateTime<Utc>>,
    pub last_help_request_at: Option<DateTime<Utc>>,
    /// Semicolon separated group ids.
    pub groups: Option<String>,
}

impl CsvStudentRow {
    pub fn into_student(self) -> Student {
        let initials = self
            .initials
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| derive_initials(&self.first_name, &self.last_name));

        Student {
            id: self
                .id
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| format!("import-{}", Uuid::new_v4())),
            initials,
            group_ids: split_group_ids(self.groups.as_deref().unwrap_or_default()),
            first_name: self.first_name,
            last_name: self.last_name,
            status: self.status.unwrap_or_default(),
            is_online: self.is_online.unwrap_or(false),
            lessons_complete: self.lessons_complete.unwrap_or(0),
            help_requests: self.help_requests.unwrap_or(0),
            submissions: self.submissions.unwrap_or(0),
            tasks: self.tasks.unwrap_or(0),
            last_submission_at: self.last_submission_at,
            last_help_request_at: self.last_help_request_at,
        }
    }
}

pub fn split_group_ids(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(';').map(str::trim).filter(|id| !id.is_empty()) {
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

fn to_db_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Tally of an import: rows that were new versus rows that replaced an existing id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub updated: usize,
}

impl ImportSummary {
    pub fn record(&mut self, was_insert: bool) {
        if was_insert {
            self.inserted += 1;
        } else {
            self.updated += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

impl std::fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} new, {} updated", self.inserted, self.updated)
    }
}

/// Upserts one student and replaces its memberships. Returns true for a new row.
async fn upsert_student(
    tx: &mut Transaction<'_, Postgres>,
    student: &Student,
) -> anyhow::Result<bool> {
    // xmax is zero only for a freshly inserted tuple.
    let was_insert: bool = sqlx::query_scalar(
        r#"
        INSERT INTO roster_dashboard.students
        (id, first_name, last_name, initials, status, is_online,
         lessons_complete, help_requests, submissions, tasks,
         last_submission_at, last_help_request_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (id) DO UPDATE
        SET first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            initials = EXCLUDED.initials,
            status = EXCLUDED.status,
            is_online = EXCLUDED.is_online,
            lessons_complete = EXCLUDED.lessons_complete,
            help_requests = EXCLUDED.help_requests,
            submissions = EXCLUDED.submissions,
            tasks = EXCLUDED.tasks,
            last_submission_at = EXCLUDED.last_submission_at,
            last_help_request_at = EXCLUDED.last_help_request_at
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&student.id)
    .bind(&student.first_name)
    .bind(&student.last_name)
    .bind(&student.initials)
    .bind(&student.status)
    .bind(student.is_online)
    .bind(to_db_count(student.lessons_complete))
    .bind(to_db_count(student.help_requests))
    .bind(to_db_count(student.submissions))
    .bind(to_db_count(student.tasks))
    .bind(student.last_submission_at)
    .bind(student.last_help_request_at)
    .fetch_one(&mut **tx)
    .await?;

    sqlx::query("DELETE FROM roster_dashboard.student_groups WHERE student_id = $1")
        .bind(&student.id)
        .execute(&mut **tx)
        .await?;

    for (position, group_id) in student.group_ids.iter().enumerate() {
        let known: Option<String> =
            sqlx::query_scalar("SELECT id FROM roster_dashboard.groups WHERE id = $1")
                .bind(group_id)
                .fetch_optional(&mut **tx)
                .await?;
        if known.is_none() {
            warn!(student = %student.id, group = %group_id, "membership references unknown group");
        }

        sqlx::query(
            r#"
            INSERT INTO roster_dashboard.student_groups (student_id, group_id, position)
            VALUES ($1, $2, $3)
            ON CONFLICT (student_id, group_id) DO NOTHING
            "#,
        )
        .bind(&student.id)
        .bind(group_id)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await?;
    }

    Ok(was_insert)
}

async fn upsert_group(tx: &mut Transaction<'_, Postgres>, group: &Group) -> anyhow::Result<bool> {
    let was_insert: bool = sqlx::query_scalar(
        r#"
        INSERT INTO roster_dashboard.groups (id, name, kind)
        VALUES ($1, $2, $3)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name, kind = EXCLUDED.kind
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&group.id)
    .bind(&group.name)
    .bind(group.kind.as_str())
    .fetch_one(&mut **tx)
    .await?;
    Ok(was_insert)
}

async fn upsert_school_group(
    tx: &mut Transaction<'_, Postgres>,
    group: &SchoolGroup,
) -> anyhow::Result<bool> {
    let was_insert: bool = sqlx::query_scalar(
        r#"
        INSERT INTO roster_dashboard.school_groups
        (id, name, group_type, student_count, members, is_mine)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE
        SET name = EXCLUDED.name,
            group_type = EXCLUDED.group_type,
            student_count = EXCLUDED.student_count,
            members = EXCLUDED.members,
            is_mine = EXCLUDED.is_mine
        RETURNING (xmax = 0) AS inserted
        "#,
    )
    .bind(&group.id)
    .bind(&group.name)
    .bind(group.group_type.as_str())
    .bind(to_db_count(group.student_count))
    .bind(&group.members)
    .bind(group.is_mine)
    .fetch_one(&mut **tx)
    .await?;
    Ok(was_insert)
}

pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
) -> anyhow::Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut tx = pool.begin().await?;
    let mut summary = ImportSummary::default();

    for (line, result) in reader.deserialize::<CsvStudentRow>().enumerate() {
        let row = result.with_context(|| format!("invalid row {} in csv", line + 1))?;
        let student = row.into_student();
        summary.record(upsert_student(&mut tx, &student).await?);
    }

    tx.commit().await?;
    info!(
        inserted = summary.inserted,
        updated = summary.updated,
        path = %csv_path.display(),
        "students imported"
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterImportSummary {
    pub groups: ImportSummary,
    pub students: ImportSummary,
    pub school_groups: ImportSummary,
}

/// Writes a whole roster snapshot (groups first, so memberships resolve) in one transaction.
pub async fn import_roster(pool: &PgPool, roster: &Roster) -> anyhow::Result<RosterImportSummary> {
    let mut tx = pool.begin().await?;
    let mut summary = RosterImportSummary::default();

    for group in &roster.groups {
        summary.groups.record(upsert_group(&mut tx, group).await?);
    }
    for student in &roster.students {
        summary.students.record(upsert_student(&mut tx, student).await?);
    }
    for group in &roster.school_groups {
        summary
            .school_groups
            .record(upsert_school_group(&mut tx, group).await?);
    }

    tx.commit().await?;
    info!(
        groups = summary.groups.total(),
        students = summary.students.total(),
        school_groups = summary.school_groups.total(),
        "roster snapshot imported"
    );
    Ok(summary)
}
