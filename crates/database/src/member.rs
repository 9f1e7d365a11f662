//! Member CRUD and attendance operations.

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{member_status, AttendanceRecord, Member, NewMember};
use crate::validation;

/// Timestamp format matching SQLite's `datetime('now')`.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn absence_cutoff(days: i64) -> String {
    format_datetime(&(Utc::now() - Duration::days(days)))
}

const MEMBER_COLUMNS: &str = "id, name, phone, birthday, status, last_attendance, \
     consecutive_absences, notify_whatsapp, notify_email, notes, created_at, updated_at";

/// Create a new member. The phone number is validated and stored as the
/// cleaned national number.
pub async fn create_member(pool: &SqlitePool, new: &NewMember) -> Result<Member> {
    validation::validate_name(&new.name)?;
    validation::validate_phone(&new.phone)?;

    let id = Uuid::new_v4().to_string();
    let phone = validation::clean_phone(&new.phone);
    let status = new
        .status
        .clone()
        .unwrap_or_else(|| member_status::ACTIVE.to_string());

    sqlx::query(
        r#"
        INSERT INTO members (id, name, phone, birthday, status, notify_whatsapp, notify_email, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&new.name)
    .bind(&phone)
    .bind(&new.birthday)
    .bind(&status)
    .bind(new.notify_whatsapp)
    .bind(new.notify_email)
    .bind(&new.notes)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "Member",
                    id: phone.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    get_member(pool, &id).await
}

/// Get a member by ID.
pub async fn get_member(pool: &SqlitePool, id: &str) -> Result<Member> {
    sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Member",
        id: id.to_string(),
    })
}

/// Update a member's editable fields.
pub async fn update_member(pool: &SqlitePool, member: &Member) -> Result<()> {
    validation::validate_name(&member.name)?;
    validation::validate_phone(&member.phone)?;

    let result = sqlx::query(
        r#"
        UPDATE members
        SET name = ?, phone = ?, birthday = ?, status = ?,
            notify_whatsapp = ?, notify_email = ?, notes = ?,
            updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&member.name)
    .bind(validation::clean_phone(&member.phone))
    .bind(&member.birthday)
    .bind(&member.status)
    .bind(member.notify_whatsapp)
    .bind(member.notify_email)
    .bind(&member.notes)
    .bind(&member.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Member",
            id: member.id.clone(),
        });
    }

    Ok(())
}

/// Delete a member by ID.
pub async fn delete_member(pool: &SqlitePool, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM members
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Member",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// List all members ordered by name.
pub async fn list_members(pool: &SqlitePool) -> Result<Vec<Member>> {
    let members = sqlx::query_as::<_, Member>(&format!(
        "SELECT {MEMBER_COLUMNS} FROM members ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(members)
}

/// Count total members.
pub async fn count_members(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM members
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Record attendance for a member.
///
/// A presence updates `last_attendance` and resets the consecutive-absence
/// counter; an absence increments it. Either way a history row is written.
pub async fn record_attendance(
    pool: &SqlitePool,
    member_id: &str,
    date: Option<DateTime<Utc>>,
    present: bool,
    recorded_by: Option<&str>,
) -> Result<()> {
    // Fail early with NotFound rather than a foreign key error.
    get_member(pool, member_id).await?;

    let date = format_datetime(&date.unwrap_or_else(Utc::now));

    sqlx::query(
        r#"
        INSERT INTO attendance_history (member_id, date, present, recorded_by)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(member_id)
    .bind(&date)
    .bind(present)
    .bind(recorded_by)
    .execute(pool)
    .await?;

    if present {
        sqlx::query(
            r#"
            UPDATE members
            SET last_attendance = ?, consecutive_absences = 0, updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&date)
        .bind(member_id)
        .execute(pool)
        .await?;
    } else {
        sqlx::query(
            r#"
            UPDATE members
            SET consecutive_absences = consecutive_absences + 1, updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(member_id)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// List a member's attendance history, most recent first.
pub async fn list_attendance(pool: &SqlitePool, member_id: &str) -> Result<Vec<AttendanceRecord>> {
    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT id, member_id, date, present, recorded_by, created_at
        FROM attendance_history
        WHERE member_id = ?
        ORDER BY date DESC, id DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Find active members whose attendance is stale or never recorded.
///
/// This is the dashboard view of absence: anyone active who has not been
/// seen within the threshold, including members with no recorded
/// attendance at all.
pub async fn find_absent(pool: &SqlitePool, days: i64) -> Result<Vec<Member>> {
    let cutoff = absence_cutoff(days);

    let members = sqlx::query_as::<_, Member>(&format!(
        r#"
        SELECT {MEMBER_COLUMNS}
        FROM members
        WHERE (last_attendance < ? OR last_attendance IS NULL)
          AND status = ?
        ORDER BY name
        "#
    ))
    .bind(&cutoff)
    .bind(member_status::ACTIVE)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

/// Find members eligible for an absence notification: active, opted in to
/// WhatsApp, and last seen before the cutoff.
pub async fn find_absent_notifiable(pool: &SqlitePool, days: i64) -> Result<Vec<Member>> {
    let cutoff = absence_cutoff(days);

    let members = sqlx::query_as::<_, Member>(&format!(
        r#"
        SELECT {MEMBER_COLUMNS}
        FROM members
        WHERE last_attendance < ?
          AND notify_whatsapp = 1
          AND status = ?
        ORDER BY name
        "#
    ))
    .bind(&cutoff)
    .bind(member_status::ACTIVE)
    .fetch_all(pool)
    .await?;

    Ok(members)
}

/// Find members with a birthday in the given month (1-12).
pub async fn find_birthdays_in_month(pool: &SqlitePool, month: u32) -> Result<Vec<Member>> {
    let month = format!("{:02}", month);

    let members = sqlx::query_as::<_, Member>(&format!(
        r#"
        SELECT {MEMBER_COLUMNS}
        FROM members
        WHERE birthday IS NOT NULL
          AND strftime('%m', birthday) = ?
        ORDER BY strftime('%d', birthday), name
        "#
    ))
    .bind(&month)
    .fetch_all(pool)
    .await?;

    Ok(members)
}
