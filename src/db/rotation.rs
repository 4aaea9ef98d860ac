use chrono::{DateTime, Days, NaiveDate, Utc};
use std::collections::HashSet;

use crate::db::{DBResult, connect};
use crate::models;

/////*============== ROTATION QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::RotationAssignment {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            member_id: row.get::<_, i64>("member_id")? as u64,
            assigned_date: super::challenges::parse_date(row, "assigned_date")?,
            completed: row.get("completed")?,
            completed_at: row
                .get::<_, Option<i64>>("completed_at")?
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        })
    }
}

fn window_start(today: NaiveDate, days: u64) -> String {
    today
        .checked_sub_days(Days::new(days))
        .unwrap_or(today)
        .to_string()
}

/// The most recent assignment in the trailing 7 days, completed or not.
pub fn query_latest_assignment(today: NaiveDate) -> DBResult<Option<models::RotationAssignment>> {
    let connection = connect()?;

    connection
        .prepare(
            "SELECT * FROM RotationAssignments
             WHERE assigned_date >= :since AND assigned_date <= :today
             ORDER BY assigned_date DESC, id DESC
             LIMIT 1",
        )?
        .query(rusqlite::named_params! {
                ":since": window_start(today, 7),
                ":today": today.to_string(),
        })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// The member currently on the hook: most recent incomplete assignment
/// within the trailing 7 days. None means no one is assigned right now.
pub fn query_current_assignee(today: NaiveDate) -> DBResult<Option<models::RotationAssignment>> {
    let connection = connect()?;

    connection
        .prepare(
            "SELECT * FROM RotationAssignments
             WHERE assigned_date >= :since AND assigned_date <= :today
               AND completed = 0
             ORDER BY assigned_date DESC, id DESC
             LIMIT 1",
        )?
        .query(rusqlite::named_params! {
                ":since": window_start(today, 7),
                ":today": today.to_string(),
        })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Records a new assignment for `member_id` dated `today`.
pub fn insert_assignment(member_id: u64, today: NaiveDate) -> DBResult<()> {
    log::info!("[insert_assignment] Assigning rotation duty to member {member_id}.");
    let connection = connect()?;

    connection
        .prepare(
            "INSERT INTO RotationAssignments ( member_id,  assigned_date)
             VALUES                          (:member_id, :assigned_date)",
        )?
        .execute(rusqlite::named_params! {
                ":member_id":     member_id as i64,
                ":assigned_date": today.to_string(),
        })?;

    Ok(())
}

/// Marks the member's active assignment complete. Returns `true` only
/// the first time; an already-completed assignment is left alone.
pub fn mark_complete(member_id: u64, today: NaiveDate, now: DateTime<Utc>) -> DBResult<bool> {
    let connection = connect()?;

    let query_params = rusqlite::named_params! {
            ":member_id": member_id as i64,
            ":since":     window_start(today, 7),
            ":today":     today.to_string(),
            ":now":       now.timestamp(),
    };

    let changed = connection
        .prepare(
            "UPDATE RotationAssignments
             SET completed = 1, completed_at = :now
             WHERE member_id = :member_id
               AND completed = 0
               AND assigned_date >= :since
               AND assigned_date <= :today",
        )?
        .execute(query_params)?;

    Ok(changed > 0)
}

/// Members assigned within the trailing `weeks` weeks, for recency
/// exclusion when picking the next assignee.
pub fn query_recent_assignees(today: NaiveDate, weeks: u64) -> DBResult<HashSet<u64>> {
    let connection = connect()?;
    let mut stmt = connection.prepare(
        "SELECT DISTINCT member_id FROM RotationAssignments
         WHERE assigned_date >= :since AND assigned_date <= :today",
    )?;

    let members = stmt
        .query_map(
            rusqlite::named_params! {
                    ":since": window_start(today, weeks * 7),
                    ":today": today.to_string(),
            },
            |row| Ok(row.get::<_, i64>("member_id")? as u64),
        )?
        .collect::<DBResult<HashSet<u64>>>()?;

    Ok(members)
}
