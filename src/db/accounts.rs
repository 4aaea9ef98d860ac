use chrono::{DateTime, Utc};

use crate::db::{DBResult, connect};
use crate::models;

/////*============== ACCOUNT QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::LinkedAccount {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            member_id: row.get::<_, i64>("member_id")? as u64,
            username: row.get("username")?,
            total_solved: row.get("total_solved")?,
            weekly_solved: row.get("weekly_solved")?,
            last_updated: row
                .get::<_, Option<i64>>("last_updated")?
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
            linked_at: DateTime::from_timestamp(row.get("linked_at")?, 0)
                .unwrap_or_default(),
        })
    }
}

/// Links a member to a LeetCode username. Re-linking overwrites the
/// username in place, so a member never holds more than one account.
pub fn link_account(member_id: u64, username: &str, now: DateTime<Utc>) -> DBResult<()> {
    log::trace!("[link_account] Linking member {member_id} to '{username}'...");
    let connection = connect()?;

    let query_params = rusqlite::named_params! {
            ":member_id": member_id as i64,
            ":username":  username,
            ":now":       now.timestamp(),
    };

    connection
        .prepare(
            "INSERT INTO Accounts ( member_id,  username, last_updated, linked_at)
             VALUES               (:member_id, :username, :now,         :now)
             ON CONFLICT(member_id)
             DO UPDATE SET username = excluded.username,
                           last_updated = excluded.last_updated",
        )?
        .execute(query_params)?;

    log::info!("Member {member_id} linked to LeetCode account '{username}'.");
    Ok(())
}

/// Returns the linked account for `member_id`, if there is one.
pub fn query_account(member_id: u64) -> DBResult<Option<models::LinkedAccount>> {
    let connection = connect()?;

    connection
        .prepare("SELECT * FROM Accounts WHERE member_id = :member_id")?
        .query(rusqlite::named_params! { ":member_id": member_id as i64 })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Gathers (member_id, username) for every linked account.
pub fn query_all_accounts() -> DBResult<Vec<(u64, String)>> {
    let connection = connect()?;
    let mut stmt = connection.prepare("SELECT member_id, username FROM Accounts")?;

    let accounts = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>("member_id")? as u64, row.get("username")?))
        })?
        .collect::<DBResult<Vec<_>>>()?;

    Ok(accounts)
}

/// Records the outcome of a stats refresh: total_solved is overwritten
/// with the freshly fetched absolute value, while the weekly count only
/// accumulates the newly-seen submissions.
pub fn apply_refresh(
    member_id: u64,
    total_solved: u32,
    weekly_delta: u32,
    now: DateTime<Utc>,
) -> DBResult<()> {
    let connection = connect()?;

    let query_params = rusqlite::named_params! {
            ":member_id":    member_id as i64,
            ":total_solved": total_solved,
            ":delta":        weekly_delta,
            ":now":          now.timestamp(),
    };

    connection
        .prepare(
            "UPDATE Accounts
             SET total_solved = :total_solved,
                 weekly_solved = weekly_solved + :delta,
                 last_updated = :now
             WHERE member_id = :member_id",
        )?
        .execute(query_params)
        .inspect_err(|err| {
            log::error!("[apply_refresh] Could not update stats for {member_id}: {err}")
        })?;

    Ok(())
}

/// Removes the member's linked account. Returns `true` if one existed.
pub fn unlink_account(member_id: u64) -> DBResult<bool> {
    let connection = connect()?;
    let changed = connection
        .prepare("DELETE FROM Accounts WHERE member_id = :member_id")?
        .execute(rusqlite::named_params! { ":member_id": member_id as i64 })?;

    Ok(changed > 0)
}

/// Top weekly solvers, best first. Members with nothing solved this week
/// are left off entirely.
pub fn weekly_leaderboard(limit: u32) -> DBResult<Vec<models::LinkedAccount>> {
    let connection = connect()?;
    let mut stmt = connection.prepare(
        "SELECT * FROM Accounts
         WHERE weekly_solved > 0
         ORDER BY weekly_solved DESC
         LIMIT :limit",
    )?;

    let accounts = stmt
        .query_map(rusqlite::named_params! { ":limit": limit }, |row| {
            models::LinkedAccount::try_from(row)
        })?
        .collect::<DBResult<Vec<_>>>()?;

    Ok(accounts)
}

/// Zeroes every account's weekly count. Returns how many rows changed.
pub fn reset_weekly_counts() -> DBResult<usize> {
    log::info!("[reset_weekly_counts] Resetting weekly counts for all accounts.");
    let connection = connect()?;
    connection
        .prepare("UPDATE Accounts SET weekly_solved = 0")?
        .execute([])
}
