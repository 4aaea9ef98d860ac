use chrono::NaiveDate;
use std::collections::HashSet;

use crate::db::{DBResult, connect, swallow_constraint_violation};
use crate::models;

/////*============== DAILY CHALLENGE QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::DailyChallenge {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            question_id: row.get("question_id")?,
            posted_date: parse_date(row, "posted_date")?,
            question_message_id: row
                .get::<_, Option<i64>>("question_message_id")?
                .map(|id| id as u64),
            solution_message_id: row
                .get::<_, Option<i64>>("solution_message_id")?
                .map(|id| id as u64),
            solution_posted: row.get("solution_posted")?,
        })
    }
}

pub(crate) fn parse_date(row: &rusqlite::Row, column: &str) -> DBResult<NaiveDate> {
    let raw: String = row.get(column)?;
    raw.parse().map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
    })
}

/// Returns the challenge row for `date`, if one was posted.
pub fn query_challenge(date: NaiveDate) -> DBResult<Option<models::DailyChallenge>> {
    let connection = connect()?;

    connection
        .prepare("SELECT * FROM DailyChallenges WHERE posted_date = :posted_date")?
        .query(rusqlite::named_params! { ":posted_date": date.to_string() })?
        .next()?
        .map(|row| row.try_into())
        .transpose()
}

/// Records a posted challenge. Returns `false` if a row for `date`
/// already exists: the UNIQUE constraint on posted_date is what closes
/// the race between a manual post and the scheduled one.
pub fn insert_challenge(
    question_id: u32,
    date: NaiveDate,
    question_message_id: u64,
) -> DBResult<bool> {
    log::trace!("[insert_challenge] Recording challenge #{question_id} for {date}...");
    let connection = connect()?;

    let query_params = rusqlite::named_params! {
            ":question_id":         question_id,
            ":posted_date":         date.to_string(),
            ":question_message_id": question_message_id as i64,
    };

    connection
        .prepare(
            "INSERT INTO DailyChallenges ( question_id,  posted_date,  question_message_id)
             VALUES                      (:question_id, :posted_date, :question_message_id)",
        )?
        .execute(query_params)
        .map_or_else(swallow_constraint_violation, |_| Ok(true))
}

/// Marks the challenge's solution as posted. The row is mutated exactly
/// once; callers check `solution_posted` first via `query_challenge`.
pub fn mark_solution_posted(challenge_id: i64, solution_message_id: u64) -> DBResult<()> {
    let connection = connect()?;

    let query_params = rusqlite::named_params! {
            ":id":                  challenge_id,
            ":solution_message_id": solution_message_id as i64,
    };

    connection
        .prepare(
            "UPDATE DailyChallenges
             SET solution_posted = 1, solution_message_id = :solution_message_id
             WHERE id = :id",
        )?
        .execute(query_params)?;

    Ok(())
}

/// Every question id that has ever been posted.
pub fn query_posted_question_ids() -> DBResult<HashSet<u32>> {
    let connection = connect()?;
    let mut stmt = connection.prepare("SELECT DISTINCT question_id FROM DailyChallenges")?;

    let ids = stmt
        .query_map([], |row| row.get("question_id"))?
        .collect::<DBResult<HashSet<u32>>>()?;

    Ok(ids)
}

/// (challenges posted, solutions posted) over all time.
pub fn query_challenge_totals() -> DBResult<(u32, u32)> {
    let connection = connect()?;

    let total: u32 = connection
        .prepare("SELECT COUNT(*) FROM DailyChallenges")?
        .query_row([], |row| row.get(0))?;

    let with_solution: u32 = connection
        .prepare("SELECT COUNT(*) FROM DailyChallenges WHERE solution_posted = 1")?
        .query_row([], |row| row.get(0))?;

    Ok((total, with_solution))
}
