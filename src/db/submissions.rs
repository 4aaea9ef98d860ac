use crate::db::{DBResult, connect, swallow_constraint_violation};
use crate::models;

/////*============== SUBMISSION QUERIES ==============*/
impl<'a> TryFrom<&'a rusqlite::Row<'a>> for models::Submission {
    type Error = rusqlite::Error;

    fn try_from(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            member_id: row.get::<_, i64>("member_id")? as u64,
            problem_title: row.get("problem_title")?,
            problem_slug: row.get("problem_slug")?,
            difficulty: row.get("difficulty")?,
            timestamp: row.get("timestamp")?,
            week_number: row.get("week_number")?,
        })
    }
}

/// Inserts a submission unless the same (member, slug, timestamp) is
/// already recorded. Returns `true` if it was newly added.
pub fn insert_submission(submission: &models::Submission) -> DBResult<bool> {
    log::trace!(
        "[insert_submission] Recording '{}' for member {}...",
        submission.problem_slug,
        submission.member_id
    );
    let connection = connect()?;

    let query_params = rusqlite::named_params! {
            ":member_id":     submission.member_id as i64,
            ":problem_title": submission.problem_title,
            ":problem_slug":  submission.problem_slug,
            ":difficulty":    submission.difficulty,
            ":timestamp":     submission.timestamp,
            ":week_number":   submission.week_number,
    };

    connection
        .prepare(
            "INSERT INTO Submissions
                ( member_id,  problem_title,  problem_slug,  difficulty,  timestamp,  week_number)
            VALUES
                (:member_id, :problem_title, :problem_slug, :difficulty, :timestamp, :week_number)",
        )?
        .execute(query_params)
        .map_or_else(swallow_constraint_violation, |_| Ok(true))
}

/// A member's submissions for the given ISO week, newest first.
pub fn query_submissions_for_week(
    member_id: u64,
    week_number: u32,
) -> DBResult<Vec<models::Submission>> {
    let connection = connect()?;

    let query_params = rusqlite::named_params! {
            ":member_id":   member_id as i64,
            ":week_number": week_number,
    };

    let mut stmt = connection.prepare(
        "SELECT * FROM Submissions
         WHERE member_id = :member_id AND week_number = :week_number
         ORDER BY timestamp DESC",
    )?;

    let submissions = stmt
        .query_map(query_params, |row| models::Submission::try_from(row))?
        .collect::<DBResult<Vec<_>>>()?;

    Ok(submissions)
}
