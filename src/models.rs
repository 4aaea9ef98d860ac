use chrono::{DateTime, NaiveDate, Utc};

/// A Discord member linked to a LeetCode account.
/// At most one row per member; re-linking overwrites the username.
#[derive(Debug, Clone)]
pub struct LinkedAccount {
    pub member_id: u64,
    pub username: String,

    pub total_solved: u32,
    pub weekly_solved: u32,

    pub last_updated: Option<DateTime<Utc>>,
    pub linked_at: DateTime<Utc>,
}

/// One accepted submission, recorded at most once per
/// (member, slug, timestamp). Immutable once inserted.
#[derive(Debug, Clone)]
pub struct Submission {
    pub member_id: u64,
    pub problem_title: String,
    pub problem_slug: String,
    pub difficulty: String,
    pub timestamp: i64,
    pub week_number: u32,
}

/// Daily-challenge state row; at most one per calendar date
/// (UNIQUE on posted_date).
#[derive(Debug, Clone)]
pub struct DailyChallenge {
    pub id: i64,
    pub question_id: u32,
    pub posted_date: NaiveDate,
    pub question_message_id: Option<u64>,
    pub solution_message_id: Option<u64>,
    pub solution_posted: bool,
}

/// One rotation pick. The "current" assignee is the most recent
/// incomplete row within the trailing 7 days.
#[derive(Debug, Clone)]
pub struct RotationAssignment {
    pub id: i64,
    pub member_id: u64,
    pub assigned_date: NaiveDate,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl std::fmt::Display for LinkedAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "**{}**\n\
             \tTotal Solved: {}\n\
             \tThis Week: {}",
            self.username, self.total_solved, self.weekly_solved
        )
    }
}
