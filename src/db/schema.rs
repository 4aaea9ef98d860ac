pub const ACCOUNTS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Accounts (
        member_id      INTEGER     PRIMARY KEY,
        username       TEXT        NOT NULL,

        total_solved   INTEGER     NOT NULL    DEFAULT 0,
        weekly_solved  INTEGER     NOT NULL    DEFAULT 0,

        last_updated   INTEGER,
        linked_at      INTEGER     NOT NULL
    )";

pub const SUBMISSIONS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS Submissions (
        member_id      INTEGER     NOT NULL    REFERENCES Accounts(member_id),

        problem_title  TEXT        NOT NULL,
        problem_slug   TEXT        NOT NULL,
        difficulty     TEXT        NOT NULL,
        timestamp      INTEGER     NOT NULL,
        week_number    INTEGER     NOT NULL,

        UNIQUE(member_id, problem_slug, timestamp)
    )";

// posted_date is UNIQUE so that two near-simultaneous post triggers
// (manual command + scheduled job) can't both record a challenge.
pub const DAILY_CHALLENGES_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS DailyChallenges (
        id                   INTEGER     PRIMARY KEY AUTOINCREMENT,
        question_id          INTEGER     NOT NULL,

        posted_date          TEXT        NOT NULL    UNIQUE,
        question_message_id  INTEGER,
        solution_message_id  INTEGER,
        solution_posted      BOOLEAN     NOT NULL    DEFAULT 0
    )";

pub const ROTATION_ASSIGNMENTS_SCHEMA: &str =
    "CREATE TABLE IF NOT EXISTS RotationAssignments (
        id             INTEGER     PRIMARY KEY AUTOINCREMENT,
        member_id      INTEGER     NOT NULL,

        assigned_date  TEXT        NOT NULL,
        completed      BOOLEAN     NOT NULL    DEFAULT 0,
        completed_at   INTEGER
    )";
