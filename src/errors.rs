use thiserror::Error;

/// Everything here is recoverable: commands report these back to the user
/// as a declined operation, and scheduled jobs log them and move on.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("no linked LeetCode account for member {0}")]
    AccountNotFound(u64),

    #[error("question #{0} not found in the catalog or on LeetCode")]
    QuestionNotFound(u32),

    #[error("already posted today")]
    AlreadyPosted,

    #[error("no challenge has been posted today")]
    NoChallengeToday,

    #[error("missing permission to manage roles")]
    Unauthorized,

    #[error("no eligible members to assign")]
    NoEligibleMembers,

    #[error("external service unavailable: {0}")]
    ExternalUnavailable(String),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type BotResult<T> = Result<T, BotError>;

impl BotError {
    /// Maps a failed HTTP round-trip to the external-service bucket.
    pub fn external(service: &str, err: impl std::fmt::Display) -> Self {
        Self::ExternalUnavailable(format!("{service}: {err}"))
    }
}
