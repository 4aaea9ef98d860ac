//! The one-challenge-per-day state machine. A calendar date moves
//! `NoChallengeToday -> ChallengePosted -> SolutionPosted`; the next
//! date starts the cycle over. All transitions are backed by the
//! DailyChallenges table, so they survive restarts.

use anyhow::anyhow;
use chrono::NaiveDate;

use crate::catalog::{Catalog, Question};
use crate::db;
use crate::errors::{BotError, BotResult};
use crate::lcapi;
use crate::models::DailyChallenge;

/// Fails with `AlreadyPosted` if a challenge row exists for `today`.
pub fn ensure_not_posted(today: NaiveDate) -> BotResult<()> {
    match db::challenges::query_challenge(today)? {
        Some(_) => Err(BotError::AlreadyPosted),
        None => Ok(()),
    }
}

/// Picks the question to post: an explicit id resolves through the
/// catalog and then a best-effort LeetCode lookup; otherwise the next
/// unposted catalog question in insertion order (cycling on exhaustion).
pub async fn resolve_question(catalog: &Catalog, explicit: Option<u32>) -> BotResult<Question> {
    match explicit {
        Some(id) => question_by_id(catalog, id).await,
        None => {
            let posted = db::challenges::query_posted_question_ids()?;
            catalog
                .next_unposted(&posted)
                .cloned()
                .ok_or_else(|| BotError::Other(anyhow!("The question catalog is empty.")))
        }
    }
}

/// Resolves a question id via the local catalog, falling back to the
/// LeetCode API for ids outside it.
pub async fn question_by_id(catalog: &Catalog, id: u32) -> BotResult<Question> {
    if let Some(question) = catalog.by_id(id) {
        return Ok(question.clone());
    }

    log::info!("Question #{id} not in catalog, trying LeetCode lookup...");
    lcapi::fetch_question_by_number(id)
        .await
        .map_err(|err| BotError::external("leetcode", err))?
        .ok_or(BotError::QuestionNotFound(id))
}

/// Records the posted challenge. A lost insert race (another trigger got
/// there first) surfaces as `AlreadyPosted`, same as the pre-check.
pub fn record_posted(question_id: u32, today: NaiveDate, message_id: u64) -> BotResult<()> {
    if db::challenges::insert_challenge(question_id, today, message_id)? {
        Ok(())
    } else {
        Err(BotError::AlreadyPosted)
    }
}

/// The challenge whose solution should be posted now. Fails with
/// `NoChallengeToday` when nothing was posted for `today`, and with
/// `AlreadyPosted` once the solution is out.
pub fn solution_target(today: NaiveDate) -> BotResult<DailyChallenge> {
    let challenge = db::challenges::query_challenge(today)?.ok_or(BotError::NoChallengeToday)?;

    if challenge.solution_posted {
        return Err(BotError::AlreadyPosted);
    }

    Ok(challenge)
}

/// Marks the solution posted. Callers only reach this after generation
/// for every target language has finished, so an interrupted generation
/// leaves the row unposted and the whole operation retryable.
pub fn record_solution(challenge_id: i64, message_id: u64) -> BotResult<()> {
    db::challenges::mark_solution_posted(challenge_id, message_id)?;
    Ok(())
}

/// A one-line summary of the schedule's overall state, for diagnostics.
pub fn status_summary(today: NaiveDate, catalog: &Catalog) -> BotResult<String> {
    let (total, with_solution) = db::challenges::query_challenge_totals()?;
    let todays = db::challenges::query_challenge(today)?;
    let posted = db::challenges::query_posted_question_ids()?;

    let today_line = match &todays {
        Some(c) if c.solution_posted => format!("#{} (solution posted)", c.question_id),
        Some(c) => format!("#{} (solution pending)", c.question_id),
        None => String::from("not posted yet"),
    };

    let next_line = catalog
        .next_unposted(&posted)
        .map(|q| format!("#{}: {} ({})", q.id, q.title, q.difficulty))
        .unwrap_or_else(|| String::from("none"));

    Ok(format!(
        "**Daily Challenge Stats**\n\
         \tQuestions posted: {total}/{}\n\
         \tSolutions posted: {with_solution}\n\
         \tToday: {today_line}\n\
         \tNext up: {next_line}",
        catalog.len()
    ))
}
