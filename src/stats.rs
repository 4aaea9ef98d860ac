//! Stats ingestion: pulls a linked account's LeetCode numbers and folds
//! the last week's accepted submissions into the durable counts.

use chrono::{DateTime, Datelike, Utc};
use std::time::Duration;

use crate::db;
use crate::errors::{BotError, BotResult};
use crate::lcapi;
use crate::models;

/// How many recent submissions LeetCode is asked for per refresh.
const RECENT_LIMIT: u32 = 20;

const WEEK_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy)]
pub struct RefreshOutcome {
    pub total_solved: u32,
    /// Submissions newly recorded by this refresh.
    pub weekly_delta: u32,
}

/// True when `timestamp` falls within the trailing 7 days of `now`.
pub fn within_trailing_week(timestamp: i64, now: i64) -> bool {
    timestamp > now - WEEK_SECS && timestamp <= now
}

/// ISO week number for an epoch timestamp, used to bucket submissions.
pub fn week_number_for(timestamp: i64) -> u32 {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .unwrap_or_default()
        .iso_week()
        .week()
}

/// Refreshes one linked account: overwrite total_solved with the fetched
/// absolute count, record unseen submissions from the trailing week, and
/// accumulate only the newly-recorded ones into weekly_solved.
pub async fn refresh_account(member_id: u64, username: &str) -> BotResult<RefreshOutcome> {
    let stats = lcapi::fetch_user_stats(username)
        .await
        .map_err(|err| BotError::external("leetcode", err))?;

    let recent = lcapi::fetch_recent_accepted(username, RECENT_LIMIT)
        .await
        .map_err(|err| BotError::external("leetcode", err))?;

    let now = Utc::now();
    let mut weekly_delta = 0;

    for submission in recent {
        let timestamp = submission.timestamp_secs()?;
        if !within_trailing_week(timestamp, now.timestamp()) {
            continue;
        }

        // A failed difficulty lookup shouldn't lose the submission.
        let difficulty = lcapi::fetch_difficulty(&submission.title_slug)
            .await
            .unwrap_or_else(|err| {
                log::warn!("Couldn't fetch difficulty for {}: {err}", submission.title_slug);
                String::from("Unknown")
            });

        let row = models::Submission {
            member_id,
            problem_title: submission.title.clone(),
            problem_slug: submission.title_slug.clone(),
            difficulty,
            timestamp,
            week_number: week_number_for(timestamp),
        };

        if db::submissions::insert_submission(&row)? {
            weekly_delta += 1;
        }
    }

    db::accounts::apply_refresh(member_id, stats.total_solved, weekly_delta, now)?;

    log::info!("Updated {username}: {} total, +{weekly_delta} this week", stats.total_solved);
    Ok(RefreshOutcome { total_solved: stats.total_solved, weekly_delta })
}

/// Refreshes a member's stats, failing with `AccountNotFound` when they
/// haven't linked a LeetCode account.
pub async fn refresh_member(member_id: u64) -> BotResult<RefreshOutcome> {
    let account = db::accounts::query_account(member_id)?
        .ok_or(BotError::AccountNotFound(member_id))?;
    refresh_account(member_id, &account.username).await
}

/// Refreshes every linked account, pausing `delay` between members to
/// stay under LeetCode's rate limits. One member failing doesn't stop
/// the batch; returns how many refreshed cleanly.
pub async fn refresh_all(delay: Duration) -> BotResult<usize> {
    let accounts = db::accounts::query_all_accounts()?;
    let mut refreshed = 0;

    for (member_id, username) in accounts {
        match refresh_account(member_id, &username).await {
            Ok(_) => refreshed += 1,
            Err(err) => log::error!("Error updating {username}: {err}"),
        }
        tokio::time::sleep(delay).await;
    }

    Ok(refreshed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    #[test]
    fn trailing_week_window_edges() {
        assert!(within_trailing_week(NOW, NOW));
        assert!(within_trailing_week(NOW - WEEK_SECS + 1, NOW));
        assert!(!within_trailing_week(NOW - WEEK_SECS, NOW));
        assert!(!within_trailing_week(NOW + 10, NOW));
    }

    #[test]
    fn week_numbers_are_iso_weeks() {
        // 2023-11-14 falls in ISO week 46.
        assert_eq!(week_number_for(NOW), 46);
        // A week later is the next ISO week.
        assert_eq!(week_number_for(NOW + WEEK_SECS), 47);
    }
}
