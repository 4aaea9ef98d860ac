//! The rotating "share the news" assignment: pick a member who hasn't
//! had the duty recently, remind until they respond, and mark the duty
//! done exactly once when they do.

use chrono::{NaiveDate, Utc};
use rand::prelude::IndexedRandom;
use std::collections::HashSet;

use crate::db;
use crate::errors::{BotError, BotResult};

/// Members assigned within this many trailing weeks are skipped.
pub const RECENCY_WEEKS: u64 = 4;

/// Reacting with this emoji counts as completing the assignment.
pub const COMPLETION_EMOJI: &str = "👍";

/// Uniform-random pick among `candidates` (already filtered to non-bot,
/// non-administrator members), excluding recently assigned ones. If the
/// exclusion empties the pool it is dropped so the rotation always makes
/// forward progress; an empty pool either way is `NoEligibleMembers`.
pub fn pick(candidates: &[u64], recent: &HashSet<u64>) -> BotResult<u64> {
    let fresh: Vec<u64> = candidates
        .iter()
        .copied()
        .filter(|id| !recent.contains(id))
        .collect();

    let pool = if fresh.is_empty() {
        log::warn!("All members assigned recently, picking from full list");
        candidates
    } else {
        &fresh
    };

    pool.choose(&mut rand::rng())
        .copied()
        .ok_or(BotError::NoEligibleMembers)
}

/// Picks the next assignee using the stored recency window.
pub fn pick_assignee(candidates: &[u64], today: NaiveDate) -> BotResult<u64> {
    let recent = db::rotation::query_recent_assignees(today, RECENCY_WEEKS)?;
    pick(candidates, &recent)
}

/// True unless the latest assignment in the trailing week is already
/// completed; no assignment at all also means a reminder is due.
pub fn should_send_reminder(today: NaiveDate) -> BotResult<bool> {
    match db::rotation::query_latest_assignment(today)? {
        Some(assignment) => Ok(!assignment.completed),
        None => Ok(true),
    }
}

/// Records `member_id` as today's assignee.
pub fn record_assignment(member_id: u64, today: NaiveDate) -> BotResult<()> {
    db::rotation::insert_assignment(member_id, today)?;
    Ok(())
}

/// Marks the active assignment complete if `member_id` is the current
/// assignee. Returns `true` only on the first qualifying response;
/// responses from anyone else, or after completion, are no-ops.
pub fn try_mark_complete(member_id: u64, today: NaiveDate) -> BotResult<bool> {
    let Some(current) = db::rotation::query_current_assignee(today)? else {
        return Ok(false);
    };

    if current.member_id != member_id {
        return Ok(false);
    }

    let marked = db::rotation::mark_complete(member_id, today, Utc::now())?;
    if marked {
        log::info!("Marked rotation assignment complete for member {member_id}.");
    }
    Ok(marked)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_fresh_candidate_is_always_picked() {
        let candidates = [1, 2, 3, 4, 5];
        let recent = HashSet::from([1, 2, 3, 4]);
        for _ in 0..20 {
            assert_eq!(pick(&candidates, &recent).unwrap(), 5);
        }
    }

    #[test]
    fn recency_exclusion_relaxes_before_failing() {
        let candidates = [7, 8, 9];
        let recent = HashSet::from([7, 8, 9]);
        let picked = pick(&candidates, &recent).unwrap();
        assert!(candidates.contains(&picked));
    }

    #[test]
    fn empty_pool_signals_no_eligible_members() {
        let err = pick(&[], &HashSet::new()).unwrap_err();
        assert!(matches!(err, BotError::NoEligibleMembers));
    }
}
