//! Integration tests over a real SQLite file in the temp directory.
//! Tests share one database per process, so each uses its own member
//! ids and calendar dates to stay out of the others' way.

use chrono::{Days, NaiveDate, Utc};

use grindbot::challenge;
use grindbot::db;
use grindbot::errors::BotError;
use grindbot::models;
use grindbot::rotation;

fn setup() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let path = std::env::temp_dir().join(format!("grindbot-test-{}.db", std::process::id()));
        let _ = std::fs::remove_file(&path);
        db::set_db_path(path);
        db::initialize_db().expect("schema init");
    });
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn submission(member_id: u64, slug: &str, timestamp: i64) -> models::Submission {
    models::Submission {
        member_id,
        problem_title: String::from("Two Sum"),
        problem_slug: String::from(slug),
        difficulty: String::from("Easy"),
        timestamp,
        week_number: 10,
    }
}

#[test]
fn relinking_overwrites_instead_of_duplicating() {
    setup();
    let member = 101;

    db::accounts::link_account(member, "alice", Utc::now()).unwrap();
    db::accounts::link_account(member, "alice_alt", Utc::now()).unwrap();

    let account = db::accounts::query_account(member).unwrap().unwrap();
    assert_eq!(account.username, "alice_alt");

    let rows = db::accounts::query_all_accounts()
        .unwrap()
        .into_iter()
        .filter(|(id, _)| *id == member)
        .count();
    assert_eq!(rows, 1);
}

#[test]
fn unlink_removes_the_account_once() {
    setup();
    let member = 102;

    db::accounts::link_account(member, "bob", Utc::now()).unwrap();
    assert!(db::accounts::unlink_account(member).unwrap());
    assert!(db::accounts::query_account(member).unwrap().is_none());
    assert!(!db::accounts::unlink_account(member).unwrap());
}

#[test]
fn duplicate_submission_is_not_recorded_twice() {
    setup();
    let member = 103;
    db::accounts::link_account(member, "carol", Utc::now()).unwrap();

    let row = submission(member, "two-sum", 1_700_000_000);
    assert!(db::submissions::insert_submission(&row).unwrap());
    assert!(!db::submissions::insert_submission(&row).unwrap());

    // Same slug at a different time is a distinct solve.
    let later = submission(member, "two-sum", 1_700_000_500);
    assert!(db::submissions::insert_submission(&later).unwrap());
}

#[test]
fn weekly_counts_accumulate_then_reset() {
    setup();
    let member = 104;
    db::accounts::link_account(member, "dave", Utc::now()).unwrap();

    db::accounts::apply_refresh(member, 50, 3, Utc::now()).unwrap();
    db::accounts::apply_refresh(member, 55, 2, Utc::now()).unwrap();

    let account = db::accounts::query_account(member).unwrap().unwrap();
    assert_eq!(account.total_solved, 55);
    assert_eq!(account.weekly_solved, 5);

    db::accounts::reset_weekly_counts().unwrap();
    let account = db::accounts::query_account(member).unwrap().unwrap();
    assert_eq!(account.weekly_solved, 0);
    // Absolute total survives the weekly reset.
    assert_eq!(account.total_solved, 55);
}

#[test]
fn one_challenge_per_calendar_date() {
    setup();
    let day = date(2031, 1, 1);

    assert!(challenge::ensure_not_posted(day).is_ok());
    assert!(db::challenges::insert_challenge(1, day, 111).unwrap());

    // A raced second insert loses to the UNIQUE constraint.
    assert!(!db::challenges::insert_challenge(2, day, 222).unwrap());
    assert!(matches!(
        challenge::ensure_not_posted(day),
        Err(BotError::AlreadyPosted)
    ));

    // The stored row is the winner's.
    let stored = db::challenges::query_challenge(day).unwrap().unwrap();
    assert_eq!(stored.question_id, 1);
    assert!(db::challenges::query_posted_question_ids().unwrap().contains(&1));

    // The next date starts fresh.
    assert!(challenge::ensure_not_posted(date(2031, 1, 2)).is_ok());
}

#[test]
fn solution_follows_challenge_and_posts_once() {
    setup();
    let day = date(2031, 2, 1);

    assert!(matches!(
        challenge::solution_target(day),
        Err(BotError::NoChallengeToday)
    ));

    assert!(db::challenges::insert_challenge(7, day, 333).unwrap());
    let target = challenge::solution_target(day).unwrap();
    assert_eq!(target.question_id, 7);
    assert!(!target.solution_posted);

    challenge::record_solution(target.id, 444).unwrap();
    assert!(matches!(
        challenge::solution_target(day),
        Err(BotError::AlreadyPosted)
    ));

    let stored = db::challenges::query_challenge(day).unwrap().unwrap();
    assert!(stored.solution_posted);
    assert_eq!(stored.solution_message_id, Some(444));
}

#[test]
fn reminder_tracks_the_trailing_week() {
    setup();
    let member = 201;
    let today = date(2032, 3, 15);

    // Nothing assigned yet.
    assert!(rotation::should_send_reminder(today).unwrap());

    rotation::record_assignment(member, today).unwrap();
    assert!(rotation::should_send_reminder(today).unwrap());

    // Someone else responding changes nothing.
    assert!(!rotation::try_mark_complete(999, today).unwrap());

    // The assignee completes exactly once.
    assert!(rotation::try_mark_complete(member, today).unwrap());
    assert!(!rotation::try_mark_complete(member, today).unwrap());
    assert!(!rotation::should_send_reminder(today).unwrap());

    // Once the assignment ages out of the window, a reminder is due again.
    let next_cycle = today.checked_add_days(Days::new(8)).unwrap();
    assert!(rotation::should_send_reminder(next_cycle).unwrap());
}

#[test]
fn recency_exclusion_window_expires() {
    setup();
    let member = 301;
    let today = date(2033, 5, 5);

    rotation::record_assignment(member, today).unwrap();

    let recent = db::rotation::query_recent_assignees(today, 4).unwrap();
    assert!(recent.contains(&member));

    let five_weeks_on = today.checked_add_days(Days::new(35)).unwrap();
    let recent = db::rotation::query_recent_assignees(five_weeks_on, 4).unwrap();
    assert!(!recent.contains(&member));
}
