use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Runtime configuration, gathered once at startup from the environment
/// (`.env` is loaded by `main` before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,

    pub db_path: String,
    pub questions_path: String,

    pub groq_api_key: Option<String>,
    pub groq_model: String,

    /// Channel the daily challenge and its solution are posted to.
    pub challenge_channel_id: u64,
    /// Channel the rotation reminder goes to and completions are watched in.
    pub news_channel_id: u64,

    /// UTC hours for the two daily challenge jobs.
    pub challenge_hour: u32,
    pub solution_hour: u32,

    /// Pause between per-member stats refreshes (LeetCode rate limits).
    pub refresh_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let discord_token = env::var("DISCORD_TOKEN")
            .context("Expected 'DISCORD_TOKEN=<token>' in .env in project root.")?;

        Ok(Self {
            discord_token,
            db_path: env::var("GRINDBOT_DB").unwrap_or_else(|_| String::from("grind.db")),
            questions_path: env::var("QUESTIONS_PATH")
                .unwrap_or_else(|_| String::from("questions.json")),
            groq_api_key: env::var("GROQ_API_KEY").ok(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| String::from("llama-3.3-70b-versatile")),
            challenge_channel_id: parse_id("DSA_CHANNEL_ID")?,
            news_channel_id: parse_id("AI_NEWS_CHANNEL_ID")?,
            challenge_hour: parse_hour("CHALLENGE_HOUR", 9)?,
            solution_hour: parse_hour("SOLUTION_HOUR", 18)?,
            refresh_delay: Duration::from_secs(2),
        })
    }
}

fn parse_id(key: &str) -> Result<u64> {
    env::var(key)
        .unwrap_or_else(|_| String::from("0"))
        .parse::<u64>()
        .with_context(|| format!("{key} must be a numeric channel id"))
}

fn parse_hour(key: &str, default: u32) -> Result<u32> {
    let hour = match env::var(key) {
        Ok(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("{key} must be an hour (0-23)"))?,
        Err(_) => default,
    };
    anyhow::ensure!(hour < 24, "{key} must be an hour (0-23), got {hour}");
    Ok(hour)
}
