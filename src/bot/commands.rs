use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use itertools::Itertools;
use serenity::model::channel::Message;

use crate::bot::{self, BotState};
use crate::challenge;
use crate::db;
use crate::errors::BotError;
use crate::jobs::JobRegistry;
use crate::lcapi;
use crate::roles;
use crate::stats;

const MAX_CMD_LENGTH: usize = 12;

struct CommandInstance<'a> {
    msg: &'a Message,
    ctx: &'a serenity::client::Context,
    state: &'a BotState,
    parameters: &'a [&'a str],
}

pub struct Commands;
impl Commands {
    pub async fn run_command(
        ctx: &serenity::client::Context,
        msg: &Message,
        state: &BotState,
    ) -> Result<String> {
        // Split the message's content (on whitespace) into:
        // - The command (first token)
        // - Its parameters (all tokens afterwards)

        // Skip the first letter for the command: it's the call token
        let input = String::from(&msg.content[1..]);
        let split_tokens = input.split_whitespace().collect::<Vec<_>>();
        let Some((&[command], parameters)) = split_tokens.split_at_checked(1) else {
            return Err(anyhow!("Invalid command syntax."));
        };

        let cmd = CommandInstance { msg, ctx, state, parameters };

        // Execute the command
        let result: String = match command {
                  "link" => cmd.link().await?,
                "unlink" => cmd.unlink().await?,
               "profile" => cmd.profile().await?,
           "leaderboard" => cmd.leaderboard().await?,
                "update" => cmd.update().await?,
              "question" => cmd.question().await?,
              "solution" => cmd.solution().await?,
            "challenges" => cmd.challenges().await?,
                  "jobs" => cmd.jobs().await?,
                  "help" => Self::get_help(),
            _ => {
                if Commands::is_valid_cmd(command) {
                    log::info!("User submitted unknown command: {}", command);
                    return Err(anyhow!(
                        "No such command found: {}, see $help for commands.",
                        command
                    ));
                } else {
                    log::info!("User submitted invalid command: {}", command);
                    return Err(anyhow!("Invalid command syntax."));
                }
            }
        };

        Ok(result)
    }
}

/// Non-async helpers
impl Commands {
    /// Ensures that the string slice conforms to C-like identifier regex
    fn is_valid_cmd(s: &str) -> bool {
        s.len() <= MAX_CMD_LENGTH
            && regex::Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap().is_match(s)
    }

    /// Gets a help string. Should be updated after a new command is added
    pub fn get_help() -> String {
        String::from(
            r#"
**Command List:**
`$link <leetcode username>`:  Link your LeetCode account.
`$unlink`:  Unlink your LeetCode account.
`$profile [@member]`:  View a member's LeetCode profile.
`$leaderboard`:  This week's top solvers.
`$update`:  Refresh your stats right now.
`$question [id]`:  Post today's challenge (next unposted, or a specific id).
`$solution`:  Generate and post today's multi-language solution.
`$challenges`:  Daily challenge statistics.
`$jobs`:  Scheduled job status.
`$help`:  Get information on supported commands
"#,
        )
    }
}

impl CommandInstance<'_> {
    async fn link(&self) -> Result<String> {
        let username = self
            .parameters
            .first()
            .context("Expected a LeetCode username, got none.")?
            .to_string();
        let member_id = self.msg.author.id.get();

        // Validate against LeetCode before recording anything.
        lcapi::fetch_user_stats(&username).await?;

        db::accounts::link_account(member_id, &username, Utc::now())?;
        stats::refresh_account(member_id, &username).await?;

        if let Some(guild_id) = self.msg.guild_id {
            if let Err(err) = roles::reconcile_member(self.ctx, guild_id, member_id).await {
                log::error!("Role update after link failed: {err}");
            }
        }

        let account = db::accounts::query_account(member_id)?
            .context("Account vanished right after linking?")?;

        Ok(format!("✅ Account linked!\n{account}"))
    }

    async fn unlink(&self) -> Result<String> {
        if db::accounts::unlink_account(self.msg.author.id.get())? {
            log::info!("{} unlinked their account", self.msg.author.name);
            Ok(String::from("✅ Your LeetCode account has been unlinked."))
        } else {
            Ok(String::from("You don't have a linked account."))
        }
    }

    async fn profile(&self) -> Result<String> {
        let member_id = match self.parameters.first() {
            Some(token) => parse_member_mention(token)
                .context("Expected a member mention or id, e.g. `$profile @name`.")?,
            None => self.msg.author.id.get(),
        };

        let Some(account) = db::accounts::query_account(member_id)? else {
            return Ok(String::from(
                "That member hasn't linked a LeetCode account yet. Use `$link` to get started.",
            ));
        };

        let mut output = format!(
            "📊 **LeetCode Profile**\n{account}\nhttps://leetcode.com/{}\n",
            account.username
        );

        let week = stats::week_number_for(Utc::now().timestamp());
        let submissions = db::submissions::query_submissions_for_week(member_id, week)?;
        if !submissions.is_empty() {
            output += "\n**This Week:**\n";
            for submission in submissions.iter().take(5) {
                output += &format!(
                    "\t{} {} ({})\n",
                    difficulty_emoji(&submission.difficulty),
                    submission.problem_title,
                    submission.difficulty
                );
            }
        }

        if let Some(updated) = account.last_updated {
            output += &format!("\nLast updated: {}", updated.format("%Y-%m-%d %H:%M UTC"));
        }

        Ok(output)
    }

    async fn leaderboard(&self) -> Result<String> {
        let leaders = db::accounts::weekly_leaderboard(10)?;
        if leaders.is_empty() {
            return Ok(String::from(
                "📊 No data available yet! Link your account with `$link`.",
            ));
        }

        const MEDALS: [&str; 3] = ["🥇", "🥈", "🥉"];
        let rows = leaders
            .iter()
            .enumerate()
            .map(|(rank, account)| {
                let medal = MEDALS
                    .get(rank)
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("#{}", rank + 1));
                format!(
                    "{medal} **{}** - {} problems",
                    account.username, account.weekly_solved
                )
            })
            .join("\n");

        Ok(format!("🏆 **Weekly Leaderboard**\n{rows}"))
    }

    async fn update(&self) -> Result<String> {
        let member_id = self.msg.author.id.get();
        if let Err(err) = stats::refresh_member(member_id).await {
            if matches!(err, BotError::AccountNotFound(_)) {
                return Ok(String::from(
                    "You haven't linked your account yet! Use `$link` first.",
                ));
            }
            return Err(err.into());
        }

        if let Some(guild_id) = self.msg.guild_id {
            if let Err(err) = roles::reconcile_member(self.ctx, guild_id, member_id).await {
                log::error!("Role update after refresh failed: {err}");
            }
        }

        let refreshed = db::accounts::query_account(member_id)?
            .context("Account vanished during refresh?")?;
        Ok(format!("✅ Stats updated!\n{refreshed}"))
    }

    async fn question(&self) -> Result<String> {
        let explicit_id = self
            .parameters
            .first()
            .map(|token| token.parse::<u32>())
            .transpose()
            .context("Question id must be a number.")?;

        Ok(bot::post_challenge_flow(self.ctx, self.state, explicit_id).await?)
    }

    async fn solution(&self) -> Result<String> {
        // Generation takes a while; acknowledge before starting.
        let _ = self
            .msg
            .channel_id
            .say(&self.ctx.http, "⏳ Generating solutions. This may take 30-60 seconds.")
            .await;

        Ok(bot::post_solution_flow(self.ctx, self.state).await?)
    }

    async fn challenges(&self) -> Result<String> {
        Ok(challenge::status_summary(Utc::now().date_naive(), &self.state.catalog)?)
    }

    async fn jobs(&self) -> Result<String> {
        let snapshot = JobRegistry::global().snapshot();
        if snapshot.is_empty() {
            return Ok(String::from("No jobs have run yet."));
        }

        let rows = snapshot
            .iter()
            .map(|(name, status)| {
                let last_run = status
                    .last_run
                    .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| String::from("never"));
                let health = match &status.last_error {
                    Some(err) => format!("last error: {err}"),
                    None => String::from("ok"),
                };
                format!("`{name}`: {} runs, last {last_run}, {health}", status.runs)
            })
            .join("\n");

        Ok(format!("**Scheduled Jobs:**\n{rows}"))
    }
}

fn parse_member_mention(token: &str) -> Option<u64> {
    let mention = regex::Regex::new(r"^<@!?(\d+)>$").unwrap();
    if let Some(captures) = mention.captures(token) {
        return captures[1].parse().ok();
    }
    token.parse().ok()
}

fn difficulty_emoji(difficulty: &str) -> &'static str {
    match difficulty {
        "Easy" => "🟢",
        "Medium" => "🟡",
        "Hard" => "🔴",
        _ => "⚪",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_mentions_parse_in_all_shapes() {
        assert_eq!(parse_member_mention("<@123456>"), Some(123456));
        assert_eq!(parse_member_mention("<@!123456>"), Some(123456));
        assert_eq!(parse_member_mention("123456"), Some(123456));
        assert_eq!(parse_member_mention("@name"), None);
    }

    #[test]
    fn command_names_validate_like_identifiers() {
        assert!(Commands::is_valid_cmd("leaderboard"));
        assert!(!Commands::is_valid_cmd("not a command"));
        assert!(!Commands::is_valid_cmd("averyverylongcommand"));
    }
}
