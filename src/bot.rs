use serenity::all::{ChannelId, GuildId, Message, Reaction, ReactionType, Ready};
use serenity::async_trait;
use serenity::prelude::*;

use anyhow::{Context as _, Result, anyhow};
use chrono::Utc;
use std::sync::Arc;

use crate::catalog::{Catalog, Question};
use crate::challenge;
use crate::config::Config;
use crate::errors::{BotError, BotResult};
use crate::genai::{Solution, SolutionClient};
use crate::jobs;
use crate::rotation;

pub mod commands;

/// Discord caps messages at 2000 chars; leave room for our framing.
const MAX_DESCRIPTION_LEN: usize = 1400;
const MAX_CODE_LEN: usize = 1600;

/// Shared, request-independent bot state: configuration, the question
/// catalog and the solution-generator client. All durable state lives
/// in the database.
pub struct BotState {
    pub config: Config,
    pub catalog: Catalog,
    pub solutions: SolutionClient,
}

pub async fn run(config: Config) -> Result<()> {
    let catalog = Catalog::load(&config.questions_path)?;
    let solutions = SolutionClient::new(&config);
    let token = config.discord_token.clone();

    let state = Arc::new(BotState { config, catalog, solutions });

    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGE_REACTIONS;

    let mut client = Client::builder(&token, intents)
        .event_handler(GrindHandler { state })
        .await
        .context("Error creating client.")?;

    client.start().await?;

    Ok(())
}

struct GrindHandler {
    state: Arc<BotState>,
}

#[async_trait]
impl EventHandler for GrindHandler {
    async fn ready(&self, ctx: serenity::client::Context, _ready: Ready) {
        log::info!("Bot is connected and ready!");

        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            jobs::run_scheduler(ctx, state).await;
        });
    }

    async fn message(&self, ctx: serenity::client::Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        // Any message from the current assignee in the news channel
        // counts as delivering the news.
        if msg.channel_id.get() == self.state.config.news_channel_id {
            match rotation::try_mark_complete(msg.author.id.get(), Utc::now().date_naive()) {
                Ok(true) => {
                    let thanks = format!(
                        "✅ Thanks <@{}>! Your AI news has been recorded.",
                        msg.author.id
                    );
                    if let Err(why) = msg.channel_id.say(&ctx.http, thanks).await {
                        log::error!("Error sending completion ack: {why:?}");
                    }
                }
                Ok(false) => {}
                Err(err) => log::error!("Error checking rotation response: {err}"),
            }
        }

        // Commands
        if msg.content.starts_with('$') && msg.content.len() > 1 {
            let response = match commands::Commands::run_command(&ctx, &msg, &self.state).await {
                Ok(message) => message,
                Err(err) => format!("Error: {}", err),
            };

            // Discord doesn't like sending empty messages.
            if response.is_empty() {
                return;
            }

            if let Err(why) = msg.channel_id.say(&ctx.http, response).await {
                let _ = msg.channel_id.say(&ctx.http, "Oops, internal error.").await;
                log::error!("Error sending message: {why:?}");
            }
        }
    }

    async fn reaction_add(&self, ctx: serenity::client::Context, reaction: Reaction) {
        if reaction.channel_id.get() != self.state.config.news_channel_id {
            return;
        }
        if reaction.emoji != ReactionType::Unicode(String::from(rotation::COMPLETION_EMOJI)) {
            return;
        }
        let Some(user_id) = reaction.user_id else {
            return;
        };

        match rotation::try_mark_complete(user_id.get(), Utc::now().date_naive()) {
            Ok(true) => {
                let thanks = format!("✅ Thanks <@{user_id}>! Your AI news has been recorded.");
                if let Err(why) = reaction.channel_id.say(&ctx.http, thanks).await {
                    log::error!("Error sending completion ack: {why:?}");
                }
            }
            Ok(false) => {}
            Err(err) => log::error!("Error checking rotation reaction: {err}"),
        }
    }
}

fn challenge_channel(state: &BotState) -> BotResult<ChannelId> {
    if state.config.challenge_channel_id == 0 {
        return Err(BotError::Other(anyhow!(
            "Challenge channel not configured; set DSA_CHANNEL_ID."
        )));
    }
    Ok(ChannelId::new(state.config.challenge_channel_id))
}

/// Posts today's challenge: pre-check, resolve the question, announce
/// it, record the row. Shared by the `$question` command and the
/// scheduled job; both lose gracefully if the other got there first.
pub async fn post_challenge_flow(
    ctx: &serenity::client::Context,
    state: &BotState,
    explicit_id: Option<u32>,
) -> BotResult<String> {
    let today = Utc::now().date_naive();
    challenge::ensure_not_posted(today)?;

    let question = challenge::resolve_question(&state.catalog, explicit_id).await?;
    let channel = challenge_channel(state)?;

    let message = channel
        .say(&ctx.http, format_question(&question))
        .await
        .map_err(|err| BotError::Other(err.into()))?;

    challenge::record_posted(question.id, today, message.id.get())?;

    log::info!("Posted daily question: {}", question.title);
    Ok(format!("✅ Posted question #{}: **{}**", question.id, question.title))
}

/// Generates solutions for every target language, posts them, and only
/// then marks the challenge solved. Generation latency lives entirely
/// before the first message, so an interrupted run changes nothing.
pub async fn post_solution_flow(
    ctx: &serenity::client::Context,
    state: &BotState,
) -> BotResult<String> {
    let today = Utc::now().date_naive();
    let target = challenge::solution_target(today)?;
    let question = challenge::question_by_id(&state.catalog, target.question_id).await?;

    let solutions = state
        .solutions
        .generate_all(&question)
        .await
        .map_err(BotError::Other)?;

    let channel = challenge_channel(state)?;
    let header = channel
        .say(&ctx.http, format_solution_header(&question, &solutions))
        .await
        .map_err(|err| BotError::Other(err.into()))?;

    for solution in &solutions {
        if let Err(err) = channel.say(&ctx.http, format_solution(solution)).await {
            log::error!("Error posting {} solution: {err:?}", solution.language);
        }
    }

    challenge::record_solution(target.id, header.id.get())?;

    log::info!("Posted multi-language solution for: {}", question.title);
    Ok(format!("✅ Posted solutions for **{}**", question.title))
}

/// Wednesday's rotation reminder: skip if the current assignee already
/// delivered, otherwise pick someone new and put them on the hook.
pub async fn send_rotation_reminder(
    ctx: &serenity::client::Context,
    state: &BotState,
) -> BotResult<()> {
    let today = Utc::now().date_naive();
    if !rotation::should_send_reminder(today)? {
        log::info!("Rotation assignment already completed this week; no reminder.");
        return Ok(());
    }

    if state.config.news_channel_id == 0 {
        log::warn!("AI_NEWS_CHANNEL_ID not set; skipping rotation reminder.");
        return Ok(());
    }
    let channel = ChannelId::new(state.config.news_channel_id);

    let guild_id = match channel
        .to_channel(&ctx.http)
        .await
        .map_err(|err| BotError::Other(err.into()))?
        .guild()
    {
        Some(guild_channel) => guild_channel.guild_id,
        None => {
            log::warn!("News channel is not a guild channel; skipping reminder.");
            return Ok(());
        }
    };

    let candidates = eligible_candidates(ctx, guild_id).await?;
    let member_id = rotation::pick_assignee(&candidates, today)?;

    let reminder = format!(
        "📰 **Weekly AI News Time!**\n\
         <@{member_id}>, you've been selected to share this week's AI news!\n\
         Reply in this channel (or react with {}) to mark it done.",
        rotation::COMPLETION_EMOJI
    );
    channel
        .say(&ctx.http, reminder)
        .await
        .map_err(|err| BotError::Other(err.into()))?;

    rotation::record_assignment(member_id, today)?;
    Ok(())
}

/// Guild members minus bots, administrators and the guild owner.
async fn eligible_candidates(
    ctx: &serenity::client::Context,
    guild_id: GuildId,
) -> BotResult<Vec<u64>> {
    let members = guild_id
        .members(&ctx.http, None, None)
        .await
        .map_err(|err| BotError::Other(err.into()))?;
    let roles = guild_id
        .roles(&ctx.http)
        .await
        .map_err(|err| BotError::Other(err.into()))?;
    let owner_id = guild_id
        .to_partial_guild(&ctx.http)
        .await
        .map_err(|err| BotError::Other(err.into()))?
        .owner_id;

    let candidates = members
        .iter()
        .filter(|member| !member.user.bot)
        .filter(|member| member.user.id != owner_id)
        .filter(|member| {
            !member.roles.iter().any(|role_id| {
                roles
                    .get(role_id)
                    .is_some_and(|role| role.permissions.administrator())
            })
        })
        .map(|member| member.user.id.get())
        .collect();

    Ok(candidates)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let cut = text
        .char_indices()
        .take_while(|(at, _)| *at < max)
        .last()
        .map(|(at, c)| at + c.len_utf8())
        .unwrap_or(0);
    format!("{}…", &text[..cut])
}

fn format_question(question: &Question) -> String {
    let mut output = format!(
        "🚀 **Daily LeetCode Challenge!**\n\
         **Problem #{}: {}** ({})\n",
        question.id, question.title, question.difficulty
    );
    if !question.category.is_empty() {
        output += &format!("Category: {}\n", question.category);
    }
    output += "\n";
    output += &truncate(&question.description, MAX_DESCRIPTION_LEN);
    output += "\n";

    for hint in &question.hints {
        output += &format!("\n💡 {hint}");
    }

    output += &format!("\n\nSolve it here: {}", question.url);
    output += "\nSolution will be posted later today!";
    output
}

fn format_solution_header(question: &Question, solutions: &[Solution]) -> String {
    let mut output = format!("✅ **Solution for Today's Challenge: {}**\n", question.title);
    if let Some(first) = solutions.first() {
        output += &format!(
            "\n{}\n\n⏱️ Time: {} • 💾 Space: {}",
            truncate(&first.explanation, MAX_DESCRIPTION_LEN),
            first.time_complexity,
            first.space_complexity
        );
    }
    output
}

fn format_solution(solution: &Solution) -> String {
    format!(
        "**{} Solution**\n```{}\n{}\n```",
        solution.language,
        solution.language.syntax(),
        truncate(&solution.code, MAX_CODE_LEN)
    )
}
