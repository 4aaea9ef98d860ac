//! Tier roles: maps weekly solved counts onto Bronze/Silver/Gold and
//! reconciles a member's held roles against the computed tier. Every
//! call recomputes desired state from scratch, so the operation is
//! idempotent and a member holds at most one tier role at any time.

use serenity::all::{Colour, Context, EditRole, GuildId, RoleId, UserId};
use std::collections::HashMap;

use crate::db;
use crate::errors::{BotError, BotResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    /// Highest tier first, so the first threshold met wins.
    pub const ALL: [Tier; 3] = [Tier::Gold, Tier::Silver, Tier::Bronze];

    pub fn name(self) -> &'static str {
        match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
        }
    }

    pub fn threshold(self) -> u32 {
        match self {
            Tier::Bronze => 1,
            Tier::Silver => 5,
            Tier::Gold => 10,
        }
    }

    pub fn colour(self) -> Colour {
        match self {
            Tier::Bronze => Colour::ORANGE,
            Tier::Silver => Colour::LIGHT_GREY,
            Tier::Gold => Colour::GOLD,
        }
    }
}

/// The tier earned by `weekly_solved`, or None below every threshold.
pub fn tier_for(weekly_solved: u32) -> Option<Tier> {
    Tier::ALL
        .into_iter()
        .find(|tier| weekly_solved >= tier.threshold())
}

fn map_role_error(err: serenity::Error) -> BotError {
    if let serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(ref resp)) = err {
        if resp.status_code == reqwest::StatusCode::FORBIDDEN {
            return BotError::Unauthorized;
        }
    }
    BotError::Other(err.into())
}

/// Ensures each tier role exists on the guild, creating missing ones
/// with their fixed colors. A creation failure for one tier is logged
/// and doesn't block the others.
async fn ensure_tier_roles(ctx: &Context, guild_id: GuildId) -> BotResult<HashMap<Tier, RoleId>> {
    let existing = guild_id.roles(&ctx.http).await.map_err(map_role_error)?;
    let mut by_tier = HashMap::new();

    for tier in Tier::ALL {
        if let Some(role) = existing.values().find(|role| role.name == tier.name()) {
            by_tier.insert(tier, role.id);
            continue;
        }

        let builder = EditRole::new().name(tier.name()).colour(tier.colour());
        match guild_id.create_role(&ctx.http, builder).await {
            Ok(role) => {
                log::info!("Created tier role: {}", tier.name());
                by_tier.insert(tier, role.id);
            }
            Err(err) => log::error!("Failed to create role {}: {err}", tier.name()),
        }
    }

    Ok(by_tier)
}

/// Reconciles one member's tier roles against their current weekly
/// count: add the earned tier if absent, strip every other tier held,
/// strip everything when below all thresholds. Members without a linked
/// account are left untouched.
pub async fn reconcile_member(ctx: &Context, guild_id: GuildId, member_id: u64) -> BotResult<()> {
    let Some(account) = db::accounts::query_account(member_id)? else {
        return Ok(());
    };

    let target = tier_for(account.weekly_solved);
    let roles = ensure_tier_roles(ctx, guild_id).await?;

    let member = guild_id
        .member(&ctx.http, UserId::new(member_id))
        .await
        .map_err(map_role_error)?;

    for (tier, role_id) in &roles {
        let held = member.roles.contains(role_id);
        if Some(*tier) == target && !held {
            member
                .add_role(&ctx.http, *role_id)
                .await
                .map_err(map_role_error)?;
            log::info!("Added {} to {}", tier.name(), member.user.name);
        } else if Some(*tier) != target && held {
            member
                .remove_role(&ctx.http, *role_id)
                .await
                .map_err(map_role_error)?;
            log::info!("Removed {} from {}", tier.name(), member.user.name);
        }
    }

    Ok(())
}

/// Reconciles every linked member. One member failing (left the guild,
/// permission trouble) doesn't stop the sweep.
pub async fn reconcile_all(ctx: &Context, guild_id: GuildId) -> BotResult<()> {
    for (member_id, username) in db::accounts::query_all_accounts()? {
        if let Err(err) = reconcile_member(ctx, guild_id, member_id).await {
            log::error!("Role reconciliation failed for {username}: {err}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_threshold_met_wins() {
        assert_eq!(tier_for(0), None);
        assert_eq!(tier_for(1), Some(Tier::Bronze));
        assert_eq!(tier_for(4), Some(Tier::Bronze));
        assert_eq!(tier_for(5), Some(Tier::Silver));
        assert_eq!(tier_for(7), Some(Tier::Silver));
        assert_eq!(tier_for(10), Some(Tier::Gold));
        assert_eq!(tier_for(100), Some(Tier::Gold));
    }

    #[test]
    fn recompute_is_history_free() {
        // Dropping from Gold-worthy to Bronze-worthy computes Bronze
        // outright; reconciliation never looks at what was held before.
        assert_eq!(tier_for(10), Some(Tier::Gold));
        assert_eq!(tier_for(3), Some(Tier::Bronze));
    }
}
