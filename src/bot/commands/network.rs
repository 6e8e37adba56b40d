//! Network Discord commands - the interactive referral tree.
//!
//! `/network show` opens a view of a member's network for the invoking user; the
//! other subcommands act on that open view. Expanding a node on the deepest loaded
//! level fetches the next level from the database. The session lock is released
//! while that fetch runs, so other commands of the same user are answered with the
//! node's pending state instead of waiting.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            loader::DbLevelLoader,
            member,
            render,
            view::{ExpandStep, LevelLoader, NetworkTreeView},
        },
        errors::{Error, Result},
    };
    use std::time::Instant;
    use tracing::info;

    /// Renders the view as a code-block message within `max_chars`.
    pub fn render_message(
        view: &mut NetworkTreeView,
        heading: &str,
        max_chars: usize,
    ) -> Result<String> {
        let now = Instant::now();
        view.expire_highlights(now);
        // heading, fences and newlines
        let overhead = heading.chars().count() + 9;
        let body = render::render(view, now, max_chars.saturating_sub(overhead))?;
        Ok(format!("{heading}\n```\n{body}```"))
    }

    /// Parent command for the interactive network tree.
    #[poise::command(
        slash_command,
        subcommands("network_show", "network_expand", "network_info", "network_root")
    )]
    pub async fn network(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "Network tree command. Available subcommands:\n\
            `/network show` - Open a member's network\n\
            `/network expand` - Expand or collapse a node\n\
            `/network info` - Toggle a node's info panel\n\
            `/network root` - Toggle the root member's info panel";

        ctx.say(help_text).await?;
        Ok(())
    }

    /// Opens the referral network of a member.
    #[poise::command(slash_command, rename = "show")]
    pub async fn network_show(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member at the root of the network"]
        #[autocomplete = "autocomplete::autocomplete_member"]
        #[rename = "member"]
        member_uid: String,
        #[description = "Levels to load up front (defaults to the configured depth)"]
        #[min = 1]
        #[max = 10]
        levels: Option<u32>,
    ) -> Result<()> {
        let data = ctx.data();
        let depth = levels.unwrap_or(data.config.display.initial_levels).max(1);

        ctx.defer().await?;
        let tree = member::fetch_network(&data.database, &member_uid, depth).await?;
        let mut view = NetworkTreeView::new(tree, depth)
            .with_lazy_loading(true)
            .with_highlight_duration(data.config.highlight_duration());

        let heading = format!(
            "🌳 **{}** · {} member{} loaded",
            view.tree().root.display_name(),
            view.tree().node_count(),
            if view.tree().node_count() == 1 { "" } else { "s" }
        );
        let message = render_message(&mut view, &heading, data.config.display.max_message_chars)?;

        let user_id = ctx.author().id.get();
        data.sessions.lock().await.insert(user_id, view);
        info!(user = user_id, root = %member_uid, depth, "Opened network view");

        ctx.say(message).await?;
        Ok(())
    }

    /// Expands or collapses a node, loading its level when needed.
    #[poise::command(slash_command, rename = "expand")]
    pub async fn network_expand(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Node to expand or collapse"]
        #[autocomplete = "autocomplete::autocomplete_node"]
        node: String,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.get();
        let max_chars = data.config.display.max_message_chars;
        ctx.defer().await?;

        let (step, root_uid) = {
            let mut sessions = data.sessions.lock().await;
            let view = sessions.get_mut(&user_id).ok_or(Error::NoOpenView)?;
            (view.begin_expand(&node)?, view.tree().root.id.clone())
        };

        let heading = match step {
            ExpandStep::Expanded => format!("▾ Expanded `{node}`"),
            ExpandStep::Collapsed => format!("▸ Collapsed `{node}`"),
            ExpandStep::NeedsLoad(load) => {
                let loader = DbLevelLoader::new(&data.database, root_uid);
                let loaded = loader.load_level(load.level, &load.node_id).await;

                let mut sessions = data.sessions.lock().await;
                let view = sessions.get_mut(&user_id).ok_or(Error::NoOpenView)?;
                match loaded {
                    Ok(batch) => {
                        let merged = view.finish_load(&load, batch);
                        if !view.expansion().is_expanded(&load.node_id) {
                            return Err(Error::LevelLoad {
                                level: load.level,
                                node_id: load.node_id,
                                message: "the result no longer matches this view".to_string(),
                            });
                        }
                        format!(
                            "▾ Expanded `{}` · loaded level {} ({merged} new member{})",
                            load.node_id,
                            load.level,
                            if merged == 1 { "" } else { "s" }
                        )
                    }
                    Err(e) => {
                        view.fail_load(&load);
                        return Err(e);
                    }
                }
            }
        };

        let message = {
            let mut sessions = data.sessions.lock().await;
            let view = sessions.get_mut(&user_id).ok_or(Error::NoOpenView)?;
            render_message(view, &heading, max_chars)?
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Toggles a node's info panel and highlights it.
    #[poise::command(slash_command, rename = "info")]
    pub async fn network_info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Node to show or hide details for"]
        #[autocomplete = "autocomplete::autocomplete_node"]
        node: String,
    ) -> Result<()> {
        let data = ctx.data();
        let message = {
            let mut sessions = data.sessions.lock().await;
            let view = sessions
                .get_mut(&ctx.author().id.get())
                .ok_or(Error::NoOpenView)?;
            let shown = view.toggle_info(&node, Instant::now())?;
            let heading = if shown {
                format!("ℹ️ Showing details for `{node}`")
            } else {
                format!("ℹ️ Hiding details for `{node}`")
            };
            render_message(view, &heading, data.config.display.max_message_chars)?
        };
        ctx.say(message).await?;
        Ok(())
    }

    /// Toggles the root member's info panel.
    #[poise::command(slash_command, rename = "root")]
    pub async fn network_root(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let message = {
            let mut sessions = data.sessions.lock().await;
            let view = sessions
                .get_mut(&ctx.author().id.get())
                .ok_or(Error::NoOpenView)?;
            let heading = if view.toggle_root_info() {
                "ℹ️ Showing root details"
            } else {
                "ℹ️ Hiding root details"
            };
            render_message(view, heading, data.config.display.max_message_chars)?
        };
        ctx.say(message).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{member::fetch_network, view::NetworkTreeView},
        errors::Result,
        test_utils::setup_with_network,
    };

    #[tokio::test]
    async fn test_render_message_fits_budget() -> Result<()> {
        let db = setup_with_network().await?;
        let tree = fetch_network(&db, "rita", 3).await?;
        let mut view = NetworkTreeView::new(tree, 3);

        let roomy = render_message(&mut view, "🌳 Rita", 10_000)?;
        assert!(roomy.starts_with("🌳 Rita\n```\n"));
        assert!(roomy.ends_with("```"));
        assert!(roomy.contains("Alice"));

        let tight = render_message(&mut view, "🌳 Rita", 200)?;
        assert!(tight.chars().count() <= 200);
        assert!(tight.contains("● Rita (rita)"));
        Ok(())
    }
}
