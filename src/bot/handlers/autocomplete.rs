//! Autocomplete handlers for Discord slash command parameters.
//!
//! Member parameters complete against the stored members; node parameters complete
//! against the nodes of the network view the user currently has open.

use crate::{
    bot::BotData,
    core::{member, tree::NetworkNode, view::NetworkTreeView},
    errors::Error,
};

/// Discord autocomplete limit
const MAX_SUGGESTIONS: usize = 25;

/// Provides autocomplete suggestions for member uids.
///
/// Matches the partial input against member names and uids and returns up to 25
/// uids, ordered by member name.
pub async fn autocomplete_member(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let db = &ctx.data().database;
    let Ok(members) = member::search_members(db, partial.trim(), MAX_SUGGESTIONS as u64).await
    else {
        return Vec::new();
    };
    members.into_iter().map(|m| m.uid).collect()
}

/// Node ids in the user's open view whose id or name contains `partial`.
#[must_use]
pub fn matching_node_ids(view: &NetworkTreeView, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut stack: Vec<&NetworkNode> = view.tree().network.iter().rev().collect();
    let mut matching = Vec::new();
    while let Some(node) = stack.pop() {
        if node.id.to_lowercase().contains(&partial_lower)
            || node.display_name().to_lowercase().contains(&partial_lower)
        {
            matching.push(node.id.clone());
            if matching.len() == MAX_SUGGESTIONS {
                break;
            }
        }
        stack.extend(node.children.iter().rev());
    }
    matching
}

/// Provides autocomplete suggestions for node ids in the user's open network view.
pub async fn autocomplete_node(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let sessions = ctx.data().sessions.lock().await;
    sessions
        .get(&ctx.author().id.get())
        .map(|view| matching_node_ids(view, partial))
        .unwrap_or_default()
}
