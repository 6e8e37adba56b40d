//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" so admins can check the bot is online.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Commission Network Help**\n\
        Here is a summary of all available commands.\n\n\
        **Commissions**\n\
        • `/commissions <member> [purchaser]` - Shows a member's commissions grouped by network level, \
        or one purchaser's individual purchases.\n\n\
        **Network Tree**\n\
        • `/network show <member> [levels]` - Opens a member's referral network.\n\
        • `/network expand <node>` - Expands or collapses a node, loading deeper levels on demand.\n\
        • `/network info <node>` - Toggles a node's details.\n\
        • `/network root` - Toggles the root member's details.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
