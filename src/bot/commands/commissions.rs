//! Commission Discord commands - the per-upline commission report.
//!
//! The report shows the stat cards (total commission, total sales, purchaser
//! count) and one embed field per network level. Naming a purchaser drills down
//! into that purchaser's individual purchases.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::autocomplete},
        core::{
            commission,
            format::{format_currency, truncate},
            member,
            report::{self, CommissionReport},
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Discord embed field value limit
    const FIELD_VALUE_LIMIT: usize = 1024;

    /// One embed field per level group: heading plus one line per purchaser.
    #[must_use]
    pub fn level_fields(report: &CommissionReport) -> Vec<(String, String, bool)> {
        report
            .groups
            .iter()
            .map(|group| {
                let lines: Vec<String> = group
                    .purchasers
                    .iter()
                    .map(|p| format!("• {}", report::format_purchaser_line(p)))
                    .collect();
                let name = format!(
                    "{} · {}",
                    group.heading(),
                    format_currency(group.total_commission())
                );
                (name, truncate(&lines.join("\n"), FIELD_VALUE_LIMIT), false)
            })
            .collect()
    }

    /// Shows the commission report of a member, or one purchaser's purchases.
    ///
    /// Records are grouped per purchaser and bucketed into the configured levels.
    #[poise::command(slash_command, prefix_command)]
    pub async fn commissions(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member whose commissions to show"]
        #[autocomplete = "autocomplete::autocomplete_member"]
        #[rename = "member"]
        member_uid: String,
        #[description = "Only show the purchases of this purchaser"]
        #[autocomplete = "autocomplete::autocomplete_member"]
        purchaser: Option<String>,
    ) -> Result<()> {
        let data = ctx.data();
        let db = &data.database;

        let Some(upline) = member::get_member(db, &member_uid).await? else {
            return Err(Error::MemberNotFound { uid: member_uid });
        };

        let records = commission::get_commission_records_for_upline(db, &upline.uid).await?;
        let report = CommissionReport::build(
            &records,
            &data.config.display.levels,
            &data.config.level_rates(),
        );

        if let Some(purchaser_uid) = purchaser {
            let Some(summary) = report.purchaser(&purchaser_uid) else {
                ctx.say(format!(
                    "ℹ️ `{purchaser_uid}` has no purchases in {}'s network.",
                    upline.name
                ))
                .await?;
                return Ok(());
            };

            let lines: Vec<String> = summary
                .purchases
                .iter()
                .map(|r| format!("• {}", report::format_purchase_line(r)))
                .collect();
            let embed = serenity::CreateEmbed::default()
                .title(format!(
                    "🧾 {} · Level {}",
                    summary.purchaser.display_name(),
                    summary.level
                ))
                .description(truncate(&lines.join("\n"), 4096))
                .color(0x0034_98DB)
                .fields(vec![
                    (
                        "Total Sales".to_string(),
                        format_currency(summary.total_amount),
                        true,
                    ),
                    (
                        "Commission".to_string(),
                        format_currency(summary.total_commission),
                        true,
                    ),
                ])
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Upline: {} ({})",
                    upline.name, upline.uid
                )));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
            return Ok(());
        }

        if report.is_empty() {
            ctx.say(format!(
                "📭 No commissions recorded for {} yet.",
                upline.name
            ))
            .await?;
            return Ok(());
        }

        let mut fields = vec![
            (
                "Total Commission".to_string(),
                format_currency(report.totals.total_commission),
                true,
            ),
            (
                "Total Sales".to_string(),
                format_currency(report.totals.total_sales),
                true,
            ),
            (
                "Purchasers".to_string(),
                report.purchaser_count.to_string(),
                true,
            ),
        ];
        fields.extend(level_fields(&report));

        let embed = serenity::CreateEmbed::default()
            .title(format!("💰 Commission Network · {}", upline.name))
            .description(format!(
                "Commissions earned from purchases in {}'s network.",
                upline.name
            ))
            .color(0x0034_98DB)
            .fields(fields)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "{} record{}",
                records.len(),
                if records.len() == 1 { "" } else { "s" }
            )));

        ctx.send(poise::CreateReply::default().embed(embed)).await?;
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
        core::{
            commission::get_commission_records_for_upline, levels::LevelRates,
            report::CommissionReport,
        },
        errors::Result,
        test_utils::{create_test_purchase_with_commission, setup_with_network},
    };

    #[tokio::test]
    async fn test_level_fields_from_stored_commissions() -> Result<()> {
        let db = setup_with_network().await?;
        create_test_purchase_with_commission(&db, "alice", "rita", 1, 100.0).await?;
        create_test_purchase_with_commission(&db, "carol", "rita", 2, 40.0).await?;

        let records = get_commission_records_for_upline(&db, "rita").await?;
        let report = CommissionReport::build(&records, &[1, 2, 3], &LevelRates::default());
        let fields = level_fields(&report);

        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].0, "Level 1 · 15% · $15.00");
        assert!(fields[0].1.starts_with("• Alice (`alice`) · 1 purchase"));
        assert_eq!(fields[1].0, "Level 2 · 5% · $2.00");
        assert!(!fields[1].2);
        Ok(())
    }
}
