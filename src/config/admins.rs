//! Admin access configuration loaded from environment variables.
//!
//! The viewer exposes member purchase data, so commands are limited to the Discord
//! user ids listed in `ADMIN_USER_IDS` (comma separated). When the variable is unset
//! or empty, every user may run commands.

use std::collections::HashSet;

/// Parses a comma-separated list of Discord user ids, skipping anything that is not a number.
#[must_use]
pub fn parse_admin_ids(raw: &str) -> HashSet<u64> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

/// Gets the configured admin ids from `ADMIN_USER_IDS`.
#[must_use]
pub fn get_admin_ids() -> HashSet<u64> {
    std::env::var("ADMIN_USER_IDS")
        .map(|raw| parse_admin_ids(&raw))
        .unwrap_or_default()
}

/// Whether `user_id` may use the viewer given the configured `admins`.
#[must_use]
pub fn is_allowed(admins: &HashSet<u64>, user_id: u64) -> bool {
    admins.is_empty() || admins.contains(&user_id)
}
