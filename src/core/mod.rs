//! Core business logic - framework-agnostic commission reporting and network tree
//! operations. Nothing in here knows about Discord.

/// Grouping commission records per purchaser
pub mod aggregate;
/// Character-grid drawing of node boxes and connectors
pub mod canvas;
/// Purchases, commissions, and snapshot import
pub mod commission;
/// Which network nodes are expanded
pub mod expansion;
/// Currency, percentage, and date formatting
pub mod format;
/// Node placement and connector geometry
pub mod geometry;
/// Level classification, totals, and display rates
pub mod levels;
/// Database-backed level loading
pub mod loader;
/// Members and the referral network
pub mod member;
/// Commission record wire types
pub mod records;
/// Text rendering of a network view
pub mod render;
/// Commission report assembly
pub mod report;
/// Network tree types and payload parsing
pub mod tree;
/// Interactive network tree state
pub mod view;
