//! Member business logic - the local referral network.
//!
//! Members point at the member who referred them. This module creates and looks up
//! members, and walks `referrer_uid` downwards to build the network below a member,
//! either several levels at once ([`fetch_network`]) or one whole level at a time
//! ([`fetch_level_batch`]) for lazily expanded trees.

use crate::{
    config::settings::MemberConfig,
    core::tree::{LevelBatch, NetworkNode, NetworkTree, RootUser},
    entities::{Member, member},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, QueryOrder, QuerySelect, Set, prelude::*};
use std::collections::HashMap;
use tracing::{debug, info};

/// Creates a member, validating that the uid and name are not blank.
///
/// # Errors
/// Returns an error if the uid or name is blank, or the insert fails (for example
/// because the uid is taken).
pub async fn create_member<C: ConnectionTrait>(
    db: &C,
    uid: &str,
    name: &str,
    referrer_uid: Option<&str>,
) -> Result<member::Model> {
    if uid.trim().is_empty() {
        return Err(Error::Config {
            message: "Member uid cannot be empty".to_string(),
        });
    }
    if name.trim().is_empty() {
        return Err(Error::Config {
            message: "Member name cannot be empty".to_string(),
        });
    }

    let member = member::ActiveModel {
        uid: Set(uid.trim().to_string()),
        name: Set(name.trim().to_string()),
        referrer_uid: Set(referrer_uid.map(|r| r.trim().to_string())),
        joined_at: Set(chrono::Utc::now()),
    };
    member.insert(db).await.map_err(Into::into)
}

/// Retrieves a member by uid.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_member<C: ConnectionTrait>(db: &C, uid: &str) -> Result<Option<member::Model>> {
    Member::find_by_id(uid.trim().to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds members whose name or uid contains `partial`, for autocomplete.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn search_members(
    db: &DatabaseConnection,
    partial: &str,
    limit: u64,
) -> Result<Vec<member::Model>> {
    Member::find()
        .filter(
            member::Column::Name
                .contains(partial)
                .or(member::Column::Uid.contains(partial)),
        )
        .order_by_asc(member::Column::Name)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Direct referrals of every member in `uids`, in join order.
async fn get_referrals_of<C: ConnectionTrait>(
    db: &C,
    uids: &[String],
) -> Result<Vec<member::Model>> {
    if uids.is_empty() {
        return Ok(Vec::new());
    }
    Member::find()
        .filter(member::Column::ReferrerUid.is_in(uids.iter().cloned()))
        .order_by_asc(member::Column::JoinedAt)
        .order_by_asc(member::Column::Uid)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Direct referrals of one member, in join order.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn get_direct_referrals<C: ConnectionTrait>(
    db: &C,
    uid: &str,
) -> Result<Vec<member::Model>> {
    get_referrals_of(db, &[uid.to_string()]).await
}

/// Counts the direct referrals of each member in `uids`. Members without
/// referrals are absent from the map.
///
/// # Errors
/// Returns an error if the database query fails.
pub async fn count_referrals<C: ConnectionTrait>(
    db: &C,
    uids: &[String],
) -> Result<HashMap<String, u32>> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for referral in get_referrals_of(db, uids).await? {
        if let Some(referrer) = referral.referrer_uid {
            *counts.entry(referrer).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Turns one level of members into nodes grouped by referrer.
///
/// `children` holds the already-built nodes of the level below, keyed by parent;
/// members without loaded children fall back to `counts` for their referral total.
fn build_level(
    members: Vec<member::Model>,
    level: u32,
    mut children: HashMap<String, Vec<NetworkNode>>,
    counts: &HashMap<String, u32>,
) -> HashMap<String, Vec<NetworkNode>> {
    let mut by_parent: HashMap<String, Vec<NetworkNode>> = HashMap::new();
    for m in members {
        let mut node = NetworkNode::new(m.uid.clone(), Some(m.name), level);
        node.children = children.remove(&m.uid).unwrap_or_default();
        node.total_children = if node.children.is_empty() {
            counts.get(&m.uid).copied().unwrap_or(0)
        } else {
            u32::try_from(node.children.len()).unwrap_or(u32::MAX)
        };
        by_parent
            .entry(m.referrer_uid.unwrap_or_default())
            .or_default()
            .push(node);
    }
    by_parent
}

/// Builds the network below `root_uid`, `depth` levels deep.
///
/// Nodes on the deepest level carry their referral count in `total_children`
/// without their children, so a view knows which of them can expand further.
///
/// # Errors
/// Returns [`Error::MemberNotFound`] if the root member does not exist, or an
/// error if a database query fails.
pub async fn fetch_network(
    db: &DatabaseConnection,
    root_uid: &str,
    depth: u32,
) -> Result<NetworkTree> {
    let root = get_member(db, root_uid)
        .await?
        .ok_or_else(|| Error::MemberNotFound {
            uid: root_uid.to_string(),
        })?;

    let mut levels: Vec<Vec<member::Model>> = Vec::new();
    let mut frontier = vec![root.uid.clone()];
    for _ in 0..depth {
        let members = get_referrals_of(db, &frontier).await?;
        if members.is_empty() {
            break;
        }
        frontier = members.iter().map(|m| m.uid.clone()).collect();
        levels.push(members);
    }
    let deepest_counts = if levels.len() == depth as usize {
        count_referrals(db, &frontier).await?
    } else {
        HashMap::new()
    };

    let no_counts = HashMap::new();
    let mut children: HashMap<String, Vec<NetworkNode>> = HashMap::new();
    let loaded = levels.len();
    for (index, members) in levels.into_iter().enumerate().rev() {
        let level = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let counts = if index + 1 == loaded {
            &deepest_counts
        } else {
            &no_counts
        };
        children = build_level(members, level, children, counts);
    }

    let network = children.remove(&root.uid).unwrap_or_default();
    let tree = NetworkTree::new(
        RootUser {
            id: root.uid,
            name: Some(root.name),
        },
        network,
    );
    debug!(
        root = root_uid,
        depth,
        nodes = tree.node_count(),
        "Fetched network"
    );
    Ok(tree)
}

/// Loads every member on `next_level` below `root_uid`, grouped by referrer.
///
/// # Errors
/// Returns an error if a database query fails.
pub async fn fetch_level_batch<C: ConnectionTrait>(
    db: &C,
    root_uid: &str,
    next_level: u32,
) -> Result<LevelBatch> {
    let mut frontier = vec![root_uid.to_string()];
    for _ in 1..next_level {
        frontier = get_referrals_of(db, &frontier)
            .await?
            .into_iter()
            .map(|m| m.uid)
            .collect();
        if frontier.is_empty() {
            return Ok(LevelBatch::new(next_level));
        }
    }

    let members = get_referrals_of(db, &frontier).await?;
    let uids: Vec<String> = members.iter().map(|m| m.uid.clone()).collect();
    let counts = count_referrals(db, &uids).await?;
    let grouped = build_level(members, next_level, HashMap::new(), &counts);

    let batch = grouped
        .into_iter()
        .fold(LevelBatch::new(next_level), |batch, (parent, nodes)| {
            batch.with_children(parent, nodes)
        });
    debug!(root = root_uid, next_level, nodes = batch.len(), "Fetched level batch");
    Ok(batch)
}

/// Inserts configured members that are not stored yet. Returns how many were added.
///
/// Members are inserted in the order given, so a referrer should be listed before
/// the members it referred.
///
/// # Errors
/// Returns an error if a configured member is invalid or an insert fails.
pub async fn seed_members(db: &DatabaseConnection, members: &[MemberConfig]) -> Result<usize> {
    let mut added = 0;
    for config in members {
        if get_member(db, &config.uid).await?.is_some() {
            debug!(uid = %config.uid, "Member already exists, skipping seed");
            continue;
        }
        create_member(db, &config.uid, &config.name, config.referrer.as_deref()).await?;
        added += 1;
    }
    if added > 0 {
        info!("Seeded {} members from configuration", added);
    }
    Ok(added)
}
