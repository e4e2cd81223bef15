//! # Access Policy
//!
//! Decides which stored cards a [`Requester`] may see. The three tiers are a
//! classification of a single request, not states:
//!
//! | Tier      | Sees                                                        |
//! |-----------|-------------------------------------------------------------|
//! | `Author`  | every card                                                  |
//! | `Manager` | own cards, plus cards whose creator is on the manager's team |
//! | `User`    | cards whose `userId`, `actualCreator` or `walletAddress` is theirs |
//!
//! Matching is exact string equality and an empty identity field never
//! matches anything. The policy never fails: an unknown requester simply
//! gets an empty list.

use crate::format::{format_card, CardLinks, CardView};
use crate::model::{AccessLevel, CardRecord, Requester};
use chrono::{DateTime, Utc};

/// Answers whether a card creator belongs to a manager's team.
pub trait TeamDirectory: Send + Sync {
    fn is_on_team(&self, creator_id: &str, manager_id: &str) -> bool;
}

/// Team lookup used until referral-tree membership exists: nobody is on
/// anybody's team.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTeams;

impl TeamDirectory for NoTeams {
    fn is_on_team(&self, _creator_id: &str, _manager_id: &str) -> bool {
        false
    }
}

impl<F> TeamDirectory for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn is_on_team(&self, creator_id: &str, manager_id: &str) -> bool {
        self(creator_id, manager_id)
    }
}

fn same(a: &str, b: &str) -> bool {
    !a.is_empty() && a == b
}

/// Whether the card belongs to the requester by one of their own identity
/// fields.
pub fn is_owner(record: &CardRecord, requester: &Requester) -> bool {
    let by_user = same(&record.user_id, &requester.user_id)
        || same(&record.actual_creator, &requester.user_id);
    let by_wallet = requester
        .wallet_address
        .as_deref()
        .is_some_and(|wallet| same(&record.wallet_address, wallet));
    by_user || by_wallet
}

/// Whether `requester` may see `record` at all.
pub fn can_see(record: &CardRecord, requester: &Requester, teams: &dyn TeamDirectory) -> bool {
    match requester.level {
        AccessLevel::Author => true,
        AccessLevel::Manager => {
            is_owner(record, requester)
                || (!record.creator().is_empty()
                    && !requester.user_id.is_empty()
                    && teams.is_on_team(record.creator(), &requester.user_id))
        }
        AccessLevel::User => is_owner(record, requester),
    }
}

/// The requester's slice of `records` as views, newest first. Cards without
/// a creation time count as created `now`.
pub fn visible_cards(
    records: &[CardRecord],
    requester: &Requester,
    teams: &dyn TeamDirectory,
    links: &CardLinks,
    now: DateTime<Utc>,
) -> Vec<CardView> {
    let mut views: Vec<CardView> = records
        .iter()
        .filter(|record| can_see(record, requester, teams))
        .map(|record| {
            let mut view = format_card(record, links, now);
            view.is_owner = Some(is_owner(record, requester));
            view
        })
        .collect();

    // Stable sort: equal timestamps keep insertion order.
    views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    views
}
