//! Identity resolution: turns what a caller claims (wallet address, user id,
//! registry level) into a [`Requester`] with a closed [`AccessLevel`].
//!
//! The wallet/contract layer is outside this crate. It hands over an
//! [`IdentityClaim`]; the configured founder addresses take precedence over
//! whatever level the registry reported.

use crate::config::FounderConfig;
use crate::model::{AccessLevel, Requester};
use log::debug;
use serde::{Deserialize, Serialize};

pub const AUTHOR_USER_ID: &str = "AUTHOR";
pub const COAUTHOR_PREFIX: &str = "COAUTHOR_";

/// Unverified identity as presented by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityClaim {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub level: Option<i64>,
}

pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, claim: &IdentityClaim) -> Requester;
}

/// Resolves founder wallets to privileged tiers, everything else by the
/// claimed level.
#[derive(Debug, Clone, Default)]
pub struct FounderRegistry {
    authors: Vec<String>,
    coauthors: Vec<String>,
}

impl FounderRegistry {
    pub fn new(authors: Vec<String>, coauthors: Vec<String>) -> Self {
        Self { authors, coauthors }
    }

    pub fn from_config(config: &FounderConfig) -> Self {
        Self::new(config.authors.clone(), config.coauthors.clone())
    }
}

// Hex addresses come in mixed (checksum) case.
fn same_address(a: &str, b: &str) -> bool {
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

impl IdentityResolver for FounderRegistry {
    fn resolve(&self, claim: &IdentityClaim) -> Requester {
        let wallet = claim
            .wallet_address
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty());

        if let Some(wallet) = wallet {
            if self.authors.iter().any(|a| same_address(a, wallet)) {
                debug!("resolved founder wallet as author");
                return Requester::author(AUTHOR_USER_ID).with_wallet(wallet);
            }
            if let Some(pos) = self.coauthors.iter().position(|a| same_address(a, wallet)) {
                debug!("resolved founder wallet as co-author {}", pos + 1);
                return Requester::manager(format!("{}{}", COAUTHOR_PREFIX, pos + 1))
                    .with_wallet(wallet);
            }
        }

        Requester {
            user_id: claim.user_id.clone().unwrap_or_default(),
            wallet_address: wallet.map(str::to_string),
            level: AccessLevel::from_level(claim.level),
        }
    }
}
