//! Command layer: one module per facade operation. Pure business logic over
//! a [`CardStore`](crate::store::CardStore); no I/O assumptions.

use serde::{Deserialize, Serialize};

pub mod counters;
pub mod get;
pub mod list;
pub mod save;

/// What a successful save hands back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveReceipt {
    pub card_id: String,
    pub share_url: String,
    pub preview_url: String,
}

pub use list::{CardFilter, CardPage, PageLimits};
