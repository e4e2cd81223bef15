//! # Card Formatter
//!
//! Turns a stored [`CardRecord`] into the [`CardView`] handed to renderers and
//! API clients. Formatting is pure and total: malformed or missing fields are
//! normalized to defaults, never rejected.

use crate::model::{CardRecord, CardStyle};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Title used when the greeting has no usable first line.
pub const DEFAULT_TITLE: &str = "Greeting Card";
pub const TITLE_MAX_CHARS: usize = 50;

/// Keys a view adds on top of the record's own fields.
const VIEW_KEYS: &[&str] = &["title", "previewUrl", "shareUrl", "viewerUrl", "isOwner"];

/// URL patterns for the public endpoints of a card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardLinks {
    pub base_url: String,
    pub share_path: String,
    pub preview_path: String,
    pub viewer_path: String,
}

impl Default for CardLinks {
    fn default() -> Self {
        crate::config::CardGiftConfig::default().links()
    }
}

impl CardLinks {
    pub fn share_url(&self, card_id: &str) -> String {
        self.link(&self.share_path, card_id)
    }

    pub fn preview_url(&self, card_id: &str) -> String {
        self.link(&self.preview_path, card_id)
    }

    pub fn viewer_url(&self, card_id: &str) -> String {
        self.link(&self.viewer_path, card_id)
    }

    /// The id is percent-encoded; any non-blank id is a valid card id.
    fn link(&self, path: &str, card_id: &str) -> String {
        format!(
            "{}{}?id={}",
            self.base_url,
            path,
            urlencoding::encode(card_id)
        )
    }
}

/// Public projection of a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub card_id: String,
    pub title: String,
    pub preview_url: String,
    pub share_url: String,
    pub viewer_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub views: u64,
    pub clicks: u64,
    pub greeting_text: String,
    pub user_id: String,
    pub actual_creator: String,
    pub wallet_address: String,
    pub style: CardStyle,
    pub tags: Vec<String>,
    pub meta: Map<String, Value>,
    /// Set by the access policy; absent on single-card reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_owner: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Builds the view of `record`. `now` stands in for a missing `created_at`.
pub fn format_card(record: &CardRecord, links: &CardLinks, now: DateTime<Utc>) -> CardView {
    let card_id = record.card_id.as_str();
    let extra = record
        .extra
        .iter()
        .filter(|(k, _)| !VIEW_KEYS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    CardView {
        card_id: card_id.to_string(),
        title: derive_title(&record.greeting_text),
        preview_url: links.preview_url(card_id),
        share_url: links.share_url(card_id),
        viewer_url: links.viewer_url(card_id),
        created_at: record.created_at.unwrap_or(now),
        updated_at: record.updated_at,
        views: record.views,
        clicks: record.clicks,
        greeting_text: record.greeting_text.clone(),
        user_id: record.user_id.clone(),
        actual_creator: record.actual_creator.clone(),
        wallet_address: record.wallet_address.clone(),
        style: record.style,
        tags: record.tags.clone(),
        meta: record.meta.clone(),
        is_owner: None,
        extra,
    }
}

/// First line of the greeting, capped at [`TITLE_MAX_CHARS`] characters.
pub fn derive_title(greeting_text: &str) -> String {
    let first = greeting_text.split('\n').next().unwrap_or_default();
    let first = first.strip_suffix('\r').unwrap_or(first);

    if first.trim().is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    if first.chars().count() <= TITLE_MAX_CHARS {
        return first.to_string();
    }

    let cut: String = first.chars().take(TITLE_MAX_CHARS).collect();
    format!("{}...", drop_partial_entity(&cut))
}

/// Greetings are stored HTML-escaped; a cut must not leave half an entity.
fn drop_partial_entity(s: &str) -> &str {
    match s.rfind('&') {
        Some(pos) => {
            let tail = &s[pos + 1..];
            let partial = tail.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
            if partial { &s[..pos] } else { s }
        }
        None => s,
    }
}
