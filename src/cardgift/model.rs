use crate::error::{CardError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Top-level keys owned by [`CardRecord`]. A payload can never smuggle these
/// in as extension fields.
const RECORD_KEYS: &[&str] = &[
    "cardId",
    "greetingText",
    "userId",
    "actualCreator",
    "walletAddress",
    "style",
    "createdAt",
    "updatedAt",
    "views",
    "clicks",
    "tags",
    "meta",
];

/// Visual theme of a card. Unknown names, and anything that is not a
/// string, fall back to [`CardStyle::Classic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum CardStyle {
    #[default]
    Classic,
    Sunset,
    Ocean,
    Space,
}

impl CardStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStyle::Classic => "classic",
            CardStyle::Sunset => "sunset",
            CardStyle::Ocean => "ocean",
            CardStyle::Space => "space",
        }
    }
}

impl From<Value> for CardStyle {
    fn from(value: Value) -> Self {
        match value {
            Value::String(name) => CardStyle::from(name.as_str()),
            _ => CardStyle::Classic,
        }
    }
}

impl From<String> for CardStyle {
    fn from(name: String) -> Self {
        CardStyle::from(name.as_str())
    }
}

impl From<&str> for CardStyle {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "sunset" => CardStyle::Sunset,
            "ocean" => CardStyle::Ocean,
            "space" => CardStyle::Space,
            _ => CardStyle::Classic,
        }
    }
}

impl fmt::Display for CardStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored greeting card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub card_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub greeting_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actual_creator: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub wallet_address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub style: CardStyle,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub clicks: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub meta: Map<String, Value>,
    /// Caller-supplied fields the core does not know about (e.g. `userName`).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Older documents carry `null` where a value is now expected.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CardRecord {
    pub fn new(card_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            card_id: card_id.into(),
            greeting_text: String::new(),
            user_id: String::new(),
            actual_creator: String::new(),
            wallet_address: String::new(),
            style: CardStyle::default(),
            created_at: Some(now),
            updated_at: Some(now),
            views: 0,
            clicks: 0,
            tags: Vec::new(),
            meta: Map::new(),
            extra: Map::new(),
        }
    }

    /// Field-level merge: whatever the patch carries replaces the stored
    /// field, everything else is kept. Counters and `created_at` survive.
    pub fn apply(&mut self, patch: CardPatch, now: DateTime<Utc>) {
        if let Some(text) = patch.greeting_text {
            self.greeting_text = text;
        }
        if let Some(user_id) = patch.user_id {
            self.user_id = user_id;
        }
        if let Some(creator) = patch.actual_creator {
            self.actual_creator = creator;
        }
        if let Some(wallet) = patch.wallet_address {
            self.wallet_address = wallet;
        }
        if let Some(style) = patch.style {
            self.style = style;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(meta) = patch.meta {
            self.meta = meta;
        }
        for (key, value) in patch.extra {
            if !RECORD_KEYS.contains(&key.as_str()) {
                self.extra.insert(key, value);
            }
        }

        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }

    /// The user the card is attributed to: `actual_creator` when set.
    pub fn creator(&self) -> &str {
        if self.actual_creator.is_empty() {
            &self.user_id
        } else {
            &self.actual_creator
        }
    }
}

/// Partial card fields as sent by a client. `None` means "keep what is stored".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(default, alias = "greeting", skip_serializing_if = "Option::is_none")]
    pub greeting_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CardStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardPatch {
    pub fn greeting(text: impl Into<String>) -> Self {
        Self {
            greeting_text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Parse a raw JSON body. Anything but an object is rejected.
    pub fn from_json(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(CardError::InvalidInput(
                "card data must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| CardError::InvalidInput(format!("malformed card data: {}", e)))
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.actual_creator = Some(creator.into());
        self
    }

    pub fn with_wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet.into());
        self
    }

    pub fn with_style(mut self, style: CardStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Resolved access tier, highest last so `Ord` follows privilege.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    User,
    Manager,
    Author,
}

impl AccessLevel {
    pub const MANAGER_LEVEL: i64 = 5;
    pub const AUTHOR_LEVEL: i64 = 6;

    /// Maps the registry's numeric level. Unknown or absent levels get the
    /// lowest tier.
    pub fn from_level(level: Option<i64>) -> Self {
        match level {
            Some(Self::AUTHOR_LEVEL) => AccessLevel::Author,
            Some(Self::MANAGER_LEVEL) => AccessLevel::Manager,
            _ => AccessLevel::User,
        }
    }
}

/// Identity a caller presents when listing cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub user_id: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub level: AccessLevel,
}

impl Requester {
    pub fn new(user_id: impl Into<String>, level: AccessLevel) -> Self {
        Self {
            user_id: user_id.into(),
            wallet_address: None,
            level,
        }
    }

    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(user_id, AccessLevel::User)
    }

    pub fn manager(user_id: impl Into<String>) -> Self {
        Self::new(user_id, AccessLevel::Manager)
    }

    pub fn author(user_id: impl Into<String>) -> Self {
        Self::new(user_id, AccessLevel::Author)
    }

    pub fn with_wallet(mut self, wallet: impl Into<String>) -> Self {
        self.wallet_address = Some(wallet.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn apply_merges_only_provided_fields() {
        let t0 = Utc::now();
        let mut record = CardRecord::new("c1", t0);
        record.apply(CardPatch::greeting("Hi").with_user("u1"), t0);
        record.views = 3;

        let t1 = t0 + Duration::seconds(5);
        record.apply(CardPatch::default().with_style(CardStyle::Ocean), t1);

        assert_eq!(record.greeting_text, "Hi");
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.style, CardStyle::Ocean);
        assert_eq!(record.views, 3);
        assert_eq!(record.created_at, Some(t0));
        assert_eq!(record.updated_at, Some(t1));
    }

    #[test]
    fn apply_stamps_missing_created_at() {
        let now = Utc::now();
        let mut record = CardRecord::new("c1", now);
        record.created_at = None;
        record.apply(CardPatch::default(), now);
        assert_eq!(record.created_at, Some(now));
    }

    #[test]
    fn apply_ignores_reserved_extension_keys() {
        let now = Utc::now();
        let mut record = CardRecord::new("c1", now);
        let mut patch = CardPatch::greeting("Hi");
        patch.extra.insert("views".into(), json!(99));
        patch.extra.insert("cardId".into(), json!("other"));
        patch.extra.insert("userName".into(), json!("Anna"));

        record.apply(patch, now);

        assert_eq!(record.views, 0);
        assert_eq!(record.card_id, "c1");
        assert_eq!(record.extra.get("userName"), Some(&json!("Anna")));
        assert!(!record.extra.contains_key("views"));
    }

    #[test]
    fn patch_from_json_rejects_non_objects() {
        let err = CardPatch::from_json(json!("just text")).unwrap_err();
        assert!(matches!(err, CardError::InvalidInput(_)));

        let err = CardPatch::from_json(json!([1, 2])).unwrap_err();
        assert!(matches!(err, CardError::InvalidInput(_)));
    }

    #[test]
    fn patch_from_json_reads_camel_case_and_extras() {
        let patch = CardPatch::from_json(json!({
            "greetingText": "Hello",
            "userId": "u1",
            "style": "SUNSET",
            "tags": ["birthday"],
            "userName": "Anna"
        }))
        .unwrap();

        assert_eq!(patch.greeting_text.as_deref(), Some("Hello"));
        assert_eq!(patch.user_id.as_deref(), Some("u1"));
        assert_eq!(patch.style, Some(CardStyle::Sunset));
        assert_eq!(patch.tags, Some(vec!["birthday".to_string()]));
        assert_eq!(patch.extra.get("userName"), Some(&json!("Anna")));
    }

    #[test]
    fn patch_accepts_greeting_alias() {
        let patch = CardPatch::from_json(json!({ "greeting": "Hey" })).unwrap();
        assert_eq!(patch.greeting_text.as_deref(), Some("Hey"));
    }

    #[test]
    fn unknown_style_falls_back_to_classic() {
        assert_eq!(CardStyle::from("neon"), CardStyle::Classic);
        assert_eq!(CardStyle::from(" Space "), CardStyle::Space);

        let style: CardStyle = serde_json::from_value(json!("glitter")).unwrap();
        assert_eq!(style, CardStyle::Classic);
    }

    #[test]
    fn record_serializes_extras_at_top_level() {
        let now = Utc::now();
        let mut record = CardRecord::new("c1", now);
        record.extra.insert("userName".into(), json!("Anna"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["cardId"], json!("c1"));
        assert_eq!(value["userName"], json!("Anna"));
        assert_eq!(value["style"], json!("classic"));

        let back: CardRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn record_loads_with_missing_fields() {
        let record: CardRecord = serde_json::from_value(json!({ "cardId": "old" })).unwrap();
        assert_eq!(record.views, 0);
        assert_eq!(record.created_at, None);
        assert_eq!(record.style, CardStyle::Classic);
    }

    #[test]
    fn record_loads_with_null_fields() {
        let record: CardRecord = serde_json::from_value(json!({
            "cardId": "legacy",
            "greetingText": null,
            "userId": null,
            "style": null,
            "views": null,
            "tags": null,
            "meta": null
        }))
        .unwrap();
        assert_eq!(record.greeting_text, "");
        assert_eq!(record.user_id, "");
        assert_eq!(record.style, CardStyle::Classic);
        assert_eq!(record.views, 0);
        assert!(record.tags.is_empty());
        assert!(record.meta.is_empty());
        assert!(record.extra.is_empty());
    }

    #[test]
    fn non_string_style_falls_back_to_classic() {
        let style: CardStyle = serde_json::from_value(json!(7)).unwrap();
        assert_eq!(style, CardStyle::Classic);
    }

    #[test]
    fn creator_prefers_actual_creator() {
        let mut record = CardRecord::new("c1", Utc::now());
        record.user_id = "u1".into();
        assert_eq!(record.creator(), "u1");
        record.actual_creator = "u2".into();
        assert_eq!(record.creator(), "u2");
    }

    #[test]
    fn numeric_levels_map_to_tiers() {
        assert_eq!(AccessLevel::from_level(Some(6)), AccessLevel::Author);
        assert_eq!(AccessLevel::from_level(Some(5)), AccessLevel::Manager);
        assert_eq!(AccessLevel::from_level(Some(3)), AccessLevel::User);
        assert_eq!(AccessLevel::from_level(Some(42)), AccessLevel::User);
        assert_eq!(AccessLevel::from_level(None), AccessLevel::User);
        assert!(AccessLevel::Author > AccessLevel::Manager);
    }
}
