use crate::access::{visible_cards, TeamDirectory};
use crate::error::{CardError, Result};
use crate::format::{CardLinks, CardView};
use crate::model::Requester;
use crate::sanitize::unescape_html;
use crate::store::CardStore;
use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFilter {
    pub requester: Requester,
    #[serde(default)]
    pub search_text: Option<String>,
    /// 1-indexed; defaults to the first page.
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default, alias = "limit")]
    pub page_size: Option<usize>,
}

impl CardFilter {
    pub fn for_requester(requester: Requester) -> Self {
        Self {
            requester,
            ..Default::default()
        }
    }

    pub fn with_search(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn with_page(mut self, page: usize, page_size: usize) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// One page of a listing. `total` counts every match, not just this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPage {
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub cards: Vec<CardView>,
}

pub fn run<S: CardStore + ?Sized>(
    store: &S,
    links: &CardLinks,
    teams: &dyn TeamDirectory,
    limits: PageLimits,
    filter: &CardFilter,
) -> Result<CardPage> {
    let page = filter.page.unwrap_or(1);
    if page == 0 {
        return Err(CardError::Validation("page must be at least 1".to_string()));
    }
    let limit = match filter.page_size {
        Some(0) => {
            return Err(CardError::Validation(
                "page size must be at least 1".to_string(),
            ));
        }
        Some(size) => size.min(limits.max_page_size.max(1)),
        None => limits.default_page_size.max(1),
    };

    let records = store.list()?;
    let mut cards = visible_cards(&records, &filter.requester, teams, links, Utc::now());

    if let Some(term) = filter.search_text.as_deref().map(str::trim) {
        if !term.is_empty() {
            cards.retain(|card| matches_search(card, term));
        }
    }

    let total = cards.len();
    let cards: Vec<CardView> = cards
        .into_iter()
        .skip((page - 1).saturating_mul(limit))
        .take(limit)
        .collect();

    debug!(
        "listed cards (user_id={}, level={:?}, total={}, page={}, returned={})",
        filter.requester.user_id,
        filter.requester.level,
        total,
        page,
        cards.len()
    );

    Ok(CardPage {
        total,
        page,
        limit,
        cards,
    })
}

/// Case-insensitive substring match on title or greeting. Stored text is
/// HTML-escaped, so matching runs against the unescaped form.
fn matches_search(card: &CardView, term: &str) -> bool {
    let needle = term.to_lowercase();
    [&card.title, &card.greeting_text]
        .iter()
        .any(|field| unescape_html(field).to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::NoTeams;
    use crate::model::CardPatch;
    use crate::sanitize::sanitize_patch;
    use crate::store::memory::fixtures::StoreFixture;

    fn list(store: &dyn CardStore, filter: &CardFilter) -> Result<CardPage> {
        run(
            store,
            &CardLinks::default(),
            &NoTeams,
            PageLimits::default(),
            filter,
        )
    }

    #[test]
    fn paginates_newest_first() {
        let fixture = StoreFixture::new().with_cards(25, "u1");
        let filter = CardFilter::for_requester(Requester::user("u1")).with_page(2, 10);

        let page = list(&fixture.store, &filter).unwrap();

        assert_eq!(page.total, 25);
        assert_eq!(page.page, 2);
        assert_eq!(page.limit, 10);
        let ids: Vec<_> = page.cards.iter().map(|c| c.card_id.as_str()).collect();
        // newest is u1-25, so the 11th..20th newest are u1-15 down to u1-6
        let expected: Vec<String> = (6..=15).rev().map(|i| format!("u1-{}", i)).collect();
        assert_eq!(ids, expected);
        assert!(page.cards.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[test]
    fn defaults_to_first_page_of_twenty() {
        let fixture = StoreFixture::new().with_cards(25, "u1");
        let page = list(
            &fixture.store,
            &CardFilter::for_requester(Requester::user("u1")),
        )
        .unwrap();
        assert_eq!((page.page, page.limit, page.cards.len()), (1, 20, 20));
    }

    #[test]
    fn page_past_the_end_is_empty_but_keeps_total() {
        let fixture = StoreFixture::new().with_cards(5, "u1");
        let filter = CardFilter::for_requester(Requester::user("u1")).with_page(3, 10);
        let page = list(&fixture.store, &filter).unwrap();
        assert_eq!(page.total, 5);
        assert!(page.cards.is_empty());
    }

    #[test]
    fn page_size_is_capped() {
        let fixture = StoreFixture::new().with_cards(3, "u1");
        let filter = CardFilter::for_requester(Requester::user("u1")).with_page(1, 10_000);
        let page = list(&fixture.store, &filter).unwrap();
        assert_eq!(page.limit, 100);
    }

    #[test]
    fn zero_page_or_size_is_rejected() {
        let fixture = StoreFixture::new();
        let zero_page = CardFilter::for_requester(Requester::user("u1")).with_page(0, 10);
        assert!(matches!(
            list(&fixture.store, &zero_page),
            Err(CardError::Validation(_))
        ));

        let zero_size = CardFilter::for_requester(Requester::user("u1")).with_page(1, 0);
        assert!(matches!(
            list(&fixture.store, &zero_size),
            Err(CardError::Validation(_))
        ));
    }

    #[test]
    fn search_applies_after_access_policy() {
        let fixture = StoreFixture::new()
            .with_card("mine", "u1", "Happy Birthday Anna")
            .with_card("other", "u2", "Happy Birthday Bob")
            .with_card("mine2", "u1", "Merry Christmas\nhappy holidays");

        let filter = CardFilter::for_requester(Requester::user("u1")).with_search("HAPPY");
        let page = list(&fixture.store, &filter).unwrap();

        assert_eq!(page.total, 2);
        assert!(page.cards.iter().all(|c| c.user_id == "u1"));
    }

    #[test]
    fn blank_search_does_not_filter() {
        let fixture = StoreFixture::new().with_cards(3, "u1");
        let filter = CardFilter::for_requester(Requester::user("u1")).with_search("   ");
        assert_eq!(list(&fixture.store, &filter).unwrap().total, 3);
    }

    #[test]
    fn search_matches_escaped_text() {
        let fixture = StoreFixture::new();
        fixture
            .store
            .put(
                "c1",
                sanitize_patch(CardPatch::greeting("Tom & Jerry").with_user("u1")),
            )
            .unwrap();

        let filter = CardFilter::for_requester(Requester::user("u1")).with_search("tom & jerry");
        assert_eq!(list(&fixture.store, &filter).unwrap().total, 1);
    }

    #[test]
    fn search_ignores_entity_fragments() {
        let fixture = StoreFixture::new();
        for (id, text) in [("c1", "Tom & Jerry"), ("c2", "a < b")] {
            fixture
                .store
                .put(id, sanitize_patch(CardPatch::greeting(text).with_user("u1")))
                .unwrap();
        }

        for term in ["amp", "lt;", "&amp;"] {
            let filter = CardFilter::for_requester(Requester::user("u1")).with_search(term);
            assert_eq!(list(&fixture.store, &filter).unwrap().total, 0, "term {:?}", term);
        }

        let filter = CardFilter::for_requester(Requester::user("u1")).with_search("a < B");
        assert_eq!(list(&fixture.store, &filter).unwrap().total, 1);
    }

    #[test]
    fn unmatched_requester_gets_empty_page() {
        let fixture = StoreFixture::new().with_cards(3, "u1");
        let page = list(
            &fixture.store,
            &CardFilter::for_requester(Requester::user("stranger")),
        )
        .unwrap();
        assert_eq!(page.total, 0);
        assert!(page.cards.is_empty());
    }

    #[test]
    fn filter_reads_limit_alias() {
        let filter: CardFilter = serde_json::from_value(serde_json::json!({
            "requester": { "userId": "u1", "level": "manager" },
            "page": 2,
            "limit": 5
        }))
        .unwrap();
        assert_eq!(filter.page_size, Some(5));
        assert_eq!(filter.requester.level, crate::model::AccessLevel::Manager);
    }
}
