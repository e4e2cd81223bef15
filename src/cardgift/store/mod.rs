//! # Storage Layer
//!
//! The [`CardStore`] trait is the card repository. Business logic only ever
//! talks to the trait, never to a concrete container.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryStore`]: process-lifetime storage, the default.
//!   - One mutex per card, so merges and counter bumps on different cards
//!     never contend
//!   - No persistence
//!
//! - [`fs::FileStore`]: durable single-file storage
//!   - All cards in `cards.json` (JSON array, insertion order)
//!   - Written through a temp file + rename
//!
//! ## Atomicity
//!
//! [`CardStore::put`] and [`CardStore::increment`] are read-modify-write
//! operations. Implementations must run each one atomically per `card_id`:
//! two concurrent increments on the same card always add exactly two.
//!
//! ## Ordering
//!
//! [`CardStore::list`] returns cards in insertion order. That is not recency
//! order; callers sort by `created_at` themselves.

use crate::error::{CardError, Result};
use crate::model::{CardPatch, CardRecord};

pub mod fs;
pub mod memory;

/// Which counter an increment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Clicks,
}

impl Counter {
    pub(crate) fn bump(self, record: &mut CardRecord) -> u64 {
        let slot = match self {
            Counter::Views => &mut record.views,
            Counter::Clicks => &mut record.clicks,
        };
        *slot = slot.saturating_add(1);
        *slot
    }
}

/// Abstract interface for card storage.
///
/// Implementations are shared between request threads, hence `&self`
/// everywhere and the `Send + Sync` bound.
pub trait CardStore: Send + Sync {
    /// Merge `patch` onto the card (creating it if needed) and return the
    /// stored result.
    fn put(&self, card_id: &str, patch: CardPatch) -> Result<CardRecord>;

    /// Get a card by id.
    fn get(&self, card_id: &str) -> Result<Option<CardRecord>>;

    /// All cards, in insertion order.
    fn list(&self) -> Result<Vec<CardRecord>>;

    /// Add one to a counter. `Ok(false)` when the card does not exist.
    fn increment(&self, card_id: &str, counter: Counter) -> Result<bool>;
}

impl<S: CardStore + ?Sized> CardStore for Box<S> {
    fn put(&self, card_id: &str, patch: CardPatch) -> Result<CardRecord> {
        (**self).put(card_id, patch)
    }

    fn get(&self, card_id: &str) -> Result<Option<CardRecord>> {
        (**self).get(card_id)
    }

    fn list(&self) -> Result<Vec<CardRecord>> {
        (**self).list()
    }

    fn increment(&self, card_id: &str, counter: Counter) -> Result<bool> {
        (**self).increment(card_id, counter)
    }
}

pub(crate) fn check_card_id(card_id: &str) -> Result<()> {
    if card_id.trim().is_empty() {
        return Err(CardError::InvalidInput("card id must not be empty".to_string()));
    }
    Ok(())
}
