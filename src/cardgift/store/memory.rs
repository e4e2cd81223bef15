use super::{check_card_id, CardStore, Counter};
use crate::error::{CardError, Result};
use crate::model::{CardPatch, CardRecord};
use chrono::Utc;
use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Slot = Arc<Mutex<CardRecord>>;

#[derive(Default)]
struct Slots {
    order: Vec<String>,
    cards: HashMap<String, Slot>,
}

/// In-memory card storage. Lives as long as the process.
///
/// The outer lock only guards the key set; each card has its own mutex, so
/// a merge or counter bump holds the outer lock for reading only.
#[derive(Default)]
pub struct InMemoryStore {
    slots: RwLock<Slots>,
    simulate_write_error: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.slots.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, card_id: &str) -> Option<Slot> {
        self.slots.read().cards.get(card_id).cloned()
    }

    fn check_writable(&self) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(CardError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl CardStore for InMemoryStore {
    fn put(&self, card_id: &str, patch: CardPatch) -> Result<CardRecord> {
        check_card_id(card_id)?;
        self.check_writable()?;

        let slot = match self.slot(card_id) {
            Some(slot) => slot,
            None => {
                let mut slots = self.slots.write();
                // Another writer may have created it between the two locks.
                let raced = slots.cards.get(card_id).cloned();
                match raced {
                    Some(slot) => slot,
                    None => {
                        let slot = Arc::new(Mutex::new(CardRecord::new(card_id, Utc::now())));
                        slots.order.push(card_id.to_string());
                        slots.cards.insert(card_id.to_string(), slot.clone());
                        debug!("created card slot (card_id={})", card_id);
                        slot
                    }
                }
            }
        };

        let mut record = slot.lock();
        record.apply(patch, Utc::now());
        Ok(record.clone())
    }

    fn get(&self, card_id: &str) -> Result<Option<CardRecord>> {
        Ok(self.slot(card_id).map(|slot| slot.lock().clone()))
    }

    fn list(&self) -> Result<Vec<CardRecord>> {
        let slots = self.slots.read();
        Ok(slots
            .order
            .iter()
            .filter_map(|id| slots.cards.get(id))
            .map(|slot| slot.lock().clone())
            .collect())
    }

    fn increment(&self, card_id: &str, counter: Counter) -> Result<bool> {
        let Some(slot) = self.slot(card_id) else {
            return Ok(false);
        };
        self.check_writable()?;
        let value = counter.bump(&mut slot.lock());
        debug!(
            "incremented counter (card_id={}, counter={:?}, value={})",
            card_id, counter, value
        );
        Ok(true)
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use chrono::{DateTime, Duration};

    pub struct StoreFixture {
        pub store: InMemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: InMemoryStore::new(),
            }
        }

        /// `count` cards owned by `user_id`, ids `{user_id}-1..`, each one
        /// minute newer than the previous.
        pub fn with_cards(mut self, count: usize, user_id: &str) -> Self {
            let base = Utc::now() - Duration::days(1);
            for i in 0..count {
                let card_id = format!("{}-{}", user_id, i + 1);
                let created = base + Duration::minutes(i as i64);
                self = self.with_card_at(&card_id, user_id, &format!("Card {}", i + 1), created);
            }
            self
        }

        pub fn with_card(self, card_id: &str, user_id: &str, text: &str) -> Self {
            self.with_card_at(card_id, user_id, text, Utc::now())
        }

        pub fn with_card_at(
            self,
            card_id: &str,
            user_id: &str,
            text: &str,
            created_at: DateTime<Utc>,
        ) -> Self {
            self.store
                .put(card_id, CardPatch::greeting(text).with_user(user_id))
                .unwrap();
            if let Some(slot) = self.store.slot(card_id) {
                slot.lock().created_at = Some(created_at);
            }
            self
        }

        pub fn with_record(self, record: CardRecord) -> Self {
            let card_id = record.card_id.clone();
            self.store.put(&card_id, CardPatch::default()).unwrap();
            if let Some(slot) = self.store.slot(&card_id) {
                *slot.lock() = record;
            }
            self
        }
    }
}
