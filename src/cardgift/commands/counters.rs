//! View and click accounting. The increment itself is the store's atomic
//! read-modify-write; a missing card is reported, never created.

use crate::error::Result;
use crate::store::{CardStore, Counter};
use log::warn;

pub fn increment_views<S: CardStore + ?Sized>(store: &S, card_id: &str) -> Result<bool> {
    increment(store, card_id, Counter::Views)
}

pub fn increment_clicks<S: CardStore + ?Sized>(store: &S, card_id: &str) -> Result<bool> {
    increment(store, card_id, Counter::Clicks)
}

fn increment<S: CardStore + ?Sized>(store: &S, card_id: &str, counter: Counter) -> Result<bool> {
    let found = store.increment(card_id, counter)?;
    if !found {
        warn!("{:?} increment for unknown card (card_id={})", counter, card_id);
    }
    Ok(found)
}
