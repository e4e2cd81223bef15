use crate::error::{CardError, Result};
use crate::format::{format_card, CardLinks, CardView};
use crate::store::CardStore;
use chrono::Utc;
use log::debug;

pub fn run<S: CardStore + ?Sized>(store: &S, links: &CardLinks, card_id: &str) -> Result<CardView> {
    debug!("get card (card_id={})", card_id);
    match store.get(card_id)? {
        Some(record) => Ok(format_card(&record, links, Utc::now())),
        None => Err(CardError::NotFound(card_id.to_string())),
    }
}
