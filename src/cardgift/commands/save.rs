use super::SaveReceipt;
use crate::error::{CardError, Result};
use crate::format::CardLinks;
use crate::model::CardPatch;
use crate::sanitize::sanitize_patch;
use crate::store::CardStore;
use log::{info, warn};
use serde_json::Value;

pub fn run<S: CardStore + ?Sized>(
    store: &S,
    links: &CardLinks,
    card_id: &str,
    patch: CardPatch,
) -> Result<SaveReceipt> {
    if let Err(e) = validate(store, card_id, &patch) {
        warn!("rejected save (card_id={:?}): {}", card_id, e);
        return Err(e);
    }

    let record = store.put(card_id, sanitize_patch(patch))?;
    info!(
        "saved card (card_id={}, user_id={}, views={})",
        record.card_id, record.user_id, record.views
    );

    Ok(SaveReceipt {
        card_id: record.card_id.clone(),
        share_url: links.share_url(&record.card_id),
        preview_url: links.preview_url(&record.card_id),
    })
}

/// Same as [`run`] for a raw JSON body.
pub fn run_json<S: CardStore + ?Sized>(
    store: &S,
    links: &CardLinks,
    card_id: &str,
    card_data: Value,
) -> Result<SaveReceipt> {
    let patch = CardPatch::from_json(card_data).map_err(|e| match e {
        CardError::InvalidInput(msg) => CardError::Validation(msg),
        other => other,
    })?;
    run(store, links, card_id, patch)
}

/// A greeting is required to create a card. Updates may omit it as long as
/// the stored card already has one; an explicitly blank greeting is never
/// accepted.
fn validate<S: CardStore + ?Sized>(store: &S, card_id: &str, patch: &CardPatch) -> Result<()> {
    if card_id.trim().is_empty() {
        return Err(CardError::Validation("cardId is required".to_string()));
    }
    let has_greeting = match patch.greeting_text.as_deref() {
        Some(text) => !text.trim().is_empty(),
        None => store
            .get(card_id)?
            .is_some_and(|stored| !stored.greeting_text.trim().is_empty()),
    };
    if !has_greeting {
        return Err(CardError::Validation(
            "cardData.greetingText must be a non-empty string".to_string(),
        ));
    }
    Ok(())
}
