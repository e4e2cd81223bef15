//! # API Facade
//!
//! [`CardService`] is the single entry point for every card operation,
//! whatever transport sits in front of it (HTTP handlers, the CLI, tests).
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Dispatches** to the command modules
//! - **Carries the wiring** every command needs: link patterns, paging
//!   limits, the team directory
//! - **Returns structured types**: receipts, views and pages, never strings
//!
//! It does no business logic of its own and no I/O.
//!
//! ## Sharing
//!
//! Every method takes `&self`. Stores synchronize internally, so a single
//! `CardService` (e.g. behind an `Arc`) can serve concurrent requests.

use crate::access::{NoTeams, TeamDirectory};
use crate::commands;
use crate::config::CardGiftConfig;
use crate::error::Result;
use crate::format::{CardLinks, CardView};
use crate::model::CardPatch;
use crate::store::CardStore;
use serde_json::Value;

/// The main API facade for card operations.
///
/// Generic over `CardStore`:
/// - Production: `CardService<FileStore>`
/// - Default / tests: `CardService<InMemoryStore>`
pub struct CardService<S: CardStore> {
    store: S,
    links: CardLinks,
    limits: commands::PageLimits,
    teams: Box<dyn TeamDirectory>,
}

impl<S: CardStore> CardService<S> {
    pub fn new(store: S, links: CardLinks) -> Self {
        Self {
            store,
            links,
            limits: commands::PageLimits::default(),
            teams: Box::new(NoTeams),
        }
    }

    pub fn from_config(store: S, config: &CardGiftConfig) -> Self {
        Self::new(store, config.links()).with_page_limits(commands::PageLimits {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        })
    }

    pub fn with_page_limits(mut self, limits: commands::PageLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replace the team lookup used for manager listings.
    pub fn with_team_directory(mut self, teams: impl TeamDirectory + 'static) -> Self {
        self.teams = Box::new(teams);
        self
    }

    pub fn save(&self, card_id: &str, card_data: CardPatch) -> Result<commands::SaveReceipt> {
        commands::save::run(&self.store, &self.links, card_id, card_data)
    }

    pub fn save_json(&self, card_id: &str, card_data: Value) -> Result<commands::SaveReceipt> {
        commands::save::run_json(&self.store, &self.links, card_id, card_data)
    }

    pub fn get(&self, card_id: &str) -> Result<CardView> {
        commands::get::run(&self.store, &self.links, card_id)
    }

    pub fn list(&self, filter: &commands::CardFilter) -> Result<commands::CardPage> {
        commands::list::run(
            &self.store,
            &self.links,
            self.teams.as_ref(),
            self.limits,
            filter,
        )
    }

    pub fn record_view(&self, card_id: &str) -> Result<bool> {
        commands::counters::increment_views(&self.store, card_id)
    }

    pub fn record_click(&self, card_id: &str) -> Result<bool> {
        commands::counters::increment_clicks(&self.store, card_id)
    }

    pub fn links(&self) -> &CardLinks {
        &self.links
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

pub use commands::{CardFilter, CardPage, PageLimits, SaveReceipt};
