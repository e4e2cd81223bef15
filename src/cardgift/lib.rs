//! # CardGift Architecture
//!
//! CardGift stores greeting cards, formats them for sharing and decides who
//! may list which cards. The core is transport-agnostic: an HTTP handler, a
//! serverless function and the bundled CLI all drive the same facade.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Transport (main.rs + args.rs for the CLI)                  │
//! │  - Parses requests, resolves identity, renders output       │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - CardService facade: save, get, list, record_view/click   │
//! │  - Carries link patterns, page limits, team directory       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Validation, sanitizing, access filtering, paging         │
//! │  - Built on format.rs and access.rs, both pure              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - CardStore trait: put (merge), get, list, increment       │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No I/O in the Core
//!
//! From `api.rs` inward, code takes Rust values and returns `Result<T>`. It
//! never prints and never exits. Diagnostics go through the `log` facade;
//! the binary decides where they end up.
//!
//! ## Module Overview
//!
//! - [`api`]: The `CardService` facade
//! - [`commands`]: Business logic for each operation
//! - [`store`]: Storage abstraction and implementations
//! - [`model`]: `CardRecord`, `CardPatch`, `Requester`, `AccessLevel`
//! - [`format`]: Record to view projection, titles and links
//! - [`access`]: Tiered visibility rules
//! - [`identity`]: Wallet/level claims to `Requester`
//! - [`sanitize`]: HTML escaping of user text
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod access;
pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod identity;
pub mod model;
pub mod sanitize;
pub mod store;
