//! deckhub-core - Core library for Deckhub
//!
//! This crate contains the shared models, database layer, and the card
//! resolution / deck composition logic used by the Deckhub backend. Route
//! handlers, session issuance, and presentation live in their own crates
//! and call into this one.

pub mod catalog;
pub mod composition;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod resolver;
pub mod util;

pub use composition::CompositionEngine;
pub use error::{Error, Result};
pub use models::{Card, CardId, Deck, DeckCard, DeckId, Folder, FolderId, User, UserId, Zone};
pub use resolver::CardResolver;
