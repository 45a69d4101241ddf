//! Deck composition engine.
//!
//! The entry point route handlers call to edit a deck's card list: resolve
//! the external card reference, then mutate the deck-card associations. All
//! context arrives as explicit parameters; the engine holds no session
//! state between calls.

use libsql::Connection;

use crate::catalog::CatalogClient;
use crate::db::{DeckRepository, LibSqlDeckRepository};
use crate::error::{Error, Result};
use crate::models::{CardId, DeckCard, DeckEntry, DeckId, Zone};
use crate::resolver::CardResolver;

/// Orchestrates card resolution and deck-card mutations.
pub struct CompositionEngine<'a, C> {
    resolver: CardResolver<'a, C>,
    decks: LibSqlDeckRepository<'a>,
}

impl<'a, C: CatalogClient> CompositionEngine<'a, C> {
    /// Create an engine over the given connection and catalog client
    pub const fn new(conn: &'a Connection, catalog: &'a C) -> Self {
        Self {
            resolver: CardResolver::new(conn, catalog),
            decks: LibSqlDeckRepository::new(conn),
        }
    }

    /// Add `delta` copies of an external card to one zone of a deck.
    ///
    /// The card is materialized locally first (fetching from the catalog on
    /// a cache miss), then the association is upserted. Either both effects
    /// land or deck state is unchanged.
    pub async fn add_card(
        &self,
        deck_id: &DeckId,
        external_id: &str,
        zone: Zone,
        delta: i64,
    ) -> Result<DeckCard> {
        if delta <= 0 {
            return Err(Error::InvalidArgument(format!(
                "quantity delta must be positive, got {delta}"
            )));
        }

        // Deck existence is checked before any catalog round-trip
        self.decks
            .get(deck_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("deck {deck_id}")))?;

        let card = self.resolver.resolve(external_id).await?;
        self.decks.add_card(deck_id, &card.id, zone, delta).await
    }

    /// Remove a card from one zone, or from every zone when `zone` is `None`.
    ///
    /// Returns the number of associations removed; repeated removal is a
    /// no-op.
    pub async fn remove_card(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Option<Zone>,
    ) -> Result<u64> {
        self.decks.remove_card(deck_id, card_id, zone).await
    }

    /// Set an association to an exact quantity; zero removes it.
    pub async fn set_quantity(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Zone,
        quantity: i64,
    ) -> Result<Option<DeckCard>> {
        self.decks
            .set_quantity(deck_id, card_id, zone, quantity)
            .await
    }

    /// The deck's associations joined with their card records
    pub async fn cards_for_deck(&self, deck_id: &DeckId) -> Result<Vec<DeckEntry>> {
        self.decks.cards_for_deck(deck_id).await
    }

    /// Total main-list copies, recomputed from the live associations
    pub async fn main_count(&self, deck_id: &DeckId) -> Result<i64> {
        self.decks.main_count(deck_id).await
    }

    /// Total sideboard copies, recomputed from the live associations
    pub async fn sideboard_count(&self, deck_id: &DeckId) -> Result<i64> {
        self.decks.sideboard_count(deck_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogCard;
    use crate::db::{Database, LibSqlUserRepository, UserRepository};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubCatalog {
        cards: HashMap<String, CatalogCard>,
        calls: AtomicUsize,
    }

    impl StubCatalog {
        fn with(entries: &[CatalogCard]) -> Self {
            Self {
                cards: entries
                    .iter()
                    .map(|entry| (entry.id.clone(), entry.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CatalogClient for StubCatalog {
        async fn fetch_card(&self, external_id: &str) -> Result<Option<CatalogCard>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.cards.get(external_id).cloned())
        }
    }

    fn bolt_entry() -> CatalogCard {
        serde_json::from_str(
            r#"{"id": "abc-123", "name": "Lightning Bolt", "mana_cost": "{R}", "colors": ["R"]}"#,
        )
        .unwrap()
    }

    async fn setup() -> (Database, DeckId) {
        let db = Database::open_in_memory().await.unwrap();
        let deck_id = {
            let conn = db.connection();
            let users = LibSqlUserRepository::new(conn);
            let decks = LibSqlDeckRepository::new(conn);
            let user = users.create("a@example.com", "hash").await.unwrap();
            let deck = decks.create(&user.id, "Burn", None, None).await.unwrap();
            deck.id
        };
        (db, deck_id)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_card_resolves_and_increments() {
        let (db, deck_id) = setup().await;
        let catalog = StubCatalog::with(&[bolt_entry()]);
        let engine = CompositionEngine::new(db.connection(), &catalog);

        let first = engine
            .add_card(&deck_id, "abc-123", Zone::Main, 1)
            .await
            .unwrap();
        assert_eq!(first.quantity, 1);

        // Same card again: one row, incremented, no second catalog call
        let second = engine
            .add_card(&deck_id, "abc-123", Zone::Main, 1)
            .await
            .unwrap();
        assert_eq!(second.quantity, 2);
        assert_eq!(second.card_id, first.card_id);
        assert_eq!(catalog.calls(), 1);

        let entries = engine.cards_for_deck(&deck_id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].card.name, "Lightning Bolt");
        assert_eq!(entries[0].quantity, 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_card_to_unknown_deck_skips_catalog() {
        let (db, _) = setup().await;
        let catalog = StubCatalog::with(&[bolt_entry()]);
        let engine = CompositionEngine::new(db.connection(), &catalog);

        let err = engine
            .add_card(&DeckId::new(), "abc-123", Zone::Main, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_add_card_rejects_bad_delta_before_resolving() {
        let (db, deck_id) = setup().await;
        let catalog = StubCatalog::with(&[bolt_entry()]);
        let engine = CompositionEngine::new(db.connection(), &catalog);

        let err = engine
            .add_card(&deck_id, "abc-123", Zone::Main, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(catalog.calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_card_is_idempotent() {
        let (db, deck_id) = setup().await;
        let catalog = StubCatalog::with(&[bolt_entry()]);
        let engine = CompositionEngine::new(db.connection(), &catalog);

        let assoc = engine
            .add_card(&deck_id, "abc-123", Zone::Main, 1)
            .await
            .unwrap();

        assert_eq!(
            engine
                .remove_card(&deck_id, &assoc.card_id, None)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            engine
                .remove_card(&deck_id, &assoc.card_id, None)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_sideboard_add_then_zero_out() {
        let (db, deck_id) = setup().await;
        let catalog = StubCatalog::with(&[bolt_entry()]);
        let engine = CompositionEngine::new(db.connection(), &catalog);

        let assoc = engine
            .add_card(&deck_id, "abc-123", Zone::Sideboard, 1)
            .await
            .unwrap();
        assert_eq!(assoc.quantity, 1);
        assert_eq!(engine.sideboard_count(&deck_id).await.unwrap(), 1);

        let gone = engine
            .set_quantity(&deck_id, &assoc.card_id, Zone::Sideboard, 0)
            .await
            .unwrap();
        assert!(gone.is_none());
        assert!(engine.cards_for_deck(&deck_id).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_counts_track_zones_independently() {
        let (db, deck_id) = setup().await;
        let catalog = StubCatalog::with(&[bolt_entry()]);
        let engine = CompositionEngine::new(db.connection(), &catalog);

        engine
            .add_card(&deck_id, "abc-123", Zone::Main, 4)
            .await
            .unwrap();
        engine
            .add_card(&deck_id, "abc-123", Zone::Sideboard, 2)
            .await
            .unwrap();

        assert_eq!(engine.main_count(&deck_id).await.unwrap(), 4);
        assert_eq!(engine.sideboard_count(&deck_id).await.unwrap(), 2);
    }
}
