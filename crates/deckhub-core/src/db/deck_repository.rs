//! Deck repository implementation
//!
//! Covers deck metadata CRUD and the deck-card composition store. Quantity
//! changes are single upserts against the `(deck_id, card_id, zone)` natural
//! key so concurrent edits of the same deck cannot lose updates.

use crate::db::{parse_id, row_text_opt};
use crate::error::{Error, Result};
use crate::models::{Card, CardId, Deck, DeckCard, DeckEntry, DeckId, FolderId, UserId, Zone};
use crate::util::normalize_text_option;
use libsql::{params, Connection, Row};

use super::card_repository::parse_card;

const DECK_COLUMNS: &str = "id, name, description, user_id, folder_id, created_at, updated_at";

/// Trait for deck storage and composition operations
#[allow(async_fn_in_trait)]
pub trait DeckRepository {
    /// Create a deck, optionally filed under a folder of the same user
    async fn create(
        &self,
        user_id: &UserId,
        name: &str,
        description: Option<&str>,
        folder_id: Option<&FolderId>,
    ) -> Result<Deck>;

    /// Get a deck by ID
    async fn get(&self, id: &DeckId) -> Result<Option<Deck>>;

    /// List a user's decks, most recently updated first
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Deck>>;

    /// Rename, re-describe, and/or re-folder a deck
    async fn update(
        &self,
        id: &DeckId,
        name: &str,
        description: Option<&str>,
        folder_id: Option<&FolderId>,
    ) -> Result<Deck>;

    /// Delete a deck; its card associations go with it
    async fn delete(&self, id: &DeckId) -> Result<()>;

    /// Add `delta` copies of a card to one zone of a deck.
    ///
    /// Increments the existing association if one exists, otherwise creates
    /// it. `delta` must be positive.
    async fn add_card(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Zone,
        delta: i64,
    ) -> Result<DeckCard>;

    /// Remove a card from one zone, or from all zones when `zone` is `None`.
    ///
    /// Returns the number of associations removed; removing a card that is
    /// not in the deck is a no-op, not an error.
    async fn remove_card(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Option<Zone>,
    ) -> Result<u64>;

    /// Set an association to an exact quantity.
    ///
    /// Zero deletes the association and returns `None`; negative quantities
    /// are rejected.
    async fn set_quantity(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Zone,
        quantity: i64,
    ) -> Result<Option<DeckCard>>;

    /// The deck's associations joined with their card records
    async fn cards_for_deck(&self, deck_id: &DeckId) -> Result<Vec<DeckEntry>>;

    /// Total number of main-list copies, recomputed from the live rows
    async fn main_count(&self, deck_id: &DeckId) -> Result<i64>;

    /// Total number of sideboard copies, recomputed from the live rows
    async fn sideboard_count(&self, deck_id: &DeckId) -> Result<i64>;
}

/// libSQL implementation of `DeckRepository`
pub struct LibSqlDeckRepository<'a> {
    conn: &'a Connection,
}

fn parse_deck(row: &Row) -> Result<Deck> {
    Ok(Deck {
        id: parse_id(&row.get::<String>(0)?)?,
        name: row.get(1)?,
        description: row_text_opt(row, 2)?,
        user_id: parse_id(&row.get::<String>(3)?)?,
        folder_id: row_text_opt(row, 4)?
            .map(|value| parse_id::<FolderId>(&value))
            .transpose()?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl<'a> LibSqlDeckRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn exists(&self, table: &str, id: &str) -> Result<bool> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?)"),
                params![id],
            )
            .await?;

        Ok(rows
            .next()
            .await?
            .is_some_and(|row| row.get::<i32>(0).unwrap_or(0) != 0))
    }

    async fn ensure_deck(&self, id: &DeckId) -> Result<()> {
        if self.exists("decks", &id.as_str()).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("deck {id}")))
        }
    }

    async fn ensure_card(&self, id: &CardId) -> Result<()> {
        if self.exists("cards", &id.as_str()).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!("card {id}")))
        }
    }

    /// Validate that a target folder exists and belongs to the deck's owner
    async fn ensure_folder_owner(&self, folder_id: &FolderId, user_id: &UserId) -> Result<()> {
        let mut rows = self
            .conn
            .query(
                "SELECT user_id FROM folders WHERE id = ?",
                params![folder_id.as_str()],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Err(Error::NotFound(format!("folder {folder_id}")));
        };

        let owner: UserId = parse_id(&row.get::<String>(0)?)?;
        if owner == *user_id {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "folder {folder_id} belongs to a different user"
            )))
        }
    }

    async fn get_association(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Zone,
    ) -> Result<Option<DeckCard>> {
        let mut rows = self
            .conn
            .query(
                "SELECT quantity FROM deck_cards WHERE deck_id = ? AND card_id = ? AND zone = ?",
                params![deck_id.as_str(), card_id.as_str(), zone.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(DeckCard {
                deck_id: *deck_id,
                card_id: *card_id,
                quantity: row.get(0)?,
                zone,
            })),
            None => Ok(None),
        }
    }

    async fn zone_count(&self, deck_id: &DeckId, zone: Zone) -> Result<i64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COALESCE(SUM(quantity), 0) FROM deck_cards WHERE deck_id = ? AND zone = ?",
                params![deck_id.as_str(), zone.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(0),
        }
    }
}

impl DeckRepository for LibSqlDeckRepository<'_> {
    async fn create(
        &self,
        user_id: &UserId,
        name: &str,
        description: Option<&str>,
        folder_id: Option<&FolderId>,
    ) -> Result<Deck> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument("deck name must not be empty".into()));
        }
        if !self.exists("users", &user_id.as_str()).await? {
            return Err(Error::NotFound(format!("user {user_id}")));
        }
        if let Some(folder_id) = folder_id {
            self.ensure_folder_owner(folder_id, user_id).await?;
        }

        let mut deck = Deck::new(*user_id, name);
        deck.description = normalize_text_option(description.map(ToString::to_string));
        deck.folder_id = folder_id.copied();

        self.conn
            .execute(
                "INSERT INTO decks (id, name, description, user_id, folder_id, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    deck.id.as_str(),
                    deck.name.clone(),
                    deck.description.clone(),
                    deck.user_id.as_str(),
                    deck.folder_id.map(|id| id.as_str()),
                    deck.created_at,
                    deck.updated_at
                ],
            )
            .await?;

        Ok(deck)
    }

    async fn get(&self, id: &DeckId) -> Result<Option<Deck>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = ?"),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_deck(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Deck>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {DECK_COLUMNS} FROM decks
                     WHERE user_id = ?
                     ORDER BY updated_at DESC"
                ),
                params![user_id.as_str()],
            )
            .await?;

        let mut decks = Vec::new();
        while let Some(row) = rows.next().await? {
            decks.push(parse_deck(&row)?);
        }
        Ok(decks)
    }

    async fn update(
        &self,
        id: &DeckId,
        name: &str,
        description: Option<&str>,
        folder_id: Option<&FolderId>,
    ) -> Result<Deck> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument("deck name must not be empty".into()));
        }

        let deck = self
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("deck {id}")))?;
        if let Some(folder_id) = folder_id {
            self.ensure_folder_owner(folder_id, &deck.user_id).await?;
        }

        let now = chrono::Utc::now().timestamp_millis();
        let description = normalize_text_option(description.map(ToString::to_string));
        self.conn
            .execute(
                "UPDATE decks SET name = ?, description = ?, folder_id = ?, updated_at = ? WHERE id = ?",
                params![
                    name,
                    description,
                    folder_id.map(FolderId::as_str),
                    now,
                    id.as_str()
                ],
            )
            .await?;

        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("deck {id}")))
    }

    async fn delete(&self, id: &DeckId) -> Result<()> {
        let rows = self
            .conn
            .execute("DELETE FROM decks WHERE id = ?", params![id.as_str()])
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("deck {id}")));
        }

        tracing::debug!(deck_id = %id, "deleted deck and its card associations");
        Ok(())
    }

    async fn add_card(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Zone,
        delta: i64,
    ) -> Result<DeckCard> {
        if delta <= 0 {
            return Err(Error::InvalidArgument(format!(
                "quantity delta must be positive, got {delta}"
            )));
        }
        self.ensure_deck(deck_id).await?;
        self.ensure_card(card_id).await?;

        // Single atomic upsert; no read-modify-write window
        self.conn
            .execute(
                "INSERT INTO deck_cards (deck_id, card_id, quantity, zone) VALUES (?, ?, ?, ?)
                 ON CONFLICT (deck_id, card_id, zone)
                 DO UPDATE SET quantity = quantity + excluded.quantity",
                params![deck_id.as_str(), card_id.as_str(), delta, zone.as_str()],
            )
            .await?;

        self.get_association(deck_id, card_id, zone)
            .await?
            .ok_or_else(|| Error::Database("deck_cards row missing after upsert".into()))
    }

    async fn remove_card(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Option<Zone>,
    ) -> Result<u64> {
        let removed = match zone {
            Some(zone) => {
                self.conn
                    .execute(
                        "DELETE FROM deck_cards WHERE deck_id = ? AND card_id = ? AND zone = ?",
                        params![deck_id.as_str(), card_id.as_str(), zone.as_str()],
                    )
                    .await?
            }
            None => {
                self.conn
                    .execute(
                        "DELETE FROM deck_cards WHERE deck_id = ? AND card_id = ?",
                        params![deck_id.as_str(), card_id.as_str()],
                    )
                    .await?
            }
        };

        Ok(removed)
    }

    async fn set_quantity(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        zone: Zone,
        quantity: i64,
    ) -> Result<Option<DeckCard>> {
        if quantity < 0 {
            return Err(Error::InvalidArgument(format!(
                "quantity must not be negative, got {quantity}"
            )));
        }

        if quantity == 0 {
            self.remove_card(deck_id, card_id, Some(zone)).await?;
            return Ok(None);
        }

        self.ensure_deck(deck_id).await?;
        self.ensure_card(card_id).await?;

        self.conn
            .execute(
                "INSERT INTO deck_cards (deck_id, card_id, quantity, zone) VALUES (?, ?, ?, ?)
                 ON CONFLICT (deck_id, card_id, zone)
                 DO UPDATE SET quantity = excluded.quantity",
                params![deck_id.as_str(), card_id.as_str(), quantity, zone.as_str()],
            )
            .await?;

        self.get_association(deck_id, card_id, zone).await
    }

    async fn cards_for_deck(&self, deck_id: &DeckId) -> Result<Vec<DeckEntry>> {
        let mut rows = self
            .conn
            .query(
                "SELECT c.id, c.external_id, c.name, c.mana_cost, c.type_line, c.oracle_text,
                        c.image_url, c.colors, c.created_at, dc.quantity, dc.zone
                 FROM deck_cards dc
                 JOIN cards c ON c.id = dc.card_id
                 WHERE dc.deck_id = ?
                 ORDER BY dc.zone, c.name COLLATE NOCASE",
                params![deck_id.as_str()],
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            let card: Card = parse_card(&row)?;
            let quantity: i64 = row.get(9)?;
            let zone: Zone = row.get::<String>(10)?.parse()?;
            entries.push(DeckEntry {
                card,
                quantity,
                zone,
            });
        }
        Ok(entries)
    }

    async fn main_count(&self, deck_id: &DeckId) -> Result<i64> {
        self.zone_count(deck_id, Zone::Main).await
    }

    async fn sideboard_count(&self, deck_id: &DeckId) -> Result<i64> {
        self.zone_count(deck_id, Zone::Sideboard).await
    }
}
