//! Card repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT/OFFSET

use crate::db::{parse_id, row_text_opt};
use crate::error::Result;
use crate::models::{Card, CardId};
use libsql::{params, Connection, Row};

const CARD_COLUMNS: &str =
    "id, external_id, name, mana_cost, type_line, oracle_text, image_url, colors, created_at";

/// Trait for card storage operations
#[allow(async_fn_in_trait)]
pub trait CardRepository {
    /// Insert a new card row.
    ///
    /// Fails with a UNIQUE violation when the external id is already cached;
    /// callers racing on first reference recover via
    /// [`Error::is_unique_violation`](crate::Error::is_unique_violation).
    async fn insert(&self, card: &Card) -> Result<()>;

    /// Get a card by its local ID
    async fn get(&self, id: &CardId) -> Result<Option<Card>>;

    /// Look up a card by the external catalog's identifier
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Card>>;

    /// Search cached cards by name substring
    async fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<Card>>;
}

/// libSQL implementation of `CardRepository`
pub struct LibSqlCardRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlCardRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

/// Parse a card from a row selected with [`CARD_COLUMNS`] at offset 0.
pub(crate) fn parse_card(row: &Row) -> Result<Card> {
    Ok(Card {
        id: parse_id(&row.get::<String>(0)?)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        mana_cost: row_text_opt(row, 3)?,
        type_line: row_text_opt(row, 4)?,
        oracle_text: row_text_opt(row, 5)?,
        image_url: row_text_opt(row, 6)?,
        colors: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl CardRepository for LibSqlCardRepository<'_> {
    async fn insert(&self, card: &Card) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO cards (id, external_id, name, mana_cost, type_line, oracle_text, image_url, colors, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    card.id.as_str(),
                    card.external_id.clone(),
                    card.name.clone(),
                    card.mana_cost.clone(),
                    card.type_line.clone(),
                    card.oracle_text.clone(),
                    card.image_url.clone(),
                    card.colors.clone(),
                    card.created_at
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &CardId) -> Result<Option<Card>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ?"),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_card(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Card>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {CARD_COLUMNS} FROM cards WHERE external_id = ?"),
                params![external_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_card(&row)?)),
            None => Ok(None),
        }
    }

    async fn search_by_name(&self, query: &str, limit: usize) -> Result<Vec<Card>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {CARD_COLUMNS} FROM cards
                     WHERE name LIKE '%' || ? || '%'
                     ORDER BY name COLLATE NOCASE
                     LIMIT ?"
                ),
                params![query, limit as i64],
            )
            .await?;

        let mut cards = Vec::new();
        while let Some(row) = rows.next().await? {
            cards.push(parse_card(&row)?);
        }
        Ok(cards)
    }
}
