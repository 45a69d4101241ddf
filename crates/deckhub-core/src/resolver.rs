//! Cache-aside card resolution.
//!
//! Given an external catalog identifier, return the local card record,
//! fetching from the catalog and materializing the row on first reference.
//! The `cards.external_id` UNIQUE constraint is the serialization point for
//! concurrent first references; there is no application-level lock.

use libsql::Connection;

use crate::catalog::CatalogClient;
use crate::db::{CardRepository, LibSqlCardRepository};
use crate::error::{Error, Result};
use crate::models::Card;

/// Resolves external card identifiers to local card records.
pub struct CardResolver<'a, C> {
    cards: LibSqlCardRepository<'a>,
    catalog: &'a C,
}

impl<'a, C: CatalogClient> CardResolver<'a, C> {
    /// Create a resolver over the given connection and catalog client
    pub const fn new(conn: &'a Connection, catalog: &'a C) -> Self {
        Self {
            cards: LibSqlCardRepository::new(conn),
            catalog,
        }
    }

    /// Resolve an external identifier to a local card record.
    ///
    /// A cached card is returned unchanged — no refresh from the catalog.
    /// On a miss the catalog is queried once: an unknown identifier fails
    /// with [`Error::NotFound`], a transport failure with
    /// [`Error::UpstreamUnavailable`], and no partial row is written in
    /// either case.
    ///
    /// Two calls racing on the same unseen identifier may both miss and both
    /// insert; the loser catches the UNIQUE violation and re-reads the
    /// winner's row, so the race never surfaces to callers.
    pub async fn resolve(&self, external_id: &str) -> Result<Card> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(Error::InvalidArgument(
                "external card id must not be empty".into(),
            ));
        }

        if let Some(card) = self.cards.find_by_external_id(external_id).await? {
            tracing::debug!(external_id, "card cache hit");
            return Ok(card);
        }

        let entry = self
            .catalog
            .fetch_card(external_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("card {external_id} not in catalog")))?;

        // The catalog's own id is authoritative (it may resolve an alias)
        let card = entry.into_card();
        match self.cards.insert(&card).await {
            Ok(()) => {
                tracing::debug!(
                    external_id = %card.external_id,
                    name = %card.name,
                    "materialized card from catalog"
                );
                Ok(card)
            }
            // Lost the first-reference race; the winner's row is authoritative
            Err(err) if err.is_unique_violation() => self
                .cards
                .find_by_external_id(&card.external_id)
                .await?
                .ok_or(err),
            Err(err) => Err(err),
        }
    }
}
