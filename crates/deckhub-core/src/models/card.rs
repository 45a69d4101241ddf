//! Card model
//!
//! A `Card` is a local cache record of an external catalog entry. Rows are
//! created lazily on first reference and never refreshed afterwards; at most
//! one row exists per `external_id`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a locally cached card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(Uuid);

impl CardId {
    /// Create a new unique card ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CardId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CardId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A locally cached card from the external catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// Unique identifier
    pub id: CardId,
    /// The external catalog's identifier, unique across cards
    pub external_id: String,
    /// Card name
    pub name: String,
    /// Mana cost string, e.g. `{1}{R}`
    pub mana_cost: Option<String>,
    /// Type line, e.g. `Instant`
    pub type_line: Option<String>,
    /// Rules text
    pub oracle_text: Option<String>,
    /// Image reference from the catalog
    pub image_url: Option<String>,
    /// Color letters joined with commas, e.g. `R` or `U,W`
    pub colors: String,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Card {
    /// Create a new card record with the given external id and name.
    ///
    /// Optional catalog attributes start empty; the catalog layer fills
    /// them in when materializing a card from an external entry.
    #[must_use]
    pub fn new(external_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CardId::new(),
            external_id: external_id.into(),
            name: name.into(),
            mana_cost: None,
            type_line: None,
            oracle_text: None,
            image_url: None,
            colors: String::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}
