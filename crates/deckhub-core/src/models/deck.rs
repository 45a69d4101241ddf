//! Deck model and deck-card associations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Card, CardId, FolderId, UserId};

/// A unique identifier for a deck, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeckId(Uuid);

impl DeckId {
    /// Create a new unique deck ID using UUID v7
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

impl Default for DeckId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeckId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Which list of a deck a card association belongs to.
///
/// Stored as text (`main` / `sideboard`) in the association's natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Main,
    Sideboard,
}

impl Zone {
    /// The stored text form of this zone
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Sideboard => "sideboard",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Self::Main),
            "sideboard" => Ok(Self::Sideboard),
            other => Err(Error::InvalidArgument(format!("unknown zone '{other}'"))),
        }
    }
}

/// A named, user-owned collection of cards, optionally scoped to a folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Unique identifier
    pub id: DeckId,
    /// Deck name
    pub name: String,
    /// Optional free-form description
    pub description: Option<String>,
    /// Owning user, immutable after creation
    pub user_id: UserId,
    /// Folder this deck is filed under, if any
    pub folder_id: Option<FolderId>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Deck {
    /// Create a new empty deck owned by the given user
    #[must_use]
    pub fn new(user_id: UserId, name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: DeckId::new(),
            name: name.into(),
            description: None,
            user_id,
            folder_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// "This many copies of this card are in this deck, in this zone."
///
/// At most one row exists per `(deck_id, card_id, zone)`; quantity is always
/// at least 1 — a quantity reaching zero deletes the row instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCard {
    /// Owning deck
    pub deck_id: DeckId,
    /// Referenced card, shared across decks
    pub card_id: CardId,
    /// Number of copies, always >= 1
    pub quantity: i64,
    /// Main list or sideboard
    pub zone: Zone,
}

/// A deck's association joined with its card record, for rendering deck lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckEntry {
    /// The cached card record
    pub card: Card,
    /// Number of copies in this zone
    pub quantity: i64,
    /// Main list or sideboard
    pub zone: Zone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_id_parse() {
        let id = DeckId::new();
        let parsed: DeckId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_deck_new() {
        let user = UserId::new();
        let deck = Deck::new(user, "Burn");
        assert_eq!(deck.name, "Burn");
        assert_eq!(deck.user_id, user);
        assert!(deck.folder_id.is_none());
        assert_eq!(deck.created_at, deck.updated_at);
    }

    #[test]
    fn test_zone_round_trip() {
        assert_eq!("main".parse::<Zone>().unwrap(), Zone::Main);
        assert_eq!("sideboard".parse::<Zone>().unwrap(), Zone::Sideboard);
        assert_eq!(Zone::Main.as_str(), "main");
        assert_eq!(Zone::Sideboard.to_string(), "sideboard");
    }

    #[test]
    fn test_zone_rejects_unknown() {
        let err = "maybeboard".parse::<Zone>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
