//! External card catalog client.
//!
//! The catalog is the authoritative source of card metadata, consumed
//! read-only and keyed by an opaque external identifier. Only the fields
//! this core persists are modeled; the rest of the payload is ignored.

use serde::{Deserialize, Serialize};

use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::models::Card;
use crate::util::compact_text;

/// Read-only access to the external card catalog.
#[allow(async_fn_in_trait)]
pub trait CatalogClient {
    /// Fetch a card's full record by its external identifier.
    ///
    /// Returns `Ok(None)` when the catalog does not know the identifier.
    /// Transport failures and non-success responses surface as
    /// [`Error::UpstreamUnavailable`]; nothing is retried here.
    async fn fetch_card(&self, external_id: &str) -> Result<Option<CatalogCard>>;
}

/// Image references as served by the catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUris {
    pub small: Option<String>,
    pub normal: Option<String>,
    pub large: Option<String>,
}

/// A card record as returned by the external catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogCard {
    /// The catalog's own identifier for this card
    pub id: String,
    /// Card name
    pub name: String,
    /// Mana cost string, e.g. `{R}`
    pub mana_cost: Option<String>,
    /// Type line, e.g. `Instant`
    pub type_line: Option<String>,
    /// Rules text
    pub oracle_text: Option<String>,
    /// Card images in several sizes
    pub image_uris: Option<ImageUris>,
    /// Color letters, e.g. `["R"]`
    #[serde(default)]
    pub colors: Vec<String>,
}

impl CatalogCard {
    /// Materialize a local card record from this catalog entry.
    ///
    /// The stored external id is the catalog's own `id` field, which may
    /// differ from the identifier the caller asked for if the catalog
    /// resolved an alias.
    #[must_use]
    pub fn into_card(self) -> Card {
        let mut card = Card::new(self.id, self.name);
        card.mana_cost = self.mana_cost;
        card.type_line = self.type_line;
        card.oracle_text = self.oracle_text;
        card.image_url = self.image_uris.and_then(|uris| uris.normal);
        card.colors = self.colors.join(",");
        card
    }
}

/// HTTP client for the Scryfall card catalog
#[derive(Debug, Clone)]
pub struct ScryfallClient {
    base_url: String,
    client: reqwest::Client,
}

impl ScryfallClient {
    /// Build a client from the given configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let base_url = config.normalized_base_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("deckhub/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                Error::UpstreamUnavailable(format!("failed to construct HTTP client: {error}"))
            })?;
        Ok(Self { base_url, client })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl CatalogClient for ScryfallClient {
    async fn fetch_card(&self, external_id: &str) -> Result<Option<CatalogCard>> {
        let url = format!(
            "{}/cards/{}",
            self.base_url,
            urlencoding::encode(external_id)
        );

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| {
                Error::UpstreamUnavailable(format!("catalog request failed: {error}"))
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UpstreamUnavailable(format!(
                "catalog returned HTTP {status}: {}",
                compact_text(&body)
            )));
        }

        let card = response.json::<CatalogCard>().await.map_err(|error| {
            Error::UpstreamUnavailable(format!("failed to parse catalog response: {error}"))
        })?;
        Ok(Some(card))
    }
}
