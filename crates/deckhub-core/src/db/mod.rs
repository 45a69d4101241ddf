//! Database layer for Deckhub

mod card_repository;
mod connection;
mod deck_repository;
mod folder_repository;
mod migrations;
mod user_repository;

pub use card_repository::{CardRepository, LibSqlCardRepository};
pub use connection::Database;
pub use deck_repository::{DeckRepository, LibSqlDeckRepository};
pub use folder_repository::{FolderRepository, LibSqlFolderRepository};
pub use user_repository::{LibSqlUserRepository, UserRepository};

use crate::error::{Error, Result};
use libsql::{Row, Value};

/// Read a nullable TEXT column.
pub(crate) fn row_text_opt(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Text(value) => Ok(Some(value)),
        Value::Null => Ok(None),
        other => Err(Error::Database(format!(
            "expected text or null at column {idx}, got {other:?}"
        ))),
    }
}

/// Parse a stored id column into its typed form.
pub(crate) fn parse_id<T>(value: &str) -> Result<T>
where
    T: std::str::FromStr,
{
    value
        .parse()
        .map_err(|_| Error::Database(format!("invalid id in row: {value}")))
}
