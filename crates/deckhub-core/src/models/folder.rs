//! Folder model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::models::UserId;

/// A unique identifier for a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(Uuid);

impl FolderId {
    /// Create a new unique folder ID using UUID v7
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

impl Default for FolderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A named grouping of decks, user-scoped and optionally nested.
///
/// Ownership is immutable and a folder's parent always belongs to the same
/// user. The tree stays acyclic — re-parenting walks the ancestor chain
/// before committing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Unique identifier
    pub id: FolderId,
    /// Folder name
    pub name: String,
    /// Owning user, immutable after creation
    pub user_id: UserId,
    /// Parent folder, `None` for top-level folders
    pub parent_id: Option<FolderId>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
}

impl Folder {
    /// Create a new folder owned by the given user
    #[must_use]
    pub fn new(user_id: UserId, name: impl Into<String>, parent_id: Option<FolderId>) -> Self {
        Self {
            id: FolderId::new(),
            name: name.into(),
            user_id,
            parent_id,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_id_parse() {
        let id = FolderId::new();
        let parsed: FolderId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_folder_new() {
        let user = UserId::new();
        let parent = FolderId::new();
        let folder = Folder::new(user, "Standard", Some(parent));
        assert_eq!(folder.user_id, user);
        assert_eq!(folder.parent_id, Some(parent));
    }
}
