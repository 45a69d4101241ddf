//! Folder repository implementation
//!
//! Folders form a per-user tree. Re-parenting walks the ancestor chain to
//! keep the tree acyclic, and deletion makes the cascade policy explicit:
//! child folders are removed with the folder, decks are detached (their
//! `folder_id` is set to null by the schema), never deleted.

use crate::db::{parse_id, row_text_opt};
use crate::error::{Error, Result};
use crate::models::{Folder, FolderId, UserId};
use libsql::{params, Connection, Row};

const FOLDER_COLUMNS: &str = "id, name, user_id, parent_id, created_at";

/// Trait for folder storage operations
#[allow(async_fn_in_trait)]
pub trait FolderRepository {
    /// Create a folder, optionally nested under a parent of the same user
    async fn create(
        &self,
        user_id: &UserId,
        name: &str,
        parent_id: Option<&FolderId>,
    ) -> Result<Folder>;

    /// Get a folder by ID
    async fn get(&self, id: &FolderId) -> Result<Option<Folder>>;

    /// List a user's folders, alphabetically
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Folder>>;

    /// Rename a folder
    async fn rename(&self, id: &FolderId, name: &str) -> Result<Folder>;

    /// Move a folder under a new parent, or to the top level with `None`.
    ///
    /// Rejects the folder itself and any of its descendants as the new
    /// parent — either would make the tree cyclic.
    async fn reparent(&self, id: &FolderId, new_parent_id: Option<&FolderId>) -> Result<Folder>;

    /// Delete a folder.
    ///
    /// Without `cascade`, a folder that still has child folders or decks is
    /// refused. With `cascade`, descendant folders are deleted and the decks
    /// they contained are detached to the top level.
    async fn delete(&self, id: &FolderId, cascade: bool) -> Result<()>;
}

/// libSQL implementation of `FolderRepository`
pub struct LibSqlFolderRepository<'a> {
    conn: &'a Connection,
}

fn parse_folder(row: &Row) -> Result<Folder> {
    Ok(Folder {
        id: parse_id(&row.get::<String>(0)?)?,
        name: row.get(1)?,
        user_id: parse_id(&row.get::<String>(2)?)?,
        parent_id: row_text_opt(row, 3)?
            .map(|value| parse_id::<FolderId>(&value))
            .transpose()?,
        created_at: row.get(4)?,
    })
}

impl<'a> LibSqlFolderRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn require(&self, id: &FolderId) -> Result<Folder> {
        self.get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("folder {id}")))
    }

    /// Fail if `candidate` is `folder` or one of its descendants.
    ///
    /// Walks from the candidate up through parents; the existing tree is
    /// acyclic, so the walk terminates at a root.
    async fn ensure_not_descendant(&self, folder: &FolderId, candidate: &FolderId) -> Result<()> {
        let mut cursor = Some(*candidate);
        while let Some(current) = cursor {
            if current == *folder {
                return Err(Error::InvalidArgument(format!(
                    "re-parenting folder {folder} under {candidate} would create a cycle"
                )));
            }
            cursor = match self.get(&current).await? {
                Some(ancestor) => ancestor.parent_id,
                None => None,
            };
        }
        Ok(())
    }

    async fn children_of(&self, id: &FolderId) -> Result<Vec<FolderId>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id FROM folders WHERE parent_id = ?",
                params![id.as_str()],
            )
            .await?;

        let mut children = Vec::new();
        while let Some(row) = rows.next().await? {
            children.push(parse_id(&row.get::<String>(0)?)?);
        }
        Ok(children)
    }

    async fn deck_count(&self, id: &FolderId) -> Result<i64> {
        let mut rows = self
            .conn
            .query(
                "SELECT COUNT(*) FROM decks WHERE folder_id = ?",
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(row.get(0)?),
            None => Ok(0),
        }
    }
}

impl FolderRepository for LibSqlFolderRepository<'_> {
    async fn create(
        &self,
        user_id: &UserId,
        name: &str,
        parent_id: Option<&FolderId>,
    ) -> Result<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "folder name must not be empty".into(),
            ));
        }

        if let Some(parent_id) = parent_id {
            let parent = self.require(parent_id).await?;
            if parent.user_id != *user_id {
                return Err(Error::Forbidden(format!(
                    "parent folder {parent_id} belongs to a different user"
                )));
            }
        }

        let folder = Folder::new(*user_id, name, parent_id.copied());
        self.conn
            .execute(
                "INSERT INTO folders (id, name, user_id, parent_id, created_at) VALUES (?, ?, ?, ?, ?)",
                params![
                    folder.id.as_str(),
                    folder.name.clone(),
                    folder.user_id.as_str(),
                    folder.parent_id.map(|id| id.as_str()),
                    folder.created_at
                ],
            )
            .await?;

        Ok(folder)
    }

    async fn get(&self, id: &FolderId) -> Result<Option<Folder>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {FOLDER_COLUMNS} FROM folders WHERE id = ?"),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_folder(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Folder>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {FOLDER_COLUMNS} FROM folders
                     WHERE user_id = ?
                     ORDER BY name COLLATE NOCASE"
                ),
                params![user_id.as_str()],
            )
            .await?;

        let mut folders = Vec::new();
        while let Some(row) = rows.next().await? {
            folders.push(parse_folder(&row)?);
        }
        Ok(folders)
    }

    async fn rename(&self, id: &FolderId, name: &str) -> Result<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidArgument(
                "folder name must not be empty".into(),
            ));
        }

        let rows = self
            .conn
            .execute(
                "UPDATE folders SET name = ? WHERE id = ?",
                params![name, id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("folder {id}")));
        }

        self.require(id).await
    }

    async fn reparent(&self, id: &FolderId, new_parent_id: Option<&FolderId>) -> Result<Folder> {
        let folder = self.require(id).await?;

        if let Some(parent_id) = new_parent_id {
            let parent = self.require(parent_id).await?;
            if parent.user_id != folder.user_id {
                return Err(Error::Forbidden(format!(
                    "parent folder {parent_id} belongs to a different user"
                )));
            }
            self.ensure_not_descendant(id, parent_id).await?;
        }

        self.conn
            .execute(
                "UPDATE folders SET parent_id = ? WHERE id = ?",
                params![new_parent_id.map(FolderId::as_str), id.as_str()],
            )
            .await?;

        self.require(id).await
    }

    async fn delete(&self, id: &FolderId, cascade: bool) -> Result<()> {
        self.require(id).await?;

        let children = self.children_of(id).await?;
        if !cascade && (!children.is_empty() || self.deck_count(id).await? > 0) {
            return Err(Error::Conflict(format!(
                "folder {id} is not empty; delete with cascade or move its contents first"
            )));
        }

        // Collect the subtree breadth-first, then delete deepest-first so no
        // child outlives its parent row. Decks detach via ON DELETE SET NULL.
        let mut subtree = vec![*id];
        let mut next = 0;
        while next < subtree.len() {
            let current = subtree[next];
            next += 1;
            subtree.extend(self.children_of(&current).await?);
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        for folder_id in subtree.iter().rev() {
            if let Err(e) = self
                .conn
                .execute(
                    "DELETE FROM folders WHERE id = ?",
                    params![folder_id.as_str()],
                )
                .await
            {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e.into());
            }
        }
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        tracing::debug!(folder_id = %id, folders = subtree.len(), "deleted folder subtree");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DeckRepository, LibSqlDeckRepository, LibSqlUserRepository, UserRepository};
    use pretty_assertions::assert_eq;

    struct Fixture {
        db: Database,
        alice: UserId,
        bob: UserId,
    }

    async fn setup() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let (alice, bob) = {
            let users = LibSqlUserRepository::new(db.connection());
            let alice = users.create("alice@example.com", "hash").await.unwrap();
            let bob = users.create("bob@example.com", "hash").await.unwrap();
            (alice.id, bob.id)
        };
        Fixture { db, alice, bob }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_and_list() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let standard = repo.create(&fx.alice, "Standard", None).await.unwrap();
        repo.create(&fx.alice, "Brews", Some(&standard.id))
            .await
            .unwrap();
        repo.create(&fx.bob, "Legacy", None).await.unwrap();

        let folders = repo.list_by_user(&fx.alice).await.unwrap();
        assert_eq!(folders.len(), 2);
        assert_eq!(folders[0].name, "Brews");
        assert_eq!(folders[1].name, "Standard");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_rejects_foreign_parent() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let bobs = repo.create(&fx.bob, "Legacy", None).await.unwrap();
        let err = repo
            .create(&fx.alice, "Sneaky", Some(&bobs.id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_create_rejects_missing_parent() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let err = repo
            .create(&fx.alice, "Orphan", Some(&FolderId::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rename() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let folder = repo.create(&fx.alice, "Standard", None).await.unwrap();
        let renamed = repo.rename(&folder.id, "Pioneer").await.unwrap();
        assert_eq!(renamed.name, "Pioneer");

        let err = repo.rename(&folder.id, "   ").await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reparent_rejects_self() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let folder = repo.create(&fx.alice, "Standard", None).await.unwrap();
        let err = repo.reparent(&folder.id, Some(&folder.id)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reparent_rejects_descendant() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let root = repo.create(&fx.alice, "Root", None).await.unwrap();
        let mid = repo.create(&fx.alice, "Mid", Some(&root.id)).await.unwrap();
        let leaf = repo.create(&fx.alice, "Leaf", Some(&mid.id)).await.unwrap();

        let err = repo.reparent(&root.id, Some(&leaf.id)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reparent_moves_and_detaches() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let a = repo.create(&fx.alice, "A", None).await.unwrap();
        let b = repo.create(&fx.alice, "B", None).await.unwrap();

        let moved = repo.reparent(&b.id, Some(&a.id)).await.unwrap();
        assert_eq!(moved.parent_id, Some(a.id));

        let detached = repo.reparent(&b.id, None).await.unwrap();
        assert_eq!(detached.parent_id, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reparent_rejects_foreign_parent() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let mine = repo.create(&fx.alice, "Mine", None).await.unwrap();
        let theirs = repo.create(&fx.bob, "Theirs", None).await.unwrap();

        let err = repo.reparent(&mine.id, Some(&theirs.id)).await.unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_refuses_non_empty_without_cascade() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let root = repo.create(&fx.alice, "Root", None).await.unwrap();
        repo.create(&fx.alice, "Child", Some(&root.id)).await.unwrap();

        let err = repo.delete(&root.id, false).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_leaf_without_cascade() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let folder = repo.create(&fx.alice, "Empty", None).await.unwrap();
        repo.delete(&folder.id, false).await.unwrap();
        assert!(repo.get(&folder.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_cascade_detaches_decks() {
        let fx = setup().await;
        let conn = fx.db.connection();
        let repo = LibSqlFolderRepository::new(conn);
        let decks = LibSqlDeckRepository::new(conn);

        let root = repo.create(&fx.alice, "Root", None).await.unwrap();
        let child = repo.create(&fx.alice, "Child", Some(&root.id)).await.unwrap();
        let deck = decks
            .create(&fx.alice, "Burn", None, Some(&child.id))
            .await
            .unwrap();

        repo.delete(&root.id, true).await.unwrap();

        assert!(repo.get(&root.id).await.unwrap().is_none());
        assert!(repo.get(&child.id).await.unwrap().is_none());

        // The deck survives, detached to the top level
        let survivor = decks.get(&deck.id).await.unwrap().unwrap();
        assert_eq!(survivor.folder_id, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_unknown_folder_not_found() {
        let fx = setup().await;
        let repo = LibSqlFolderRepository::new(fx.db.connection());

        let err = repo.delete(&FolderId::new(), false).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
