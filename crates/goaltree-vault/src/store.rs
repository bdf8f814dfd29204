//! Document persistence
//!
//! [`DocumentStore`] is the seam between the engine and wherever notes live.
//! [`VaultStore`] keeps them as markdown files under a root directory, with
//! vault-relative `/`-separated paths as identifiers.

use crate::error::{StoreError, StoreResult};
use crate::frontmatter::Note;
use async_trait::async_trait;
use goaltree_core::{NodeId, PropertyBag};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::sync::Mutex;

/// Read-modify-write step applied to one document's properties
pub type PropertyTransform<'a> = &'a (dyn Fn(&mut PropertyBag) + Send + Sync);

/// Identifier and display name of a stored document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    /// Document identifier
    pub id: NodeId,
    /// Display name (file stem)
    pub name: String,
}

impl DocumentRef {
    /// Reference whose name is the identifier's file stem
    #[must_use]
    pub fn new(id: impl Into<NodeId>) -> Self {
        let id = id.into();
        let name = id.basename().to_string();
        Self { id, name }
    }
}

/// Storage of markdown documents and their frontmatter
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Every markdown document, in a stable scan order
    async fn list_documents(&self) -> StoreResult<Vec<DocumentRef>>;

    /// Current frontmatter of a document
    async fn read_properties(&self, id: &NodeId) -> StoreResult<PropertyBag>;

    /// Atomically apply `transform` to a document's frontmatter
    ///
    /// Returns `true` when the stored bag changed.
    async fn update_properties(
        &self,
        id: &NodeId,
        transform: PropertyTransform<'_>,
    ) -> StoreResult<bool>;
}

/// Markdown files under a root directory
///
/// Hidden entries (names starting with `.`) are skipped. Updates are
/// serialized through one lock and written via a temporary file and rename.
#[derive(Debug)]
pub struct VaultStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl VaultStore {
    /// Store over a vault root
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Vault root directory
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a document
    #[must_use]
    pub fn path_of(&self, id: &NodeId) -> PathBuf {
        id.as_str()
            .split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Modification time of every markdown document
    pub async fn modified_times(&self) -> StoreResult<HashMap<NodeId, SystemTime>> {
        let mut times = HashMap::new();
        for doc in self.list_documents().await? {
            let path = self.path_of(&doc.id);
            match tokio::fs::metadata(&path).await {
                Ok(meta) => {
                    let modified = meta
                        .modified()
                        .map_err(|e| StoreError::io_error(&path, e))?;
                    times.insert(doc.id, modified);
                }
                // Removed between listing and stat
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io_error(&path, e)),
            }
        }
        Ok(times)
    }

    async fn read_note(&self, id: &NodeId) -> StoreResult<(PathBuf, Note)> {
        let path = self.path_of(id);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.clone()));
            }
            Err(e) => return Err(StoreError::io_error(&path, e)),
        };
        let note = Note::parse(&text).map_err(|e| StoreError::frontmatter(id.clone(), e))?;
        Ok((path, note))
    }
}

#[async_trait]
impl DocumentStore for VaultStore {
    async fn list_documents(&self) -> StoreResult<Vec<DocumentRef>> {
        let mut ids: Vec<String> = Vec::new();
        let mut pending: Vec<(PathBuf, String)> = vec![(self.root.clone(), String::new())];

        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| StoreError::io_error(&dir, e))?;
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StoreError::io_error(&dir, e))?
            {
                let Ok(name) = entry.file_name().into_string() else {
                    tracing::warn!("Skipping non UTF-8 path in {}", dir.display());
                    continue;
                };
                if name.starts_with('.') {
                    continue;
                }
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StoreError::io_error(entry.path(), e))?;
                let rel = format!("{prefix}{name}");
                if file_type.is_dir() {
                    pending.push((entry.path(), format!("{rel}/")));
                } else if file_type.is_file() && name.ends_with(".md") {
                    ids.push(rel);
                }
            }
        }

        ids.sort();
        Ok(ids.into_iter().map(DocumentRef::new).collect())
    }

    async fn read_properties(&self, id: &NodeId) -> StoreResult<PropertyBag> {
        let (_, note) = self.read_note(id).await?;
        Ok(note.properties)
    }

    async fn update_properties(
        &self,
        id: &NodeId,
        transform: PropertyTransform<'_>,
    ) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().await;

        let (path, mut note) = self.read_note(id).await?;
        let before = note.properties.clone();
        transform(&mut note.properties);
        if note.properties == before {
            return Ok(false);
        }

        let text = note
            .render()
            .map_err(|e| StoreError::frontmatter(id.clone(), e))?;
        let tmp = path.with_extension("md.goaltree-tmp");
        tokio::fs::write(&tmp, text)
            .await
            .map_err(|e| StoreError::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::io_error(&path, e))?;

        tracing::debug!("Wrote frontmatter of {}", id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_yaml::Value;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
    }

    #[tokio::test]
    async fn lists_markdown_in_stable_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Goals/B.md", "");
        write(dir.path(), "Goals/A.md", "");
        write(dir.path(), "Goals/Sub/C.md", "");
        write(dir.path(), "Goals/image.png", "");
        write(dir.path(), ".obsidian/cache.md", "");
        write(dir.path(), "Inbox.md", "");

        let store = VaultStore::new(dir.path());
        let ids: Vec<String> = store
            .list_documents()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id.as_str().to_string())
            .collect();
        assert_eq!(ids, vec!["Goals/A.md", "Goals/B.md", "Goals/Sub/C.md", "Inbox.md"]);
    }

    #[tokio::test]
    async fn update_rewrites_frontmatter_only() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Goals/A.md", "---\nprogress: 40\n---\n# A\n\nNotes\n");
        let store = VaultStore::new(dir.path());
        let id = NodeId::new("Goals/A.md");

        let changed = store
            .update_properties(&id, &|bag| {
                bag.insert("_depth", Value::from(0));
            })
            .await
            .unwrap();
        assert!(changed);

        let text = std::fs::read_to_string(dir.path().join("Goals/A.md")).unwrap();
        assert_eq!(text, "---\nprogress: 40\n_depth: 0\n---\n# A\n\nNotes\n");
        assert_eq!(
            store.read_properties(&id).await.unwrap().get("_depth"),
            Some(&Value::from(0))
        );
    }

    #[tokio::test]
    async fn unchanged_bag_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let original = "---\nprogress:   40\n---\nbody";
        write(dir.path(), "A.md", original);
        let store = VaultStore::new(dir.path());

        let changed = store
            .update_properties(&NodeId::new("A.md"), &|_| {})
            .await
            .unwrap();
        assert!(!changed);
        assert_eq!(std::fs::read_to_string(dir.path().join("A.md")).unwrap(), original);
    }

    #[tokio::test]
    async fn missing_and_malformed_documents() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "Bad.md", "---\n- not\n- a mapping\n---\n");
        let store = VaultStore::new(dir.path());

        assert!(matches!(
            store.read_properties(&NodeId::new("Gone.md")).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.read_properties(&NodeId::new("Bad.md")).await,
            Err(StoreError::Frontmatter { .. })
        ));
    }
}
