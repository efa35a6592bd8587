use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Flat-file document collection: the whole collection lives in one JSON
/// array on disk and is held in memory behind a lock. Mutations rewrite the
/// file (last-write-wins, same as the upstream store).
pub struct JsonCollection<T> {
    path: PathBuf,
    items: RwLock<Vec<T>>,
}

impl<T> JsonCollection<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let items = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    pub fn find<F>(&self, predicate: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items.read().iter().find(|item| predicate(item)).cloned()
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        self.items
            .read()
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    pub fn contains<F>(&self, predicate: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        self.items.read().iter().any(|item| predicate(item))
    }

    pub async fn insert(&self, item: T) -> Result<(), StoreError> {
        let snapshot = {
            let mut items = self.items.write();
            items.push(item);
            serde_json::to_vec_pretty(&*items)?
        };
        self.write_snapshot(snapshot).await
    }

    /// Mutates the first matching document in place and rewrites the file.
    /// Returns the mutated document, or `None` when nothing matched.
    pub async fn update<P, F>(&self, predicate: P, mutate: F) -> Result<Option<T>, StoreError>
    where
        P: Fn(&T) -> bool,
        F: FnOnce(&mut T),
    {
        let (updated, snapshot) = {
            let mut items = self.items.write();
            let Some(item) = items.iter_mut().find(|item| predicate(item)) else {
                return Ok(None);
            };
            mutate(item);
            let updated = item.clone();
            (updated, serde_json::to_vec_pretty(&*items)?)
        };
        self.write_snapshot(snapshot).await?;
        Ok(Some(updated))
    }

    async fn write_snapshot(&self, snapshot: Vec<u8>) -> Result<(), StoreError> {
        tokio::fs::write(&self.path, snapshot).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Doc {
        id: String,
        value: i64,
    }

    #[tokio::test]
    async fn insert_then_reopen_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");

        let collection: JsonCollection<Doc> = JsonCollection::open(&path).unwrap();
        collection
            .insert(Doc {
                id: "a".into(),
                value: 1,
            })
            .await
            .unwrap();

        let reopened: JsonCollection<Doc> = JsonCollection::open(&path).unwrap();
        let found = reopened.find(|doc| doc.id == "a").unwrap();
        assert_eq!(found.value, 1);
    }

    #[tokio::test]
    async fn update_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let collection: JsonCollection<Doc> =
            JsonCollection::open(dir.path().join("docs.json")).unwrap();

        let updated = collection
            .update(|doc| doc.id == "missing", |doc| doc.value = 9)
            .await
            .unwrap();
        assert!(updated.is_none());
    }
}
