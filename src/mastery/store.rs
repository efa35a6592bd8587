use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::store::StoreError;

use super::profile::LearnerProfile;

/// Persistence seam for learner profiles. `save` is a full-document
/// overwrite; there is no field-level update.
pub trait LearnerProfileStore: Send + Sync {
    fn load(
        &self,
        learner_id: &str,
    ) -> impl Future<Output = Result<Option<LearnerProfile>, StoreError>> + Send;

    fn save(
        &self,
        learner_id: &str,
        profile: &LearnerProfile,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: LearnerProfileStore> LearnerProfileStore for std::sync::Arc<S> {
    async fn load(&self, learner_id: &str) -> Result<Option<LearnerProfile>, StoreError> {
        (**self).load(learner_id).await
    }

    async fn save(&self, learner_id: &str, profile: &LearnerProfile) -> Result<(), StoreError> {
        (**self).save(learner_id, profile).await
    }
}

/// One pretty-printed JSON document per learner under
/// `<dir>/<learner_id>.json`, the layout the rest of the app's flat-file
/// stores use as well.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    dir: PathBuf,
}

impl FileProfileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn profile_path(&self, learner_id: &str) -> PathBuf {
        self.dir.join(format!("{learner_id}.json"))
    }
}

impl LearnerProfileStore for FileProfileStore {
    async fn load(&self, learner_id: &str) -> Result<Option<LearnerProfile>, StoreError> {
        match tokio::fs::read(self.profile_path(learner_id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, learner_id: &str, profile: &LearnerProfile) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let bytes = serde_json::to_vec_pretty(profile)?;
        tokio::fs::write(self.profile_path(learner_id), bytes).await?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, LearnerProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl LearnerProfileStore for MemoryProfileStore {
    async fn load(&self, learner_id: &str) -> Result<Option<LearnerProfile>, StoreError> {
        Ok(self.profiles.read().get(learner_id).cloned())
    }

    async fn save(&self, learner_id: &str, profile: &LearnerProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .insert(learner_id.to_string(), profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path());
        assert!(store.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path().join("learning_rates"));

        let mut profile = LearnerProfile::fresh("u1");
        profile.overall_rate = 61.5;
        profile.subject_rates.insert("Math".into(), 73.0);

        store.save("u1", &profile).await.unwrap();
        let loaded = store.load("u1").await.unwrap().unwrap();
        assert_eq!(loaded.overall_rate, 61.5);
        assert_eq!(loaded.subject_rates.get("Math"), Some(&73.0));
    }

    #[tokio::test]
    async fn file_store_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileProfileStore::new(dir.path());
        tokio::fs::write(dir.path().join("u1.json"), b"not json")
            .await
            .unwrap();
        assert!(store.load("u1").await.is_err());
    }
}
