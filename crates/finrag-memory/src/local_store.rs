use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::vector_store::{
    BoxFuture, Payload, ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError,
};

/// File name of the snapshot written inside the index directory.
pub const SNAPSHOT_FILE: &str = "collections.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredPoint {
    vector: Vec<f32>,
    payload: Payload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LocalCollection {
    vector_size: u64,
    points: BTreeMap<String, StoredPoint>,
}

/// In-process vector store with optional JSON snapshot persistence.
///
/// When opened on a directory, the whole store is rewritten to `collections.json`
/// on every mutation and reloaded by the next [`LocalVectorStore::open`]. A mutation
/// becomes visible only after its snapshot is on disk.
pub struct LocalVectorStore {
    collections: RwLock<HashMap<String, LocalCollection>>,
    snapshot: Option<PathBuf>,
    /// Serializes mutations between reading the current state and committing the next.
    writer: tokio::sync::Mutex<()>,
}

type Collections = HashMap<String, LocalCollection>;

impl LocalVectorStore {
    /// Volatile store, nothing touches the disk.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            snapshot: None,
            writer: tokio::sync::Mutex::new(()),
        }
    }

    /// Open (or create) a persistent store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing snapshot
    /// cannot be read or parsed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, VectorStoreError> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| VectorStoreError::Persistence(format!("{}: {e}", dir.display())))?;

        let snapshot = dir.join(SNAPSHOT_FILE);
        let collections: HashMap<String, LocalCollection> = match tokio::fs::read(&snapshot).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| VectorStoreError::Serialization(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(VectorStoreError::Persistence(format!(
                    "{}: {e}",
                    snapshot.display()
                )));
            }
        };

        tracing::debug!(
            path = %snapshot.display(),
            collections = collections.len(),
            "opened local vector store"
        );

        Ok(Self {
            collections: RwLock::new(collections),
            snapshot: Some(snapshot),
            writer: tokio::sync::Mutex::new(()),
        })
    }

    #[must_use]
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    /// Apply `mutate` to a copy of the state, persist the copy, then swap it in.
    ///
    /// `mutate` returns `false` when nothing changed; no snapshot is written then.
    /// On any error the visible state is left as it was.
    async fn commit<F>(
        &self,
        lock_err: fn(String) -> VectorStoreError,
        mutate: F,
    ) -> Result<bool, VectorStoreError>
    where
        F: FnOnce(&mut Collections) -> Result<bool, VectorStoreError>,
    {
        let _writer = self.writer.lock().await;

        let mut next = self
            .collections
            .read()
            .map_err(|e| lock_err(e.to_string()))?
            .clone();
        if !mutate(&mut next)? {
            return Ok(false);
        }

        self.persist(&next).await?;
        *self.collections.write().map_err(|e| lock_err(e.to_string()))? = next;
        Ok(true)
    }

    async fn persist(&self, collections: &Collections) -> Result<(), VectorStoreError> {
        let Some(path) = &self.snapshot else {
            return Ok(());
        };

        let bytes = serde_json::to_vec(collections)
            .map_err(|e| VectorStoreError::Serialization(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| VectorStoreError::Persistence(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| VectorStoreError::Persistence(format!("{}: {e}", path.display())))?;
        Ok(())
    }
}

impl Default for LocalVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocalVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalVectorStore")
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn check_dimension(expected: u64, vector: &[f32]) -> Result<(), VectorStoreError> {
    let actual = vector.len() as u64;
    if actual == expected {
        Ok(())
    } else {
        Err(VectorStoreError::DimensionMismatch { expected, actual })
    }
}

impl VectorStore for LocalVectorStore {
    fn ensure_collection(
        &self,
        collection: &str,
        vector_size: u64,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let created = self
                .commit(VectorStoreError::Collection, |cols| {
                    if cols.contains_key(&collection) {
                        return Ok(false);
                    }
                    cols.insert(
                        collection.clone(),
                        LocalCollection {
                            vector_size,
                            points: BTreeMap::new(),
                        },
                    );
                    Ok(true)
                })
                .await?;
            if created {
                tracing::info!(%collection, vector_size, "created collection");
            }
            Ok(())
        })
    }

    fn collection_exists(&self, collection: &str) -> BoxFuture<'_, Result<bool, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Collection(e.to_string()))?;
            Ok(cols.contains_key(&collection))
        })
    }

    fn delete_collection(&self, collection: &str) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.commit(VectorStoreError::Collection, |cols| {
                Ok(cols.remove(&collection).is_some())
            })
            .await?;
            Ok(())
        })
    }

    fn upsert(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> BoxFuture<'_, Result<(), VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            self.commit(VectorStoreError::Upsert, |cols| {
                let col = cols.get_mut(&collection).ok_or_else(|| {
                    VectorStoreError::Upsert(format!("collection {collection} not found"))
                })?;
                for p in &points {
                    check_dimension(col.vector_size, &p.vector)?;
                }
                for p in points {
                    col.points.insert(
                        p.id,
                        StoredPoint {
                            vector: p.vector,
                            payload: p.payload,
                        },
                    );
                }
                Ok(true)
            })
            .await?;
            Ok(())
        })
    }

    fn search(
        &self,
        collection: &str,
        vector: Vec<f32>,
        limit: u64,
    ) -> BoxFuture<'_, Result<Vec<ScoredVectorPoint>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Search(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Search(format!("collection {collection} not found"))
            })?;
            check_dimension(col.vector_size, &vector)?;

            let mut scored: Vec<ScoredVectorPoint> = col
                .points
                .iter()
                .map(|(id, sp)| ScoredVectorPoint {
                    id: id.clone(),
                    score: cosine_similarity(&vector, &sp.vector),
                    payload: sp.payload.clone(),
                })
                .collect();

            scored.sort_by(|a, b| b.score.total_cmp(&a.score));
            scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            Ok(scored)
        })
    }

    fn scroll_payloads(
        &self,
        collection: &str,
    ) -> BoxFuture<'_, Result<Vec<Payload>, VectorStoreError>> {
        let collection = collection.to_owned();
        Box::pin(async move {
            let cols = self
                .collections
                .read()
                .map_err(|e| VectorStoreError::Scroll(e.to_string()))?;
            let col = cols.get(&collection).ok_or_else(|| {
                VectorStoreError::Scroll(format!("collection {collection} not found"))
            })?;
            Ok(col.points.values().map(|sp| sp.payload.clone()).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, vector: Vec<f32>, filename: &str) -> VectorPoint {
        VectorPoint {
            id: id.into(),
            vector,
            payload: HashMap::from([("filename".into(), serde_json::json!(filename))]),
        }
    }

    #[tokio::test]
    async fn ensure_collection_and_exists() {
        let store = LocalVectorStore::new();
        assert!(!store.collection_exists("test").await.unwrap());
        store.ensure_collection("test", 3).await.unwrap();
        assert!(store.collection_exists("test").await.unwrap());
    }

    #[tokio::test]
    async fn ensure_collection_idempotent_keeps_points() {
        let store = LocalVectorStore::new();
        store.ensure_collection("test", 3).await.unwrap();
        store
            .upsert("test", vec![point("a", vec![1.0, 0.0, 0.0], "a.txt")])
            .await
            .unwrap();
        store.ensure_collection("test", 3).await.unwrap();
        assert_eq!(store.scroll_payloads("test").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_collection_removes() {
        let store = LocalVectorStore::new();
        store.ensure_collection("test", 3).await.unwrap();
        store.delete_collection("test").await.unwrap();
        assert!(!store.collection_exists("test").await.unwrap());
    }

    #[tokio::test]
    async fn delete_missing_collection_is_ok() {
        let store = LocalVectorStore::new();
        store.delete_collection("nope").await.unwrap();
    }

    #[tokio::test]
    async fn upsert_and_search_ranked() {
        let store = LocalVectorStore::new();
        store.ensure_collection("test", 3).await.unwrap();
        store
            .upsert(
                "test",
                vec![
                    point("a", vec![1.0, 0.0, 0.0], "a.txt"),
                    point("b", vec![0.0, 1.0, 0.0], "b.txt"),
                    point("c", vec![0.8, 0.6, 0.0], "c.txt"),
                ],
            )
            .await
            .unwrap();

        let results = store.search("test", vec![1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[1].id, "c");
        assert!((results[1].score - 0.8).abs() < 1e-6);
        assert_eq!(results[1].payload["filename"], "c.txt");
    }

    #[tokio::test]
    async fn search_limit_larger_than_collection() {
        let store = LocalVectorStore::new();
        store.ensure_collection("test", 2).await.unwrap();
        store
            .upsert("test", vec![point("a", vec![1.0, 0.0], "a.txt")])
            .await
            .unwrap();
        let results = store.search("test", vec![0.0, 1.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn search_empty_collection() {
        let store = LocalVectorStore::new();
        store.ensure_collection("test", 2).await.unwrap();
        assert!(store.search("test", vec![1.0, 0.0], 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_missing_collection_errors() {
        let store = LocalVectorStore::new();
        let result = store.search("missing", vec![1.0], 1).await;
        assert!(matches!(result, Err(VectorStoreError::Search(_))));
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimension_atomically() {
        let store = LocalVectorStore::new();
        store.ensure_collection("test", 3).await.unwrap();
        let result = store
            .upsert(
                "test",
                vec![
                    point("a", vec![1.0, 0.0, 0.0], "a.txt"),
                    point("b", vec![1.0, 0.0], "b.txt"),
                ],
            )
            .await;
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(store.scroll_payloads("test").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_rejects_wrong_dimension() {
        let store = LocalVectorStore::new();
        store.ensure_collection("test", 3).await.unwrap();
        let result = store.search("test", vec![1.0], 1).await;
        assert!(matches!(
            result,
            Err(VectorStoreError::DimensionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn scroll_payloads_returns_every_point() {
        let store = LocalVectorStore::new();
        store.ensure_collection("test", 2).await.unwrap();
        store
            .upsert(
                "test",
                vec![
                    point("a", vec![1.0, 0.0], "a.txt"),
                    point("b", vec![0.0, 1.0], "b.csv"),
                ],
            )
            .await
            .unwrap();
        let mut names: Vec<String> = store
            .scroll_payloads("test")
            .await
            .unwrap()
            .iter()
            .map(|p| p["filename"].as_str().unwrap().to_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.csv"]);
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalVectorStore::open(dir.path()).await.unwrap();
            store.ensure_collection("docs", 2).await.unwrap();
            store
                .upsert("docs", vec![point("a", vec![0.6, 0.8], "budget.txt")])
                .await
                .unwrap();
        }
        assert!(dir.path().join(SNAPSHOT_FILE).exists());

        let reopened = LocalVectorStore::open(dir.path()).await.unwrap();
        assert!(reopened.collection_exists("docs").await.unwrap());
        let results = reopened.search("docs", vec![0.6, 0.8], 1).await.unwrap();
        assert_eq!(results[0].id, "a");
        assert_eq!(results[0].payload["filename"], "budget.txt");
    }

    #[tokio::test]
    async fn delete_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalVectorStore::open(dir.path()).await.unwrap();
            store.ensure_collection("docs", 2).await.unwrap();
            store.delete_collection("docs").await.unwrap();
        }
        let reopened = LocalVectorStore::open(dir.path()).await.unwrap();
        assert!(!reopened.collection_exists("docs").await.unwrap());
    }

    /// A directory squatting on the temp path makes every snapshot write fail.
    fn block_snapshot_writes(dir: &Path) {
        std::fs::create_dir(dir.join(SNAPSHOT_FILE).with_extension("json.tmp")).unwrap();
    }

    #[tokio::test]
    async fn failed_snapshot_write_leaves_upsert_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).await.unwrap();
        store.ensure_collection("docs", 2).await.unwrap();
        block_snapshot_writes(dir.path());

        let result = store
            .upsert("docs", vec![point("a", vec![1.0, 0.0], "a.txt")])
            .await;
        assert!(matches!(result, Err(VectorStoreError::Persistence(_))));
        assert!(store.scroll_payloads("docs").await.unwrap().is_empty());
        assert!(store.search("docs", vec![1.0, 0.0], 5).await.unwrap().is_empty());

        let reopened = LocalVectorStore::open(dir.path()).await.unwrap();
        assert!(reopened.scroll_payloads("docs").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_snapshot_write_keeps_collections_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalVectorStore::open(dir.path()).await.unwrap();
        store.ensure_collection("docs", 2).await.unwrap();
        block_snapshot_writes(dir.path());

        assert!(store.ensure_collection("other", 2).await.is_err());
        assert!(!store.collection_exists("other").await.unwrap());

        assert!(store.delete_collection("docs").await.is_err());
        assert!(store.collection_exists("docs").await.unwrap());

        // Already present: no write needed, so it still succeeds.
        store.ensure_collection("docs", 2).await.unwrap();
    }

    #[tokio::test]
    async fn open_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = LocalVectorStore::open(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.snapshot_path(), Some(nested.join(SNAPSHOT_FILE).as_path()));
    }

    #[tokio::test]
    async fn open_rejects_corrupt_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SNAPSHOT_FILE), "{not json").unwrap();
        let result = LocalVectorStore::open(dir.path()).await;
        assert!(matches!(result, Err(VectorStoreError::Serialization(_))));
    }

    #[test]
    fn cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &b)).abs() < f32::EPSILON);
    }

    #[test]
    fn cosine_similarity_zero_vector() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn debug_format() {
        let store = LocalVectorStore::new();
        let dbg = format!("{store:?}");
        assert!(dbg.contains("LocalVectorStore"));
    }
}
