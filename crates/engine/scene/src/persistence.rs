//! Transform persistence
//!
//! The per-item [`ModelTransform`] and edited hotspot placements live in an
//! external store. The scene requests the transform once at mount on a
//! background task and polls for it each frame; a result arriving after the
//! request was dropped is discarded.

use crate::content::{SceneContent, TransformRecord, Vec3Record};
use crate::error::{Error, Result};
use async_trait::async_trait;
use placement::ModelTransform;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;

/// Placement of one edited hotspot, as written on save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotEdit {
    pub id: String,
    pub position: Vec3Record,
    pub scale: Vec3Record,
    pub rotation: Vec3Record,
}

/// Everything written on an explicit save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub saved_transform: TransformRecord,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hotspots: Vec<HotspotEdit>,
}

impl SavePayload {
    /// Build the payload from the current transform and the edited hotspots
    pub fn new(transform: &ModelTransform, content: &SceneContent) -> Result<Self> {
        transform.validate()?;
        let hotspots = content
            .hotspots
            .iter()
            .filter(|h| h.edited)
            .map(|h| HotspotEdit {
                id: h.id.clone(),
                position: h.position.into(),
                scale: h.scale.into(),
                rotation: h.rotation.into(),
            })
            .collect();
        Ok(Self {
            saved_transform: transform.into(),
            hotspots,
        })
    }

    pub fn transform(&self) -> ModelTransform {
        self.saved_transform.into()
    }
}

/// External store of per-item transforms
#[async_trait]
pub trait TransformStore: Send + Sync {
    /// Saved transform of an item, `None` if never saved
    async fn load_transform(&self, item_id: &str) -> Result<Option<ModelTransform>>;

    /// Persist a save payload for an item
    async fn save(&self, item_id: &str, payload: &SavePayload) -> Result<()>;
}

/// In-process store; loads optionally answer after a fixed latency
#[derive(Debug, Default)]
pub struct MemoryTransformStore {
    entries: RwLock<HashMap<String, SavePayload>>,
    latency: Option<Duration>,
}

impl MemoryTransformStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            entries: RwLock::default(),
            latency: Some(latency),
        }
    }

    /// Last payload saved for an item
    pub async fn get(&self, item_id: &str) -> Option<SavePayload> {
        self.entries.read().await.get(item_id).cloned()
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl TransformStore for MemoryTransformStore {
    async fn load_transform(&self, item_id: &str) -> Result<Option<ModelTransform>> {
        self.delay().await;
        Ok(self
            .entries
            .read()
            .await
            .get(item_id)
            .map(SavePayload::transform))
    }

    async fn save(&self, item_id: &str, payload: &SavePayload) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(item_id.to_string(), payload.clone());
        Ok(())
    }
}

/// One JSON file per item under a directory
#[derive(Debug, Clone)]
pub struct FileTransformStore {
    root: PathBuf,
}

impl FileTransformStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of an item's file; ids are reduced to `[A-Za-z0-9_-]`
    pub fn path_for(&self, item_id: &str) -> PathBuf {
        let name: String = item_id
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        let name = if name.is_empty() { "_".to_string() } else { name };
        self.root.join(format!("{name}.json"))
    }

    /// Read the full payload of an item
    pub async fn load_payload(&self, item_id: &str) -> Result<Option<SavePayload>> {
        match tokio::fs::read(self.path_for(item_id)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::Io(err)),
        }
    }
}

#[async_trait]
impl TransformStore for FileTransformStore {
    async fn load_transform(&self, item_id: &str) -> Result<Option<ModelTransform>> {
        Ok(self
            .load_payload(item_id)
            .await?
            .map(|payload| payload.transform()))
    }

    async fn save(&self, item_id: &str, payload: &SavePayload) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.path_for(item_id);
        let data = serde_json::to_vec_pretty(payload)?;
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(tmp, &path).await?;
        tracing::debug!(item = item_id, path = %path.display(), "Transform saved");
        Ok(())
    }
}

/// Issues background transform fetches against a store
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn TransformStore>,
}

impl std::fmt::Debug for PersistenceBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceBridge").finish_non_exhaustive()
    }
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn TransformStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TransformStore> {
        &self.store
    }

    /// Start fetching an item's transform. Must be called inside a tokio runtime.
    pub fn request(&self, item_id: &str) -> PendingTransform {
        let (tx, rx) = oneshot::channel();
        let store = Arc::clone(&self.store);
        let item = item_id.to_string();
        let task = tokio::spawn(async move {
            let result = store.load_transform(&item).await;
            // Receiver gone means the scene unmounted
            if tx.send(result).is_err() {
                tracing::debug!(item = %item, "Transform fetch discarded");
            }
        });
        PendingTransform {
            rx: Some(rx),
            task: Some(task),
        }
    }

    /// Save on the caller's task
    pub async fn save(&self, item_id: &str, payload: &SavePayload) -> Result<()> {
        self.store.save(item_id, payload).await
    }
}

/// In-flight transform fetch
#[derive(Debug)]
pub struct PendingTransform {
    rx: Option<oneshot::Receiver<Result<Option<ModelTransform>>>>,
    task: Option<JoinHandle<()>>,
}

impl PendingTransform {
    /// Non-blocking check. Yields the result once, then `None` forever.
    pub fn poll(&mut self) -> Option<Result<Option<ModelTransform>>> {
        let rx = self.rx.as_mut()?;
        match rx.try_recv() {
            Ok(result) => {
                self.finish();
                Some(result)
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.finish();
                Some(Err(Error::Cancelled))
            }
        }
    }

    /// True until the result was taken or the fetch cancelled
    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    /// Abort the fetch; a late result is dropped
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx = None;
    }

    fn finish(&mut self) {
        self.rx = None;
        self.task = None;
    }
}

impl Drop for PendingTransform {
    fn drop(&mut self) {
        self.cancel();
    }
}
