//! Saved-test records: one named slot holding a JSON array, most recent first.
//!
//! The slot itself is abstracted behind `SlotBackend` (file on disk, or memory
//! for tests). `TestStore` owns the read-modify-write cycle and serializes
//! every mutation through one async mutex.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{GeneratedTest, SavedTestRecord, TestConfiguration};
use crate::error::StoreError;

/// Logical name of the saved-tests collection.
pub const SLOT_NAME: &str = "vn_edtech_saved_tests";

/// Raw storage for the serialized collection.
#[async_trait]
pub trait SlotBackend: Send + Sync {
  /// Raw bytes, `None` when nothing has been written yet.
  async fn read(&self) -> Result<Option<Vec<u8>>, StoreError>;
  async fn write(&self, data: String) -> Result<(), StoreError>;
}

/// JSON file on disk. Writes go to a sibling temp file which is then renamed over the target.
pub struct FileSlot {
  path: PathBuf,
}

impl FileSlot {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io { path: path.display().to_string(), source }
  }
}

#[async_trait]
impl SlotBackend for FileSlot {
  async fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
    match tokio::fs::read(&self.path).await {
      Ok(s) => Ok(Some(s)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(Self::io_err(&self.path, e)),
    }
  }

  async fn write(&self, data: String) -> Result<(), StoreError> {
    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(dir).await.map_err(|e| Self::io_err(dir, e))?;
    }
    let mut tmp = self.path.clone().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, data).await.map_err(|e| Self::io_err(&tmp, e))?;
    tokio::fs::rename(&tmp, &self.path).await.map_err(|e| Self::io_err(&self.path, e))?;
    Ok(())
  }
}

/// In-process slot.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySlot {
  data: std::sync::Mutex<Option<String>>,
}

#[cfg(test)]
impl MemorySlot {
  pub fn with_contents(data: impl Into<String>) -> Self {
    Self { data: std::sync::Mutex::new(Some(data.into())) }
  }
}

#[cfg(test)]
#[async_trait]
impl SlotBackend for MemorySlot {
  async fn read(&self) -> Result<Option<Vec<u8>>, StoreError> {
    let data = self.data.lock().map(|g| g.clone()).unwrap_or_else(|p| p.into_inner().clone());
    Ok(data.map(String::into_bytes))
  }

  async fn write(&self, data: String) -> Result<(), StoreError> {
    match self.data.lock() {
      Ok(mut g) => *g = Some(data),
      Err(p) => *p.into_inner() = Some(data),
    }
    Ok(())
  }
}

/// Single-writer record store. Cloning shares the same slot and lock.
#[derive(Clone)]
pub struct TestStore {
  slot: Arc<Mutex<Box<dyn SlotBackend>>>,
}

impl TestStore {
  pub fn new(backend: impl SlotBackend + 'static) -> Self {
    Self { slot: Arc::new(Mutex::new(Box::new(backend))) }
  }

  #[cfg(test)]
  pub fn in_memory() -> Self {
    Self::new(MemorySlot::default())
  }

  /// Decode the slot; unreadable content counts as an empty collection.
  async fn load(slot: &dyn SlotBackend) -> Result<Vec<SavedTestRecord>, StoreError> {
    let Some(raw) = slot.read().await? else {
      return Ok(Vec::new());
    };
    if raw.iter().all(u8::is_ascii_whitespace) {
      return Ok(Vec::new());
    }
    // Invalid UTF-8 surfaces here as a parse error, same as malformed JSON.
    match serde_json::from_slice::<Vec<SavedTestRecord>>(&raw) {
      Ok(records) => Ok(records),
      Err(e) => {
        warn!(target: "store", slot = SLOT_NAME, error = %e, bytes = raw.len(), "Saved tests are unreadable; treating as empty");
        Ok(Vec::new())
      }
    }
  }

  async fn persist(slot: &dyn SlotBackend, records: &[SavedTestRecord]) -> Result<(), StoreError> {
    let data = serde_json::to_string(records)?;
    debug!(target: "store", slot = SLOT_NAME, records = records.len(), bytes = data.len(), "Writing saved tests");
    slot.write(data).await
  }

  /// Snapshot `test` under `name` and put it at the front of the collection.
  #[instrument(level = "info", skip(self, test, config), fields(name_len = name.len()))]
  pub async fn save(
    &self,
    name: &str,
    test: GeneratedTest,
    config: TestConfiguration,
  ) -> Result<SavedTestRecord, StoreError> {
    let name = name.trim();
    if name.is_empty() {
      return Err(StoreError::EmptyName);
    }
    let record = SavedTestRecord {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      timestamp: chrono::Utc::now().timestamp_millis(),
      data: test,
      config,
    };

    let slot = self.slot.lock().await;
    let mut records = Self::load(&**slot).await?;
    records.insert(0, record.clone());
    Self::persist(&**slot, &records).await?;
    info!(target: "store", id = %record.id, total = records.len(), "Test saved");
    Ok(record)
  }

  /// All records, most recent first.
  #[instrument(level = "debug", skip(self))]
  pub async fn list(&self) -> Result<Vec<SavedTestRecord>, StoreError> {
    let slot = self.slot.lock().await;
    Self::load(&**slot).await
  }

  #[instrument(level = "debug", skip(self))]
  pub async fn get(&self, id: &str) -> Result<Option<SavedTestRecord>, StoreError> {
    Ok(self.list().await?.into_iter().find(|r| r.id == id))
  }

  /// Remove `id` if present and return what remains. Unknown ids leave the slot untouched.
  #[instrument(level = "info", skip(self))]
  pub async fn delete(&self, id: &str) -> Result<Vec<SavedTestRecord>, StoreError> {
    let slot = self.slot.lock().await;
    let mut records = Self::load(&**slot).await?;
    let before = records.len();
    records.retain(|r| r.id != id);
    if records.len() == before {
      debug!(target: "store", %id, "Delete of unknown id ignored");
      return Ok(records);
    }
    Self::persist(&**slot, &records).await?;
    info!(target: "store", %id, remaining = records.len(), "Test deleted");
    Ok(records)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixtures::sample_test;
  use std::sync::atomic::{AtomicU32, Ordering};

  static COUNTER: AtomicU32 = AtomicU32::new(0);

  fn temp_path() -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir()
      .join(format!("edtest-store-{}-{}", std::process::id(), n))
      .join("saved_tests.json")
  }

  fn config() -> TestConfiguration {
    TestConfiguration::unknown()
  }

  #[tokio::test]
  async fn save_puts_the_new_record_first() {
    let store = TestStore::in_memory();
    store.save("First", sample_test(), config()).await.unwrap();
    let before = store.list().await.unwrap().len();
    let rec = store.save("Second", sample_test(), config()).await.unwrap();
    let list = store.list().await.unwrap();
    assert_eq!(list.len(), before + 1);
    assert_eq!(list[0].id, rec.id);
    assert_eq!(list[0].name, "Second");
  }

  #[tokio::test]
  async fn delete_removes_only_that_record() {
    let store = TestStore::in_memory();
    store.save("Quiz A", sample_test(), config()).await.unwrap();
    store.save("Quiz B", sample_test(), config()).await.unwrap();
    let a = store.list().await.unwrap().into_iter().find(|r| r.name == "Quiz A").unwrap();

    let remaining = store.delete(&a.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Quiz B");
    assert!(store.list().await.unwrap().iter().all(|r| r.id != a.id));
    assert!(store.get(&a.id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn deleting_an_unknown_id_changes_nothing() {
    let store = TestStore::in_memory();
    store.save("Only", sample_test(), config()).await.unwrap();
    let remaining = store.delete("no-such-id").await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(store.list().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn empty_names_are_rejected_and_names_trimmed() {
    let store = TestStore::in_memory();
    assert!(matches!(store.save("   ", sample_test(), config()).await, Err(StoreError::EmptyName)));
    let rec = store.save("  Unit 3  ", sample_test(), config()).await.unwrap();
    assert_eq!(rec.name, "Unit 3");
  }

  #[tokio::test]
  async fn corrupt_slot_reads_as_empty() {
    let store = TestStore::new(MemorySlot::with_contents("{ not an array"));
    assert!(store.list().await.unwrap().is_empty());
    store.save("Fresh", sample_test(), config()).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn non_utf8_file_reads_as_empty() {
    let path = temp_path();
    if let Some(dir) = path.parent() {
      std::fs::create_dir_all(dir).unwrap();
    }
    std::fs::write(&path, [0xff, 0xfe, b'[', b']']).unwrap();

    let store = TestStore::new(FileSlot::new(&path));
    assert!(store.list().await.unwrap().is_empty());
    store.save("Recovered", sample_test(), config()).await.unwrap();
    assert_eq!(store.list().await.unwrap().len(), 1);

    if let Some(dir) = path.parent() {
      let _ = std::fs::remove_dir_all(dir);
    }
  }

  #[tokio::test]
  async fn concurrent_saves_keep_every_record() {
    let store = TestStore::in_memory();
    let mut handles = Vec::new();
    for i in 0..16 {
      let s = store.clone();
      handles.push(tokio::spawn(async move {
        s.save(&format!("Quiz {i}"), sample_test(), TestConfiguration::unknown()).await
      }));
    }
    for h in handles {
      h.await.unwrap().unwrap();
    }
    assert_eq!(store.list().await.unwrap().len(), 16);
  }

  #[tokio::test]
  async fn file_slot_survives_a_new_store_instance() {
    let path = temp_path();
    let store = TestStore::new(FileSlot::new(&path));
    assert!(store.list().await.unwrap().is_empty());
    let rec = store.save("On disk", sample_test(), config()).await.unwrap();

    let reopened = TestStore::new(FileSlot::new(&path));
    let loaded = reopened.get(&rec.id).await.unwrap().unwrap();
    assert_eq!(loaded, rec);

    if let Some(dir) = path.parent() {
      let _ = std::fs::remove_dir_all(dir);
    }
  }
}
