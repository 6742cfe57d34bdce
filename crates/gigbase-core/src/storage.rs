use std::sync::Arc;

use async_trait::async_trait;

use crate::band::Band;
use crate::document::{Document, Store};
use crate::error::StorageError;
use crate::event::Event;
use crate::festival::{Festival, FestivalEvent};
use crate::genre::Genre;
use crate::location::Location;
use crate::report::{Bug, Feedback, Report};

/// Filter used by [`Collection::find`].
pub type Predicate<'a, D> = &'a (dyn Fn(&D) -> bool + Send + Sync);

/// A document collection for one entity type and one store side.
///
/// Implementations must give read-your-writes consistency within a request.
#[async_trait]
pub trait Collection<D: Document>: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<D>, StorageError>;

    /// All documents in storage order.
    async fn find_all(&self) -> Result<Vec<D>, StorageError>;

    /// Insert a document. An empty id is replaced with a fresh one.
    /// Returns the document as stored.
    async fn save(&self, doc: D) -> Result<D, StorageError>;

    /// Replace the document with the given id.
    /// Returns Ok(false) if no such document exists.
    async fn update_by_id(&self, id: &str, doc: D) -> Result<bool, StorageError>;

    /// Returns Ok(false) if no such document exists.
    async fn delete_by_id(&self, id: &str) -> Result<bool, StorageError>;

    async fn find(&self, predicate: Predicate<'_, D>) -> Result<Vec<D>, StorageError> {
        Ok(self
            .find_all()
            .await?
            .into_iter()
            .filter(|d| predicate(d))
            .collect())
    }
}

/// Generate a fresh opaque document id.
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Releases stored image files. Implemented outside the core.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn delete_images(&self, paths: &[String]) -> Result<(), StorageError>;
}

/// The validated and unvalidated collections of one entity type.
pub struct Twin<D: Document> {
    pub validated: Arc<dyn Collection<D>>,
    pub unvalidated: Arc<dyn Collection<D>>,
}

impl<D: Document> Clone for Twin<D> {
    fn clone(&self) -> Self {
        Self {
            validated: self.validated.clone(),
            unvalidated: self.unvalidated.clone(),
        }
    }
}

impl<D: Document> Twin<D> {
    pub fn new(validated: Arc<dyn Collection<D>>, unvalidated: Arc<dyn Collection<D>>) -> Self {
        Self {
            validated,
            unvalidated,
        }
    }

    /// The collection for a store side. Twins have no archive.
    pub fn side(&self, store: Store) -> Option<&Arc<dyn Collection<D>>> {
        match store {
            Store::Validated => Some(&self.validated),
            Store::Unvalidated => Some(&self.unvalidated),
            Store::Archived => None,
        }
    }

    /// Look a document up in the validated store, then the unvalidated one.
    /// Returns the document and whether it was found in the validated store.
    pub async fn find_either(&self, id: &str) -> Result<Option<(D, bool)>, StorageError> {
        if let Some(doc) = self.validated.find_by_id(id).await? {
            return Ok(Some((doc, true)));
        }
        Ok(self
            .unvalidated
            .find_by_id(id)
            .await?
            .map(|doc| (doc, false)))
    }
}

/// Handles to every document collection. Cloning is cheap.
#[derive(Clone)]
pub struct Stores {
    pub bands: Twin<Band>,
    pub locations: Twin<Location>,
    pub events: Twin<Event>,
    pub archived_events: Arc<dyn Collection<Event>>,
    pub festivals: Twin<Festival>,
    pub festival_events: Twin<FestivalEvent>,
    pub genres: Arc<dyn Collection<Genre>>,
    pub reports: Arc<dyn Collection<Report>>,
    pub bugs: Arc<dyn Collection<Bug>>,
    pub feedback: Arc<dyn Collection<Feedback>>,
}

impl Stores {
    /// The event collection for a store side, including the archive.
    pub fn events_in(&self, store: Store) -> &Arc<dyn Collection<Event>> {
        match store {
            Store::Validated => &self.events.validated,
            Store::Unvalidated => &self.events.unvalidated,
            Store::Archived => &self.archived_events,
        }
    }

    /// Every collection that holds events.
    pub fn all_event_collections(&self) -> [&Arc<dyn Collection<Event>>; 3] {
        [
            &self.events.validated,
            &self.events.unvalidated,
            &self.archived_events,
        ]
    }
}

// In-memory implementations for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Mutex, RwLock};
    use std::time::Duration;

    /// In-memory collection for testing.
    ///
    /// Lookups can be slowed down per id to force out-of-order completion,
    /// and writes can be made to fail.
    pub struct InMemoryCollection<D: Document> {
        docs: RwLock<Vec<D>>,
        delays: RwLock<HashMap<String, Duration>>,
        fail_writes: AtomicBool,
    }

    impl<D: Document> Default for InMemoryCollection<D> {
        fn default() -> Self {
            Self {
                docs: RwLock::new(Vec::new()),
                delays: RwLock::new(HashMap::new()),
                fail_writes: AtomicBool::new(false),
            }
        }
    }

    impl<D: Document> InMemoryCollection<D> {
        pub fn new() -> Self {
            Self::default()
        }

        /// Delay `find_by_id` for the given id.
        pub fn set_delay(&self, id: &str, delay: Duration) {
            self.delays.write().unwrap().insert(id.to_string(), delay);
        }

        /// Make every subsequent write fail.
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn len(&self) -> usize {
            self.docs.read().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn check_writable(&self) -> Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Database("write rejected".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl<D: Document> Collection<D> for InMemoryCollection<D> {
        async fn find_by_id(&self, id: &str) -> Result<Option<D>, StorageError> {
            let delay = self.delays.read().unwrap().get(id).copied();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self
                .docs
                .read()
                .unwrap()
                .iter()
                .find(|d| d.id() == id)
                .cloned())
        }

        async fn find_all(&self) -> Result<Vec<D>, StorageError> {
            Ok(self.docs.read().unwrap().clone())
        }

        async fn save(&self, mut doc: D) -> Result<D, StorageError> {
            self.check_writable()?;
            if doc.id().is_empty() {
                doc.set_id(new_document_id());
            }
            let mut docs = self.docs.write().unwrap();
            docs.retain(|d| d.id() != doc.id());
            docs.push(doc.clone());
            Ok(doc)
        }

        async fn update_by_id(&self, id: &str, doc: D) -> Result<bool, StorageError> {
            self.check_writable()?;
            let mut docs = self.docs.write().unwrap();
            match docs.iter_mut().find(|d| d.id() == id) {
                Some(slot) => {
                    *slot = doc;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete_by_id(&self, id: &str) -> Result<bool, StorageError> {
            self.check_writable()?;
            let mut docs = self.docs.write().unwrap();
            let before = docs.len();
            docs.retain(|d| d.id() != id);
            Ok(docs.len() < before)
        }
    }

    /// Image store that records the paths it was asked to delete.
    #[derive(Default)]
    pub struct RecordingImageStore {
        deleted: Mutex<Vec<String>>,
        fail: AtomicBool,
    }

    impl RecordingImageStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// A store whose deletions always fail.
        pub fn failing() -> Self {
            let store = Self::default();
            store.fail.store(true, Ordering::SeqCst);
            store
        }

        pub fn deleted(&self) -> Vec<String> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ImageStore for RecordingImageStore {
        async fn delete_images(&self, paths: &[String]) -> Result<(), StorageError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(StorageError::ImageStorage("disk unavailable".to_string()));
            }
            self.deleted.lock().unwrap().extend(paths.iter().cloned());
            Ok(())
        }
    }

    fn twin<D: Document>() -> Twin<D> {
        Twin::new(
            Arc::new(InMemoryCollection::new()),
            Arc::new(InMemoryCollection::new()),
        )
    }

    impl Stores {
        /// Every collection backed by a fresh [`InMemoryCollection`].
        pub fn in_memory() -> Self {
            Self {
                bands: twin(),
                locations: twin(),
                events: twin(),
                archived_events: Arc::new(InMemoryCollection::new()),
                festivals: twin(),
                festival_events: twin(),
                genres: Arc::new(InMemoryCollection::new()),
                reports: Arc::new(InMemoryCollection::new()),
                bugs: Arc::new(InMemoryCollection::new()),
                feedback: Arc::new(InMemoryCollection::new()),
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::genre::Genre;

        #[tokio::test]
        async fn test_save_assigns_id() {
            let store = InMemoryCollection::<Genre>::new();

            let saved = store.save(Genre::new("Thrash Metal")).await.unwrap();
            assert!(!saved.id.is_empty());

            let found = store.find_by_id(&saved.id).await.unwrap().unwrap();
            assert_eq!(found.name, "Thrash Metal");
        }

        #[tokio::test]
        async fn test_update_and_delete() {
            let store = InMemoryCollection::<Genre>::new();
            let mut genre = store.save(Genre::new("Doom")).await.unwrap();

            genre.name = "Doom Metal".to_string();
            assert!(store.update_by_id(&genre.id.clone(), genre.clone()).await.unwrap());
            assert!(!store.update_by_id("missing", genre.clone()).await.unwrap());

            assert!(store.delete_by_id(&genre.id).await.unwrap());
            assert!(!store.delete_by_id(&genre.id).await.unwrap());
            assert!(store.is_empty());
        }

        #[tokio::test]
        async fn test_find_filters_in_storage_order() {
            let store = InMemoryCollection::<Genre>::new();
            for name in ["Black Metal", "Death Metal", "Grindcore"] {
                store.save(Genre::new(name)).await.unwrap();
            }

            let metal = store
                .find(&|g: &Genre| g.name.ends_with("Metal"))
                .await
                .unwrap();
            let names: Vec<_> = metal.iter().map(|g| g.name.as_str()).collect();
            assert_eq!(names, vec!["Black Metal", "Death Metal"]);
        }

        #[tokio::test]
        async fn test_failing_writes() {
            let store = InMemoryCollection::<Genre>::new();
            store.fail_writes(true);
            assert!(store.save(Genre::new("Sludge")).await.is_err());
        }

        #[tokio::test]
        async fn test_find_either_prefers_validated() {
            let bands = twin::<Band>();
            let mut band = Band::new("Kreator", vec![]);
            band.id = "b1".to_string();
            bands.unvalidated.save(band.clone()).await.unwrap();

            let (_, validated) = bands.find_either("b1").await.unwrap().unwrap();
            assert!(!validated);

            bands.validated.save(band).await.unwrap();
            let (_, validated) = bands.find_either("b1").await.unwrap().unwrap();
            assert!(validated);

            assert!(bands.find_either("b2").await.unwrap().is_none());
        }
    }
}
