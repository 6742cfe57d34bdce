use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable};

use gigbase_core::storage::new_document_id;
use gigbase_core::{Collection, Document, StorageError};

use crate::tables::CollectionTables;

/// redb implementation of [`Collection`] for one document type and store side.
///
/// Documents are stored as JSON under an insertion sequence, so `find_all`
/// returns them in the order they were first saved. Replacing a document
/// keeps its position.
pub struct RedbCollection<D> {
    db: Arc<Database>,
    tables: CollectionTables,
    _doc: PhantomData<fn() -> D>,
}

impl<D: Document> RedbCollection<D> {
    pub fn new(db: Arc<Database>, tables: CollectionTables) -> Self {
        Self {
            db,
            tables,
            _doc: PhantomData,
        }
    }

    /// Write `doc` under `id`. With `must_exist`, nothing is written unless
    /// the id is already present. Returns whether the id was present.
    fn write(&self, id: &str, doc: &D, must_exist: bool) -> Result<bool, StorageError> {
        let value = serde_json::to_vec(doc)?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let existed;
        {
            let mut ids = write_txn
                .open_table(self.tables.ids)
                .map_err(|e| StorageError::Database(e.to_string()))?;
            let mut documents = write_txn
                .open_table(self.tables.documents)
                .map_err(|e| StorageError::Database(e.to_string()))?;

            let current = ids
                .get(id)
                .map_err(|e| StorageError::Database(e.to_string()))?
                .map(|seq| seq.value());
            existed = current.is_some();

            let seq = match current {
                Some(seq) => seq,
                None if must_exist => return Ok(false),
                None => {
                    let last = documents
                        .last()
                        .map_err(|e| StorageError::Database(e.to_string()))?
                        .map(|(key, _)| key.value());
                    let seq = last.map_or(0, |last| last + 1);
                    ids.insert(id, seq)
                        .map_err(|e| StorageError::Database(e.to_string()))?;
                    seq
                }
            };

            documents
                .insert(seq, value.as_slice())
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }

        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(existed)
    }
}

#[async_trait]
impl<D: Document> Collection<D> for RedbCollection<D> {
    async fn find_by_id(&self, id: &str) -> Result<Option<D>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let ids = read_txn
            .open_table(self.tables.ids)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let Some(seq) = ids
            .get(id)
            .map_err(|e| StorageError::Database(e.to_string()))?
            .map(|seq| seq.value())
        else {
            return Ok(None);
        };

        let documents = read_txn
            .open_table(self.tables.documents)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        match documents
            .get(seq)
            .map_err(|e| StorageError::Database(e.to_string()))?
        {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    async fn find_all(&self) -> Result<Vec<D>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let documents = read_txn
            .open_table(self.tables.documents)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut docs = Vec::new();
        for entry in documents
            .iter()
            .map_err(|e| StorageError::Database(e.to_string()))?
        {
            let (_, value) = entry.map_err(|e| StorageError::Database(e.to_string()))?;
            docs.push(serde_json::from_slice(value.value())?);
        }

        Ok(docs)
    }

    async fn save(&self, mut doc: D) -> Result<D, StorageError> {
        if doc.id().is_empty() {
            doc.set_id(new_document_id());
        }
        let id = doc.id().to_string();
        self.write(&id, &doc, false)?;
        tracing::trace!(kind = %D::KIND, id = %id, "saved document");
        Ok(doc)
    }

    async fn update_by_id(&self, id: &str, mut doc: D) -> Result<bool, StorageError> {
        doc.set_id(id.to_string());
        self.write(id, &doc, true)
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool, StorageError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let removed;
        {
            let mut ids = write_txn
                .open_table(self.tables.ids)
                .map_err(|e| StorageError::Database(e.to_string()))?;
            let seq = ids
                .remove(id)
                .map_err(|e| StorageError::Database(e.to_string()))?
                .map(|seq| seq.value());

            removed = seq.is_some();
            if let Some(seq) = seq {
                let mut documents = write_txn
                    .open_table(self.tables.documents)
                    .map_err(|e| StorageError::Database(e.to_string()))?;
                documents
                    .remove(seq)
                    .map_err(|e| StorageError::Database(e.to_string()))?;
            }
        }

        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{BANDS, GENRES};
    use gigbase_core::{Band, Genre};
    use tempfile::{tempdir, TempDir};

    fn create_test_db() -> (TempDir, Arc<Database>) {
        let dir = tempdir().unwrap();
        let db = Database::create(dir.path().join("test.redb")).unwrap();
        GENRES.init(&db).unwrap();
        BANDS.init(&db).unwrap();
        (dir, Arc::new(db))
    }

    #[tokio::test]
    async fn test_save_and_find() {
        let (_dir, db) = create_test_db();
        let store = RedbCollection::<Band>::new(db, BANDS);

        let mut band = Band::new("Kreator", vec!["thrash".to_string()]);
        band.url = "kreator".to_string();
        let saved = store.save(band).await.unwrap();
        assert!(!saved.id.is_empty());

        let found = store.find_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_all_keeps_storage_order() {
        let (_dir, db) = create_test_db();
        let store = RedbCollection::<Genre>::new(db, GENRES);

        for name in ["Thrash Metal", "Black Metal", "Crust", "Anarcho Punk"] {
            store.save(Genre::new(name)).await.unwrap();
        }

        let names: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Thrash Metal", "Black Metal", "Crust", "Anarcho Punk"]);
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let (_dir, db) = create_test_db();
        let store = RedbCollection::<Genre>::new(db, GENRES);

        let first = store.save(Genre::new("Doom")).await.unwrap();
        store.save(Genre::new("Sludge")).await.unwrap();

        let mut renamed = first.clone();
        renamed.name = "Doom Metal".to_string();
        assert!(store.update_by_id(&first.id, renamed).await.unwrap());
        assert!(!store
            .update_by_id("missing", Genre::new("Nope"))
            .await
            .unwrap());

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Doom Metal");
        assert_eq!(all[0].id, first.id);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_dir, db) = create_test_db();
        let store = RedbCollection::<Genre>::new(db, GENRES);

        let genre = store.save(Genre::new("Grindcore")).await.unwrap();
        assert!(store.delete_by_id(&genre.id).await.unwrap());
        assert!(store.find_by_id(&genre.id).await.unwrap().is_none());
        assert!(store.find_all().await.unwrap().is_empty());

        // Deleting non-existent returns false
        assert!(!store.delete_by_id(&genre.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_sequence_continues_after_delete() {
        let (_dir, db) = create_test_db();
        let store = RedbCollection::<Genre>::new(db, GENRES);

        store.save(Genre::new("Power Metal")).await.unwrap();
        let last = store.save(Genre::new("Speed Metal")).await.unwrap();
        store.delete_by_id(&last.id).await.unwrap();
        store.save(Genre::new("Heavy Metal")).await.unwrap();

        let names: Vec<_> = store
            .find_all()
            .await
            .unwrap()
            .into_iter()
            .map(|g| g.name)
            .collect();
        assert_eq!(names, vec!["Power Metal", "Heavy Metal"]);
    }
}
