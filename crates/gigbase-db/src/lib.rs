//! Gigbase DB - redb implementation of the document collections.

pub mod collection;
pub mod image_store;
pub mod tables;

pub use collection::RedbCollection;
pub use image_store::FsImageStore;

use std::path::Path;
use std::sync::Arc;

use redb::Database;

use gigbase_core::{Collection, Document, StorageError, Stores, Twin};

use crate::tables::CollectionTables;

/// Initialize a database with all required tables.
pub fn init_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

    for collection in tables::ALL {
        collection.init(&db)?;
    }

    Ok(Arc::new(db))
}

fn collection<D: Document>(
    db: &Arc<Database>,
    tables: CollectionTables,
) -> Arc<dyn Collection<D>> {
    Arc::new(RedbCollection::<D>::new(db.clone(), tables))
}

fn twin<D: Document>(
    db: &Arc<Database>,
    validated: CollectionTables,
    unvalidated: CollectionTables,
) -> Twin<D> {
    Twin::new(collection(db, validated), collection(db, unvalidated))
}

/// Every collection backed by `db`.
pub fn open_stores(db: Arc<Database>) -> Stores {
    use tables::*;

    Stores {
        bands: twin(&db, BANDS, UNVALIDATED_BANDS),
        locations: twin(&db, LOCATIONS, UNVALIDATED_LOCATIONS),
        events: twin(&db, EVENTS, UNVALIDATED_EVENTS),
        archived_events: collection(&db, ARCHIVED_EVENTS),
        festivals: twin(&db, FESTIVALS, UNVALIDATED_FESTIVALS),
        festival_events: twin(&db, FESTIVAL_EVENTS, UNVALIDATED_FESTIVAL_EVENTS),
        genres: collection(&db, GENRES),
        reports: collection(&db, REPORTS),
        bugs: collection(&db, BUGS),
        feedback: collection(&db, FEEDBACK),
    }
}
