use redb::{Database, TableDefinition};

use gigbase_core::StorageError;

/// The two tables backing one document collection.
#[derive(Clone, Copy)]
pub struct CollectionTables {
    /// Key: insertion sequence, so iteration follows storage order.
    /// Value: JSON-encoded document.
    pub documents: TableDefinition<'static, u64, &'static [u8]>,
    /// Key: document id.
    /// Value: sequence key in `documents`.
    pub ids: TableDefinition<'static, &'static str, u64>,
}

impl CollectionTables {
    const fn new(documents: &'static str, ids: &'static str) -> Self {
        Self {
            documents: TableDefinition::new(documents),
            ids: TableDefinition::new(ids),
        }
    }

    /// Create both tables if they do not exist yet.
    pub fn init(self, db: &Database) -> Result<(), StorageError> {
        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let _ = write_txn
                .open_table(self.documents)
                .map_err(|e| StorageError::Database(e.to_string()))?;
            let _ = write_txn
                .open_table(self.ids)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }
}

pub const BANDS: CollectionTables = CollectionTables::new("bands", "bands_ids");
pub const UNVALIDATED_BANDS: CollectionTables =
    CollectionTables::new("unvalidated_bands", "unvalidated_bands_ids");

pub const LOCATIONS: CollectionTables = CollectionTables::new("locations", "locations_ids");
pub const UNVALIDATED_LOCATIONS: CollectionTables =
    CollectionTables::new("unvalidated_locations", "unvalidated_locations_ids");

pub const EVENTS: CollectionTables = CollectionTables::new("events", "events_ids");
pub const UNVALIDATED_EVENTS: CollectionTables =
    CollectionTables::new("unvalidated_events", "unvalidated_events_ids");
pub const ARCHIVED_EVENTS: CollectionTables =
    CollectionTables::new("archived_events", "archived_events_ids");

pub const FESTIVALS: CollectionTables = CollectionTables::new("festivals", "festivals_ids");
pub const UNVALIDATED_FESTIVALS: CollectionTables =
    CollectionTables::new("unvalidated_festivals", "unvalidated_festivals_ids");

pub const FESTIVAL_EVENTS: CollectionTables =
    CollectionTables::new("festival_events", "festival_events_ids");
pub const UNVALIDATED_FESTIVAL_EVENTS: CollectionTables =
    CollectionTables::new("unvalidated_festival_events", "unvalidated_festival_events_ids");

pub const GENRES: CollectionTables = CollectionTables::new("genres", "genres_ids");
pub const REPORTS: CollectionTables = CollectionTables::new("reports", "reports_ids");
pub const BUGS: CollectionTables = CollectionTables::new("bugs", "bugs_ids");
pub const FEEDBACK: CollectionTables = CollectionTables::new("feedback", "feedback_ids");

/// Every collection, for table creation.
pub const ALL: [CollectionTables; 15] = [
    BANDS,
    UNVALIDATED_BANDS,
    LOCATIONS,
    UNVALIDATED_LOCATIONS,
    EVENTS,
    UNVALIDATED_EVENTS,
    ARCHIVED_EVENTS,
    FESTIVALS,
    UNVALIDATED_FESTIVALS,
    FESTIVAL_EVENTS,
    UNVALIDATED_FESTIVAL_EVENTS,
    GENRES,
    REPORTS,
    BUGS,
    FEEDBACK,
];
