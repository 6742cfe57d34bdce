//! Gigbase Core - Documents, store traits, and the reference engine.
//!
//! Every directory entry lives in a validated or an unvalidated store and
//! points at other entries only by id. This crate resolves those ids into
//! nested views, keeps the `verifiable` flag and inbound references
//! consistent as entries are deleted or promoted, and assigns slugs.
//! It does no I/O of its own.

pub mod band;
pub mod consistency;
pub mod document;
pub mod error;
pub mod event;
pub mod festival;
pub mod genre;
pub mod location;
pub mod promotion;
pub mod report;
pub mod resolve;
pub mod sentinel;
pub mod slug;
pub mod sort;
pub mod storage;
pub mod validation;
pub mod verify;
pub mod writer;

// Re-exports for convenience
pub use band::{Band, Release};
pub use consistency::ConsistencyMaintainer;
pub use document::{Address, Composite, Document, EntityKind, ImageSet, Store};
pub use error::{CoreError, StorageError, ValidationError};
pub use event::Event;
pub use festival::{Festival, FestivalEvent};
pub use genre::Genre;
pub use location::Location;
pub use promotion::Moderation;
pub use report::{Bug, Feedback, Report, ReportCategory};
pub use resolve::{EntityView, Resolver};
pub use sentinel::{Resolved, Sentinel};
pub use slug::{slugify, SlugGenerator, SlugSource};
pub use sort::{SortDirection, SortKey};
pub use storage::{Collection, ImageStore, Stores, Twin};
pub use validation::Validator;
pub use verify::VerifiabilityCalculator;
pub use writer::ContentWriter;

#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::{InMemoryCollection, RecordingImageStore};
