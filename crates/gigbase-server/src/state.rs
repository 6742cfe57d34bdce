use std::sync::Arc;

use gigbase_core::{ConsistencyMaintainer, ContentWriter, ImageStore, Moderation, Resolver, Stores};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Resolver,
    pub writer: ContentWriter,
    pub maintainer: ConsistencyMaintainer,
    pub moderation: Moderation,
}

impl AppState {
    pub fn new(stores: Stores, images: Arc<dyn ImageStore>) -> Self {
        Self {
            resolver: Resolver::new(stores.clone()),
            writer: ContentWriter::new(stores.clone()),
            maintainer: ConsistencyMaintainer::new(stores.clone(), images.clone()),
            moderation: Moderation::new(stores, images),
        }
    }
}
