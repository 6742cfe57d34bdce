use std::sync::Arc;

use futures::future::try_join_all;

use crate::document::{Composite, Document, EntityKind, Store};
use crate::error::StorageError;
use crate::event::Event;
use crate::festival::Festival;
use crate::report::Report;
use crate::sentinel::Sentinel;
use crate::storage::{Collection, ImageStore, Stores};
use crate::verify::VerifiabilityCalculator;

/// The only component that rewrites inbound references.
///
/// Every operation awaits its whole cascade before returning. A failing
/// store write aborts the operation with the error; writes that already
/// went through are not rolled back.
#[derive(Clone)]
pub struct ConsistencyMaintainer {
    stores: Stores,
    images: Arc<dyn ImageStore>,
    verifier: VerifiabilityCalculator,
}

impl ConsistencyMaintainer {
    pub fn new(stores: Stores, images: Arc<dyn ImageStore>) -> Self {
        let verifier = VerifiabilityCalculator::new(stores.clone());
        Self {
            stores,
            images,
            verifier,
        }
    }

    /// Replace `old_id` with `new_id` in the band list of every document in
    /// `collection`, or drop it when there is no replacement. `verifiable`
    /// is recomputed and persisted for each touched document.
    ///
    /// Returns the number of documents rewritten.
    pub async fn rewrite_band_reference<C: Composite>(
        &self,
        collection: &dyn Collection<C>,
        old_id: &str,
        new_id: Option<&str>,
    ) -> Result<usize, StorageError> {
        let affected = collection
            .find(&|doc: &C| doc.bands().iter().any(|b| b == old_id))
            .await?;

        let rewrites = affected.into_iter().map(|mut doc| async move {
            let bands = doc.bands_mut();
            match new_id {
                Some(new_id) if !bands.iter().any(|b| b == new_id) => {
                    for band in bands.iter_mut().filter(|b| b.as_str() == old_id) {
                        *band = new_id.to_string();
                    }
                }
                // Already listed under the new id, so the old entry is a duplicate.
                _ => bands.retain(|b| b != old_id),
            }
            self.persist(collection, doc).await
        });
        let rewritten = try_join_all(rewrites).await?;

        tracing::debug!(
            kind = %C::KIND,
            old_id,
            ?new_id,
            count = rewritten.len(),
            "rewrote band references"
        );
        Ok(rewritten.len())
    }

    /// Point every document in `collection` located at `old_id` at `new_id`,
    /// or at the "Location was deleted" sentinel when there is no replacement.
    pub async fn rewrite_location_reference<C: Composite>(
        &self,
        collection: &dyn Collection<C>,
        old_id: &str,
        new_id: Option<&str>,
    ) -> Result<usize, StorageError> {
        let affected = collection
            .find(&|doc: &C| doc.location() == Some(old_id))
            .await?;

        let replacement = new_id.unwrap_or(Sentinel::LocationDeleted.as_str());
        let rewrites = affected.into_iter().map(|mut doc| async move {
            doc.set_location(replacement.to_string());
            self.persist(collection, doc).await
        });
        let rewritten = try_join_all(rewrites).await?;

        tracing::debug!(
            kind = %C::KIND,
            old_id,
            replacement,
            count = rewritten.len(),
            "rewrote location references"
        );
        Ok(rewritten.len())
    }

    async fn persist<C: Composite>(
        &self,
        collection: &dyn Collection<C>,
        mut doc: C,
    ) -> Result<(), StorageError> {
        let verifiable = self.verifier.compute_for(&doc).await?;
        doc.set_verifiable(verifiable);
        let id = doc.id().to_string();
        collection.update_by_id(&id, doc).await?;
        tracing::debug!(kind = %C::KIND, id = %id, verifiable, "updated dependent record");
        Ok(())
    }

    /// Delete an entry and everything that depended on it.
    ///
    /// Returns Ok(false) when the entry does not exist in `store`.
    pub async fn delete_entity(
        &self,
        kind: EntityKind,
        store: Store,
        id: &str,
    ) -> Result<bool, StorageError> {
        let deleted = match kind {
            EntityKind::Band => self.delete_band(store, id).await?,
            EntityKind::Location => self.delete_location(store, id).await?,
            EntityKind::Event => self.delete_event(store, id).await?,
            EntityKind::Festival => self.delete_festival(store, id).await?,
            EntityKind::FestivalEvent => self.delete_festival_event(store, id).await?,
            EntityKind::Genre => self.stores.genres.delete_by_id(id).await?,
            EntityKind::Report => self.stores.reports.delete_by_id(id).await?,
            EntityKind::Bug => self.stores.bugs.delete_by_id(id).await?,
            EntityKind::Feedback => self.stores.feedback.delete_by_id(id).await?,
        };
        if deleted {
            tracing::info!(%kind, ?store, id, "deleted entry");
        }
        Ok(deleted)
    }

    async fn delete_band(&self, store: Store, id: &str) -> Result<bool, StorageError> {
        let Some(collection) = self.stores.bands.side(store) else {
            return Ok(false);
        };
        let Some(band) = collection.find_by_id(id).await? else {
            return Ok(false);
        };
        collection.delete_by_id(id).await?;

        let [validated, unvalidated, archived] = self.stores.all_event_collections();
        let festival_events = &self.stores.festival_events;
        futures::try_join!(
            self.rewrite_band_reference(validated.as_ref(), id, None),
            self.rewrite_band_reference(unvalidated.as_ref(), id, None),
            self.rewrite_band_reference(archived.as_ref(), id, None),
            self.rewrite_band_reference(festival_events.validated.as_ref(), id, None),
            self.rewrite_band_reference(festival_events.unvalidated.as_ref(), id, None),
            self.delete_reports(id),
        )?;

        self.release_images(&band).await;
        Ok(true)
    }

    /// Events at a deleted validated location go with it. Events at a
    /// deleted unvalidated location, and archived events in any case, keep
    /// existing with the location degraded to a sentinel.
    async fn delete_location(&self, store: Store, id: &str) -> Result<bool, StorageError> {
        let Some(collection) = self.stores.locations.side(store) else {
            return Ok(false);
        };
        let Some(location) = collection.find_by_id(id).await? else {
            return Ok(false);
        };
        collection.delete_by_id(id).await?;

        let events = &self.stores.events;
        let archived = self.stores.archived_events.as_ref();
        if store == Store::Validated {
            futures::try_join!(
                self.delete_events_at(events.validated.as_ref(), id),
                self.delete_events_at(events.unvalidated.as_ref(), id),
                self.rewrite_location_reference(archived, id, None),
                self.delete_reports(id),
            )?;
        } else {
            futures::try_join!(
                self.rewrite_location_reference(events.validated.as_ref(), id, None),
                self.rewrite_location_reference(events.unvalidated.as_ref(), id, None),
                self.rewrite_location_reference(archived, id, None),
                self.delete_reports(id),
            )?;
        }

        self.release_images(&location).await;
        Ok(true)
    }

    async fn delete_events_at(
        &self,
        collection: &dyn Collection<Event>,
        location_id: &str,
    ) -> Result<usize, StorageError> {
        let events = collection
            .find(&|event: &Event| event.location == location_id)
            .await?;
        let deletions = events
            .iter()
            .map(|event| self.delete_event_doc(collection, event));
        Ok(try_join_all(deletions).await?.len())
    }

    async fn delete_event(&self, store: Store, id: &str) -> Result<bool, StorageError> {
        let collection = self.stores.events_in(store);
        let Some(event) = collection.find_by_id(id).await? else {
            return Ok(false);
        };
        self.delete_event_doc(collection.as_ref(), &event).await?;
        Ok(true)
    }

    async fn delete_event_doc(
        &self,
        collection: &dyn Collection<Event>,
        event: &Event,
    ) -> Result<(), StorageError> {
        collection.delete_by_id(&event.id).await?;
        self.delete_reports(&event.id).await?;
        tracing::debug!(id = %event.id, name = %event.name, "deleted event");
        self.release_images(event).await;
        Ok(())
    }

    async fn delete_festival(&self, store: Store, id: &str) -> Result<bool, StorageError> {
        let Some(collection) = self.stores.festivals.side(store) else {
            return Ok(false);
        };
        let Some(festival) = collection.find_by_id(id).await? else {
            return Ok(false);
        };
        self.delete_festival_doc(collection.as_ref(), &festival)
            .await?;
        Ok(true)
    }

    async fn delete_festival_doc(
        &self,
        collection: &dyn Collection<Festival>,
        festival: &Festival,
    ) -> Result<(), StorageError> {
        collection.delete_by_id(&festival.id).await?;

        // Owned festival events may sit on either side regardless of the festival's store.
        let festival_events = &self.stores.festival_events;
        let deletions = festival.events.iter().map(|event_id| async move {
            futures::try_join!(
                festival_events.validated.delete_by_id(event_id),
                festival_events.unvalidated.delete_by_id(event_id),
            )
        });
        try_join_all(deletions).await?;
        self.delete_reports(&festival.id).await?;

        tracing::debug!(
            id = %festival.id,
            events = festival.events.len(),
            "deleted festival"
        );
        self.release_images(festival).await;
        Ok(())
    }

    async fn delete_festival_event(&self, store: Store, id: &str) -> Result<bool, StorageError> {
        let Some(collection) = self.stores.festival_events.side(store) else {
            return Ok(false);
        };
        if !collection.delete_by_id(id).await? {
            return Ok(false);
        }

        for side in [Store::Validated, Store::Unvalidated] {
            let Some(festivals) = self.stores.festivals.side(side) else {
                continue;
            };
            let owners = festivals
                .find(&|festival: &Festival| festival.events.iter().any(|e| e == id))
                .await?;
            for mut owner in owners {
                owner.events.retain(|e| e != id);
                if owner.events.is_empty() {
                    self.delete_festival_doc(festivals.as_ref(), &owner).await?;
                } else {
                    let owner_id = owner.id.clone();
                    festivals.update_by_id(&owner_id, owner).await?;
                }
            }
        }
        Ok(true)
    }

    /// Delete every report targeting `target_id`.
    pub async fn delete_reports(&self, target_id: &str) -> Result<usize, StorageError> {
        let reports = self
            .stores
            .reports
            .find(&|report: &Report| report.item == target_id)
            .await?;
        let deletions = reports
            .iter()
            .map(|report| self.stores.reports.delete_by_id(&report.id));
        Ok(try_join_all(deletions).await?.len())
    }

    /// Point every report on `old_id` at `new_id`.
    pub async fn retarget_reports(
        &self,
        old_id: &str,
        new_id: &str,
    ) -> Result<usize, StorageError> {
        let reports = self
            .stores
            .reports
            .find(&|report: &Report| report.item == old_id)
            .await?;
        let updates = reports.into_iter().map(|mut report| async move {
            report.item = new_id.to_string();
            let id = report.id.clone();
            self.stores.reports.update_by_id(&id, report).await
        });
        Ok(try_join_all(updates).await?.len())
    }

    /// Image failures never fail the deletion.
    async fn release_images<D: Document>(&self, doc: &D) {
        let paths = doc.image_paths();
        if paths.is_empty() {
            return;
        }
        if let Err(e) = self.images.delete_images(&paths).await {
            tracing::warn!(kind = %D::KIND, id = doc.id(), error = %e, "failed to delete images");
        }
    }
}
