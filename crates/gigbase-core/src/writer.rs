use std::sync::Arc;

use crate::band::Band;
use crate::document::{current_epoch_ms, Document, EntityKind, Store};
use crate::error::{CoreError, StorageError, ValidationError};
use crate::event::Event;
use crate::festival::{Festival, FestivalEvent};
use crate::genre::Genre;
use crate::location::Location;
use crate::report::{Bug, Feedback, Report};
use crate::slug::{SlugGenerator, SlugSource};
use crate::storage::{Collection, Stores, Twin};
use crate::validation::Validator;
use crate::verify::VerifiabilityCalculator;

/// Write path for new and edited entries.
///
/// Public submissions go to the unvalidated store, moderator writes to the
/// validated one. Slugs and `verifiable` flags are always derived here,
/// never taken from the submitted document.
#[derive(Clone)]
pub struct ContentWriter {
    stores: Stores,
    slugs: SlugGenerator,
    verifier: VerifiabilityCalculator,
}

impl ContentWriter {
    pub fn new(stores: Stores) -> Self {
        Self {
            slugs: SlugGenerator::new(stores.clone()),
            verifier: VerifiabilityCalculator::new(stores.clone()),
            stores,
        }
    }

    pub async fn create_band(&self, mut band: Band, store: Store) -> Result<Band, CoreError> {
        Validator::validate_band(&band)?;
        let collection = side(&self.stores.bands, store)?;

        band.id = String::new();
        band.url = self.slug(&SlugSource::from(&band), &[], None).await?;
        band.last_modified = current_epoch_ms();
        Ok(collection.save(band).await?)
    }

    /// Create many bands at once. Nothing is written if any band is invalid.
    pub async fn import_bands(
        &self,
        bands: Vec<Band>,
        store: Store,
    ) -> Result<Vec<Band>, CoreError> {
        for band in &bands {
            Validator::validate_band(band)?;
        }
        let collection = side(&self.stores.bands, store)?;

        let mut batch: Vec<String> = Vec::with_capacity(bands.len());
        let mut saved = Vec::with_capacity(bands.len());
        for mut band in bands {
            band.id = String::new();
            band.url = self.slug(&SlugSource::from(&band), &batch, None).await?;
            band.last_modified = current_epoch_ms();
            batch.push(band.url.clone());
            saved.push(collection.save(band).await?);
        }

        tracing::info!(count = saved.len(), ?store, "imported bands");
        Ok(saved)
    }

    pub async fn update_band(
        &self,
        id: &str,
        mut band: Band,
        store: Store,
    ) -> Result<Band, CoreError> {
        Validator::validate_band(&band)?;
        let collection = side(&self.stores.bands, store)?;
        ensure_exists(collection.as_ref(), id).await?;

        band.id = id.to_string();
        band.url = self.slug(&SlugSource::from(&band), &[], Some(id)).await?;
        band.last_modified = current_epoch_ms();
        collection.update_by_id(id, band.clone()).await?;
        Ok(band)
    }

    pub async fn create_location(
        &self,
        mut location: Location,
        store: Store,
    ) -> Result<Location, CoreError> {
        Validator::validate_location(&location)?;
        let collection = side(&self.stores.locations, store)?;

        location.id = String::new();
        location.url = self.slug(&SlugSource::from(&location), &[], None).await?;
        location.last_modified = current_epoch_ms();
        Ok(collection.save(location).await?)
    }

    pub async fn update_location(
        &self,
        id: &str,
        mut location: Location,
        store: Store,
    ) -> Result<Location, CoreError> {
        Validator::validate_location(&location)?;
        let collection = side(&self.stores.locations, store)?;
        ensure_exists(collection.as_ref(), id).await?;

        location.id = id.to_string();
        location.url = self
            .slug(&SlugSource::from(&location), &[], Some(id))
            .await?;
        location.last_modified = current_epoch_ms();
        collection.update_by_id(id, location.clone()).await?;
        Ok(location)
    }

    pub async fn create_event(&self, mut event: Event, store: Store) -> Result<Event, CoreError> {
        Validator::validate_event(&event)?;
        let collection = self.stores.events_in(store);

        event.id = String::new();
        event.verifiable = self.verifier.compute_for(&event).await?;
        let source = self.slugs.event_source(&event).await?;
        event.url = self.slug(&source, &[], None).await?;
        event.last_modified = current_epoch_ms();
        Ok(collection.save(event).await?)
    }

    pub async fn update_event(
        &self,
        id: &str,
        mut event: Event,
        store: Store,
    ) -> Result<Event, CoreError> {
        Validator::validate_event(&event)?;
        let collection = self.stores.events_in(store);
        ensure_exists(collection.as_ref(), id).await?;

        event.id = id.to_string();
        event.verifiable = self.verifier.compute_for(&event).await?;
        let source = self.slugs.event_source(&event).await?;
        event.url = self.slug(&source, &[], Some(id)).await?;
        event.last_modified = current_epoch_ms();
        collection.update_by_id(id, event.clone()).await?;
        Ok(event)
    }

    /// Create a festival together with its festival events, which are stored
    /// on the same side in the given order.
    pub async fn create_festival(
        &self,
        mut festival: Festival,
        events: Vec<FestivalEvent>,
        store: Store,
    ) -> Result<Festival, CoreError> {
        Validator::validate_festival(&festival)?;
        for event in &events {
            Validator::validate_festival_event(event)?;
        }
        let festivals = side(&self.stores.festivals, store)?;
        let festival_events = side(&self.stores.festival_events, store)?;

        festival.events = Vec::with_capacity(events.len());
        for event in events {
            let saved = self.save_festival_event(festival_events.as_ref(), event).await?;
            festival.events.push(saved.id);
        }

        festival.id = String::new();
        festival.url = self.slug(&SlugSource::from(&festival), &[], None).await?;
        festival.last_modified = current_epoch_ms();
        Ok(festivals.save(festival).await?)
    }

    /// Append a festival event to a festival's list.
    pub async fn add_festival_event(
        &self,
        festival_id: &str,
        store: Store,
        event: FestivalEvent,
    ) -> Result<FestivalEvent, CoreError> {
        Validator::validate_festival_event(&event)?;
        let festivals = side(&self.stores.festivals, store)?;
        let mut festival = festivals
            .find_by_id(festival_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Festival, festival_id))?;
        let festival_events = side(&self.stores.festival_events, store)?;

        let saved = self.save_festival_event(festival_events.as_ref(), event).await?;
        festival.events.push(saved.id.clone());
        festival.last_modified = current_epoch_ms();
        festivals.update_by_id(festival_id, festival).await?;
        Ok(saved)
    }

    /// Edit a festival event through the festival that owns it.
    pub async fn update_festival_event(
        &self,
        festival_id: &str,
        store: Store,
        event_id: &str,
        mut event: FestivalEvent,
    ) -> Result<FestivalEvent, CoreError> {
        Validator::validate_festival_event(&event)?;
        let festival = side(&self.stores.festivals, store)?
            .find_by_id(festival_id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Festival, festival_id))?;
        Validator::validate_festival_event_owner(&festival, event_id)?;

        let festival_events = &self.stores.festival_events;
        let collection = match festival_events.find_either(event_id).await? {
            Some((_, true)) => &festival_events.validated,
            Some((_, false)) => &festival_events.unvalidated,
            None => return Err(CoreError::not_found(EntityKind::FestivalEvent, event_id)),
        };

        event.id = event_id.to_string();
        event.verifiable = self.verifier.compute_for(&event).await?;
        event.last_modified = current_epoch_ms();
        collection.update_by_id(event_id, event.clone()).await?;
        Ok(event)
    }

    pub async fn create_genre(&self, mut genre: Genre) -> Result<Genre, CoreError> {
        genre.id = String::new();
        genre.name = genre.name.trim().to_string();
        let existing = self.stores.genres.find_all().await?;
        Validator::validate_genre(&genre, &existing)?;
        Ok(self.stores.genres.save(genre).await?)
    }

    pub async fn create_report(&self, mut report: Report) -> Result<Report, CoreError> {
        report.id = String::new();
        Ok(self.stores.reports.save(report).await?)
    }

    pub async fn create_bug(&self, mut bug: Bug) -> Result<Bug, CoreError> {
        bug.id = String::new();
        Ok(self.stores.bugs.save(bug).await?)
    }

    pub async fn create_feedback(&self, mut feedback: Feedback) -> Result<Feedback, CoreError> {
        feedback.id = String::new();
        Ok(self.stores.feedback.save(feedback).await?)
    }

    async fn save_festival_event(
        &self,
        collection: &dyn Collection<FestivalEvent>,
        mut event: FestivalEvent,
    ) -> Result<FestivalEvent, StorageError> {
        event.id = String::new();
        event.verifiable = self.verifier.compute_for(&event).await?;
        event.last_modified = current_epoch_ms();
        collection.save(event).await
    }

    async fn slug(
        &self,
        source: &SlugSource,
        batch: &[String],
        self_id: Option<&str>,
    ) -> Result<String, StorageError> {
        Ok(self
            .slugs
            .assign(Some(source), batch, self_id)
            .await?
            .unwrap_or_default())
    }
}

fn side<D: Document>(
    twin: &Twin<D>,
    store: Store,
) -> Result<&Arc<dyn Collection<D>>, ValidationError> {
    twin.side(store)
        .ok_or(ValidationError::NoSuchStore { kind: D::KIND, store })
}

async fn ensure_exists<D: Document>(
    collection: &dyn Collection<D>,
    id: &str,
) -> Result<(), CoreError> {
    match collection.find_by_id(id).await? {
        Some(_) => Ok(()),
        None => Err(CoreError::not_found(D::KIND, id)),
    }
}
