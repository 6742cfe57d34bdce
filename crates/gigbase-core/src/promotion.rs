use std::sync::Arc;

use futures::future::try_join_all;

use crate::consistency::ConsistencyMaintainer;
use crate::document::{current_epoch_ms, Composite, EntityKind};
use crate::error::{CoreError, ValidationError};
use crate::festival::{Festival, FestivalEvent};
use crate::slug::{SlugGenerator, SlugSource};
use crate::storage::{ImageStore, Stores};
use crate::validation::Validator;
use crate::verify::VerifiabilityCalculator;

/// Moves entries from the unvalidated store into the validated store.
///
/// A promoted entry is saved under a fresh id, every inbound reference is
/// rewritten to that id, and the unvalidated original is removed last.
#[derive(Clone)]
pub struct Moderation {
    stores: Stores,
    slugs: SlugGenerator,
    maintainer: ConsistencyMaintainer,
    verifier: VerifiabilityCalculator,
}

impl Moderation {
    pub fn new(stores: Stores, images: Arc<dyn ImageStore>) -> Self {
        Self {
            slugs: SlugGenerator::new(stores.clone()),
            maintainer: ConsistencyMaintainer::new(stores.clone(), images),
            verifier: VerifiabilityCalculator::new(stores.clone()),
            stores,
        }
    }

    /// Promote the unvalidated entry `id`. Returns the id of the validated copy.
    pub async fn validate(&self, kind: EntityKind, id: &str) -> Result<String, CoreError> {
        let new_id = match kind {
            EntityKind::Band => self.validate_band(id).await?,
            EntityKind::Location => self.validate_location(id).await?,
            EntityKind::Event => self.validate_event(id).await?,
            EntityKind::Festival => self.validate_festival(id).await?,
            EntityKind::FestivalEvent => self.validate_festival_event(id).await?,
            kind => return Err(ValidationError::NotPromotable(kind).into()),
        };
        tracing::info!(%kind, old_id = id, new_id = %new_id, "validated entry");
        Ok(new_id)
    }

    async fn validate_band(&self, id: &str) -> Result<String, CoreError> {
        let bands = &self.stores.bands;
        let band = bands
            .unvalidated
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Band, id))?;

        let mut promoted = band.clone();
        promoted.id = String::new();
        promoted.url = self
            .slugs
            .assign(Some(&SlugSource::from(&band)), &[], Some(id))
            .await?
            .unwrap_or_default();
        promoted.last_modified = current_epoch_ms();
        let promoted = bands.validated.save(promoted).await?;
        let new_id = promoted.id.as_str();

        let [validated, unvalidated, archived] = self.stores.all_event_collections();
        let festival_events = &self.stores.festival_events;
        let maintainer = &self.maintainer;
        futures::try_join!(
            maintainer.rewrite_band_reference(validated.as_ref(), id, Some(new_id)),
            maintainer.rewrite_band_reference(unvalidated.as_ref(), id, Some(new_id)),
            maintainer.rewrite_band_reference(archived.as_ref(), id, Some(new_id)),
            maintainer.rewrite_band_reference(festival_events.validated.as_ref(), id, Some(new_id)),
            maintainer.rewrite_band_reference(
                festival_events.unvalidated.as_ref(),
                id,
                Some(new_id)
            ),
            maintainer.retarget_reports(id, new_id),
        )?;

        bands.unvalidated.delete_by_id(id).await?;
        Ok(promoted.id)
    }

    async fn validate_location(&self, id: &str) -> Result<String, CoreError> {
        let locations = &self.stores.locations;
        let location = locations
            .unvalidated
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Location, id))?;

        let mut promoted = location.clone();
        promoted.id = String::new();
        promoted.url = self
            .slugs
            .assign(Some(&SlugSource::from(&location)), &[], Some(id))
            .await?
            .unwrap_or_default();
        promoted.last_modified = current_epoch_ms();
        let promoted = locations.validated.save(promoted).await?;
        let new_id = promoted.id.as_str();

        let [validated, unvalidated, archived] = self.stores.all_event_collections();
        let maintainer = &self.maintainer;
        futures::try_join!(
            maintainer.rewrite_location_reference(validated.as_ref(), id, Some(new_id)),
            maintainer.rewrite_location_reference(unvalidated.as_ref(), id, Some(new_id)),
            maintainer.rewrite_location_reference(archived.as_ref(), id, Some(new_id)),
            maintainer.retarget_reports(id, new_id),
        )?;

        locations.unvalidated.delete_by_id(id).await?;
        Ok(promoted.id)
    }

    async fn validate_event(&self, id: &str) -> Result<String, CoreError> {
        let events = &self.stores.events;
        let event = events
            .unvalidated
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Event, id))?;

        Validator::validate_band_list(&event.bands)?;
        if !self.verifier.compute_for(&event).await? {
            return Err(ValidationError::NotVerifiable(event.name).into());
        }

        let source = self.slugs.event_source(&event).await?;
        let mut promoted = event;
        promoted.id = String::new();
        promoted.url = self
            .slugs
            .assign(Some(&source), &[], Some(id))
            .await?
            .unwrap_or_default();
        promoted.set_verifiable(true);
        promoted.last_modified = current_epoch_ms();
        let promoted = events.validated.save(promoted).await?;

        self.maintainer.retarget_reports(id, &promoted.id).await?;
        events.unvalidated.delete_by_id(id).await?;
        Ok(promoted.id)
    }

    /// The owning festival must already be validated.
    async fn validate_festival_event(&self, id: &str) -> Result<String, CoreError> {
        let festival_events = &self.stores.festival_events;
        let event = festival_events
            .unvalidated
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::FestivalEvent, id))?;

        let owned_by = |festival: &Festival| festival.events.iter().any(|e| e == id);
        let mut owner = self
            .stores
            .festivals
            .validated
            .find(&owned_by)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ValidationError::OwnerNotValidated(event.name.clone()))?;

        let promoted = self.promote_festival_event(event).await?;

        for entry in owner.events.iter_mut().filter(|e| e.as_str() == id) {
            *entry = promoted.id.clone();
        }
        owner.last_modified = current_epoch_ms();
        let owner_id = owner.id.clone();
        self.stores
            .festivals
            .validated
            .update_by_id(&owner_id, owner)
            .await?;

        festival_events.unvalidated.delete_by_id(id).await?;
        Ok(promoted.id)
    }

    /// Save a verifiable festival event in the validated store.
    async fn promote_festival_event(
        &self,
        mut event: FestivalEvent,
    ) -> Result<FestivalEvent, CoreError> {
        Validator::validate_band_list(&event.bands)?;
        if !self.verifier.compute_for(&event).await? {
            return Err(ValidationError::NotVerifiable(event.name).into());
        }
        event.id = String::new();
        event.verifiable = true;
        event.last_modified = current_epoch_ms();
        Ok(self.stores.festival_events.validated.save(event).await?)
    }

    /// Promotes the festival together with its unvalidated festival events,
    /// keeping their display order.
    async fn validate_festival(&self, id: &str) -> Result<String, CoreError> {
        let festivals = &self.stores.festivals;
        let festival = festivals
            .unvalidated
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found(EntityKind::Festival, id))?;

        let festival_events = &self.stores.festival_events;
        let pending = try_join_all(
            festival
                .events
                .iter()
                .map(|event_id| festival_events.unvalidated.find_by_id(event_id)),
        )
        .await?;

        let checks = pending
            .iter()
            .flatten()
            .map(|event| self.verifier.compute_for(event));
        if try_join_all(checks).await?.contains(&false) {
            return Err(ValidationError::UnvalidatedReferences {
                kind: EntityKind::Festival,
                id: id.to_string(),
            }
            .into());
        }

        let mut promoted = festival.clone();
        for (slot, event) in promoted.events.iter_mut().zip(pending) {
            if let Some(event) = event {
                *slot = self.promote_festival_event(event).await?.id;
            }
        }
        promoted.id = String::new();
        promoted.url = self
            .slugs
            .assign(Some(&SlugSource::from(&festival)), &[], Some(id))
            .await?
            .unwrap_or_default();
        promoted.last_modified = current_epoch_ms();
        let promoted = festivals.validated.save(promoted).await?;

        self.maintainer.retarget_reports(id, &promoted.id).await?;
        let stale = festival
            .events
            .iter()
            .map(|event_id| festival_events.unvalidated.delete_by_id(event_id));
        try_join_all(stale).await?;
        festivals.unvalidated.delete_by_id(id).await?;
        Ok(promoted.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::Band;
    use crate::document::Store;
    use crate::event::Event;
    use crate::location::Location;
    use crate::report::{Report, ReportCategory};
    use crate::storage::memory::RecordingImageStore;
    use chrono::NaiveDate;

    fn moderation(stores: &Stores) -> Moderation {
        Moderation::new(stores.clone(), Arc::new(RecordingImageStore::new()))
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    async fn band(stores: &Stores, store: Store, id: &str, name: &str) -> Band {
        let mut band = Band::new(name, vec![]);
        band.id = id.to_string();
        band.url = crate::slug::slugify(name);
        stores.bands.side(store).unwrap().save(band).await.unwrap()
    }

    async fn location(stores: &Stores, store: Store, id: &str) -> Location {
        let mut location = Location::new("Backstage", "München");
        location.id = id.to_string();
        location.url = "backstage-muenchen".to_string();
        stores.locations.side(store).unwrap().save(location).await.unwrap()
    }

    #[tokio::test]
    async fn test_validate_band_rewrites_references() {
        let stores = Stores::in_memory();
        location(&stores, Store::Validated, "loc").await;
        band(&stores, Store::Validated, "v1", "Kreator").await;
        band(&stores, Store::Unvalidated, "u1", "Sodom").await;

        let mut event = Event::new("Thrash Night", "loc", date(1), vec!["u1".into(), "v1".into()]);
        event.id = "e1".to_string();
        stores.events.unvalidated.save(event).await.unwrap();
        stores
            .reports
            .save(Report::new(ReportCategory::Band, "u1"))
            .await
            .unwrap();

        let new_id = moderation(&stores)
            .validate(EntityKind::Band, "u1")
            .await
            .unwrap();
        assert_ne!(new_id, "u1");

        let promoted = stores.bands.validated.find_by_id(&new_id).await.unwrap().unwrap();
        assert_eq!(promoted.url, "sodom");
        assert!(stores.bands.unvalidated.find_by_id("u1").await.unwrap().is_none());

        let event = stores.events.unvalidated.find_by_id("e1").await.unwrap().unwrap();
        assert_eq!(event.bands, vec![new_id.clone(), "v1".to_string()]);
        assert!(event.verifiable);

        let reports = stores.reports.find_all().await.unwrap();
        assert_eq!(reports[0].item, new_id);
    }

    #[tokio::test]
    async fn test_validate_band_rewrites_festival_events_and_archive() {
        let stores = Stores::in_memory();
        location(&stores, Store::Validated, "loc").await;
        band(&stores, Store::Validated, "v1", "Kreator").await;
        band(&stores, Store::Unvalidated, "u1", "Sodom").await;

        let sides = [
            (Store::Validated, "fe1", vec!["u1".to_string(), "v1".to_string()]),
            (Store::Unvalidated, "fe2", vec!["u1".to_string()]),
        ];
        for (store, id, bands) in sides {
            let mut fe = FestivalEvent::new(id, date(10), date(12), bands);
            fe.id = id.to_string();
            stores.festival_events.side(store).unwrap().save(fe).await.unwrap();
        }
        let mut old = Event::new("Thrash Night 2019", "loc", date(2), vec!["u1".into()]);
        old.id = "old".to_string();
        stores.archived_events.save(old).await.unwrap();

        let new_id = moderation(&stores)
            .validate(EntityKind::Band, "u1")
            .await
            .unwrap();

        let fe1 = stores
            .festival_events
            .validated
            .find_by_id("fe1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fe1.bands, vec![new_id.clone(), "v1".to_string()]);
        assert!(fe1.verifiable);

        let fe2 = stores
            .festival_events
            .unvalidated
            .find_by_id("fe2")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fe2.bands, vec![new_id.clone()]);
        assert!(fe2.verifiable);

        let old = stores.archived_events.find_by_id("old").await.unwrap().unwrap();
        assert_eq!(old.bands, vec![new_id]);
        assert!(old.verifiable);
    }

    #[tokio::test]
    async fn test_validate_location_rewrites_events() {
        let stores = Stores::in_memory();
        location(&stores, Store::Unvalidated, "pending").await;
        band(&stores, Store::Validated, "v1", "Kreator").await;
        let mut event = Event::new("Thrash Night", "pending", date(1), vec!["v1".into()]);
        event.id = "e1".to_string();
        stores.events.unvalidated.save(event).await.unwrap();

        let new_id = moderation(&stores)
            .validate(EntityKind::Location, "pending")
            .await
            .unwrap();

        let event = stores.events.unvalidated.find_by_id("e1").await.unwrap().unwrap();
        assert_eq!(event.location, new_id);
        assert!(event.verifiable);
    }

    #[tokio::test]
    async fn test_unverifiable_event_is_refused() {
        let stores = Stores::in_memory();
        location(&stores, Store::Validated, "loc").await;
        band(&stores, Store::Unvalidated, "u1", "Sodom").await;
        let mut event = Event::new("Thrash Night", "loc", date(1), vec!["u1".into()]);
        event.id = "e1".to_string();
        stores.events.unvalidated.save(event).await.unwrap();

        let result = moderation(&stores).validate(EntityKind::Event, "e1").await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::NotVerifiable(_)))
        ));
        assert!(stores.events.unvalidated.find_by_id("e1").await.unwrap().is_some());
        assert!(stores.events.validated.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_without_bands_is_refused() {
        let stores = Stores::in_memory();
        location(&stores, Store::Validated, "loc").await;
        band(&stores, Store::Validated, "b1", "Kreator").await;
        let mut event = Event::new("Thrash Night", "loc", date(1), vec!["b1".into()]);
        event.id = "e1".to_string();
        stores.events.unvalidated.save(event).await.unwrap();

        let maintainer = ConsistencyMaintainer::new(
            stores.clone(),
            Arc::new(RecordingImageStore::new()),
        );
        maintainer
            .delete_entity(EntityKind::Band, Store::Validated, "b1")
            .await
            .unwrap();
        let orphaned = stores.events.unvalidated.find_by_id("e1").await.unwrap().unwrap();
        assert!(orphaned.bands.is_empty());
        assert!(!orphaned.verifiable);

        let result = moderation(&stores).validate(EntityKind::Event, "e1").await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::EmptyBandList))
        ));
        assert!(stores.events.validated.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_validate_event() {
        let stores = Stores::in_memory();
        location(&stores, Store::Validated, "loc").await;
        band(&stores, Store::Validated, "v1", "Kreator").await;
        let mut event = Event::new("Thrash Night", "loc", date(1), vec!["v1".into()]);
        event.id = "e1".to_string();
        stores.events.unvalidated.save(event).await.unwrap();

        let new_id = moderation(&stores)
            .validate(EntityKind::Event, "e1")
            .await
            .unwrap();
        let promoted = stores.events.validated.find_by_id(&new_id).await.unwrap().unwrap();
        assert!(promoted.verifiable);
        assert_eq!(promoted.url, "thrash-night-2024-08-01-backstage");
        assert!(stores.events.unvalidated.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_festival_event_needs_validated_owner() {
        let stores = Stores::in_memory();
        band(&stores, Store::Validated, "v1", "Kreator").await;
        let mut fe = FestivalEvent::new("2024", date(1), date(3), vec!["v1".into()]);
        fe.id = "fe1".to_string();
        stores.festival_events.unvalidated.save(fe).await.unwrap();
        let mut festival = Festival::new("Summer Breeze", vec![]);
        festival.id = "f1".to_string();
        festival.events = vec!["fe1".to_string()];
        stores.festivals.unvalidated.save(festival.clone()).await.unwrap();

        let result = moderation(&stores)
            .validate(EntityKind::FestivalEvent, "fe1")
            .await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::OwnerNotValidated(_)))
        ));

        stores.festivals.unvalidated.delete_by_id("f1").await.unwrap();
        festival.events = vec!["fe0".to_string(), "fe1".to_string()];
        stores.festivals.validated.save(festival).await.unwrap();

        let new_id = moderation(&stores)
            .validate(EntityKind::FestivalEvent, "fe1")
            .await
            .unwrap();
        let owner = stores.festivals.validated.find_by_id("f1").await.unwrap().unwrap();
        assert_eq!(owner.events, vec!["fe0".to_string(), new_id]);
    }

    #[tokio::test]
    async fn test_validate_festival_promotes_events_in_order() {
        let stores = Stores::in_memory();
        band(&stores, Store::Validated, "v1", "Kreator").await;
        for (id, day) in [("fe1", 20), ("fe2", 10)] {
            let mut fe = FestivalEvent::new(id, date(day), date(day + 2), vec!["v1".into()]);
            fe.id = id.to_string();
            stores.festival_events.unvalidated.save(fe).await.unwrap();
        }
        let mut festival = Festival::new("Wacken Open Air", vec![]);
        festival.id = "f1".to_string();
        festival.events = vec!["fe1".to_string(), "fe2".to_string()];
        stores.festivals.unvalidated.save(festival).await.unwrap();

        let new_id = moderation(&stores)
            .validate(EntityKind::Festival, "f1")
            .await
            .unwrap();

        let promoted = stores.festivals.validated.find_by_id(&new_id).await.unwrap().unwrap();
        assert_eq!(promoted.url, "wacken-open-air");
        assert_eq!(promoted.events.len(), 2);
        let first = stores
            .festival_events
            .validated
            .find_by_id(&promoted.events[0])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.name, "fe1");
        assert!(stores.festival_events.unvalidated.find_all().await.unwrap().is_empty());
        assert!(stores.festivals.unvalidated.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_festival_with_unverifiable_events_is_refused() {
        let stores = Stores::in_memory();
        let mut fe = FestivalEvent::new("2024", date(1), date(3), vec!["nobody".into()]);
        fe.id = "fe1".to_string();
        stores.festival_events.unvalidated.save(fe).await.unwrap();
        let mut festival = Festival::new("Wacken Open Air", vec![]);
        festival.id = "f1".to_string();
        festival.events = vec!["fe1".to_string()];
        stores.festivals.unvalidated.save(festival).await.unwrap();

        let result = moderation(&stores).validate(EntityKind::Festival, "f1").await;
        assert!(matches!(
            result,
            Err(CoreError::Validation(ValidationError::UnvalidatedReferences { .. }))
        ));
        assert!(stores.festivals.validated.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_and_unpromotable() {
        let stores = Stores::in_memory();
        let moderation = moderation(&stores);
        assert!(matches!(
            moderation.validate(EntityKind::Band, "nope").await,
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(
            moderation.validate(EntityKind::Genre, "g1").await,
            Err(CoreError::Validation(ValidationError::NotPromotable(EntityKind::Genre)))
        ));
    }
}
