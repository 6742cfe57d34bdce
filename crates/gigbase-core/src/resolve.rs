//! Hydration of stored id-graphs into nested views.
//!
//! Every reference is resolved on its own: validated store first, then the
//! unvalidated store, then a [`Sentinel`]. Sibling references are looked up
//! concurrently but always come back in their stored order. Nothing in here
//! writes to storage.

use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::Serialize;

use crate::band::{Band, Release};
use crate::document::{Address, Document, EntityKind, ImageSet, Store};
use crate::error::StorageError;
use crate::event::Event;
use crate::festival::{Festival, FestivalEvent};
use crate::genre::Genre;
use crate::location::Location;
use crate::report::{Bug, Feedback, Report, ReportCategory};
use crate::sentinel::{Resolved, Sentinel};
use crate::sort::locale_cmp;
use crate::storage::{Collection, Stores, Twin};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandView {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Genre names in alphabetical order.
    pub genre: Vec<String>,
    pub origin: Address,
    pub history: Option<String>,
    pub record_label: Option<String>,
    pub releases: Vec<Release>,
    pub founding_date: Option<i32>,
    pub website: Option<String>,
    pub bandcamp_url: Option<String>,
    pub facebook_url: Option<String>,
    pub image: Option<ImageSet>,
    pub last_modified: i64,
    pub is_validated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationView {
    pub id: String,
    pub name: String,
    pub url: String,
    pub address: Address,
    pub information: Option<String>,
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub image: Option<ImageSet>,
    pub last_modified: i64,
    pub is_validated: bool,
}

impl LocationView {
    pub fn new(location: Location, is_validated: bool) -> Self {
        Self {
            id: location.id,
            name: location.name,
            url: location.url,
            address: location.address,
            information: location.information,
            website: location.website,
            facebook_url: location.facebook_url,
            image: location.image,
            last_modified: location.last_modified,
            is_validated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    pub id: String,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub location: Resolved<LocationView>,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub bands: Vec<Resolved<BandView>>,
    pub canceled: bool,
    pub ticket_link: Option<String>,
    pub verifiable: bool,
    pub image: Option<ImageSet>,
    pub last_modified: i64,
    pub is_validated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalEventView {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bands: Vec<Resolved<BandView>>,
    pub canceled: bool,
    pub verifiable: bool,
    pub last_modified: i64,
    pub is_validated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalView {
    pub id: String,
    pub name: String,
    pub url: String,
    pub genre: Vec<String>,
    /// Owned festival events by start date. Ids resolving nowhere are dropped.
    pub events: Vec<FestivalEventView>,
    pub description: Option<String>,
    pub address: Address,
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub image: Option<ImageSet>,
    pub last_modified: i64,
    pub is_validated: bool,
}

/// The entry a report points at.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportTarget {
    Band(BandView),
    Event(EventView),
    Festival(FestivalView),
    Location(LocationView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: String,
    pub category: ReportCategory,
    pub item: Resolved<ReportTarget>,
    pub description: Option<String>,
}

/// A hydrated document of any kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityView {
    Band(BandView),
    Location(LocationView),
    Event(EventView),
    Festival(FestivalView),
    FestivalEvent(FestivalEventView),
    Genre(Genre),
    Report(ReportView),
    Bug(Bug),
    Feedback(Feedback),
}

/// Look up `id` in a twin pair, consulting the unvalidated side only when allowed.
async fn lookup<D: Document>(
    twin: &Twin<D>,
    id: &str,
    allow_unvalidated: bool,
) -> Result<Option<(D, bool)>, StorageError> {
    if allow_unvalidated {
        return twin.find_either(id).await;
    }
    Ok(twin
        .validated
        .find_by_id(id)
        .await?
        .map(|doc| (doc, true)))
}

#[derive(Clone)]
pub struct Resolver {
    stores: Stores,
}

impl Resolver {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Resolve a bare id (or sentinel) of any kind with the full fallback chain.
    pub async fn resolve(
        &self,
        kind: EntityKind,
        reference: &str,
    ) -> Result<Resolved<EntityView>, StorageError> {
        if let Some(sentinel) = Sentinel::parse(reference) {
            return Ok(Resolved::Missing(sentinel));
        }
        let stores = &self.stores;
        let view = match kind {
            EntityKind::Band => self.band_ref(reference, true).await?.map(EntityView::Band),
            EntityKind::Location => self
                .location_ref(reference, true)
                .await?
                .map(EntityView::Location),
            EntityKind::Event => self.event_ref(reference).await?.map(EntityView::Event),
            EntityKind::Festival => self
                .festival_ref(reference)
                .await?
                .map(EntityView::Festival),
            EntityKind::FestivalEvent => self
                .festival_event_ref(reference, true)
                .await?
                .map(EntityView::FestivalEvent),
            EntityKind::Genre => found_or(
                stores.genres.find_by_id(reference).await?.map(EntityView::Genre),
                kind,
            ),
            EntityKind::Report => match stores.reports.find_by_id(reference).await? {
                Some(report) => Resolved::Found(EntityView::Report(self.report(report).await?)),
                None => Resolved::Missing(Sentinel::ReportNotFound),
            },
            EntityKind::Bug => found_or(
                stores.bugs.find_by_id(reference).await?.map(EntityView::Bug),
                kind,
            ),
            EntityKind::Feedback => found_or(
                stores
                    .feedback
                    .find_by_id(reference)
                    .await?
                    .map(EntityView::Feedback),
                kind,
            ),
        };
        Ok(view)
    }

    /// Resolve the document with `id` in one specific collection.
    /// Returns Ok(None) when that collection does not hold it.
    pub async fn resolve_in(
        &self,
        kind: EntityKind,
        store: Store,
        id: &str,
    ) -> Result<Option<EntityView>, StorageError> {
        let stores = &self.stores;
        let validated = store.is_validated();
        let view = match kind {
            EntityKind::Band => match find_in(&stores.bands, store, id).await? {
                Some(band) => Some(EntityView::Band(self.band(band, validated).await?)),
                None => None,
            },
            EntityKind::Location => find_in(&stores.locations, store, id)
                .await?
                .map(|l| EntityView::Location(LocationView::new(l, validated))),
            EntityKind::Event => match stores.events_in(store).find_by_id(id).await? {
                Some(event) => Some(EntityView::Event(self.event(event, validated).await?)),
                None => None,
            },
            EntityKind::Festival => {
                match find_in(&stores.festivals, store, id).await? {
                    Some(f) => Some(EntityView::Festival(self.festival(f, validated).await?)),
                    None => None,
                }
            }
            EntityKind::FestivalEvent => {
                match find_in(&stores.festival_events, store, id).await? {
                    Some(fe) => Some(EntityView::FestivalEvent(
                        self.festival_event(fe, validated).await?,
                    )),
                    None => None,
                }
            }
            EntityKind::Report => match stores.reports.find_by_id(id).await? {
                Some(report) => Some(EntityView::Report(self.report(report).await?)),
                None => None,
            },
            EntityKind::Genre => stores.genres.find_by_id(id).await?.map(EntityView::Genre),
            EntityKind::Bug => stores.bugs.find_by_id(id).await?.map(EntityView::Bug),
            EntityKind::Feedback => stores.feedback.find_by_id(id).await?.map(EntityView::Feedback),
        };
        Ok(view)
    }

    /// Hydrate every document of a collection, in storage order.
    pub async fn resolve_all(
        &self,
        kind: EntityKind,
        store: Store,
    ) -> Result<Vec<EntityView>, StorageError> {
        let stores = &self.stores;
        let validated = store.is_validated();
        let views = match kind {
            EntityKind::Band => {
                let bands = all_in(&stores.bands, store).await?;
                try_join_all(bands.into_iter().map(|b| self.band(b, validated)))
                    .await?
                    .into_iter()
                    .map(EntityView::Band)
                    .collect()
            }
            EntityKind::Location => all_in(&stores.locations, store)
                .await?
                .into_iter()
                .map(|l| EntityView::Location(LocationView::new(l, validated)))
                .collect(),
            EntityKind::Event => {
                let events = stores.events_in(store).find_all().await?;
                try_join_all(events.into_iter().map(|e| self.event(e, validated)))
                    .await?
                    .into_iter()
                    .map(EntityView::Event)
                    .collect()
            }
            EntityKind::Festival => {
                let festivals = all_in(&stores.festivals, store).await?;
                try_join_all(festivals.into_iter().map(|f| self.festival(f, validated)))
                    .await?
                    .into_iter()
                    .map(EntityView::Festival)
                    .collect()
            }
            EntityKind::FestivalEvent => {
                let events = all_in(&stores.festival_events, store).await?;
                try_join_all(events.into_iter().map(|fe| self.festival_event(fe, validated)))
                    .await?
                    .into_iter()
                    .map(EntityView::FestivalEvent)
                    .collect()
            }
            EntityKind::Report => {
                let reports = stores.reports.find_all().await?;
                try_join_all(reports.into_iter().map(|r| self.report(r)))
                    .await?
                    .into_iter()
                    .map(EntityView::Report)
                    .collect()
            }
            EntityKind::Genre => stores
                .genres
                .find_all()
                .await?
                .into_iter()
                .map(EntityView::Genre)
                .collect(),
            EntityKind::Bug => stores
                .bugs
                .find_all()
                .await?
                .into_iter()
                .map(EntityView::Bug)
                .collect(),
            EntityKind::Feedback => stores
                .feedback
                .find_all()
                .await?
                .into_iter()
                .map(EntityView::Feedback)
                .collect(),
        };
        Ok(views)
    }

    /// Genre names for a list of genre ids, alphabetically. Unknown ids are dropped.
    pub async fn genre_names(&self, ids: &[String]) -> Result<Vec<String>, StorageError> {
        let lookups = ids.iter().map(|id| self.stores.genres.find_by_id(id));
        let mut names: Vec<String> = try_join_all(lookups)
            .await?
            .into_iter()
            .flatten()
            .map(|genre| genre.name)
            .collect();
        names.sort_by(|a, b| locale_cmp(a, b));
        Ok(names)
    }

    pub async fn band(&self, band: Band, is_validated: bool) -> Result<BandView, StorageError> {
        let genre = self.genre_names(&band.genre).await?;
        Ok(BandView {
            id: band.id,
            name: band.name,
            url: band.url,
            genre,
            origin: band.origin,
            history: band.history,
            record_label: band.record_label,
            releases: band.releases,
            founding_date: band.founding_date,
            website: band.website,
            bandcamp_url: band.bandcamp_url,
            facebook_url: band.facebook_url,
            image: band.image,
            last_modified: band.last_modified,
            is_validated,
        })
    }

    pub async fn band_ref(
        &self,
        reference: &str,
        allow_unvalidated: bool,
    ) -> Result<Resolved<BandView>, StorageError> {
        if let Some(sentinel) = Sentinel::parse(reference) {
            return Ok(Resolved::Missing(sentinel));
        }
        match lookup(&self.stores.bands, reference, allow_unvalidated).await? {
            Some((band, validated)) => Ok(Resolved::Found(self.band(band, validated).await?)),
            None => Ok(Resolved::Missing(Sentinel::BandNotFound)),
        }
    }

    /// Resolve a band list, keeping the stored order whatever order lookups finish in.
    pub async fn band_refs(
        &self,
        ids: &[String],
        allow_unvalidated: bool,
    ) -> Result<Vec<Resolved<BandView>>, StorageError> {
        try_join_all(ids.iter().map(|id| self.band_ref(id, allow_unvalidated))).await
    }

    pub async fn location_ref(
        &self,
        reference: &str,
        allow_unvalidated: bool,
    ) -> Result<Resolved<LocationView>, StorageError> {
        if let Some(sentinel) = Sentinel::parse(reference) {
            return Ok(Resolved::Missing(sentinel));
        }
        Ok(
            match lookup(&self.stores.locations, reference, allow_unvalidated).await? {
                Some((location, validated)) => {
                    Resolved::Found(LocationView::new(location, validated))
                }
                None => Resolved::Missing(Sentinel::LocationNotFound),
            },
        )
    }

    /// Hydrate an event. A verifiable event never exposes unvalidated references.
    pub async fn event(&self, event: Event, is_validated: bool) -> Result<EventView, StorageError> {
        let allow_unvalidated = !event.verifiable;
        let (location, bands) = futures::try_join!(
            self.location_ref(&event.location, allow_unvalidated),
            self.band_refs(&event.bands, allow_unvalidated),
        )?;
        Ok(EventView {
            id: event.id,
            name: event.name,
            url: event.url,
            description: event.description,
            location,
            date: event.date,
            time: event.time,
            bands,
            canceled: event.canceled,
            ticket_link: event.ticket_link,
            verifiable: event.verifiable,
            image: event.image,
            last_modified: event.last_modified,
            is_validated,
        })
    }

    /// Archived events are consulted after both live stores.
    pub async fn event_ref(&self, reference: &str) -> Result<Resolved<EventView>, StorageError> {
        if let Some(sentinel) = Sentinel::parse(reference) {
            return Ok(Resolved::Missing(sentinel));
        }
        let found = match self.stores.events.find_either(reference).await? {
            Some(found) => Some(found),
            None => self
                .stores
                .archived_events
                .find_by_id(reference)
                .await?
                .map(|event| (event, true)),
        };
        match found {
            Some((event, validated)) => Ok(Resolved::Found(self.event(event, validated).await?)),
            None => Ok(Resolved::Missing(Sentinel::EventNotFound)),
        }
    }

    pub async fn festival_event(
        &self,
        event: FestivalEvent,
        is_validated: bool,
    ) -> Result<FestivalEventView, StorageError> {
        let bands = self.band_refs(&event.bands, !event.verifiable).await?;
        Ok(FestivalEventView {
            id: event.id,
            name: event.name,
            start_date: event.start_date,
            end_date: event.end_date,
            bands,
            canceled: event.canceled,
            verifiable: event.verifiable,
            last_modified: event.last_modified,
            is_validated,
        })
    }

    pub async fn festival_event_ref(
        &self,
        reference: &str,
        allow_unvalidated: bool,
    ) -> Result<Resolved<FestivalEventView>, StorageError> {
        if let Some(sentinel) = Sentinel::parse(reference) {
            return Ok(Resolved::Missing(sentinel));
        }
        match lookup(&self.stores.festival_events, reference, allow_unvalidated).await? {
            Some((event, validated)) => Ok(Resolved::Found(
                self.festival_event(event, validated).await?,
            )),
            None => Ok(Resolved::Missing(Sentinel::FestivalEventNotFound)),
        }
    }

    pub async fn festival(
        &self,
        festival: Festival,
        is_validated: bool,
    ) -> Result<FestivalView, StorageError> {
        let owned = try_join_all(
            festival
                .events
                .iter()
                .map(|id| self.festival_event_ref(id, true)),
        );
        let (genre, owned) = futures::try_join!(self.genre_names(&festival.genre), owned)?;

        let mut events: Vec<FestivalEventView> =
            owned.into_iter().filter_map(Resolved::into_found).collect();
        events.sort_by(|a, b| a.start_date.cmp(&b.start_date));

        Ok(FestivalView {
            id: festival.id,
            name: festival.name,
            url: festival.url,
            genre,
            events,
            description: festival.description,
            address: festival.address,
            website: festival.website,
            facebook_url: festival.facebook_url,
            image: festival.image,
            last_modified: festival.last_modified,
            is_validated,
        })
    }

    pub async fn festival_ref(
        &self,
        reference: &str,
    ) -> Result<Resolved<FestivalView>, StorageError> {
        if let Some(sentinel) = Sentinel::parse(reference) {
            return Ok(Resolved::Missing(sentinel));
        }
        match self.stores.festivals.find_either(reference).await? {
            Some((festival, validated)) => {
                Ok(Resolved::Found(self.festival(festival, validated).await?))
            }
            None => Ok(Resolved::Missing(Sentinel::FestivalNotFound)),
        }
    }

    pub async fn report(&self, report: Report) -> Result<ReportView, StorageError> {
        let item = match report.category {
            ReportCategory::Band => self
                .band_ref(&report.item, true)
                .await?
                .map(ReportTarget::Band),
            ReportCategory::Event => self.event_ref(&report.item).await?.map(ReportTarget::Event),
            ReportCategory::Festival => self
                .festival_ref(&report.item)
                .await?
                .map(ReportTarget::Festival),
            ReportCategory::Location => self
                .location_ref(&report.item, true)
                .await?
                .map(ReportTarget::Location),
        };
        Ok(ReportView {
            id: report.id,
            category: report.category,
            item,
            description: report.description,
        })
    }
}

async fn find_in<D: Document>(
    twin: &Twin<D>,
    store: Store,
    id: &str,
) -> Result<Option<D>, StorageError> {
    match twin.side(store) {
        Some(collection) => collection.find_by_id(id).await,
        None => Ok(None),
    }
}

async fn all_in<D: Document>(twin: &Twin<D>, store: Store) -> Result<Vec<D>, StorageError> {
    match twin.side(store) {
        Some(collection) => collection.find_all().await,
        None => Ok(Vec::new()),
    }
}

fn found_or(view: Option<EntityView>, kind: EntityKind) -> Resolved<EntityView> {
    match view {
        Some(view) => Resolved::Found(view),
        None => Resolved::Missing(Sentinel::not_found(kind)),
    }
}
