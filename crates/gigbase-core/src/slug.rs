use std::sync::Arc;

use crate::band::Band;
use crate::document::{Document, EntityKind};
use crate::error::StorageError;
use crate::event::Event;
use crate::festival::Festival;
use crate::location::Location;
use crate::storage::{Collection, Stores};

/// Characters dropped from slugs entirely.
const STRIPPED: &[char] = &[',', '(', ')', '[', ']', '{', '}'];

/// The fields a slug is built from, tagged with the kind whose namespace it lives in.
#[derive(Debug, Clone, PartialEq)]
pub struct SlugSource {
    kind: EntityKind,
    parts: Vec<String>,
}

impl SlugSource {
    pub fn band(name: &str) -> Self {
        Self::new(EntityKind::Band, [name])
    }

    pub fn location(name: &str, city: &str) -> Self {
        Self::new(EntityKind::Location, [name, city])
    }

    pub fn festival(name: &str) -> Self {
        Self::new(EntityKind::Festival, [name])
    }

    /// Events are named after title, date and venue, since titles repeat.
    pub fn event(name: &str, date: chrono::NaiveDate, location_name: Option<&str>) -> Self {
        let date = date.format("%Y-%m-%d").to_string();
        Self::new(
            EntityKind::Event,
            [name, date.as_str(), location_name.unwrap_or_default()],
        )
    }

    fn new<'a>(kind: EntityKind, parts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            kind,
            parts: parts
                .into_iter()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect(),
        }
    }

    /// The slug before any collision suffix is applied.
    pub fn base(&self) -> String {
        slugify(&self.parts.join(" "))
    }
}

impl From<&Band> for SlugSource {
    fn from(band: &Band) -> Self {
        SlugSource::band(&band.name)
    }
}

impl From<&Location> for SlugSource {
    fn from(location: &Location) -> Self {
        SlugSource::location(&location.name, &location.address.city)
    }
}

impl From<&Festival> for SlugSource {
    fn from(festival: &Festival) -> Self {
        SlugSource::festival(&festival.name)
    }
}

/// Turn display text into a lower-case, URL-safe slug.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            'ß' => out.push_str("ss"),
            c if STRIPPED.contains(&c) => {}
            '/' | '\\' => push_separator(&mut out),
            c if c.is_whitespace() || c == '-' => push_separator(&mut out),
            c => out.push(c),
        }
    }
    let trimmed = out.trim_matches('-');
    urlencoding::encode(trimmed).to_lowercase()
}

fn push_separator(out: &mut String) {
    if !out.ends_with('-') {
        out.push('-');
    }
}

/// Assigns collision-free slugs within a kind's namespace.
///
/// The namespace spans the validated and unvalidated stores; for events
/// it also spans the archive.
#[derive(Clone)]
pub struct SlugGenerator {
    stores: Stores,
}

impl SlugGenerator {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Pick a slug for `source`.
    ///
    /// `batch` holds slugs already handed out in the current bulk write.
    /// A stored record whose id equals `self_id` does not count as a collision.
    /// Returns Ok(None) only when there is no source.
    pub async fn assign(
        &self,
        source: Option<&SlugSource>,
        batch: &[String],
        self_id: Option<&str>,
    ) -> Result<Option<String>, StorageError> {
        let Some(source) = source else {
            return Ok(None);
        };

        let base = source.base();
        let mut counter: u32 = 1;
        loop {
            let candidate = if counter == 1 {
                base.clone()
            } else {
                format!("{}--{}", base, counter)
            };
            if !self.is_taken(source.kind, &candidate, batch, self_id).await? {
                return Ok(Some(candidate));
            }
            counter += 1;
        }
    }

    /// Build the slug source for an event, looking up the venue name.
    pub async fn event_source(&self, event: &Event) -> Result<SlugSource, StorageError> {
        let location_name = self
            .stores
            .locations
            .find_either(&event.location)
            .await?
            .map(|(location, _)| location.name);
        Ok(SlugSource::event(
            &event.name,
            event.date,
            location_name.as_deref(),
        ))
    }

    async fn is_taken(
        &self,
        kind: EntityKind,
        candidate: &str,
        batch: &[String],
        self_id: Option<&str>,
    ) -> Result<bool, StorageError> {
        if batch.iter().any(|s| s.eq_ignore_ascii_case(candidate)) {
            return Ok(true);
        }
        let holders = self.holders(kind, candidate).await?;
        Ok(holders.iter().any(|id| Some(id.as_str()) != self_id))
    }

    /// Ids of every record in the namespace currently holding `slug`.
    async fn holders(&self, kind: EntityKind, slug: &str) -> Result<Vec<String>, StorageError> {
        let stores = &self.stores;
        match kind {
            EntityKind::Band => {
                holders_in(&[&stores.bands.validated, &stores.bands.unvalidated], slug).await
            }
            EntityKind::Location => {
                holders_in(
                    &[&stores.locations.validated, &stores.locations.unvalidated],
                    slug,
                )
                .await
            }
            EntityKind::Event => holders_in(&stores.all_event_collections(), slug).await,
            EntityKind::Festival => {
                holders_in(
                    &[&stores.festivals.validated, &stores.festivals.unvalidated],
                    slug,
                )
                .await
            }
            _ => Ok(Vec::new()),
        }
    }
}

async fn holders_in<D: Document>(
    collections: &[&Arc<dyn Collection<D>>],
    slug: &str,
) -> Result<Vec<String>, StorageError> {
    let matches_slug = |doc: &D| doc.slug().is_some_and(|s| s.eq_ignore_ascii_case(slug));
    let mut ids = Vec::new();
    for collection in collections {
        let found = collection.find(&matches_slug).await?;
        ids.extend(found.iter().map(|doc| doc.id().to_string()));
    }
    Ok(ids)
}
