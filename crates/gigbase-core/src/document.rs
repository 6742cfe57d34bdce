use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The closed set of entity kinds the directory stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Band,
    Location,
    Event,
    Festival,
    FestivalEvent,
    Genre,
    Report,
    Bug,
    Feedback,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Band => "Band",
            EntityKind::Location => "Location",
            EntityKind::Event => "Event",
            EntityKind::Festival => "Festival",
            EntityKind::FestivalEvent => "Festival event",
            EntityKind::Genre => "Genre",
            EntityKind::Report => "Report",
            EntityKind::Bug => "Bug",
            EntityKind::Feedback => "Feedback",
        };
        f.write_str(name)
    }
}

/// Which side of a twin pair a document lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Store {
    Validated,
    Unvalidated,
    /// Past events moved out of the public listing. Only events have this store.
    Archived,
}

impl Store {
    pub fn is_validated(self) -> bool {
        !matches!(self, Store::Unvalidated)
    }
}

/// A record held in one of the document collections.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    fn slug(&self) -> Option<&str> {
        None
    }

    /// Paths of stored image files attached to this document.
    fn image_paths(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A document whose `verifiable` flag is derived from its band (and location) references.
pub trait Composite: Document {
    fn bands(&self) -> &[String];

    fn bands_mut(&mut self) -> &mut Vec<String>;

    /// The location reference, for kinds that have one.
    fn location(&self) -> Option<&str> {
        None
    }

    fn set_location(&mut self, _location: String) {}

    fn set_verifiable(&mut self, verifiable: bool);
}

/// Postal address with optional geocoding results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: Option<String>,
    pub city: String,
    pub administrative: Option<String>,
    pub country: String,
    pub country_code: Option<String>,
    pub postcode: Option<String>,
    /// Full display form of the address.
    pub value: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

/// An uploaded image and the derivatives generated from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageSet {
    pub original: String,
    pub derivatives: Vec<String>,
}

impl ImageSet {
    pub fn paths(&self) -> Vec<String> {
        std::iter::once(self.original.clone())
            .chain(self.derivatives.iter().cloned())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

/// Current time as milliseconds since the Unix epoch.
pub fn current_epoch_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub(crate) fn image_paths(image: &Option<ImageSet>) -> Vec<String> {
    image.as_ref().map(ImageSet::paths).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_paths_skip_empty_original() {
        let image = ImageSet {
            original: String::new(),
            derivatives: vec!["bands/a-300.jpg".to_string()],
        };
        assert_eq!(image.paths(), vec!["bands/a-300.jpg".to_string()]);
        assert!(image_paths(&None).is_empty());
    }
}
