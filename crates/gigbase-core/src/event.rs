use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::document::{image_paths, Composite, Document, EntityKind, ImageSet};

/// A single concert night at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Location id, or a sentinel once the location is gone.
    pub location: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    /// Band ids in billing order.
    pub bands: Vec<String>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub ticket_link: Option<String>,
    #[serde(default)]
    pub verifiable: bool,
    #[serde(default)]
    pub image: Option<ImageSet>,
    #[serde(default)]
    pub last_modified: i64,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        location: impl Into<String>,
        date: NaiveDate,
        bands: Vec<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            url: String::new(),
            description: None,
            location: location.into(),
            date,
            time: None,
            bands,
            canceled: false,
            ticket_link: None,
            verifiable: false,
            image: None,
            last_modified: 0,
        }
    }
}

impl Document for Event {
    const KIND: EntityKind = EntityKind::Event;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn slug(&self) -> Option<&str> {
        Some(&self.url)
    }

    fn image_paths(&self) -> Vec<String> {
        image_paths(&self.image)
    }
}

impl Composite for Event {
    fn bands(&self) -> &[String] {
        &self.bands
    }

    fn bands_mut(&mut self) -> &mut Vec<String> {
        &mut self.bands
    }

    fn location(&self) -> Option<&str> {
        Some(&self.location)
    }

    fn set_location(&mut self, location: String) {
        self.location = location;
    }

    fn set_verifiable(&mut self, verifiable: bool) {
        self.verifiable = verifiable;
    }
}
