use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::document::{image_paths, Address, Composite, Document, EntityKind, ImageSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Festival {
    pub id: String,
    pub name: String,
    pub url: String,
    /// Genre ids, one to three.
    pub genre: Vec<String>,
    /// Festival event ids in display order.
    pub events: Vec<String>,
    pub description: Option<String>,
    pub address: Address,
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub image: Option<ImageSet>,
    pub last_modified: i64,
}

impl Festival {
    pub fn new(name: impl Into<String>, genre: Vec<String>) -> Self {
        Self {
            name: name.into(),
            genre,
            ..Default::default()
        }
    }
}

impl Document for Festival {
    const KIND: EntityKind = EntityKind::Festival;

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

/// One edition of a festival, owned by exactly one festival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalEvent {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bands: Vec<String>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub verifiable: bool,
    #[serde(default)]
    pub last_modified: i64,
}

impl FestivalEvent {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        bands: Vec<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            start_date,
            end_date,
            bands,
            canceled: false,
            verifiable: false,
            last_modified: 0,
        }
    }
}

impl Document for FestivalEvent {
    const KIND: EntityKind = EntityKind::FestivalEvent;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Composite for FestivalEvent {
    fn bands(&self) -> &[String] {
        &self.bands
    }

    fn bands_mut(&mut self) -> &mut Vec<String> {
        &mut self.bands
    }

    fn set_verifiable(&mut self, verifiable: bool) {
        self.verifiable = verifiable;
    }
}
