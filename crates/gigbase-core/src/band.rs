use serde::{Deserialize, Serialize};

use crate::document::{image_paths, Address, Document, EntityKind, ImageSet};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Release {
    pub release_name: String,
    pub release_year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Band {
    pub id: String,
    pub name: String,
    /// Slug used in public URLs.
    pub url: String,
    /// Genre ids, one to three.
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
}

impl Band {
    pub fn new(name: impl Into<String>, genre: Vec<String>) -> Self {
        Self {
            name: name.into(),
            genre,
            ..Default::default()
        }
    }
}

impl Document for Band {
    const KIND: EntityKind = EntityKind::Band;

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
