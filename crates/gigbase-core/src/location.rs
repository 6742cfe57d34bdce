use serde::{Deserialize, Serialize};

use crate::document::{image_paths, Address, Document, EntityKind, ImageSet};

/// A venue or other place where events take place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub url: String,
    pub address: Address,
    pub information: Option<String>,
    pub website: Option<String>,
    pub facebook_url: Option<String>,
    pub image: Option<ImageSet>,
    pub last_modified: i64,
}

impl Location {
    pub fn new(name: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: Address {
                city: city.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

impl Document for Location {
    const KIND: EntityKind = EntityKind::Location;

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
