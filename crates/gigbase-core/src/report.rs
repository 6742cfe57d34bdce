use serde::{Deserialize, Serialize};

use crate::document::{Document, EntityKind};

/// What kind of entry a report points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportCategory {
    Band,
    Event,
    Festival,
    Location,
}

impl ReportCategory {
    pub fn kind(self) -> EntityKind {
        match self {
            ReportCategory::Band => EntityKind::Band,
            ReportCategory::Event => EntityKind::Event,
            ReportCategory::Festival => EntityKind::Festival,
            ReportCategory::Location => EntityKind::Location,
        }
    }
}

/// A user report flagging a problem with a directory entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default)]
    pub id: String,
    pub category: ReportCategory,
    /// Id of the reported entry.
    pub item: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Report {
    pub fn new(category: ReportCategory, item: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            category,
            item: item.into(),
            description: None,
        }
    }
}

impl Document for Report {
    const KIND: EntityKind = EntityKind::Report;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bug {
    pub id: String,
    pub function: Option<String>,
    pub description: String,
    pub contact: Option<String>,
}

impl Document for Bug {
    const KIND: EntityKind = EntityKind::Bug;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Feedback {
    pub id: String,
    pub text: String,
    pub contact: Option<String>,
}

impl Document for Feedback {
    const KIND: EntityKind = EntityKind::Feedback;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}
