use gigbase_core::{EntityKind, Store};

use crate::error::ApiError;

/// A collection addressed by its URL segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collection {
    pub kind: EntityKind,
    pub store: Store,
}

const COLLECTIONS: &[(&str, EntityKind, Store)] = &[
    ("bands", EntityKind::Band, Store::Validated),
    ("unvalidated-bands", EntityKind::Band, Store::Unvalidated),
    ("locations", EntityKind::Location, Store::Validated),
    ("unvalidated-locations", EntityKind::Location, Store::Unvalidated),
    ("events", EntityKind::Event, Store::Validated),
    ("unvalidated-events", EntityKind::Event, Store::Unvalidated),
    ("archived-events", EntityKind::Event, Store::Archived),
    ("festivals", EntityKind::Festival, Store::Validated),
    ("unvalidated-festivals", EntityKind::Festival, Store::Unvalidated),
    ("festival-events", EntityKind::FestivalEvent, Store::Validated),
    ("unvalidated-festival-events", EntityKind::FestivalEvent, Store::Unvalidated),
    ("genres", EntityKind::Genre, Store::Validated),
    ("reports", EntityKind::Report, Store::Validated),
    ("bugs", EntityKind::Bug, Store::Validated),
    ("feedback", EntityKind::Feedback, Store::Validated),
];

impl Collection {
    pub fn parse(name: &str) -> Result<Self, ApiError> {
        COLLECTIONS
            .iter()
            .find(|(segment, _, _)| *segment == name)
            .map(|&(_, kind, store)| Collection { kind, store })
            .ok_or_else(|| ApiError::UnknownCollection(name.to_string()))
    }
}
