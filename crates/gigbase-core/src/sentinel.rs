use serde::{Serialize, Serializer};

use crate::document::EntityKind;

/// In-band marker for a reference that cannot be resolved to a record.
///
/// Serialized as its display string, and a reference field may hold that
/// string directly (see [`Sentinel::LocationDeleted`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    BandNotFound,
    LocationNotFound,
    LocationDeleted,
    EventNotFound,
    FestivalNotFound,
    FestivalEventNotFound,
    GenreNotFound,
    ReportNotFound,
    BugNotFound,
    FeedbackNotFound,
}

const ALL: [Sentinel; 10] = [
    Sentinel::BandNotFound,
    Sentinel::LocationNotFound,
    Sentinel::LocationDeleted,
    Sentinel::EventNotFound,
    Sentinel::FestivalNotFound,
    Sentinel::FestivalEventNotFound,
    Sentinel::GenreNotFound,
    Sentinel::ReportNotFound,
    Sentinel::BugNotFound,
    Sentinel::FeedbackNotFound,
];

impl Sentinel {
    /// The "not found" sentinel for a kind.
    pub fn not_found(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Band => Sentinel::BandNotFound,
            EntityKind::Location => Sentinel::LocationNotFound,
            EntityKind::Event => Sentinel::EventNotFound,
            EntityKind::Festival => Sentinel::FestivalNotFound,
            EntityKind::FestivalEvent => Sentinel::FestivalEventNotFound,
            EntityKind::Genre => Sentinel::GenreNotFound,
            EntityKind::Report => Sentinel::ReportNotFound,
            EntityKind::Bug => Sentinel::BugNotFound,
            EntityKind::Feedback => Sentinel::FeedbackNotFound,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Sentinel::BandNotFound => "Band not found",
            Sentinel::LocationNotFound => "Location not found",
            Sentinel::LocationDeleted => "Location was deleted",
            Sentinel::EventNotFound => "Event not found",
            Sentinel::FestivalNotFound => "Festival not found",
            Sentinel::FestivalEventNotFound => "Festival event not found",
            Sentinel::GenreNotFound => "Genre not found",
            Sentinel::ReportNotFound => "Report not found",
            Sentinel::BugNotFound => "Bug not found",
            Sentinel::FeedbackNotFound => "Feedback not found",
        }
    }

    /// Recognize a stored or previously resolved sentinel string.
    pub fn parse(value: &str) -> Option<Self> {
        ALL.into_iter().find(|s| s.as_str() == value)
    }
}

impl std::fmt::Display for Sentinel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sentinel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Outcome of resolving one reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resolved<T> {
    Found(T),
    Missing(Sentinel),
}

impl<T> Resolved<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Resolved::Found(value) => Some(value),
            Resolved::Missing(_) => None,
        }
    }

    pub fn into_found(self) -> Option<T> {
        match self {
            Resolved::Found(value) => Some(value),
            Resolved::Missing(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Resolved::Found(value) => Resolved::Found(f(value)),
            Resolved::Missing(sentinel) => Resolved::Missing(sentinel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrips_every_sentinel() {
        for sentinel in ALL {
            assert_eq!(Sentinel::parse(sentinel.as_str()), Some(sentinel));
        }
        assert_eq!(Sentinel::parse("Backstage"), None);
    }

    #[test]
    fn test_missing_serializes_as_plain_string() {
        let missing: Resolved<u32> = Resolved::Missing(Sentinel::LocationDeleted);
        assert_eq!(
            serde_json::to_value(&missing).unwrap(),
            serde_json::json!("Location was deleted")
        );
        let found: Resolved<u32> = Resolved::Found(7);
        assert_eq!(serde_json::to_value(&found).unwrap(), serde_json::json!(7));
    }
}
