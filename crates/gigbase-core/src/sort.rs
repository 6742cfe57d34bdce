use std::cmp::Ordering;

use serde::Deserialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::genre::Genre;
use crate::resolve::{
    BandView, EntityView, EventView, FestivalEventView, FestivalView, LocationView,
};
use crate::sentinel::Resolved;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Name,
    LastModified,
    /// Lowest genre name.
    Genre,
    Country,
    City,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// A comparable field value.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Text(String),
    Number(i64),
}

impl SortValue {
    fn compare(&self, other: &SortValue) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => locale_cmp(a, b),
            (SortValue::Number(a), SortValue::Number(b)) => a.cmp(b),
            (SortValue::Number(_), SortValue::Text(_)) => Ordering::Less,
            (SortValue::Text(_), SortValue::Number(_)) => Ordering::Greater,
        }
    }
}

/// Something that can be ordered by a [`SortKey`].
pub trait Sortable {
    /// The value for `key`, or None when the entry has no such field.
    fn sort_value(&self, key: SortKey) -> Option<SortValue>;
}

/// Compare two resolved entries. Missing entries sort last in either direction.
pub fn compare<T: Sortable>(
    a: &Resolved<T>,
    b: &Resolved<T>,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    match (a, b) {
        (Resolved::Found(a), Resolved::Found(b)) => compare_found(a, b, key, direction),
        (Resolved::Found(_), Resolved::Missing(_)) => Ordering::Less,
        (Resolved::Missing(_), Resolved::Found(_)) => Ordering::Greater,
        (Resolved::Missing(_), Resolved::Missing(_)) => Ordering::Equal,
    }
}

/// Compare two hydrated entries. Entries without a value for `key` sort last.
pub fn compare_found<T: Sortable>(
    a: &T,
    b: &T,
    key: SortKey,
    direction: SortDirection,
) -> Ordering {
    match (a.sort_value(key), b.sort_value(key)) {
        (Some(a), Some(b)) => direction.apply(a.compare(&b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_resolved<T: Sortable>(
    items: &mut [Resolved<T>],
    key: SortKey,
    direction: SortDirection,
) {
    items.sort_by(|a, b| compare(a, b, key, direction));
}

pub fn sort_views<T: Sortable>(items: &mut [T], key: SortKey, direction: SortDirection) {
    items.sort_by(|a, b| compare_found(a, b, key, direction));
}

/// Locale-style string ordering: accents and case are ignored first,
/// then lower case sorts before upper case.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(&fold(b))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

/// Lower-case base letters: canonical decomposition with the combining marks
/// dropped, plus the Latin letters that have no decomposition.
fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
    {
        match c {
            'ł' => out.push('l'),
            'ø' => out.push('o'),
            'đ' | 'ð' => out.push('d'),
            'ħ' => out.push('h'),
            'ı' => out.push('i'),
            'ß' => out.push_str("ss"),
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'þ' => out.push_str("th"),
            c => out.push(c),
        }
    }
    out
}

fn text(value: &str) -> Option<SortValue> {
    (!value.is_empty()).then(|| SortValue::Text(value.to_string()))
}

/// Reduce a multi-valued field to its lowest entry.
fn lowest<'a>(values: impl IntoIterator<Item = &'a String>) -> Option<SortValue> {
    values
        .into_iter()
        .min_by(|a, b| locale_cmp(a, b))
        .map(|v| SortValue::Text(v.clone()))
}

impl Sortable for BandView {
    fn sort_value(&self, key: SortKey) -> Option<SortValue> {
        match key {
            SortKey::Name => text(&self.name),
            SortKey::LastModified => Some(SortValue::Number(self.last_modified)),
            SortKey::Genre => lowest(&self.genre),
            SortKey::Country => text(&self.origin.country),
            SortKey::City => text(&self.origin.city),
            SortKey::Date => None,
        }
    }
}

impl Sortable for LocationView {
    fn sort_value(&self, key: SortKey) -> Option<SortValue> {
        match key {
            SortKey::Name => text(&self.name),
            SortKey::LastModified => Some(SortValue::Number(self.last_modified)),
            SortKey::Country => text(&self.address.country),
            SortKey::City => text(&self.address.city),
            SortKey::Genre | SortKey::Date => None,
        }
    }
}

impl Sortable for EventView {
    fn sort_value(&self, key: SortKey) -> Option<SortValue> {
        match key {
            SortKey::Name => text(&self.name),
            SortKey::LastModified => Some(SortValue::Number(self.last_modified)),
            SortKey::Date => Some(SortValue::Text(self.date.format("%Y-%m-%d").to_string())),
            SortKey::Genre => lowest(
                self.bands
                    .iter()
                    .filter_map(Resolved::found)
                    .flat_map(|b| b.genre.iter()),
            ),
            SortKey::Country => self.location.found().and_then(|l| text(&l.address.country)),
            SortKey::City => self.location.found().and_then(|l| text(&l.address.city)),
        }
    }
}

impl Sortable for FestivalEventView {
    fn sort_value(&self, key: SortKey) -> Option<SortValue> {
        match key {
            SortKey::Name => text(&self.name),
            SortKey::LastModified => Some(SortValue::Number(self.last_modified)),
            SortKey::Date => Some(SortValue::Text(
                self.start_date.format("%Y-%m-%d").to_string(),
            )),
            SortKey::Genre | SortKey::Country | SortKey::City => None,
        }
    }
}

impl Sortable for FestivalView {
    fn sort_value(&self, key: SortKey) -> Option<SortValue> {
        match key {
            SortKey::Name => text(&self.name),
            SortKey::LastModified => Some(SortValue::Number(self.last_modified)),
            SortKey::Genre => lowest(&self.genre),
            SortKey::Country => text(&self.address.country),
            SortKey::City => text(&self.address.city),
            // Events are already ordered by start date.
            SortKey::Date => self.events.first().and_then(|e| e.sort_value(SortKey::Date)),
        }
    }
}

impl Sortable for Genre {
    fn sort_value(&self, key: SortKey) -> Option<SortValue> {
        match key {
            SortKey::Name => text(&self.name),
            _ => None,
        }
    }
}

impl Sortable for EntityView {
    fn sort_value(&self, key: SortKey) -> Option<SortValue> {
        match self {
            EntityView::Band(v) => v.sort_value(key),
            EntityView::Location(v) => v.sort_value(key),
            EntityView::Event(v) => v.sort_value(key),
            EntityView::Festival(v) => v.sort_value(key),
            EntityView::FestivalEvent(v) => v.sort_value(key),
            EntityView::Genre(v) => v.sort_value(key),
            EntityView::Report(_) | EntityView::Bug(_) | EntityView::Feedback(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Address;
    use crate::sentinel::Sentinel;

    fn band(name: &str, genre: &[&str], last_modified: i64) -> BandView {
        BandView {
            id: name.to_lowercase(),
            name: name.to_string(),
            url: String::new(),
            genre: genre.iter().map(|g| g.to_string()).collect(),
            origin: Address::default(),
            history: None,
            record_label: None,
            releases: Vec::new(),
            founding_date: None,
            website: None,
            bandcamp_url: None,
            facebook_url: None,
            image: None,
            last_modified,
            is_validated: true,
        }
    }

    fn names(items: &[Resolved<BandView>]) -> Vec<String> {
        items
            .iter()
            .map(|i| match i {
                Resolved::Found(b) => b.name.clone(),
                Resolved::Missing(s) => s.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_missing_sorts_last_ascending() {
        let mut items = vec![
            Resolved::Found(band("Z-Band", &[], 0)),
            Resolved::Missing(Sentinel::BandNotFound),
            Resolved::Found(band("A-Band", &[], 0)),
        ];
        sort_resolved(&mut items, SortKey::Name, SortDirection::Ascending);
        assert_eq!(names(&items), vec!["A-Band", "Z-Band", "Band not found"]);
    }

    #[test]
    fn test_missing_sorts_last_descending() {
        let mut items = vec![
            Resolved::Missing(Sentinel::BandNotFound),
            Resolved::Found(band("A-Band", &[], 0)),
            Resolved::Found(band("Z-Band", &[], 0)),
        ];
        sort_resolved(&mut items, SortKey::Name, SortDirection::Descending);
        assert_eq!(names(&items), vec!["Z-Band", "A-Band", "Band not found"]);
    }

    #[test]
    fn test_last_modified_is_numeric() {
        let mut items = vec![band("a", &[], 100), band("b", &[], 9), band("c", &[], 20)];
        sort_views(&mut items, SortKey::LastModified, SortDirection::Ascending);
        let order: Vec<_> = items.iter().map(|b| b.last_modified).collect();
        assert_eq!(order, vec![9, 20, 100]);
    }

    #[test]
    fn test_genre_uses_lowest_value() {
        let mut items = vec![
            band("Slayer", &["Thrash Metal", "Speed Metal"], 0),
            band("Obituary", &["Death Metal"], 0),
            band("Untagged", &[], 0),
        ];
        sort_views(&mut items, SortKey::Genre, SortDirection::Ascending);
        let order: Vec<_> = items.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(order, vec!["Obituary", "Slayer", "Untagged"]);
    }

    #[test]
    fn test_locale_cmp_ignores_accents_and_case() {
        assert_eq!(locale_cmp("Ärzte", "Beatsteaks"), Ordering::Less);
        assert_eq!(locale_cmp("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_cmp("a", "A"), Ordering::Less);
        assert_eq!(locale_cmp("Motörhead", "motorhead"), Ordering::Greater);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_locale_cmp_folds_letters_beyond_latin1() {
        assert_eq!(locale_cmp("Šlágr", "Tankard"), Ordering::Less);
        assert_eq!(locale_cmp("Łzy", "Metallica"), Ordering::Less);
        assert_eq!(locale_cmp("Ōkami", "Pantera"), Ordering::Less);
        assert_eq!(locale_cmp("Čad", "Dio"), Ordering::Less);
        assert_eq!(locale_cmp("Dvořák", "Dvorak"), Ordering::Greater);
        assert_eq!(locale_cmp("Kőszív", "Kozmosz"), Ordering::Less);
        assert_eq!(locale_cmp("Žal", "Zebra"), Ordering::Less);
    }
}
