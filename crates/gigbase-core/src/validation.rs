use crate::band::Band;
use crate::error::ValidationError;
use crate::event::Event;
use crate::festival::{Festival, FestivalEvent};
use crate::genre::Genre;
use crate::location::Location;

/// Shape checks for submitted entries.
pub struct Validator;

impl Validator {
    /// Name must contain something other than whitespace.
    pub fn validate_name(name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(())
    }

    /// Bands and festivals carry one to three genres.
    pub fn validate_genre_count(genre: &[String]) -> Result<(), ValidationError> {
        if !(1..=3).contains(&genre.len()) {
            return Err(ValidationError::GenreCount(genre.len()));
        }
        Ok(())
    }

    pub fn validate_band_list(bands: &[String]) -> Result<(), ValidationError> {
        if bands.is_empty() {
            return Err(ValidationError::EmptyBandList);
        }
        Ok(())
    }

    pub fn validate_band(band: &Band) -> Result<(), ValidationError> {
        Self::validate_name(&band.name)?;
        Self::validate_genre_count(&band.genre)?;
        Ok(())
    }

    pub fn validate_location(location: &Location) -> Result<(), ValidationError> {
        Self::validate_name(&location.name)
    }

    pub fn validate_event(event: &Event) -> Result<(), ValidationError> {
        Self::validate_name(&event.name)?;
        Self::validate_band_list(&event.bands)?;
        Ok(())
    }

    pub fn validate_festival(festival: &Festival) -> Result<(), ValidationError> {
        Self::validate_name(&festival.name)?;
        Self::validate_genre_count(&festival.genre)?;
        Ok(())
    }

    pub fn validate_festival_event(event: &FestivalEvent) -> Result<(), ValidationError> {
        Self::validate_name(&event.name)?;
        Self::validate_band_list(&event.bands)?;
        Ok(())
    }

    /// The festival event must be listed by the festival it is edited through.
    pub fn validate_festival_event_owner(
        festival: &Festival,
        event_id: &str,
    ) -> Result<(), ValidationError> {
        if !festival.events.iter().any(|e| e == event_id) {
            return Err(ValidationError::FestivalEventNotOwned {
                festival: festival.id.clone(),
                event: event_id.to_string(),
            });
        }
        Ok(())
    }

    /// Genre names are unique ignoring case.
    pub fn validate_genre(genre: &Genre, existing: &[Genre]) -> Result<(), ValidationError> {
        Self::validate_name(&genre.name)?;
        let name = genre.name.trim().to_lowercase();
        if existing
            .iter()
            .any(|g| g.id != genre.id && g.name.trim().to_lowercase() == name)
        {
            return Err(ValidationError::DuplicateGenre(genre.name.clone()));
        }
        Ok(())
    }
}
