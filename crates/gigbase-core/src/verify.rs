use futures::future::try_join_all;

use crate::document::Composite;
use crate::error::StorageError;
use crate::sentinel::Sentinel;
use crate::storage::Stores;

/// Derives the `verifiable` flag of events and festival events.
///
/// The result is a pure function of current store contents and is never cached.
#[derive(Clone)]
pub struct VerifiabilityCalculator {
    stores: Stores,
}

impl VerifiabilityCalculator {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// True iff there is at least one band, every band id is in the validated
    /// band store and, when a location is given, the location id is in the
    /// validated location store.
    pub async fn compute(
        &self,
        location: Option<&str>,
        bands: &[String],
    ) -> Result<bool, StorageError> {
        if bands.is_empty() {
            return Ok(false);
        }
        if let Some(location) = location {
            if Sentinel::parse(location).is_some() {
                return Ok(false);
            }
            if self
                .stores
                .locations
                .validated
                .find_by_id(location)
                .await?
                .is_none()
            {
                return Ok(false);
            }
        }

        let lookups = bands
            .iter()
            .map(|id| self.stores.bands.validated.find_by_id(id));
        let found = try_join_all(lookups).await?;
        Ok(found.iter().all(Option::is_some))
    }

    /// Compute the flag for a composite document from its own references.
    pub async fn compute_for<C: Composite>(&self, doc: &C) -> Result<bool, StorageError> {
        self.compute(doc.location(), doc.bands()).await
    }
}
