use crate::store::{StoreError, UpdateStore};
use crate::types::VaccineUpdate;

/// Decides whether a scraped update is newer than anything stored.
pub struct UpdateGate<'a> {
    store: &'a UpdateStore,
}

impl<'a> UpdateGate<'a> {
    pub fn new(store: &'a UpdateStore) -> Self {
        Self { store }
    }

    /// Records `update` and returns `true` only when its date is strictly
    /// later than the latest stored date, or the store is empty. Nothing is
    /// written when it returns `false`.
    pub fn check_and_store(&self, update: &VaccineUpdate) -> Result<bool, StoreError> {
        let previous = self.store.latest_date()?;

        if let Some(prev) = previous
            && update.date <= prev
        {
            log::info!("No new update: {} is not later than stored {}", update.date, prev);
            return Ok(false);
        }

        log::info!(
            "New update found: {}. Previous date: {}",
            update.date,
            previous
                .map(|d| d.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
        self.store.record(update)?;
        Ok(true)
    }
}
