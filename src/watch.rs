use crate::gate::UpdateGate;
use crate::notifier::Notifier;
use crate::scraper::{ScraperError, WebScraper};
use crate::store::{StoreError, UpdateStore};
use crate::types::VaccineUpdate;

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error(transparent)]
    Scraper(#[from] ScraperError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The page did not answer with 200; nothing was read or written.
    Unavailable,
    Unchanged(VaccineUpdate),
    NewUpdate {
        update: VaccineUpdate,
        /// The messaging program ran and exited successfully.
        notified: bool,
    },
}

/// One fetch, check and notify pass.
///
/// The store named by `engine` is only opened once the page has yielded an
/// update, so an unavailable or unparsable page leaves no database behind.
pub struct Watcher<'a> {
    scraper: &'a WebScraper,
    engine: &'a str,
    notifier: Option<&'a Notifier>,
}

impl<'a> Watcher<'a> {
    pub fn new(
        scraper: &'a WebScraper,
        engine: &'a str,
        notifier: Option<&'a Notifier>,
    ) -> Self {
        Self {
            scraper,
            engine,
            notifier,
        }
    }

    pub async fn run_once(&self) -> Result<RunOutcome, WatchError> {
        let Some(update) = self.scraper.fetch_latest_update().await? else {
            return Ok(RunOutcome::Unavailable);
        };

        let store = UpdateStore::open(self.engine)?;
        if !UpdateGate::new(&store).check_and_store(&update)? {
            return Ok(RunOutcome::Unchanged(update));
        }

        let notified = match self.notifier {
            Some(notifier) => match notifier.notify(&update).await {
                Ok(status) => status.success(),
                Err(e) => {
                    log::error!("Notification for {} failed: {}", update.date, e);
                    false
                }
            },
            None => {
                log::info!("Notifications disabled, not sending {}", update.date);
                false
            }
        };

        Ok(RunOutcome::NewUpdate { update, notified })
    }
}
