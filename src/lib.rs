pub mod config;
pub mod gate;
pub mod notifier;
pub mod parser;
pub mod scraper;
pub mod store;
pub mod types;
pub mod watch;

pub use scraper::WebScraper;
pub use watch::{RunOutcome, Watcher};

pub const BOOKING_URL: &str = "https://www.nhs.uk/conditions/coronavirus-covid-19/coronavirus-vaccination/book-coronavirus-vaccination/";
