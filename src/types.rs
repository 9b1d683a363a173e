use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The review date and first eligibility criterion scraped from the booking page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineUpdate {
    pub date: NaiveDate,
    pub criterion: String,
}

impl VaccineUpdate {
    pub fn new(date: NaiveDate, criterion: impl Into<String>) -> Self {
        Self {
            date,
            criterion: criterion.into(),
        }
    }
}

impl Display for VaccineUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.date, self.criterion)
    }
}

/// A row of the `updates` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredUpdate {
    pub date: NaiveDate,
    pub criterion: String,
}

impl Display for StoredUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.date, self.criterion)
    }
}
