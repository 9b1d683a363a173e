use std::sync::LazyLock;

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};

use crate::types::VaccineUpdate;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse date: {0}")]
    DateParse(String),
    #[error("Missing required element: {0}")]
    MissingElement(String),
}

// The booking page carries no ids on these blocks, so both lookups are positional.
static SEL_REVIEW_DATE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.nhsuk-review-date").expect("invalid selector: review date")
});

static SEL_PARAGRAPH: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p").expect("invalid selector: paragraph"));

static SEL_FIRST_CRITERION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(
        "#maincontent > article > div > div > section:nth-child(2) > ul > li:nth-child(1)",
    )
    .expect("invalid selector: first criterion")
});

const REVIEW_DATE_FORMAT: &str = "%d %B %Y";

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parses the `Page last reviewed: 19 March 2024` line into a date.
///
/// Only the first line is considered; the block usually carries a
/// `Next review due` line below it.
fn parse_review_date(text: &str) -> Result<NaiveDate, ParseError> {
    let first_line = text.trim().split('\n').next().unwrap_or_default();
    let date_text = first_line
        .split(':')
        .nth(1)
        .map(str::trim)
        .ok_or_else(|| {
            ParseError::DateParse(format!("No ':' separator in review line: {}", first_line))
        })?;

    let date = NaiveDate::parse_from_str(date_text, REVIEW_DATE_FORMAT)
        .map_err(|e| ParseError::DateParse(format!("{} ({})", date_text, e)))?;

    // chrono's %B also takes "Mar"; only the full month name is accepted.
    let month = date_text.split_whitespace().nth(1).unwrap_or_default();
    if !month.eq_ignore_ascii_case(&date.format("%B").to_string()) {
        return Err(ParseError::DateParse(format!(
            "{} (month must be written in full)",
            date_text
        )));
    }

    Ok(date)
}

pub fn parse_vaccine_update(html: &str) -> Result<VaccineUpdate, ParseError> {
    let document = Html::parse_document(html);

    let review_block = document
        .select(&SEL_REVIEW_DATE)
        .next()
        .ok_or_else(|| ParseError::MissingElement("review date block".to_string()))?;
    let review_paragraph = review_block
        .select(&SEL_PARAGRAPH)
        .next()
        .ok_or_else(|| ParseError::MissingElement("review date paragraph".to_string()))?;
    let date = parse_review_date(&elem_text(review_paragraph))?;

    let criterion = document
        .select(&SEL_FIRST_CRITERION)
        .next()
        .map(|e| normalize_whitespace(&elem_text(e)))
        .ok_or_else(|| ParseError::MissingElement("first eligibility criterion".to_string()))?;

    log::debug!("Latest review date {}", date);

    Ok(VaccineUpdate { date, criterion })
}
