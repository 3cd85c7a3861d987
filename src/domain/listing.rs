use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const NOT_AVAILABLE: &str = "N/A";
pub const SALARY_NOT_PROVIDED: &str = "Not provided";
pub const NOT_SPECIFIED: &str = "Not specified";
pub const DESCRIPTION_PENDING: &str = "To be fetched";
pub const DESCRIPTION_UNAVAILABLE: &str = "Description not available";
pub const DESCRIPTION_ERROR: &str = "Error fetching description";

/// Origin site of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Indeed,
    LinkedIn,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Indeed => "Indeed",
            Source::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Indeed" => Ok(Source::Indeed),
            "LinkedIn" => Ok(Source::LinkedIn),
            other => Err(format!("Unknown source: {}", other)),
        }
    }
}

/// Summary fields read off a single result card.
///
/// Every field is optional here; sentinels are applied when the card is
/// turned into a [`JobListing`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialListing {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub url: Option<String>,
    pub date_posted: Option<String>,
}

/// Fields read off a listing's detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingDetail {
    pub description: String,
    pub detailed_salary: Option<String>,
    pub job_type: Option<String>,
    pub detailed_location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub source: Source,
    pub category: Option<String>,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub url: String,
    pub description: String,
    pub detailed_salary: String,
    pub job_type: String,
    pub detailed_location: String,
    pub date_posted: String,
    pub date_scraped: NaiveDate,
}

impl JobListing {
    /// Builds a listing with placeholder detail fields.
    pub fn new(source: Source, url: impl Into<String>, date_scraped: NaiveDate) -> Self {
        Self {
            source,
            category: None,
            title: NOT_AVAILABLE.to_string(),
            company: NOT_AVAILABLE.to_string(),
            location: NOT_AVAILABLE.to_string(),
            salary: SALARY_NOT_PROVIDED.to_string(),
            url: url.into(),
            description: DESCRIPTION_PENDING.to_string(),
            detailed_salary: SALARY_NOT_PROVIDED.to_string(),
            job_type: NOT_SPECIFIED.to_string(),
            detailed_location: NOT_SPECIFIED.to_string(),
            date_posted: NOT_AVAILABLE.to_string(),
            date_scraped,
        }
    }

    /// Converts a card into a listing, resolving missing fields to sentinels.
    ///
    /// Returns `None` when the card carries no URL.
    pub fn from_partial(
        source: Source,
        category: &str,
        partial: PartialListing,
        date_scraped: NaiveDate,
    ) -> Option<Self> {
        let url = non_empty(partial.url)?;
        let mut listing = Self::new(source, url, date_scraped);
        listing.category = Some(category.to_string());
        listing.title = or_sentinel(partial.title, NOT_AVAILABLE);
        listing.company = or_sentinel(partial.company, NOT_AVAILABLE);
        listing.location = or_sentinel(partial.location, NOT_AVAILABLE);
        listing.salary = or_sentinel(partial.salary, SALARY_NOT_PROVIDED);
        listing.date_posted = or_sentinel(partial.date_posted, NOT_AVAILABLE);
        Some(listing)
    }

    /// Merges detail page fields into this listing.
    pub fn apply_detail(&mut self, detail: ListingDetail) {
        self.description = or_sentinel(Some(detail.description), DESCRIPTION_UNAVAILABLE);
        self.detailed_salary = or_sentinel(detail.detailed_salary, SALARY_NOT_PROVIDED);
        self.job_type = or_sentinel(detail.job_type, NOT_SPECIFIED);
        self.detailed_location = or_sentinel(detail.detailed_location, NOT_SPECIFIED);
    }

    /// Sets every detail field to its "unavailable" sentinel.
    pub fn degrade_detail(&mut self, description: &str) {
        self.description = description.to_string();
        self.detailed_salary = SALARY_NOT_PROVIDED.to_string();
        self.job_type = NOT_SPECIFIED.to_string();
        self.detailed_location = NOT_SPECIFIED.to_string();
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn or_sentinel(value: Option<String>, sentinel: &str) -> String {
    non_empty(value).unwrap_or_else(|| sentinel.to_string())
}
