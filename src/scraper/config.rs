use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::DelayRange;
use crate::domain::Source;

/// How the scraper waits for the result list to appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitMode {
    /// Present in the DOM
    Presence,
    /// Present, visible and enabled
    Interactable,
}

/// Where a listing's detail page is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailTab {
    /// Navigate the current tab away from the results
    SameTab,
    /// Open a new tab and return to the results tab afterwards
    NewTab,
}

/// When listings are enriched with their detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailPhase {
    /// Once every result page of the category has been read
    AfterAllPages,
    /// Right after each result page, before moving on
    PerPage,
}

/// Retry parameters: `delay(k) = base_delay * factor^k` plus up to `jitter_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub factor: u32,
    pub jitter_ms: u64,
}

impl RetrySettings {
    pub const NONE: RetrySettings = RetrySettings {
        max_retries: 0,
        base_delay_ms: 0,
        factor: 1,
        jitter_ms: 0,
    };

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// CSS selectors for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selectors {
    /// Waited for before cards are read
    pub results_container: String,
    /// Page-wide selector matching every card
    pub card: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: Option<String>,
    pub link: String,
    pub date_posted: Option<String>,
    /// Attribute holding the posting date; element text is used when unset
    pub date_posted_attribute: Option<String>,
    pub description: String,
    pub detailed_salary: Option<String>,
    pub job_type: Option<String>,
    pub detailed_location: Option<String>,
}

/// Login form for sites that require an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginSettings {
    pub url: String,
    pub username_field: String,
    pub password_field: String,
    pub submit_button: String,
    pub page_settle: DelayRange,
    pub after_submit: DelayRange,
    pub keystroke: DelayRange,
}

/// Everything that differs between the two sites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSettings {
    pub source: Source,
    pub categories: Vec<String>,
    /// Search URL with a `{query}` placeholder
    pub search_url: String,
    /// Replacement for spaces inside the query
    pub query_space: String,
    /// Query parameter carrying the result offset
    pub offset_param: String,
    pub results_per_page: usize,
    pub max_pages: usize,
    /// Browsers running at once when each category gets its own. Sites with a
    /// login ignore this and share one signed-in browser.
    pub workers: usize,
    /// Drop the query string when canonicalising listing URLs
    pub strip_query: bool,
    /// Scroll until the page height settles before reading cards
    pub scroll_results: bool,
    pub wait_mode: WaitMode,
    pub detail_tab: DetailTab,
    pub detail_phase: DetailPhase,
    pub page_settle: DelayRange,
    pub detail_settle: DelayRange,
    pub between_details: DelayRange,
    pub page_retry: RetrySettings,
    pub detail_retry: RetrySettings,
    pub login: Option<LoginSettings>,
    pub selectors: Selectors,
}

const SHARED_CATEGORIES: &[&str] = &[
    "Quantitative Finance",
    "Quantitative Developer",
    "Quantitative Researcher",
    "Quantitative Analyst",
    "Consultant",
    "AI Research Scientist",
    "AI Scientist",
    "AI Engineer",
    "Data Scientist",
    "Data Engineer",
    "Machine Learning Scientist",
    "Machine Learning Engineer",
    "Energy",
];

const LINKEDIN_EXTRA_CATEGORIES: &[&str] = &[
    "Sustainability",
    "Environment",
    "Climate",
    "Education",
    "Lecturer",
];

impl SourceSettings {
    pub fn indeed() -> Self {
        Self {
            source: Source::Indeed,
            categories: SHARED_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            search_url: "https://uk.indeed.com/jobs?q={query}&l=United+Kingdom".to_string(),
            query_space: "+".to_string(),
            offset_param: "start".to_string(),
            results_per_page: 10,
            max_pages: 20,
            workers: 3,
            strip_query: false,
            scroll_results: false,
            wait_mode: WaitMode::Presence,
            detail_tab: DetailTab::SameTab,
            detail_phase: DetailPhase::AfterAllPages,
            page_settle: DelayRange::secs(3, 5),
            detail_settle: DelayRange::secs(2, 4),
            between_details: DelayRange::secs(1, 3),
            page_retry: RetrySettings::NONE,
            detail_retry: RetrySettings {
                max_retries: 2,
                base_delay_ms: 2000,
                factor: 1,
                jitter_ms: 0,
            },
            login: None,
            selectors: Selectors {
                results_container: "div.job_seen_beacon".to_string(),
                card: "div.job_seen_beacon".to_string(),
                title: "h2.jobTitle span".to_string(),
                company: "span[data-testid=\"company-name\"]".to_string(),
                location: "div[data-testid=\"text-location\"]".to_string(),
                salary: Some("div[class*=\"salary-snippet\"]".to_string()),
                link: "h2.jobTitle a".to_string(),
                date_posted: None,
                date_posted_attribute: None,
                description: "#jobDescriptionText".to_string(),
                detailed_salary: Some("span[class*=\"css-19j1a75\"]".to_string()),
                job_type: Some("span[class*=\"css-k5flys\"]".to_string()),
                detailed_location: Some("#jobLocationText".to_string()),
            },
        }
    }

    pub fn linkedin() -> Self {
        Self {
            source: Source::LinkedIn,
            categories: SHARED_CATEGORIES
                .iter()
                .chain(LINKEDIN_EXTRA_CATEGORIES)
                .map(|c| c.to_string())
                .collect(),
            search_url:
                "https://www.linkedin.com/jobs/search/?keywords={query}&location=United%20Kingdom"
                    .to_string(),
            query_space: "%20".to_string(),
            offset_param: "start".to_string(),
            results_per_page: 25,
            max_pages: 10,
            workers: 1,
            strip_query: true,
            scroll_results: true,
            wait_mode: WaitMode::Interactable,
            detail_tab: DetailTab::NewTab,
            detail_phase: DetailPhase::PerPage,
            page_settle: DelayRange::secs(5, 10),
            detail_settle: DelayRange::secs(3, 5),
            between_details: DelayRange::secs(1, 3),
            page_retry: RetrySettings {
                max_retries: 5,
                base_delay_ms: 60_000,
                factor: 2,
                jitter_ms: 0,
            },
            detail_retry: RetrySettings::NONE,
            login: Some(LoginSettings {
                url: "https://www.linkedin.com/login".to_string(),
                username_field: "#username".to_string(),
                password_field: "#password".to_string(),
                submit_button: "button[type='submit']".to_string(),
                page_settle: DelayRange::secs(3, 5),
                after_submit: DelayRange::secs(5, 7),
                keystroke: DelayRange::millis(100, 300),
            }),
            selectors: Selectors {
                results_container: ".jobs-search__results-list".to_string(),
                card: ".jobs-search__results-list li".to_string(),
                title: "h3.base-search-card__title".to_string(),
                company: "h4.base-search-card__subtitle".to_string(),
                location: "span.job-search-card__location".to_string(),
                salary: None,
                link: "a.base-card__full-link".to_string(),
                date_posted: Some("time.job-search-card__listdate".to_string()),
                date_posted_attribute: Some("datetime".to_string()),
                description: ".show-more-less-html__markup".to_string(),
                detailed_salary: None,
                job_type: Some("li.description__job-criteria-item:nth-child(2) span".to_string()),
                detailed_location: None,
            },
        }
    }

    pub fn for_source(source: Source) -> Self {
        match source {
            Source::Indeed => Self::indeed(),
            Source::LinkedIn => Self::linkedin(),
        }
    }

    /// Same settings with every delay removed, for tests against a fake driver.
    pub fn without_delays(mut self) -> Self {
        self.page_settle = DelayRange::ZERO;
        self.detail_settle = DelayRange::ZERO;
        self.between_details = DelayRange::ZERO;
        self.page_retry.base_delay_ms = 0;
        self.page_retry.jitter_ms = 0;
        self.detail_retry.base_delay_ms = 0;
        self.detail_retry.jitter_ms = 0;
        if let Some(login) = self.login.as_mut() {
            login.page_settle = DelayRange::ZERO;
            login.after_submit = DelayRange::ZERO;
            login.keystroke = DelayRange::ZERO;
        }
        self
    }
}
