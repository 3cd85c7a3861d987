//! Canned result and detail pages shaped like the two sites' markup.

use crate::browser::fake::{FakeNode, FakePage};

pub const INDEED_DATA_SCIENTIST_P0: &str =
    "https://uk.indeed.com/jobs?q=Data+Scientist&l=United+Kingdom";
pub const INDEED_DATA_SCIENTIST_P1: &str =
    "https://uk.indeed.com/jobs?q=Data+Scientist&l=United+Kingdom&start=10";
pub const LINKEDIN_DATA_SCIENTIST_P0: &str =
    "https://www.linkedin.com/jobs/search/?keywords=Data%20Scientist&location=United%20Kingdom";
pub const LINKEDIN_DATA_SCIENTIST_P1: &str =
    "https://www.linkedin.com/jobs/search/?keywords=Data%20Scientist&location=United%20Kingdom&start=25";

pub fn indeed_job_url(jk: &str) -> String {
    format!("https://uk.indeed.com/viewjob?jk={}", jk)
}

pub fn linkedin_job_url(id: &str) -> String {
    format!("https://uk.linkedin.com/jobs/view/{}", id)
}

pub fn indeed_card(title: &str, jk: &str, salary: Option<&str>) -> FakeNode {
    let mut card = FakeNode::new("div.job_seen_beacon")
        .child(FakeNode::new("h2.jobTitle span").text(title))
        .child(FakeNode::new("h2.jobTitle a").attr("href", &format!("/viewjob?jk={}", jk)))
        .child(FakeNode::new("span[data-testid=\"company-name\"]").text("Acme"))
        .child(FakeNode::new("div[data-testid=\"text-location\"]").text("London"));
    if let Some(salary) = salary {
        card = card.child(FakeNode::new("div[class*=\"salary-snippet\"]").text(salary));
    }
    card
}

pub fn indeed_detail(description: &str, job_type: &str) -> FakePage {
    FakePage::new(vec![
        FakeNode::new("#jobDescriptionText").text(description),
        FakeNode::new("span[class*=\"css-k5flys\"]").text(job_type),
    ])
}

pub fn linkedin_card(title: &str, id: &str) -> FakeNode {
    FakeNode::new(".jobs-search__results-list li")
        .child(FakeNode::new("h3.base-search-card__title").text(title))
        .child(FakeNode::new("h4.base-search-card__subtitle").text("Globex"))
        .child(FakeNode::new("span.job-search-card__location").text("Leeds"))
        .child(FakeNode::new("time.job-search-card__listdate").attr("datetime", "2024-05-30"))
        .child(FakeNode::new("a.base-card__full-link").attr(
            "href",
            &format!("{}?refId=abc&trackingId=def", linkedin_job_url(id)),
        ))
}

pub fn linkedin_results(cards: Vec<FakeNode>) -> FakePage {
    let list = cards
        .into_iter()
        .fold(FakeNode::new(".jobs-search__results-list"), FakeNode::child);
    FakePage::new(vec![list])
}

pub fn linkedin_detail(description: &str, job_type: &str) -> FakePage {
    FakePage::new(vec![
        FakeNode::new(".show-more-less-html__markup").text(description),
        FakeNode::new("li.description__job-criteria-item:nth-child(2) span").text(job_type),
    ])
}

pub fn linkedin_login_form() -> FakePage {
    FakePage::new(vec![
        FakeNode::new("#username"),
        FakeNode::new("#password"),
        FakeNode::new("button[type='submit']"),
    ])
}
