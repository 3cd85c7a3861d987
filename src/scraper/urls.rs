use url::form_urlencoded::byte_serialize;
use url::Url;

use crate::app::Result;
use crate::scraper::SourceSettings;

/// Search results URL for `category` at zero-based `page`.
///
/// The category is percent-encoded with spaces written as the site's
/// `query_space`. The first page carries no offset parameter.
pub fn search_url(settings: &SourceSettings, category: &str, page: usize) -> String {
    let words = category.split_whitespace().collect::<Vec<_>>().join(" ");
    // byte_serialize encodes a literal '+' as %2B, so every '+' left is a space
    let query = byte_serialize(words.as_bytes())
        .collect::<String>()
        .replace('+', &settings.query_space);
    let base = settings.search_url.replace("{query}", &query);

    if page == 0 {
        base
    } else {
        let separator = if base.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}",
            base,
            separator,
            settings.offset_param,
            page * settings.results_per_page
        )
    }
}

/// Absolute, fragment-free form of a listing link.
pub fn canonical_url(page_url: &str, href: &str, strip_query: bool) -> Result<String> {
    let mut url = Url::parse(page_url)?.join(href.trim())?;
    url.set_fragment(None);
    if strip_query {
        url.set_query(None);
    }
    Ok(url.to_string())
}
