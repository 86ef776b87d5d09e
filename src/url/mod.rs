//! URL handling module for Stack-Scrape
//!
//! Builds every page URL the scraper visits from the configured site root,
//! and resolves the relative links found in scraped markup.

mod domain;

use crate::query::SortOrder;
use url::Url;

pub use domain::{first_numeric_segment, migration_site_url};

/// Page size requested from the site's own listing pages
const LISTING_PAGE_SIZE: &str = "30";

/// URL builder for one scraped site
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
}

impl SiteUrls {
    /// Creates a builder rooted at `base_url` (e.g. `https://stackoverflow.com`)
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base: Url::parse(base_url)?,
        })
    }

    /// Resolves a link found on a page of this site
    ///
    /// Absolute links are returned unchanged; anything that cannot be resolved
    /// is returned as-is.
    pub fn absolute(&self, href: &str) -> String {
        self.base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }

    /// `/questions/{id}`; the site also resolves answer ids through this path
    pub fn question(&self, id: i64) -> String {
        self.at_path(&format!("/questions/{}", id)).to_string()
    }

    /// `/questions/{id}?page=N`, the N-th page of a question's answers
    pub fn question_page(&self, id: i64, page: u32) -> String {
        let mut url = self.at_path(&format!("/questions/{}", id));
        if page > 1 {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        url.to_string()
    }

    /// `/posts/{id}/timeline`
    pub fn timeline(&self, post_id: i64) -> String {
        self.at_path(&format!("/posts/{}/timeline", post_id))
            .to_string()
    }

    /// `/collectives-all`
    pub fn collectives_all(&self) -> String {
        self.at_path("/collectives-all").to_string()
    }

    /// The listing page matching a sort order and tag filter
    ///
    /// `hot`, `week` and `month` are the home page tabs and ignore tags;
    /// the other orders map to the `/questions` tabs.
    pub fn listing(&self, sort: SortOrder, tagged: &[String]) -> String {
        let tab = match sort {
            SortOrder::Hot | SortOrder::Week | SortOrder::Month => {
                let mut url = self.at_path("/");
                url.query_pairs_mut().append_pair("tab", sort.as_str());
                return url.to_string();
            }
            SortOrder::Activity => "active",
            SortOrder::Creation => "newest",
            SortOrder::Votes => "votes",
        };

        let mut url = if tagged.is_empty() {
            self.at_path("/questions")
        } else {
            self.at_path(&format!("/questions/tagged/{}", tagged.join("+")))
        };
        url.query_pairs_mut()
            .append_pair("pagesize", LISTING_PAGE_SIZE)
            .append_pair("tab", tab);
        url.to_string()
    }

    fn at_path(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url.set_fragment(None);
        url
    }
}

/// Appends `page=N` to an already-built page URL
pub fn with_page(url: &str, page: u32) -> Result<String, url::ParseError> {
    let mut url = Url::parse(url)?;
    url.query_pairs_mut().append_pair("page", &page.to_string());
    Ok(url.to_string())
}
