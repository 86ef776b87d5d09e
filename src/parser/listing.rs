//! Question listing pages (`/questions`, `/questions/tagged/...`, home tabs)

use super::{digits_only, page_count, select_all, select_first, Chain};
use crate::Result;
use scraper::Html;

const CONTAINER: Chain = Chain::new(
    "questions",
    &["#questions", "#question-mini-list", ".flush-left.js-search-results"],
);
const SUMMARY_LINK: &str = ".s-post-summary--content-title a[href]";
const TOTAL: &str = ".fs-body3.flex--item.fl1.mr12";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    /// Permalinks of the summary cards, in page order
    pub question_hrefs: Vec<String>,
    pub page_count: u32,
}

/// Extracts the summary cards of a listing page
pub fn parse_listing(html: &str) -> Result<ListingPage> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let container = CONTAINER.first(root)?;

    let mut question_hrefs = Vec::new();
    for card in select_all(container, ".js-post-summary")? {
        let href = select_first(card, SUMMARY_LINK)?.and_then(|a| a.value().attr("href"));
        if let Some(href) = href {
            question_hrefs.push(href.to_string());
        }
    }

    Ok(ListingPage {
        question_hrefs,
        page_count: page_count(root, ".s-pagination--item.js-pagination-item")?,
    })
}

/// The "N questions" counter above a listing, if shown
pub fn parse_total_questions(html: &str) -> Result<Option<i64>> {
    let document = Html::parse_document(html);
    let Some(counter) = select_first(document.root_element(), TOTAL)? else {
        return Ok(None);
    };
    let digits = digits_only(&counter.text().collect::<String>());
    Ok(digits.parse().ok())
}
