//! Markup extractors
//!
//! Every extractor takes the page text, parses it, and returns owned data, so
//! no parsed document is ever held across an await point. Fields are looked up
//! through `Chain`s: an ordered list of selectors tried until one matches.

mod answer;
mod collective;
mod listing;
mod normalize;
mod profile;
mod question;
mod timeline;

pub use answer::{find_answer, parse_answer_page, AnswerCard, AnswerPage};
pub use collective::{
    parse_collective_cards, parse_collective_page, parse_tag_page, CollectivePage, TagPage,
};
pub use listing::{parse_listing, parse_total_questions, ListingPage};
pub use normalize::{clean_title, decode_cfemail, digits_only, parse_count, parse_timestamp};
pub use profile::{migrated_user_link, parse_profile, stack_overflow_profile_link, Profile};
pub use question::{parse_answer_count, parse_question_id, parse_question_page, Bounty, QuestionPage};
pub use timeline::{
    parse_timeline, AnswerTimeline, EventKind, MigrationEvent, OwnerLink, QuestionTimeline,
    TimelineEvent, TimelinePage,
};

use crate::{MissingFieldError, Result, ScrapeError};
use regex::Regex;
use scraper::{ElementRef, Selector};

/// Ordered selectors for one field
#[derive(Debug, Clone, Copy)]
pub struct Chain {
    field: &'static str,
    selectors: &'static [&'static str],
}

impl Chain {
    pub const fn new(field: &'static str, selectors: &'static [&'static str]) -> Self {
        Self { field, selectors }
    }

    /// First element matched by the first selector that matches anything
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Result<ElementRef<'a>> {
        self.probe(scope)?.ok_or_else(|| self.missing().into())
    }

    /// Like `first`, but a match must carry `attr`; returns its value
    pub fn attr<'a>(&self, scope: ElementRef<'a>, attr: &str) -> Result<&'a str> {
        for css in self.selectors {
            let sel = selector(css)?;
            if let Some(value) = scope.select(&sel).find_map(|el| el.value().attr(attr)) {
                return Ok(value);
            }
        }
        Err(self.missing().into())
    }

    /// Every element matched by the first selector that matches anything
    pub fn all<'a>(&self, scope: ElementRef<'a>) -> Result<Vec<ElementRef<'a>>> {
        for css in self.selectors {
            let sel = selector(css)?;
            let found: Vec<_> = scope.select(&sel).collect();
            if !found.is_empty() {
                return Ok(found);
            }
        }
        Err(self.missing().into())
    }

    /// Optional lookup; only an unparsable selector is an error
    pub fn probe<'a>(&self, scope: ElementRef<'a>) -> Result<Option<ElementRef<'a>>> {
        for css in self.selectors {
            let sel = selector(css)?;
            if let Some(el) = scope.select(&sel).next() {
                return Ok(Some(el));
            }
        }
        Ok(None)
    }

    pub fn missing(&self) -> MissingFieldError {
        MissingFieldError {
            field: self.field,
            tried: self.selectors.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Parses a CSS selector
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScrapeError::selector(css, e))
}

/// All elements under `scope` matching `css`
pub(crate) fn select_all<'a>(scope: ElementRef<'a>, css: &str) -> Result<Vec<ElementRef<'a>>> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).collect())
}

/// First element under `scope` matching `css`
pub(crate) fn select_first<'a>(scope: ElementRef<'a>, css: &str) -> Result<Option<ElementRef<'a>>> {
    let sel = selector(css)?;
    Ok(scope.select(&sel).next())
}

/// Element text with runs of whitespace collapsed
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

/// Number of pages announced by a pagination bar (the second-to-last item)
pub(crate) fn page_count(scope: ElementRef<'_>, css: &str) -> Result<u32> {
    let items = select_all(scope, css)?;
    if items.len() < 2 {
        return Ok(1);
    }
    Ok(text_of(items[items.len() - 2]).parse::<u32>().unwrap_or(1).max(1))
}

/// Number assigned to `key` inside the first inline script containing `marker`
///
/// Used for the `StackExchange.question.init({ questionId: 123 })` style
/// initialisers.
pub(crate) fn script_number(scope: ElementRef<'_>, marker: &str, key: &str) -> Result<Option<i64>> {
    let pattern = format!(r"{}\s*:\s*(\d+)", regex::escape(key));
    let re = Regex::new(&pattern).map_err(|e| ScrapeError::selector(pattern.as_str(), e))?;

    for script in select_all(scope, "script")? {
        let text: String = script.text().collect();
        if !text.contains(marker) {
            continue;
        }
        if let Some(caps) = re.captures(&text) {
            return Ok(caps[1].parse().ok());
        }
    }
    Ok(None)
}

/// Inner HTML of a post body with nested `div`s removed and protected
/// e-mail addresses decoded
pub(crate) fn post_body(body: ElementRef<'_>) -> Result<String> {
    let mut html = body.inner_html();

    for div in select_all(body, "div")? {
        let outer = div.html();
        if let Some(at) = html.find(&outer) {
            html.replace_range(at..at + outer.len(), "");
        }
    }

    for protected in select_all(body, ".__cf_email__[data-cfemail]")? {
        let decoded = protected
            .value()
            .attr("data-cfemail")
            .and_then(decode_cfemail);
        if let Some(address) = decoded {
            html = html.replacen(&protected.html(), &address, 1);
        }
    }

    Ok(html.trim_start().to_string())
}
