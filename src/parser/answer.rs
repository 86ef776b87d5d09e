//! Answer cards on a question page

use super::{has_class, page_count, parse_count, parse_timestamp, post_body, select_all, select_first, Chain};
use crate::{MissingFieldError, Result};
use scraper::{ElementRef, Html};

const CARDS: Chain = Chain::new("answers", &["#answers .js-answer", ".answer[data-answerid]"]);
const BODY: Chain = Chain::new("body", &[".s-prose.js-post-body", ".js-post-body"]);
const COLLECTIVE_LINKS: &str = ".s-link.s-link__inherit.js-gps-track[href*=\"/collectives/\"]";

/// One answer as shown on its question's page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerCard {
    pub answer_id: i64,
    pub question_id: i64,
    pub score: i64,
    pub is_accepted: bool,
    pub last_edit_date: Option<i64>,
    pub is_wiki: bool,
    /// Collective page of a collective that recommends this answer
    pub recommendation_href: Option<String>,
    /// Collective pages of the collectives the answer was posted by
    pub collective_hrefs: Vec<String>,
    pub body: Option<String>,
}

/// One page of a question's answers
#[derive(Debug)]
pub struct AnswerPage {
    /// Each card parsed on its own; a malformed card does not spoil the rest
    pub cards: Vec<Result<AnswerCard>>,
    pub page_count: u32,
}

/// Extracts every answer card on a question page
pub fn parse_answer_page(html: &str, with_body: bool) -> Result<AnswerPage> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let cards = match CARDS.probe(root)? {
        Some(_) => CARDS
            .all(root)?
            .into_iter()
            .map(|el| answer_card(el, with_body))
            .collect(),
        None => Vec::new(),
    };

    Ok(AnswerPage {
        cards,
        page_count: page_count(root, ".s-pagination--item")?,
    })
}

/// Extracts the card of one answer, if the page shows it
///
/// The site serves `/questions/{answer_id}` as the parent question's page, so
/// this is how single answers are looked up.
pub fn find_answer(html: &str, answer_id: i64, with_body: bool) -> Result<Option<AnswerCard>> {
    let document = Html::parse_document(html);
    select_first(document.root_element(), &format!("#answer-{}", answer_id))?
        .map(|el| answer_card(el, with_body))
        .transpose()
}

fn data_attr(el: ElementRef<'_>, field: &'static str, name: &str) -> Result<i64> {
    let value = el.value().attr(name).ok_or_else(|| MissingFieldError {
        field,
        tried: vec![format!("[{}]", name)],
    })?;
    parse_count(field, value)
}

fn answer_card(el: ElementRef<'_>, with_body: bool) -> Result<AnswerCard> {
    let answer_id = data_attr(el, "answer_id", "data-answerid")?;
    let question_id = data_attr(el, "question_id", "data-parentid")?;
    let score = data_attr(el, "score", "data-score")?;

    let is_accepted = match select_first(el, ".js-accepted-answer-indicator")? {
        Some(indicator) => !has_class(indicator, "d-none"),
        None => has_class(el, "accepted-answer"),
    };

    let last_edit_date = select_first(el, ".user-action-time .js-gps-track .relativetime[title]")?
        .and_then(|time| time.value().attr("title"))
        .map(parse_timestamp)
        .transpose()?;

    let is_wiki = select_first(el, ".community-wiki")?.is_some();

    let recommendation_href = match select_first(el, ".fc-theme-primary")? {
        Some(_) => select_first(el, ".fc-theme-primary a[href*=\"/collectives/\"]")?
            .or(select_first(el, "a.js-gps-track[href*=\"/collectives/\"]")?)
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string),
        None => None,
    };

    let mut collective_hrefs: Vec<String> = Vec::new();
    for link in select_all(el, COLLECTIVE_LINKS)? {
        let inside_recommendation = link
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|parent| has_class(parent, "fc-theme-primary"));
        if inside_recommendation {
            continue;
        }
        if let Some(href) = link.value().attr("href") {
            if !collective_hrefs.iter().any(|seen| seen == href) {
                collective_hrefs.push(href.to_string());
            }
        }
    }

    let body = if with_body {
        Some(post_body(BODY.first(el)?)?)
    } else {
        None
    };

    Ok(AnswerCard {
        answer_id,
        question_id,
        score,
        is_accepted,
        last_edit_date,
        is_wiki,
        recommendation_href,
        collective_hrefs,
        body,
    })
}
