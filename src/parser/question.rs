//! Question detail page (`/questions/{id}`)

use super::{
    clean_title, digits_only, parse_count, parse_timestamp, post_body, script_number, select_all,
    select_first, text_of, Chain,
};
use crate::{Result, ScrapeError};
use scraper::{ElementRef, Html};

const TITLE: Chain = Chain::new(
    "title",
    &["#question-header .question-hyperlink", "#question-header h1 a"],
);
const TAGS: Chain = Chain::new(
    "tags",
    &["#question .js-post-tag-list-item", "#question .post-tag"],
);
const QUESTION_ID: Chain = Chain::new("question_id", &["#question[data-questionid]"]);
const SCORE: Chain = Chain::new(
    "score",
    &[
        "#question .js-vote-count.fs-subheading",
        "#question .js-vote-count.fs-title",
        "#question .js-vote-count",
    ],
);
const ANSWER_COUNT: Chain = Chain::new(
    "answer_count",
    &["#answers-header [data-answercount]", "#answers [data-answercount]"],
);
const VIEWS: Chain = Chain::new(
    "view_count",
    &[".flex--item.ws-nowrap.mb8[title]", "[title^=\"Viewed\"]"],
);
const CREATED: Chain = Chain::new(
    "creation_date",
    &["time[itemprop=\"dateCreated\"][datetime]", "time[datetime]"],
);
const ACTIVITY: Chain = Chain::new(
    "last_activity_date",
    &[
        "a.s-link.s-link__inherit[href*=\"lastactivity\"][title]",
        ".s-link.s-link__inherit[title]",
    ],
);
const BODY: Chain = Chain::new(
    "body",
    &["#question .s-prose.js-post-body", "#question .js-post-body"],
);

/// An open bounty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounty {
    pub closes_date: i64,
    pub amount: Option<i64>,
}

/// Everything the question page itself says about the question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPage {
    pub question_id: i64,
    pub title: String,
    /// Permalink as found on the page (usually site-relative)
    pub href: String,
    pub tags: Vec<String>,
    pub score: i64,
    pub answer_count: i64,
    pub accepted_answer_id: Option<i64>,
    pub is_answered: bool,
    pub view_count: i64,
    pub creation_date: i64,
    pub last_activity_date: i64,
    /// Equal to `creation_date` when the question was never edited
    pub last_edit_date: i64,
    pub is_wiki: bool,
    pub bounty: Option<Bounty>,
    pub body: Option<String>,
}

/// Extracts a question from its detail page
///
/// # Arguments
///
/// * `html` - The question page
/// * `with_body` - Also extract the post body
pub fn parse_question_page(html: &str, with_body: bool) -> Result<QuestionPage> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let question_id = question_id(root)?;

    let title_link = TITLE.first(root)?;
    let title = clean_title(&text_of(title_link));
    let href = title_link
        .value()
        .attr("href")
        .ok_or_else(|| TITLE.missing())?
        .to_string();

    let tags = TAGS.all(root)?.into_iter().map(text_of).collect();
    let score = parse_count("score", &text_of(SCORE.first(root)?))?;
    let (answer_count, accepted_answer_id, is_answered) = answer_stats(root)?;

    let views = digits_only(VIEWS.attr(root, "title")?);
    let view_count = views
        .parse()
        .map_err(|_| ScrapeError::number("view_count", views.as_str()))?;

    let creation_date = parse_timestamp(CREATED.attr(root, "datetime")?)?;
    let last_activity_date = parse_timestamp(ACTIVITY.attr(root, "title")?)?;
    let last_edit_date = edit_date(root)?.unwrap_or(creation_date);

    let is_wiki = select_first(root, "#question .community-wiki")?.is_some();
    let bounty = bounty(root)?;

    let body = if with_body {
        Some(post_body(BODY.first(root)?)?)
    } else {
        None
    };

    Ok(QuestionPage {
        question_id,
        title,
        href,
        tags,
        score,
        answer_count,
        accepted_answer_id,
        is_answered,
        view_count,
        creation_date,
        last_activity_date,
        last_edit_date,
        is_wiki,
        bounty,
        body,
    })
}

/// Extracts only the id of the question a page shows
///
/// A requested id that was merged or migrated resolves to a page for a
/// different id.
pub fn parse_question_id(html: &str) -> Result<i64> {
    let document = Html::parse_document(html);
    question_id(document.root_element())
}

/// Extracts only the number of answers
pub fn parse_answer_count(html: &str) -> Result<i64> {
    let document = Html::parse_document(html);
    Ok(answer_stats(document.root_element())?.0)
}

fn question_id(root: ElementRef<'_>) -> Result<i64> {
    if let Some(id) = script_number(root, "StackExchange.question.init", "questionId")? {
        return Ok(id);
    }

    let value = QUESTION_ID.attr(root, "data-questionid").map_err(|_| {
        let mut missing = QUESTION_ID.missing();
        missing
            .tried
            .insert(0, "script StackExchange.question.init".to_string());
        ScrapeError::from(missing)
    })?;
    parse_count("question_id", value)
}

/// (answer count, accepted answer id, is answered)
///
/// A question counts as answered when it has an accepted answer or its top
/// answer has a positive score.
fn answer_stats(root: ElementRef<'_>) -> Result<(i64, Option<i64>, bool)> {
    let Some(answers) = select_first(root, "#answers")? else {
        return Ok((0, None, false));
    };

    let count = parse_count("answer_count", ANSWER_COUNT.attr(root, "data-answercount")?)?;

    let accepted = select_first(answers, ".accepted-answer[data-answerid]")?
        .and_then(|el| el.value().attr("data-answerid"))
        .map(|id| parse_count("accepted_answer_id", id))
        .transpose()?;

    let is_answered = match accepted {
        Some(_) => true,
        None => match select_first(answers, ".js-vote-count")? {
            Some(vote) => parse_count("answer_score", &text_of(vote))? > 0,
            None => false,
        },
    };

    Ok((count, accepted, is_answered))
}

/// Date of the "edited" signature on the question, if any
fn edit_date(root: ElementRef<'_>) -> Result<Option<i64>> {
    for action in select_all(root, "#question .user-action-time")? {
        if !text_of(action).to_lowercase().starts_with("edited") {
            continue;
        }
        if let Some(title) = select_first(action, "span[title]")?.and_then(|s| s.value().attr("title")) {
            return parse_timestamp(title).map(Some);
        }
    }
    Ok(None)
}

fn bounty(root: ElementRef<'_>) -> Result<Option<Bounty>> {
    if select_first(root, ".svg-icon.iconClock")?.is_none() {
        return Ok(None);
    }

    for banner in select_all(root, ".flex--item.fl1.lh-lg")? {
        let Some(bold) = select_first(banner, "b")? else {
            continue;
        };
        let (Some(link), Some(until)) = (select_first(bold, "a")?, select_first(bold, "span[title]")?)
        else {
            continue;
        };
        if text_of(link) != "bounty" {
            continue;
        }

        let closes_date = match until.value().attr("title") {
            Some(title) => parse_timestamp(title)?,
            None => continue,
        };
        let amount = select_first(banner, ".s-badge__bounty")?
            .map(|badge| parse_count("bounty_amount", &text_of(badge)))
            .transpose()?;

        return Ok(Some(Bounty {
            closes_date,
            amount,
        }));
    }

    Ok(None)
}
