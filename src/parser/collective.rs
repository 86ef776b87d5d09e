//! Collective pages (`/collectives-all`, `/collectives/{slug}`, tag pages)

use super::{decode_cfemail, page_count, select_all, select_first, text_of, Chain};
use crate::model::ExternalLink;
use crate::Result;
use scraper::{ElementRef, Html};

const CARDS: &str = ".flex--item.s-card.bs-sm.mb12.py16.fc-black-500";
const HEADER: Chain = Chain::new("community_header", &["#community-header"]);
const NAME: Chain = Chain::new("name", &[".mb2"]);
const SLUG: Chain = Chain::new("slug", &[".js-join-community[data-slug]", "[data-slug]"]);
const DESCRIPTION: Chain = Chain::new("description", &[".wmx7"]);
const LINKS: &str = ".flex--item.ml-auto[class~=\"md:d-none\"] .s-link.s-link__inherit.ml12";

/// The header of one collective's page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectivePage {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub external_links: Vec<ExternalLink>,
    /// Link to the paged tag list, when the header has one
    pub tags_href: Option<String>,
    /// Tags shown in the header itself
    pub header_tags: Vec<String>,
}

/// One page of a collective's tag list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPage {
    pub tags: Vec<String>,
    pub page_count: u32,
}

/// Links to every collective on `/collectives-all`
pub fn parse_collective_cards(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);

    let mut hrefs = Vec::new();
    for card in select_all(document.root_element(), CARDS)? {
        let href = select_first(card, ".js-gps-track[href]")?
            .and_then(|a| a.value().attr("href"))
            .or_else(|| card.value().attr("href"));
        if let Some(href) = href {
            hrefs.push(href.to_string());
        }
    }
    Ok(hrefs)
}

/// Extracts a collective's name, slug, description and links
pub fn parse_collective_page(html: &str) -> Result<CollectivePage> {
    let document = Html::parse_document(html);
    let header = HEADER.first(document.root_element())?;

    let name = text_of(NAME.first(header)?)
        .replace("Collective", "")
        .trim()
        .to_string();

    let external_links = select_all(header, LINKS)?
        .into_iter()
        .map(external_link)
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    Ok(CollectivePage {
        name,
        slug: SLUG.attr(header, "data-slug")?.to_string(),
        description: text_of(DESCRIPTION.first(header)?),
        external_links,
        tags_href: select_first(header, ".ml4.ws-nowrap[href]")?
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string),
        header_tags: select_all(header, ".post-tag")?.into_iter().map(text_of).collect(),
    })
}

/// Extracts one page of a collective's tag list
pub fn parse_tag_page(html: &str) -> Result<TagPage> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    Ok(TagPage {
        tags: select_all(root, ".post-tag")?.into_iter().map(text_of).collect(),
        page_count: page_count(root, ".s-pagination--item")?,
    })
}

/// Type and target of one header link; `None` for links without a target
fn external_link(link: ElementRef<'_>) -> Result<Option<ExternalLink>> {
    let Some(href) = link.value().attr("href") else {
        return Ok(None);
    };

    let target = if href.contains("email-protection") {
        let encoded = href.rsplit('#').next().unwrap_or_default();
        match decode_cfemail(encoded) {
            Some(address) => format!("mailto:{}", address),
            None => href.to_string(),
        }
    } else {
        href.to_string()
    };

    let label = match select_first(link, ".d-none")? {
        Some(hidden) => text_of(hidden),
        None => text_of(link),
    };
    let kind = if label == "Contact" {
        "support".to_string()
    } else {
        label.to_lowercase()
    };

    Ok(Some(ExternalLink { kind, link: target }))
}
