//! User profile pages, and the pages walked to find the profile of a
//! migrated post's owner

use super::{parse_count, script_number, select_all, select_first, text_of, Chain};
use crate::model::UserType;
use crate::{MissingFieldError, Result};
use scraper::{ElementRef, Html};

const REPUTATION: Chain = Chain::new(
    "reputation",
    &["#stats .fs-body3.fc-black-600", "#stats .fs-body3"],
);
const AVATAR: Chain = Chain::new(
    "profile_image",
    &[".bar-sm.bar-md.d-block[src]", "img.s-avatar--image[src]"],
);
const DISPLAY_NAME: Chain = Chain::new("display_name", &[".lh-xs"]);
const USER_CARD_LINK: &str = ".d-flex.p4.ai-center.gs4.bg-blue-100 .s-user-card--link.lh-lg[href]";
const COMMUNITIES: &str = "[class~=\"md:order-last\"] .s-card.bar-md .pr4";

/// What a profile page says about its user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub user_id: i64,
    pub account_id: i64,
    pub reputation: i64,
    pub user_type: UserType,
    pub profile_image: String,
    /// Name in the profile header
    pub display_name: Option<String>,
    /// `<link rel="canonical">`
    pub canonical_link: Option<String>,
}

/// Extracts a user profile
pub fn parse_profile(html: &str) -> Result<Profile> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let user_id = user_init(root, "userId", "user_id")?;
    let account_id = user_init(root, "accountId", "account_id")?;
    let reputation = parse_count("reputation", &text_of(REPUTATION.first(root)?))?;

    let user_type = if select_first(root, ".s-badge__moderator")?.is_some() {
        UserType::Moderator
    } else if select_first(root, ".s-badge__votes")?
        .is_some_and(|badge| text_of(badge).eq_ignore_ascii_case("unregistered"))
    {
        UserType::Unregistered
    } else {
        UserType::Registered
    };

    let profile_image = AVATAR.attr(root, "src")?.to_string();
    let display_name = DISPLAY_NAME.probe(root)?.map(text_of);
    let canonical_link = select_first(root, "link[rel=\"canonical\"][href]")?
        .and_then(|link| link.value().attr("href"))
        .map(str::to_string);

    Ok(Profile {
        user_id,
        account_id,
        reputation,
        user_type,
        profile_image,
        display_name,
        canonical_link,
    })
}

fn user_init(root: ElementRef<'_>, key: &str, field: &'static str) -> Result<i64> {
    script_number(root, "StackExchange.user.init", key)?.ok_or_else(|| {
        MissingFieldError {
            field,
            tried: vec![format!("script StackExchange.user.init {}", key)],
        }
        .into()
    })
}

/// Profile link of the author on a revision page of another site
pub fn migrated_user_link(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    Ok(select_first(document.root_element(), USER_CARD_LINK)?
        .and_then(|link| link.value().attr("href"))
        .map(str::to_string))
}

/// Link to the Stack Overflow profile listed among a user's communities
pub fn stack_overflow_profile_link(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);

    for community in select_all(document.root_element(), COMMUNITIES)? {
        let is_stack_overflow = select_first(community, ".truncate")?
            .is_some_and(|name| text_of(name) == "Stack Overflow");
        if !is_stack_overflow {
            continue;
        }

        let href = community
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.value().attr("href"));
        if let Some(href) = href {
            return Ok(Some(href.to_string()));
        }
    }

    Ok(None)
}
