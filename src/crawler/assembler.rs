//! Multi-hop record assembly
//!
//! One question or answer is spread over several pages: its detail page, its
//! timeline, the owner's profile and, for answers, collective pages. The
//! assembler walks those hops for a single entity and folds the extracted
//! values into a record. Each hop is traced through a `StageTracker`.

use crate::crawler::fetcher::PageSource;
use crate::model::{
    distinct_edit_date, Answer, Collective, MigrationInfo, OtherSite, Owner, Question,
    Recommendation, RegisteredOwner,
};
use crate::parser::{
    find_answer, migrated_user_link, parse_answer_page, parse_collective_page, parse_profile,
    parse_question_id, parse_question_page, parse_tag_page, parse_timeline,
    stack_overflow_profile_link, AnswerCard, Profile, QuestionPage, TimelinePage,
};
use crate::state::{AssemblyStage, StageTracker};
use crate::url::{with_page, SiteUrls};
use crate::{MissingFieldError, Result};
use std::sync::Arc;
use url::Url;

/// Builds records by following the pages each one is spread over
#[derive(Clone)]
pub struct Assembler {
    source: Arc<dyn PageSource>,
    urls: SiteUrls,
}

impl Assembler {
    pub fn new(source: Arc<dyn PageSource>, urls: SiteUrls) -> Self {
        Self { source, urls }
    }

    pub fn urls(&self) -> &SiteUrls {
        &self.urls
    }

    /// Fetches one page through the page source
    pub async fn fetch(&self, url: &str) -> Result<String> {
        Ok(self.source.fetch(url).await?)
    }

    /// Assembles the question behind a listing card's permalink
    pub async fn question_from_listing(&self, href: &str, with_body: bool) -> Result<Question> {
        let mut tracker = StageTracker::new(format!("question {}", href), AssemblyStage::Listing);

        let outcome = async {
            let html = self.fetch(&self.urls.absolute(href)).await?;
            tracker.advance(AssemblyStage::Detail)?;
            let page = parse_question_page(&html, with_body)?;
            self.build_question(page, &mut tracker).await
        }
        .await;

        fail_on_error(&mut tracker, outcome)
    }

    /// Assembles the question with the given id
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Question))` - The question was assembled
    /// * `Ok(None)` - The id resolves to a page for a different question
    ///   (merged, duplicate or migrated); the record is discarded
    /// * `Err(ScrapeError)` - A hop failed
    pub async fn question_by_id(&self, id: i64, with_body: bool) -> Result<Option<Question>> {
        let mut tracker = StageTracker::new(format!("question {}", id), AssemblyStage::Detail);

        let outcome = async {
            let html = self.fetch(&self.urls.question(id)).await?;

            let resolved = parse_question_id(&html)?;
            if resolved != id {
                tracing::debug!("Question {} resolves to {}, discarding", id, resolved);
                tracker.advance(AssemblyStage::Discarded)?;
                return Ok(None);
            }

            let page = parse_question_page(&html, with_body)?;
            self.build_question(page, &mut tracker).await.map(Some)
        }
        .await;

        fail_on_error(&mut tracker, outcome)
    }

    /// Timeline and owner hops shared by both question entry points
    async fn build_question(
        &self,
        page: QuestionPage,
        tracker: &mut StageTracker,
    ) -> Result<Question> {
        tracker.advance(AssemblyStage::Timeline)?;
        let html = self.fetch(&self.urls.timeline(page.question_id)).await?;
        let timeline = parse_timeline(&html)?;
        let summary = timeline.question_summary(page.is_wiki, page.creation_date);

        tracker.advance(AssemblyStage::Owner)?;
        let migration_link = summary
            .migration
            .as_ref()
            .and_then(|migration| migration.revision_link.as_deref());
        let owner = self.resolve_owner(&timeline, migration_link).await?;

        if page.body.is_some() {
            tracker.advance(AssemblyStage::BodyExtraction)?;
        }
        tracker.advance(AssemblyStage::Assembled)?;

        let migrated_from = summary.migration.map(|migration| MigrationInfo {
            other_site: OtherSite {
                site_url: migration.site_url,
            },
            on_date: migration.on_date,
            question_id: migration.question_id,
        });

        Ok(Question {
            tags: page.tags,
            migrated_from,
            owner,
            is_answered: page.is_answered,
            view_count: page.view_count,
            bounty_amount: page.bounty.as_ref().and_then(|bounty| bounty.amount),
            bounty_closes_date: page.bounty.as_ref().map(|bounty| bounty.closes_date),
            protected_date: summary.protected_date,
            closed_date: summary.closed_date,
            accepted_answer_id: page.accepted_answer_id,
            answer_count: page.answer_count,
            community_owned_date: summary.community_owned_date,
            score: page.score,
            locked_date: summary.locked_date,
            last_activity_date: page.last_activity_date,
            creation_date: page.creation_date,
            last_edit_date: distinct_edit_date(page.creation_date, Some(page.last_edit_date)),
            question_id: page.question_id,
            content_license: summary.content_license,
            link: self.urls.absolute(&page.href),
            closed_reason: summary.closed_reason,
            title: page.title,
            body: page.body,
        })
    }

    /// Works out who owns a post from its timeline
    ///
    /// * A profile link is followed and read.
    /// * Without one, a migrated post's owner is looked up on the source site;
    ///   if that fails the timeline name is kept.
    /// * Otherwise the account no longer exists.
    pub async fn resolve_owner(
        &self,
        timeline: &TimelinePage,
        migration_link: Option<&str>,
    ) -> Result<Owner> {
        if let Some(owner) = &timeline.owner {
            let link = self.urls.absolute(&owner.href);
            let profile = parse_profile(&self.fetch(&link).await?)?;

            let display_name = if owner.name.is_empty() {
                profile.display_name.clone().unwrap_or_default()
            } else {
                owner.name.clone()
            };
            return Ok(Owner::Registered(registered(profile, display_name, link)));
        }

        let display_name = timeline.author_name().ok_or_else(|| MissingFieldError {
            field: "owner",
            tried: vec![".owner".to_string(), "asked/answered row".to_string()],
        })?;

        let Some(link) = migration_link else {
            return Ok(Owner::DoesNotExist { display_name });
        };

        match self.follow_migration(link).await {
            Ok(Some(owner)) => Ok(Owner::Registered(owner)),
            Ok(None) => Ok(Owner::NameOnly { display_name }),
            Err(e) => {
                let owner = Owner::NameOnly { display_name };
                tracing::warn!(
                    "Owner lookup through {} failed, keeping '{}': {}",
                    link,
                    owner.display_name(),
                    e
                );
                Ok(owner)
            }
        }
    }

    /// Revision page on the source site, then the author's profile there,
    /// then their Stack Overflow profile
    ///
    /// `Ok(None)` when one of the pages lacks the link to the next hop.
    async fn follow_migration(&self, revision_link: &str) -> Result<Option<RegisteredOwner>> {
        let revision_url = Url::parse(revision_link)?;
        let revision = self.fetch(revision_url.as_str()).await?;
        let Some(user_href) = migrated_user_link(&revision)? else {
            return Ok(None);
        };

        let user_url = revision_url.join(&user_href)?;
        let user_page = self.fetch(user_url.as_str()).await?;
        let Some(profile_href) = stack_overflow_profile_link(&user_page)? else {
            return Ok(None);
        };

        let profile_url = user_url.join(&profile_href)?;
        let profile = parse_profile(&self.fetch(profile_url.as_str()).await?)?;

        let Some(display_name) = profile.display_name.clone() else {
            return Ok(None);
        };
        let link = profile
            .canonical_link
            .clone()
            .unwrap_or_else(|| profile_url.to_string());
        Ok(Some(registered(profile, display_name, link)))
    }

    /// Every answer card on every page of a question's answers
    ///
    /// Cards that fail to parse, and cards whose parent is a different
    /// question, are skipped. A later page that cannot be fetched ends the
    /// walk with what was collected so far.
    pub async fn answer_cards(&self, question_id: i64, with_body: bool) -> Result<Vec<AnswerCard>> {
        let first = parse_answer_page(
            &self.fetch(&self.urls.question_page(question_id, 1)).await?,
            with_body,
        )?;

        let mut pages = vec![first.cards];
        for n in 2..=first.page_count {
            let url = self.urls.question_page(question_id, n);
            let page = match self.fetch(&url).await {
                Ok(html) => parse_answer_page(&html, with_body),
                Err(e) => Err(e),
            };
            match page {
                Ok(page) => pages.push(page.cards),
                Err(e) => {
                    tracing::warn!("Stopping answer walk of {} at page {}: {}", question_id, n, e);
                    break;
                }
            }
        }

        let mut cards = Vec::new();
        for card in pages.into_iter().flatten() {
            match card {
                Ok(card) if card.question_id == question_id => cards.push(card),
                Ok(card) => {
                    tracing::debug!(
                        "Answer {} belongs to question {}, skipping",
                        card.answer_id,
                        card.question_id
                    );
                }
                Err(e) => tracing::warn!("Skipping answer on question {}: {}", question_id, e),
            }
        }
        Ok(cards)
    }

    /// Looks up one answer by id
    ///
    /// The site serves `/questions/{answer_id}` as the parent question's page.
    pub async fn answer_card(&self, answer_id: i64, with_body: bool) -> Result<Option<AnswerCard>> {
        let html = self.fetch(&self.urls.question(answer_id)).await?;
        find_answer(&html, answer_id, with_body)
    }

    /// Assembles an answer from its card
    pub async fn answer(&self, card: AnswerCard) -> Result<Answer> {
        let mut tracker = StageTracker::new(format!("answer {}", card.answer_id), AssemblyStage::Detail);
        let outcome = self.build_answer(card, &mut tracker).await;
        fail_on_error(&mut tracker, outcome)
    }

    async fn build_answer(&self, card: AnswerCard, tracker: &mut StageTracker) -> Result<Answer> {
        tracker.advance(AssemblyStage::Timeline)?;
        let html = self.fetch(&self.urls.timeline(card.answer_id)).await?;
        let timeline = parse_timeline(&html)?;
        let summary = timeline.answer_summary(card.is_wiki, card.recommendation_href.is_some());

        tracker.advance(AssemblyStage::Owner)?;
        let owner = self.resolve_owner(&timeline, None).await?;

        let creation_date = summary.creation_date.ok_or_else(|| MissingFieldError {
            field: "creation_date",
            tried: vec!["answered row".to_string()],
        })?;

        let mut recommendations = Vec::new();
        if let Some(href) = &card.recommendation_href {
            if let Some(collective) = self.optional_collective(href).await {
                recommendations.push(Recommendation {
                    collective,
                    creation_date: summary.recommendation_date,
                });
            }
        }

        let mut posted_by_collectives = Vec::new();
        for href in &card.collective_hrefs {
            if let Some(collective) = self.optional_collective(href).await {
                posted_by_collectives.push(collective);
            }
        }

        if card.body.is_some() {
            tracker.advance(AssemblyStage::BodyExtraction)?;
        }
        tracker.advance(AssemblyStage::Assembled)?;

        Ok(Answer {
            recommendations,
            posted_by_collectives,
            owner,
            is_accepted: card.is_accepted,
            community_owned_date: summary.community_owned_date,
            score: card.score,
            last_activity_date: summary
                .last_activity_date
                .or(card.last_edit_date)
                .unwrap_or(creation_date),
            last_edit_date: distinct_edit_date(creation_date, card.last_edit_date),
            creation_date,
            answer_id: card.answer_id,
            question_id: card.question_id,
            content_license: summary.content_license,
            body: card.body,
        })
    }

    /// A collective an answer points at; a failure drops only that collective
    async fn optional_collective(&self, href: &str) -> Option<Collective> {
        match self.collective(href).await {
            Ok(collective) => Some(collective),
            Err(e) => {
                tracing::warn!("Skipping collective {}: {}", href, e);
                None
            }
        }
    }

    /// Assembles a collective from its page and its tag pages
    pub async fn collective(&self, href: &str) -> Result<Collective> {
        let page = parse_collective_page(&self.fetch(&self.urls.absolute(href)).await?)?;

        let tags = match &page.tags_href {
            Some(tags_href) => self.collective_tags(tags_href).await?,
            None => page.header_tags,
        };

        Ok(Collective {
            tags,
            external_links: page.external_links,
            description: page.description,
            link: href.to_string(),
            name: page.name,
            slug: page.slug,
        })
    }

    /// Walks every page of a collective's tag list
    async fn collective_tags(&self, tags_href: &str) -> Result<Vec<String>> {
        let first_url = self.urls.absolute(tags_href);
        let first = parse_tag_page(&self.fetch(&first_url).await?)?;

        let mut tags = first.tags;
        for n in 2..=first.page_count {
            let url = with_page(&first_url, n)?;
            tags.extend(parse_tag_page(&self.fetch(&url).await?)?.tags);
        }
        Ok(tags)
    }
}

fn registered(profile: Profile, display_name: String, link: String) -> RegisteredOwner {
    RegisteredOwner {
        account_id: profile.account_id,
        reputation: profile.reputation,
        user_id: profile.user_id,
        user_type: profile.user_type,
        profile_image: profile.profile_image,
        display_name,
        link,
    }
}

/// Moves the tracker to `Failed` when assembly errored
fn fail_on_error<T>(tracker: &mut StageTracker, outcome: Result<T>) -> Result<T> {
    if outcome.is_err() && !tracker.stage().is_terminal() {
        tracker.advance(AssemblyStage::Failed)?;
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserType;
    use crate::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Serves canned pages by URL; anything else is a 404
    struct CannedPages(HashMap<String, String>);

    #[async_trait]
    impl PageSource for CannedPages {
        async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| FetchError::status(url, 404))
        }
    }

    fn assembler(pages: &[(&str, &str)]) -> Assembler {
        let pages = pages
            .iter()
            .map(|(url, html)| (url.to_string(), html.to_string()))
            .collect();
        Assembler::new(
            Arc::new(CannedPages(pages)),
            SiteUrls::new("https://stackoverflow.com").unwrap(),
        )
    }

    const PROFILE: &str = r#"<html><head><link rel="canonical" href="https://stackoverflow.com/users/7/ada"></head><body>
<script>StackExchange.user.init({ userId: 7, accountId: 70 });</script>
<img class="bar-sm bar-md d-block" src="https://img/7.png">
<div class="lh-xs">Ada</div>
<div id="stats"><div class="fs-body3 fc-black-600">1,234</div></div>
</body></html>"#;

    fn timeline(owner: &str, rows: &str) -> String {
        format!(
            r#"<html><body><div class="subheader mb16 d-flex fd-column h-auto"><h3><a>CC BY-SA 3.0</a></h3></div>
{owner}
<table class="event-rows fs-body"><tbody>{rows}</tbody></table></body></html>"#
        )
    }

    const ASKED_ROW: &str = r#"<tr><td><span class="relativetime" title="2020-01-01 00:00:00Z"></span></td><td class="wmn1">asked</td><td>Grace</td><td></td></tr>"#;

    #[tokio::test]
    async fn test_owner_with_profile_link() {
        let page = timeline(r#"<a class="owner" href="/users/7/ada">Ada L</a>"#, ASKED_ROW);
        let assembler = assembler(&[("https://stackoverflow.com/users/7/ada", PROFILE)]);

        let owner = assembler
            .resolve_owner(&parse_timeline(&page).unwrap(), None)
            .await
            .unwrap();

        match owner {
            Owner::Registered(owner) => {
                assert_eq!(owner.user_id, 7);
                assert_eq!(owner.account_id, 70);
                assert_eq!(owner.reputation, 1234);
                assert_eq!(owner.user_type, UserType::Registered);
                assert_eq!(owner.display_name, "Ada L");
                assert_eq!(owner.link, "https://stackoverflow.com/users/7/ada");
            }
            other => panic!("expected a registered owner, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_owner_without_link_does_not_exist() {
        let page = timeline("", ASKED_ROW);
        let owner = assembler(&[])
            .resolve_owner(&parse_timeline(&page).unwrap(), None)
            .await
            .unwrap();

        assert_eq!(
            owner,
            Owner::DoesNotExist {
                display_name: "Grace".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_failed_migration_hop_keeps_name() {
        let page = timeline("", ASKED_ROW);
        let owner = assembler(&[])
            .resolve_owner(
                &parse_timeline(&page).unwrap(),
                Some("https://superuser.com/posts/12/revisions"),
            )
            .await
            .unwrap();

        assert_eq!(
            owner,
            Owner::NameOnly {
                display_name: "Grace".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_question_by_id_discards_other_question() {
        let page = r#"<html><body><script>StackExchange.question.init({questionId: 99});</script></body></html>"#;
        let assembler = assembler(&[("https://stackoverflow.com/questions/5", page)]);

        assert_eq!(assembler.question_by_id(5, false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_question_by_id_missing_page_is_error() {
        let err = assembler(&[]).question_by_id(5, false).await.unwrap_err();
        assert!(matches!(
            err,
            crate::ScrapeError::Fetch(FetchError {
                status: Some(404),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_collective_walks_tag_pages() {
        let collective = r#"<html><body><div id="community-header">
<div class="mb2">Go Collective</div>
<div class="wmx7">Gophers</div>
<button class="js-join-community" data-slug="go">Join</button>
<a class="ml4 ws-nowrap" href="/collectives/go/tags?sort=popular">View all tags</a>
</div></body></html>"#;
        let tags_1 = r#"<html><body><a class="post-tag">go</a><a class="post-tag">goroutine</a>
<div class="s-pagination"><a class="s-pagination--item">1</a><a class="s-pagination--item">2</a><a class="s-pagination--item">Next</a></div></body></html>"#;
        let tags_2 = r#"<html><body><a class="post-tag">channel</a></body></html>"#;

        let assembler = assembler(&[
            ("https://stackoverflow.com/collectives/go", collective),
            ("https://stackoverflow.com/collectives/go/tags?sort=popular", tags_1),
            ("https://stackoverflow.com/collectives/go/tags?sort=popular&page=2", tags_2),
        ]);

        let collective = assembler.collective("/collectives/go").await.unwrap();
        assert_eq!(collective.name, "Go");
        assert_eq!(collective.slug, "go");
        assert_eq!(collective.link, "/collectives/go");
        assert_eq!(collective.tags, vec!["go", "goroutine", "channel"]);
    }
}
