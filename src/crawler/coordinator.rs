//! Request-level orchestration
//!
//! This module turns one API request into the set of entities it covers:
//! - Walking the listing pages for `/questions`
//! - Fanning out over requested ids
//! - Assembling the entities concurrently, in request order
//! - Running the collection processor over the result
//!
//! A failed entity is logged and left out; only the page the whole request
//! hangs on (the listing or the collectives index) fails the request.

use crate::config::Config;
use crate::crawler::assembler::Assembler;
use crate::crawler::fetcher::{Fetcher, PageSource};
use crate::model::{Answer, Collective, Question};
use crate::output::ApiResponse;
use crate::parser::{
    parse_answer_count, parse_collective_cards, parse_listing, parse_question_id,
    parse_total_questions, ListingPage,
};
use crate::query::{process, FilterMode, QueryParams};
use crate::url::{with_page, SiteUrls};
use crate::Result;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;

/// Count reported by `filter=total` on a listing that shows no total
pub const TOTAL_FALLBACK: i64 = 1000;

/// Entry point for every endpoint
#[derive(Clone)]
pub struct Coordinator {
    assembler: Assembler,
    max_listing_pages: u32,
    concurrency: usize,
}

impl Coordinator {
    /// Creates a coordinator over any page source
    ///
    /// # Arguments
    ///
    /// * `source` - Where pages come from
    /// * `config` - Site root, listing depth and fan-out width
    pub fn new(source: Arc<dyn PageSource>, config: &Config) -> Result<Self> {
        let urls = SiteUrls::new(&config.site.base_url)?;
        Ok(Self {
            assembler: Assembler::new(source, urls),
            max_listing_pages: config.fetcher.max_listing_pages.max(1),
            concurrency: config.fetcher.max_concurrent.max(1) as usize,
        })
    }

    /// Creates a coordinator that fetches over HTTP
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = Fetcher::new(config)?;
        Self::new(Arc::new(fetcher), config)
    }

    /// `GET /questions`
    pub async fn questions(&self, params: &QueryParams) -> Result<ApiResponse<Question>> {
        if params.filter == FilterMode::None {
            return Ok(ApiResponse::Empty {});
        }

        let listing_url = self.assembler.urls().listing(params.sort, &params.tagged);
        let html = self.assembler.fetch(&listing_url).await?;

        if params.filter == FilterMode::Total {
            let total = parse_total_questions(&html)?.unwrap_or_else(|| {
                tracing::debug!("No question count on {}, using {}", listing_url, TOTAL_FALLBACK);
                TOTAL_FALLBACK
            });
            return Ok(ApiResponse::total(total));
        }

        let mut listing = parse_listing(&html)?;
        let pages = listing.page_count.min(self.max_listing_pages);
        tracing::info!("Walking {} listing page(s) of {}", pages, listing_url);

        let with_body = params.filter.with_body();
        let mut items: Vec<Question> = Vec::new();
        for n in 1..=pages {
            let jobs = listing
                .question_hrefs
                .iter()
                .map(|href| {
                    (
                        format!("question {}", href),
                        self.assembler.question_from_listing(href, with_body),
                    )
                })
                .collect();
            items.extend(collect_entities(jobs, self.concurrency).await);

            if n == pages {
                break;
            }
            match self.listing_page(&listing_url, n + 1).await {
                Ok(next) => listing = next,
                Err(e) => {
                    tracing::warn!("Stopping listing walk at page {}: {}", n + 1, e);
                    break;
                }
            }
        }

        Ok(process(items, params).into())
    }

    async fn listing_page(&self, listing_url: &str, n: u32) -> Result<ListingPage> {
        let url = with_page(listing_url, n)?;
        parse_listing(&self.assembler.fetch(&url).await?)
    }

    /// `GET /questions/{ids}`
    pub async fn questions_by_ids(
        &self,
        ids: &[i64],
        params: &QueryParams,
    ) -> Result<ApiResponse<Question>> {
        let ids = distinct(ids);
        match params.filter {
            FilterMode::None => Ok(ApiResponse::Empty {}),
            FilterMode::Total => {
                let jobs = ids
                    .iter()
                    .map(|&id| (format!("question {}", id), self.resolves_to_itself(id)))
                    .collect();
                let found = collect_entities(jobs, self.concurrency).await;
                Ok(ApiResponse::total(found.into_iter().filter(|&same| same).count() as i64))
            }
            FilterMode::Default | FilterMode::WithBody => {
                let with_body = params.filter.with_body();
                let jobs = ids
                    .iter()
                    .map(|&id| {
                        (
                            format!("question {}", id),
                            self.assembler.question_by_id(id, with_body),
                        )
                    })
                    .collect();
                let items: Vec<_> = collect_entities(jobs, self.concurrency)
                    .await
                    .into_iter()
                    .flatten()
                    .collect();
                Ok(process(items, params).into())
            }
        }
    }

    /// Whether `/questions/{id}` shows question `id` itself
    async fn resolves_to_itself(&self, id: i64) -> Result<bool> {
        let html = self.assembler.fetch(&self.assembler.urls().question(id)).await?;
        Ok(parse_question_id(&html)? == id)
    }

    /// `GET /questions/{ids}/answers`
    pub async fn answers_by_question_ids(
        &self,
        ids: &[i64],
        params: &QueryParams,
    ) -> Result<ApiResponse<Answer>> {
        let ids = distinct(ids);
        match params.filter {
            FilterMode::None => Ok(ApiResponse::Empty {}),
            FilterMode::Total => {
                let jobs = ids
                    .iter()
                    .map(|&id| (format!("question {}", id), self.answer_count(id)))
                    .collect();
                let counts = collect_entities(jobs, self.concurrency).await;
                Ok(ApiResponse::total(counts.into_iter().sum()))
            }
            FilterMode::Default | FilterMode::WithBody => {
                let with_body = params.filter.with_body();
                let jobs = ids
                    .iter()
                    .map(|&id| {
                        (
                            format!("answers of question {}", id),
                            self.assembler.answer_cards(id, with_body),
                        )
                    })
                    .collect();
                let cards: Vec<_> = collect_entities(jobs, self.concurrency)
                    .await
                    .into_iter()
                    .flatten()
                    .collect();

                let jobs = cards
                    .into_iter()
                    .map(|card| (format!("answer {}", card.answer_id), self.assembler.answer(card)))
                    .collect();
                let items = collect_entities(jobs, self.concurrency).await;
                Ok(process(items, params).into())
            }
        }
    }

    /// Answer count of question `id`; 0 when the id resolves elsewhere
    async fn answer_count(&self, id: i64) -> Result<i64> {
        let html = self.assembler.fetch(&self.assembler.urls().question(id)).await?;
        if parse_question_id(&html)? != id {
            return Ok(0);
        }
        parse_answer_count(&html)
    }

    /// `GET /answers/{ids}`
    pub async fn answers_by_ids(
        &self,
        ids: &[i64],
        params: &QueryParams,
    ) -> Result<ApiResponse<Answer>> {
        let ids = distinct(ids);
        match params.filter {
            FilterMode::None => Ok(ApiResponse::Empty {}),
            FilterMode::Total => {
                let jobs = ids
                    .iter()
                    .map(|&id| (format!("answer {}", id), self.assembler.answer_card(id, false)))
                    .collect();
                let found = collect_entities(jobs, self.concurrency).await;
                Ok(ApiResponse::total(found.into_iter().flatten().count() as i64))
            }
            FilterMode::Default | FilterMode::WithBody => {
                let with_body = params.filter.with_body();
                let jobs = ids
                    .iter()
                    .map(|&id| (format!("answer {}", id), self.answer_by_id(id, with_body)))
                    .collect();
                let items: Vec<_> = collect_entities(jobs, self.concurrency)
                    .await
                    .into_iter()
                    .flatten()
                    .collect();
                Ok(process(items, params).into())
            }
        }
    }

    async fn answer_by_id(&self, id: i64, with_body: bool) -> Result<Option<Answer>> {
        match self.assembler.answer_card(id, with_body).await? {
            Some(card) => self.assembler.answer(card).await.map(Some),
            None => {
                tracing::debug!("Answer {} not found on its page", id);
                Ok(None)
            }
        }
    }

    /// `GET /collectives`
    ///
    /// Every collective is returned at once; `has_more` is always false.
    pub async fn collectives(&self, filter: FilterMode) -> Result<ApiResponse<Collective>> {
        if filter == FilterMode::None {
            return Ok(ApiResponse::Empty {});
        }

        let html = self
            .assembler
            .fetch(&self.assembler.urls().collectives_all())
            .await?;
        let hrefs = parse_collective_cards(&html)?;

        if filter == FilterMode::Total {
            return Ok(ApiResponse::total(hrefs.len() as i64));
        }

        let jobs = hrefs
            .iter()
            .map(|href| (format!("collective {}", href), self.assembler.collective(href)))
            .collect();
        Ok(ApiResponse::Items {
            items: collect_entities(jobs, self.concurrency).await,
            has_more: false,
        })
    }
}

/// Runs entity jobs with bounded concurrency, keeping their order
///
/// A failed job is logged with its entity label and left out.
async fn collect_entities<T, F>(jobs: Vec<(String, F)>, concurrency: usize) -> Vec<T>
where
    F: Future<Output = Result<T>>,
{
    stream::iter(jobs)
        .map(|(entity, job)| async move {
            match job.await {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(entity = %entity, error = %e, "dropping entity");
                    None
                }
            }
        })
        .buffered(concurrency.max(1))
        .filter_map(futures::future::ready)
        .collect()
        .await
}

/// `ids` without repeats, first occurrence kept
fn distinct(ids: &[i64]) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
