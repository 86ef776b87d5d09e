//! Post timeline page (`/posts/{id}/timeline`)
//!
//! Rows are parsed into typed events once, then folded into the dates and
//! flags a question or an answer needs. For each state family (protected,
//! locked, closed) only the first event seen decides: a later "protected"
//! after an "unprotected" is ignored.

use super::{has_class, parse_timestamp, select_all, select_first, text_of, Chain};
use crate::url::{first_numeric_segment, migration_site_url};
use crate::{MissingFieldError, Result};
use scraper::{ElementRef, Html};

/// License that later revisions are published under
pub const UPGRADED_LICENSE: &str = "CC BY-SA 4.0";

const EVENT_TABLE: Chain = Chain::new("events", &[".event-rows.fs-body", ".event-rows"]);
const LICENSE: Chain = Chain::new("content_license", &[".subheader h3 a"]);
const OWNER: Chain = Chain::new("owner", &["a.owner[href]", ".owner"]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Asked,
    Answered,
    Edited,
    Protected,
    Unprotected,
    Locked,
    Unlocked,
    Closed,
    Reopened,
    Migrated,
    NoticeAdded,
    Other,
}

impl EventKind {
    fn from_label(label: &str) -> Self {
        match label {
            "asked" => Self::Asked,
            "answered" => Self::Answered,
            "edited" => Self::Edited,
            "protected" => Self::Protected,
            "unprotected" => Self::Unprotected,
            "locked" => Self::Locked,
            "unlocked" => Self::Unlocked,
            "closed" => Self::Closed,
            "reopened" => Self::Reopened,
            l if l.contains("migrated") => Self::Migrated,
            l if l.contains("notice added") => Self::NoticeAdded,
            _ => Self::Other,
        }
    }
}

/// One timeline row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEvent {
    pub kind: EventKind,
    /// Lowercased event label
    pub label: String,
    pub timestamp: i64,
    /// Text of the cell after the label (the acting user)
    pub actor: Option<String>,
    /// First span of the comment cell (close reasons live here)
    pub comment: Option<String>,
    /// Text of the first link in the comment cell (migration source site)
    pub comment_link_text: Option<String>,
    /// Link following that first link (migration revision page)
    pub revision_link: Option<String>,
    pub has_revision: bool,
    pub has_license_marker: bool,
    pub made_community_wiki: bool,
}

impl TimelineEvent {
    pub fn is_bot(&self) -> bool {
        self.actor
            .as_deref()
            .is_some_and(|actor| actor.to_lowercase().contains("bot"))
    }
}

/// Profile link of the post owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerLink {
    pub href: String,
    pub name: String,
}

/// The "simultaneous" block grouping events that happened together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simultaneous {
    pub label: String,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelinePage {
    pub content_license: Option<String>,
    pub owner: Option<OwnerLink>,
    pub simultaneous: Option<Simultaneous>,
    pub events: Vec<TimelineEvent>,
}

/// A question migration as recorded on its timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEvent {
    pub on_date: i64,
    pub site_url: String,
    pub revision_link: Option<String>,
    pub question_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionTimeline {
    pub content_license: Option<String>,
    pub community_owned_date: Option<i64>,
    pub protected_date: Option<i64>,
    pub locked_date: Option<i64>,
    pub closed_date: Option<i64>,
    pub closed_reason: Option<String>,
    pub migration: Option<MigrationEvent>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerTimeline {
    pub creation_date: Option<i64>,
    pub content_license: Option<String>,
    pub last_activity_date: Option<i64>,
    pub community_owned_date: Option<i64>,
    pub recommendation_date: Option<i64>,
}

/// Parses a timeline page into its events
pub fn parse_timeline(html: &str) -> Result<TimelinePage> {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let content_license = LICENSE.probe(root)?.map(text_of);

    let owner = OWNER.probe(root)?.map(|el| OwnerLink {
        href: el.value().attr("href").unwrap_or_default().to_string(),
        name: text_of(el),
    });
    let owner = owner.filter(|o| !o.href.is_empty());

    let simultaneous = match select_first(root, ".simultaneous")? {
        Some(block) => Some(Simultaneous {
            label: select_first(block, ".wmn1")?
                .map(|el| text_of(el).to_lowercase())
                .unwrap_or_default(),
            timestamp: select_first(block, ".relativetime[title]")?
                .and_then(|el| el.value().attr("title"))
                .map(parse_timestamp)
                .transpose()?,
        }),
        None => None,
    };

    let table = EVENT_TABLE.first(root)?;
    let mut events = Vec::new();
    for row in select_all(table, "tr")? {
        if let Some(event) = parse_row(row)? {
            events.push(event);
        }
    }

    Ok(TimelinePage {
        content_license,
        owner,
        simultaneous,
        events,
    })
}

fn parse_row(row: ElementRef<'_>) -> Result<Option<TimelineEvent>> {
    let Some(label_cell) = select_first(row, ".wmn1")? else {
        return Ok(None);
    };
    let label = text_of(label_cell).to_lowercase();

    let time = select_first(row, ".relativetime[title]")?
        .and_then(|el| el.value().attr("title"))
        .ok_or_else(|| MissingFieldError {
            field: "event_date",
            tried: vec![".relativetime[title]".to_string()],
        })?;
    let timestamp = parse_timestamp(time)?;

    let kind = EventKind::from_label(&label);
    if kind == EventKind::Other {
        tracing::trace!(label = %label, "unrecognised timeline event");
    }

    let actor = label_cell
        .next_siblings()
        .find_map(ElementRef::wrap)
        .map(text_of);

    let comment = select_first(row, ".event-comment span")?.map(text_of);
    let comment_link = select_first(row, ".event-comment a")?;
    let comment_link_text = comment_link.map(text_of);
    let revision_link = comment_link
        .and_then(|a| a.next_siblings().find_map(ElementRef::wrap))
        .and_then(|next| next.value().attr("href"))
        .map(str::to_string);

    Ok(Some(TimelineEvent {
        kind,
        label,
        timestamp,
        actor,
        comment,
        comment_link_text,
        revision_link,
        has_revision: select_first(row, ".js-load-revision")?.is_some(),
        has_license_marker: select_first(row, ".mtn2")?.is_some(),
        made_community_wiki: text_of(row).contains("Post Made Community Wiki")
            || has_class(row, "community-wiki"),
    }))
}

impl TimelinePage {
    /// Name on the "asked" / "answered" row, used when there is no profile
    pub fn author_name(&self) -> Option<String> {
        self.events
            .iter()
            .find(|e| matches!(e.kind, EventKind::Asked | EventKind::Answered))
            .and_then(|e| e.actor.clone())
    }

    /// Folds the events of a question's timeline
    ///
    /// # Arguments
    ///
    /// * `is_wiki` - The question page marks the post community wiki
    /// * `creation_date` - Wiki date used when no wiki event is listed
    pub fn question_summary(&self, is_wiki: bool, creation_date: i64) -> QuestionTimeline {
        let mut summary = QuestionTimeline::default();
        let mut license = self.content_license.clone();
        let mut license_final = false;
        let mut wiki_pending = is_wiki;
        let (mut protect_seen, mut lock_seen, mut close_seen) = (false, false, false);

        for event in &self.events {
            if wiki_pending && event.made_community_wiki {
                summary.community_owned_date = Some(event.timestamp);
                wiki_pending = false;
            }

            if event.kind == EventKind::Edited
                && event.has_license_marker
                && event.has_revision
                && !license_final
            {
                license = Some(UPGRADED_LICENSE.to_string());
            }

            if !protect_seen {
                match event.kind {
                    EventKind::Protected => {
                        protect_seen = true;
                        summary.protected_date = Some(event.timestamp);
                    }
                    EventKind::Unprotected => protect_seen = true,
                    _ => {}
                }
            }

            if !lock_seen {
                match event.kind {
                    EventKind::Locked => {
                        lock_seen = true;
                        summary.locked_date = Some(event.timestamp);
                    }
                    EventKind::Unlocked => lock_seen = true,
                    _ => {}
                }
            }

            if !close_seen {
                match event.kind {
                    EventKind::Closed => {
                        close_seen = true;
                        license = None;
                        license_final = true;
                        summary.closed_date = Some(event.timestamp);
                        summary.closed_reason = event.comment.as_deref().map(|reason| {
                            if reason.contains("Duplicate") {
                                "Duplicate".to_string()
                            } else {
                                reason.to_string()
                            }
                        });
                    }
                    EventKind::Reopened => close_seen = true,
                    _ => {}
                }
            }

            if summary.migration.is_none() && event.kind == EventKind::Migrated {
                if let Some(site) = &event.comment_link_text {
                    summary.migration = Some(MigrationEvent {
                        on_date: event.timestamp,
                        site_url: migration_site_url(site),
                        question_id: event.revision_link.as_deref().and_then(first_numeric_segment),
                        revision_link: event.revision_link.clone(),
                    });
                }
            }
        }

        if is_wiki && summary.community_owned_date.is_none() {
            summary.community_owned_date = Some(creation_date);
        }
        summary.content_license = license;
        summary
    }

    /// Folds the events of an answer's timeline
    ///
    /// Last activity is the later of the simultaneous block and the first
    /// revision made by a human; the creation date comes from the
    /// "answered" row.
    pub fn answer_summary(&self, is_wiki: bool, recommended: bool) -> AnswerTimeline {
        let mut summary = AnswerTimeline {
            content_license: self.content_license.clone(),
            ..AnswerTimeline::default()
        };

        let mut activity = self
            .simultaneous
            .as_ref()
            .filter(|block| block.label != "late answers")
            .and_then(|block| block.timestamp);
        let mut revision_seen = false;
        let mut wiki_pending = is_wiki;

        for event in &self.events {
            if event.has_revision && !revision_seen {
                if !event.is_bot() {
                    revision_seen = true;
                    activity = Some(activity.map_or(event.timestamp, |a| a.max(event.timestamp)));
                } else if event.has_license_marker {
                    summary.content_license = Some(UPGRADED_LICENSE.to_string());
                }
            }

            if wiki_pending && event.made_community_wiki {
                summary.community_owned_date = Some(event.timestamp);
                wiki_pending = false;
            }

            if recommended
                && summary.recommendation_date.is_none()
                && event.kind == EventKind::NoticeAdded
            {
                summary.recommendation_date = Some(event.timestamp);
            }

            if event.kind == EventKind::Answered {
                summary.creation_date = Some(event.timestamp);
            }
        }

        summary.last_activity_date = activity.or(summary.creation_date);
        summary
    }
}
