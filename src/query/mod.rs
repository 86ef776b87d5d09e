//! Query parameters and the collection processor
//!
//! `QueryParams` is the validated, immutable form of a request's query
//! string. The `process` submodule filters, sorts and pages a batch of
//! assembled records according to it.

mod process;

pub use process::{
    filter_date_range, filter_min_max, paginate, process, sort_items, Page, Sortable,
};

use std::fmt;

/// `sort` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Activity,
    Votes,
    Creation,
    Hot,
    Week,
    Month,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "activity" => Some(Self::Activity),
            "votes" => Some(Self::Votes),
            "creation" => Some(Self::Creation),
            "hot" => Some(Self::Hot),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activity => "activity",
            Self::Votes => "votes",
            Self::Creation => "creation",
            Self::Hot => "hot",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Home page tabs: the site's own ranking is kept, so no sorting or min/max
    pub fn is_home_tab(&self) -> bool {
        matches!(self, Self::Hot | Self::Week | Self::Month)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `order` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Asc,
    #[default]
    Desc,
}

impl Direction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }
}

/// `filter` parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    #[default]
    Default,
    /// Adds the `body` field
    WithBody,
    /// Returns `{}` without scraping
    None,
    /// Returns `{"total": n}` only
    Total,
}

impl FilterMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "withbody" => Some(Self::WithBody),
            "none" => Some(Self::None),
            "total" => Some(Self::Total),
            _ => None,
        }
    }

    pub fn with_body(&self) -> bool {
        matches!(self, Self::WithBody)
    }
}

/// Validated request parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub sort: SortOrder,
    pub order: Direction,
    /// 1-based page number
    pub page: u32,
    pub pagesize: u32,
    /// Tags from `tagged`, only honoured on `/questions`
    pub tagged: Vec<String>,
    pub fromdate: Option<i64>,
    pub todate: Option<i64>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub filter: FilterMode,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            sort: SortOrder::default(),
            order: Direction::default(),
            page: 1,
            pagesize: 30,
            tagged: Vec::new(),
            fromdate: None,
            todate: None,
            min: None,
            max: None,
            filter: FilterMode::default(),
        }
    }
}
