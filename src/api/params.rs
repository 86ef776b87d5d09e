//! Query string validation
//!
//! Parameters are checked in a fixed order and the first bad one is
//! reported, so a request with several mistakes always gets the same error.
//! An empty value counts as absent.

use crate::query::{Direction, FilterMode, QueryParams, SortOrder};
use crate::ValidationError;
use std::collections::HashMap;

/// The only site served
pub const SITE: &str = "stackoverflow";

/// Latest accepted unix timestamp (year 3000)
pub const MAX_TIMESTAMP: i64 = 32_503_680_000;

pub const MAX_PAGESIZE: u32 = 100;

/// Which endpoint the parameters are for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `/questions`: home page tabs and `tagged` are allowed
    Listing,
    /// Every id-scoped endpoint
    Ids,
}

type Args = HashMap<String, String>;

fn arg<'a>(args: &'a Args, name: &str) -> Option<&'a str> {
    args.get(name).map(String::as_str).filter(|v| !v.is_empty())
}

fn bad(message: &str) -> ValidationError {
    ValidationError::bad_parameter(message)
}

/// Checks `site=stackoverflow`
pub fn check_site(args: &Args) -> Result<(), ValidationError> {
    match args.get("site") {
        Some(site) if site == SITE => Ok(()),
        _ => Err(bad("site is required")),
    }
}

/// Parses `filter`, defaulting to `default`
pub fn parse_filter(args: &Args) -> Result<FilterMode, ValidationError> {
    match arg(args, "filter") {
        None => Ok(FilterMode::Default),
        Some(value) => FilterMode::parse(value).ok_or_else(|| bad("Invalid filter specified")),
    }
}

/// Validates every query parameter of a question or answer endpoint
///
/// # Errors
///
/// `ValidationError::BadParameter` naming the first invalid parameter.
pub fn parse_query(args: &Args, scope: Scope) -> Result<QueryParams, ValidationError> {
    check_site(args)?;

    let sort = match arg(args, "sort") {
        None => SortOrder::default(),
        Some(value) => match SortOrder::parse(value) {
            Some(sort) if !sort.is_home_tab() || scope == Scope::Listing => sort,
            _ => return Err(bad("sort")),
        },
    };

    let order = match arg(args, "order") {
        None => Direction::default(),
        Some(value) => Direction::parse(value).ok_or_else(|| bad("order"))?,
    };

    let page = match arg(args, "page") {
        None => 1,
        Some(value) => digits::<u32>(value)
            .filter(|&page| page >= 1)
            .ok_or_else(|| bad("page"))?,
    };

    let pagesize = match arg(args, "pagesize") {
        None => 30,
        Some(value) => digits::<u32>(value)
            .filter(|size| (1..=MAX_PAGESIZE).contains(size))
            .ok_or_else(|| bad("pagesize"))?,
    };

    let tagged = match (scope, arg(args, "tagged")) {
        (Scope::Listing, Some(value)) => value
            .split(';')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    let fromdate = optional_timestamp(args, "fromdate")?;
    let todate = optional_timestamp(args, "todate")?;
    let min = bound(args, "min", sort)?;
    let max = bound(args, "max", sort)?;
    let filter = parse_filter(args)?;

    Ok(QueryParams {
        sort,
        order,
        page,
        pagesize,
        tagged,
        fromdate,
        todate,
        min,
        max,
        filter,
    })
}

/// Splits a `;`-separated id list
///
/// # Errors
///
/// * `NotFound` - An id is empty or not all digits
/// * `BadParameter("ids")` - An id does not fit a 32-bit signed integer
pub fn parse_ids(raw: &str) -> Result<Vec<i64>, ValidationError> {
    raw.split(';')
        .map(|id| {
            if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ValidationError::NotFound);
            }
            id.parse::<i64>()
                .ok()
                .filter(|&id| id <= i64::from(i32::MAX))
                .ok_or_else(|| bad("ids"))
        })
        .collect()
}

/// Parses a string made only of ASCII digits
fn digits<T: std::str::FromStr>(value: &str) -> Option<T> {
    if value.bytes().all(|b| b.is_ascii_digit()) {
        value.parse().ok()
    } else {
        None
    }
}

/// A unix timestamp in `0..=MAX_TIMESTAMP`
fn timestamp(value: &str) -> Option<i64> {
    digits::<i64>(value).filter(|ts| (0..=MAX_TIMESTAMP).contains(ts))
}

fn optional_timestamp(args: &Args, name: &str) -> Result<Option<i64>, ValidationError> {
    arg(args, name)
        .map(|value| timestamp(value).ok_or_else(|| bad(name)))
        .transpose()
}

/// `min` / `max`: a score when sorting by votes, otherwise a date
fn bound(args: &Args, name: &str, sort: SortOrder) -> Result<Option<i64>, ValidationError> {
    let Some(value) = arg(args, name) else {
        return Ok(None);
    };

    if sort.is_home_tab() {
        return Err(bad(name));
    }

    if sort == SortOrder::Votes {
        value
            .parse::<i32>()
            .map(|score| Some(i64::from(score)))
            .map_err(|_| bad(&format!("{}, expected integer", name)))
    } else {
        timestamp(value)
            .map(Some)
            .ok_or_else(|| bad(&format!("{}, expected date", name)))
    }
}
