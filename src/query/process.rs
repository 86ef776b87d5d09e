//! Collection processor: filtering, sorting and paging of assembled records
//!
//! Every step keeps the relative order of the records it does not reorder.

use super::{Direction, QueryParams, SortOrder};
use crate::model::{Answer, Question};

/// The keys the processor filters and sorts on
pub trait Sortable {
    fn score(&self) -> i64;
    fn creation_date(&self) -> i64;
    fn last_activity_date(&self) -> i64;

    /// Key used for `min`/`max` and sorting under `sort`
    fn sort_key(&self, sort: SortOrder) -> i64 {
        match sort {
            SortOrder::Votes => self.score(),
            SortOrder::Creation => self.creation_date(),
            _ => self.last_activity_date(),
        }
    }
}

impl Sortable for Question {
    fn score(&self) -> i64 {
        self.score
    }

    fn creation_date(&self) -> i64 {
        self.creation_date
    }

    fn last_activity_date(&self) -> i64 {
        self.last_activity_date
    }
}

impl Sortable for Answer {
    fn score(&self) -> i64 {
        self.score
    }

    fn creation_date(&self) -> i64 {
        self.creation_date
    }

    fn last_activity_date(&self) -> i64 {
        self.last_activity_date
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

/// Keeps records with `fromdate <= creation_date < todate`
pub fn filter_date_range<T: Sortable>(
    items: Vec<T>,
    fromdate: Option<i64>,
    todate: Option<i64>,
) -> Vec<T> {
    if fromdate.is_none() && todate.is_none() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| {
            let date = item.creation_date();
            fromdate.map_or(true, |from| date >= from) && todate.map_or(true, |to| date < to)
        })
        .collect()
}

/// Keeps records whose sort key lies within `min`/`max`
///
/// Scores use an inclusive upper bound, dates an exclusive one.
pub fn filter_min_max<T: Sortable>(
    items: Vec<T>,
    sort: SortOrder,
    min: Option<i64>,
    max: Option<i64>,
) -> Vec<T> {
    if min.is_none() && max.is_none() {
        return items;
    }

    let inclusive_max = sort == SortOrder::Votes;
    items
        .into_iter()
        .filter(|item| {
            let key = item.sort_key(sort);
            let above_min = min.map_or(true, |min| key >= min);
            let below_max = max.map_or(true, |max| {
                if inclusive_max {
                    key <= max
                } else {
                    key < max
                }
            });
            above_min && below_max
        })
        .collect()
}

/// Stable sort by the key of `sort`
pub fn sort_items<T: Sortable>(items: &mut [T], sort: SortOrder, order: Direction) {
    match order {
        Direction::Asc => items.sort_by_key(|item| item.sort_key(sort)),
        Direction::Desc => items.sort_by(|a, b| b.sort_key(sort).cmp(&a.sort_key(sort))),
    }
}

/// Slices out 1-based page `page` of `pagesize` records
pub fn paginate<T>(items: Vec<T>, page: u32, pagesize: u32) -> Page<T> {
    let size = pagesize as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(size);
    let end = start.saturating_add(size);
    let has_more = end < items.len();

    let items = items.into_iter().skip(start).take(size).collect();
    Page { items, has_more }
}

/// Runs the whole pipeline: date range, min/max, sort, paginate
///
/// Home page tabs (`hot`, `week`, `month`) keep the site's order and skip
/// the min/max filter.
pub fn process<T: Sortable>(items: Vec<T>, params: &QueryParams) -> Page<T> {
    let mut items = filter_date_range(items, params.fromdate, params.todate);

    if !params.sort.is_home_tab() {
        items = filter_min_max(items, params.sort, params.min, params.max);
        sort_items(&mut items, params.sort, params.order);
    }

    paginate(items, params.page, params.pagesize)
}
