//! Output module for shaping and recording API responses
//!
//! This module handles:
//! - The three response shapes (`items`, `total`, empty object)
//! - Writing the last response of each endpoint to disk, when configured

mod dump;

pub use dump::{write_dump, Endpoint, OutputError, OutputResult};

use crate::query::Page;
use serde::Serialize;

/// Body of every successful response
///
/// Serializes as `{"items": [...], "has_more": bool}`, `{"total": n}` or `{}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Items { items: Vec<T>, has_more: bool },
    Total { total: i64 },
    Empty {},
}

impl<T> ApiResponse<T> {
    /// Response for `filter=total`
    pub fn total(total: i64) -> Self {
        Self::Total { total }
    }

    /// Number of items, 0 for the count and empty shapes
    pub fn len(&self) -> usize {
        match self {
            Self::Items { items, .. } => items.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> From<Page<T>> for ApiResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self::Items {
            items: page.items,
            has_more: page.has_more,
        }
    }
}
