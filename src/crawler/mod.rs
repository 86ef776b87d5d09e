//! Crawler module for fetching pages and assembling records
//!
//! This module contains the core scraping logic including:
//! - The admission gate pacing every request
//! - HTTP fetching with retries
//! - Multi-hop assembly of one record
//! - Request-level coordination across many records

mod assembler;
mod coordinator;
mod fetcher;
mod scheduler;

pub use assembler::Assembler;
pub use coordinator::{Coordinator, TOTAL_FALLBACK};
pub use fetcher::{build_http_client, Fetcher, PageSource};
pub use scheduler::{ScheduledFetch, Scheduler};
