//! Record types returned by the API
//!
//! Every record is a named struct whose field order is the serialization
//! order. Optional fields are skipped when the page did not expose the signal;
//! they are never serialized as `null`.

mod answer;
mod collective;
mod owner;
mod question;

pub use answer::{Answer, Recommendation};
pub use collective::{Collective, ExternalLink};
pub use owner::{Owner, RegisteredOwner, UserType};
pub use question::{MigrationInfo, OtherSite, Question};

/// Returns `edit` only when it is a real edit, i.e. differs from creation
pub fn distinct_edit_date(creation_date: i64, edit: Option<i64>) -> Option<i64> {
    edit.filter(|&date| date != creation_date)
}
