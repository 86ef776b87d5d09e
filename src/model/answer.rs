use super::{Collective, Owner};
use serde::Serialize;

/// A collective's endorsement of an answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub collective: Collective,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
}

/// An answer item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub posted_by_collectives: Vec<Collective>,
    pub owner: Owner,
    pub is_accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_owned_date: Option<i64>,
    pub score: i64,
    pub last_activity_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edit_date: Option<i64>,
    pub creation_date: i64,
    pub answer_id: i64,
    pub question_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_license: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}
