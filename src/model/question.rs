use super::Owner;
use serde::Serialize;

/// Where a migrated question came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationInfo {
    pub other_site: OtherSite,
    pub on_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherSite {
    pub site_url: String,
}

/// A question item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrated_from: Option<MigrationInfo>,
    pub owner: Owner,
    pub is_answered: bool,
    pub view_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounty_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounty_closes_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_answer_id: Option<i64>,
    pub answer_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_owned_date: Option<i64>,
    pub score: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked_date: Option<i64>,
    pub last_activity_date: i64,
    pub creation_date: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edit_date: Option<i64>,
    pub question_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_license: Option<String>,
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closed_reason: Option<String>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}
