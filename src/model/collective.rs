use serde::Serialize;

/// A link listed in a collective's header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalLink {
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
}

/// A collective (a sponsored group of tags)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collective {
    pub tags: Vec<String>,
    pub external_links: Vec<ExternalLink>,
    pub description: String,
    pub link: String,
    pub name: String,
    pub slug: String,
}
