use serde::{Deserialize, Serialize};

/// A regulation document held in the library.
///
/// `publication_date` stays a raw string so that malformed dates coming from
/// a catalog file reach the date filter untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier within the in-memory store.
    pub id: String,
    pub title: String,
    /// The document type (e.g. `Guidelines`, `FAQ`).
    pub category: String,
    pub content: String,
    /// ISO date (`YYYY-MM-DD`) or RFC 3339 timestamp.
    pub publication_date: String,
    /// Organisational level: `Group`, `Business Unit` or `Local`.
    pub level: String,
    pub owning_business_group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bookmarked: Option<bool>,
}

impl Document {
    /// Returns `true` only when the bookmark flag is explicitly set.
    pub fn bookmarked(&self) -> bool {
        self.is_bookmarked == Some(true)
    }

    /// Flip the bookmark flag. An unset flag counts as `false`.
    pub fn toggle_bookmark(&mut self) {
        self.is_bookmarked = Some(!self.bookmarked());
    }
}
