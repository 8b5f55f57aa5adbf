use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Sidebar filter selections.
///
/// Array fields are OR-of-selected-values; an empty array means "no
/// constraint". `publication_date` holds a bucket label such as
/// `"Last 7 days"`; `None` and `"All"` both mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub publication_date: Option<String>,
    pub document_type: Vec<String>,
    pub level: Vec<String>,
    pub owning_business_group: Vec<String>,
    pub region: Vec<String>,
    pub risk_type: Vec<String>,
    pub topic: Vec<String>,
    // Carried for the sidebar but not read by the predicate.
    pub control_procedure: Option<bool>,
    pub policy_category: Option<String>,
    pub policy_sub_category: Option<String>,
    pub control_category: Option<String>,
    pub control_sub_category: Option<String>,
}

impl FilterState {
    /// Merge a partial update. Fields absent from the patch are kept.
    pub fn apply_patch(&mut self, patch: FilterPatch) {
        if let Some(date) = patch.publication_date {
            self.publication_date = date.filter(|label| label != "All");
        }
        if let Some(values) = patch.document_type {
            self.document_type = values;
        }
        if let Some(values) = patch.level {
            self.level = values;
        }
        if let Some(values) = patch.owning_business_group {
            self.owning_business_group = values;
        }
        if let Some(values) = patch.region {
            self.region = values;
        }
        if let Some(values) = patch.risk_type {
            self.risk_type = values;
        }
        if let Some(values) = patch.topic {
            self.topic = values;
        }
    }

    /// Reset a single field to its "no constraint" value.
    pub fn clear(&mut self, field: FilterField) {
        match field {
            FilterField::PublicationDate => self.publication_date = None,
            FilterField::DocumentType => self.document_type.clear(),
            FilterField::Level => self.level.clear(),
            FilterField::OwningBusinessGroup => self.owning_business_group.clear(),
            FilterField::Region => self.region.clear(),
            FilterField::RiskType => self.risk_type.clear(),
            FilterField::Topic => self.topic.clear(),
        }
    }
}

/// A partial [`FilterState`] update, as sent by the sidebar.
///
/// `publication_date: Some(None)` clears the bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterPatch {
    #[serde(deserialize_with = "explicit_null")]
    pub publication_date: Option<Option<String>>,
    pub document_type: Option<Vec<String>>,
    pub level: Option<Vec<String>>,
    pub owning_business_group: Option<Vec<String>>,
    pub region: Option<Vec<String>>,
    pub risk_type: Option<Vec<String>>,
    pub topic: Option<Vec<String>>,
}

/// Keeps an explicit JSON `null` as `Some(None)` instead of collapsing it.
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The filter fields that can be cleared individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    PublicationDate,
    DocumentType,
    Level,
    OwningBusinessGroup,
    Region,
    RiskType,
    Topic,
}

/// How a column filter compares its value against the cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    #[default]
    Contains,
    StartsWith,
    EndsWith,
    Exact,
    /// Any unrecognised type string. Never constrains.
    #[serde(other)]
    Unknown,
}

/// A per-column text filter. An empty `value` is inactive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub value: String,
    #[serde(rename = "type", default)]
    pub match_type: MatchType,
}

impl ColumnFilter {
    pub fn new(value: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            value: value.into(),
            match_type,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.value.is_empty()
    }
}

/// The columns displayed in the document table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnKey {
    Id,
    Title,
    DocumentType,
    Level,
    OwningBusinessGroup,
    PublicationDate,
}

impl ColumnKey {
    pub const ALL: [ColumnKey; 6] = [
        ColumnKey::Id,
        ColumnKey::Title,
        ColumnKey::DocumentType,
        ColumnKey::Level,
        ColumnKey::OwningBusinessGroup,
        ColumnKey::PublicationDate,
    ];
}

pub type ColumnFilters = BTreeMap<ColumnKey, ColumnFilter>;

/// Everything the inclusion predicate looks at, bundled together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    pub filters: FilterState,
    pub search_term: String,
    pub column_filters: ColumnFilters,
    pub show_bookmarks_only: bool,
}

/// Option lists for the sidebar.
pub const PUBLICATION_DATE_OPTIONS: &[&str] = &[
    "All",
    "Last 7 days",
    "Last month",
    "This month",
    "Year to date",
    "Last 12 months",
];

pub const DOCUMENT_TYPE_OPTIONS: &[&str] = &[
    "Desktop procedures",
    "Executive summary",
    "Exhibit",
    "FAQ",
    "Glossary",
    "Guidelines",
    "Job aid",
    "Methodology",
    "Narrative",
];

pub const LEVEL_OPTIONS: &[&str] = &["Group", "Business Unit", "Local"];

pub const OWNING_BUSINESS_OPTIONS: &[&str] = &[
    "Legal & Compliance",
    "Information Technology",
    "Risk Management",
    "Procurement",
    "Human Resources",
    "Compliance",
    "Trading",
    "Credit Risk",
];
