//! The document inclusion predicate.
//!
//! Every dimension (search, sidebar facets, date bucket, column filters,
//! bookmarks) is an AND term. Options inside one sidebar facet are OR terms.
//! Unrecognised column match types and date buckets never constrain.

use chrono::{DateTime, Datelike, Days, Months, NaiveDate};

use crate::models::document::Document;
use crate::models::filter::{ColumnFilter, ColumnKey, FilterCriteria, FilterState, MatchType};

/// A named relative date range used by the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBucket {
    Last7Days,
    LastMonth,
    ThisMonth,
    YearToDate,
    Last12Months,
}

impl DateBucket {
    /// Parse a sidebar label. `"All"` and unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Last 7 days" => Some(DateBucket::Last7Days),
            "Last month" => Some(DateBucket::LastMonth),
            "This month" => Some(DateBucket::ThisMonth),
            "Year to date" => Some(DateBucket::YearToDate),
            "Last 12 months" => Some(DateBucket::Last12Months),
            _ => None,
        }
    }

    /// Inclusive day range covered by this bucket relative to `today`.
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            DateBucket::Last7Days => (today - Days::new(7), today),
            DateBucket::LastMonth => {
                let first_of_this_month = today.with_day(1).unwrap_or(today);
                let last_of_previous = first_of_this_month - Days::new(1);
                let first_of_previous = last_of_previous.with_day(1).unwrap_or(last_of_previous);
                (first_of_previous, last_of_previous)
            }
            DateBucket::ThisMonth => (today.with_day(1).unwrap_or(today), today),
            DateBucket::YearToDate => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today),
                today,
            ),
            // Feb 29 minus one year clamps to Feb 28.
            DateBucket::Last12Months => (
                today.checked_sub_months(Months::new(12)).unwrap_or(today),
                today,
            ),
        }
    }
}

/// Parse a document date at day granularity.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps (time of day dropped).
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|value| value.date_naive())
        })
}

/// Check a document date against a bucket label.
///
/// A recognised bucket with an unparseable document date excludes the
/// document.
pub fn matches_publication_date(doc_date: &str, bucket: Option<&str>, today: NaiveDate) -> bool {
    let Some(label) = bucket else {
        return true;
    };
    let Some(bucket) = DateBucket::from_label(label) else {
        return true;
    };
    let Some(day) = parse_day(doc_date) else {
        return false;
    };
    let (start, end) = bucket.range(today);
    start <= day && day <= end
}

/// Case-insensitive column match. Inactive and unknown filters pass.
pub fn matches_column_filter(text: &str, filter: &ColumnFilter) -> bool {
    if !filter.is_active() {
        return true;
    }
    let text = text.to_lowercase();
    let needle = filter.value.to_lowercase();
    match filter.match_type {
        MatchType::Contains => text.contains(&needle),
        MatchType::StartsWith => text.starts_with(&needle),
        MatchType::EndsWith => text.ends_with(&needle),
        MatchType::Exact => text == needle,
        MatchType::Unknown => true,
    }
}

/// Free-text search over title and document type.
pub fn matches_search(doc: &Document, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let term = term.to_lowercase();
    doc.title.to_lowercase().contains(&term) || doc.category.to_lowercase().contains(&term)
}

fn matches_any(selected: &[String], value: &str) -> bool {
    selected.is_empty() || selected.iter().any(|s| s == value)
}

fn matches_any_optional(selected: &[String], value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|v| selected.iter().any(|s| s == v))
}

/// Sidebar multi-select facets.
pub fn matches_sidebar(doc: &Document, filters: &FilterState) -> bool {
    matches_any(&filters.document_type, &doc.category)
        && matches_any(&filters.level, &doc.level)
        && matches_any(&filters.owning_business_group, &doc.owning_business_group)
        && matches_any_optional(&filters.region, doc.region.as_deref())
        && matches_any_optional(&filters.risk_type, doc.risk_type.as_deref())
        && matches_any_optional(&filters.topic, doc.topic.as_deref())
}

/// The text a table column displays for a document.
pub fn column_text(doc: &Document, column: ColumnKey) -> &str {
    match column {
        ColumnKey::Id => &doc.id,
        ColumnKey::Title => &doc.title,
        ColumnKey::DocumentType => &doc.category,
        ColumnKey::Level => &doc.level,
        ColumnKey::OwningBusinessGroup => &doc.owning_business_group,
        ColumnKey::PublicationDate => &doc.publication_date,
    }
}

/// The full inclusion decision for one document.
pub fn is_included(doc: &Document, criteria: &FilterCriteria, today: NaiveDate) -> bool {
    matches_search(doc, &criteria.search_term)
        && criteria
            .column_filters
            .iter()
            .all(|(column, filter)| matches_column_filter(column_text(doc, *column), filter))
        && matches_publication_date(
            &doc.publication_date,
            criteria.filters.publication_date.as_deref(),
            today,
        )
        && matches_sidebar(doc, &criteria.filters)
        && (!criteria.show_bookmarks_only || doc.bookmarked())
}

/// Apply the predicate, keeping store order.
pub fn filter_documents<'a>(
    docs: &'a [Document],
    criteria: &FilterCriteria,
    today: NaiveDate,
) -> Vec<&'a Document> {
    docs.iter()
        .filter(|doc| is_included(doc, criteria, today))
        .collect()
}
