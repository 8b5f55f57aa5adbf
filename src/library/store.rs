//! Reducer-driven state for the document library view.
//!
//! [`LibraryState::reduce`] is the only mutator. Any action that changes the
//! filtered set or the page size sends the view back to page 1.
//!
//! Date buckets are evaluated against the state's `today`, captured at
//! construction.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::library::filter::filter_documents;
use crate::library::pagination::{clamp_page, paginate, total_pages, visible_pages, PageButton, Pagination};
use crate::models::document::Document;
use crate::models::filter::{ColumnFilter, ColumnKey, FilterCriteria, FilterField, FilterPatch, FilterState};

/// Everything the library view can be asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryAction {
    LoadDocuments(Vec<Document>),
    SetSearchTerm(String),
    UpdateFilters(FilterPatch),
    ClearFilter(FilterField),
    ClearAllFilters,
    SetColumnFilter { column: ColumnKey, filter: ColumnFilter },
    ClearColumnFilters,
    ToggleBookmarksOnly,
    SetPage(usize),
    SetPageSize(usize),
    ToggleBookmark(String),
    ToggleSelection(String),
    SelectAll,
    ClearSelection,
}

/// What the table renders for the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryView {
    pub documents: Vec<Document>,
    pub filtered_count: usize,
    pub total_count: usize,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub start_item: usize,
    pub end_item: usize,
    pub pages: Vec<PageButton>,
    pub selected_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LibraryState {
    documents: Vec<Document>,
    criteria: FilterCriteria,
    pagination: Pagination,
    selected: Vec<String>,
    today: NaiveDate,
}

impl LibraryState {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            today: Local::now().date_naive(),
            ..Default::default()
        }
    }

    /// Pin the reference date used by the publication-date buckets.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn filters(&self) -> &FilterState {
        &self.criteria.filters
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    /// Selected documents in selection order.
    pub fn selected_documents(&self) -> Vec<&Document> {
        self.selected
            .iter()
            .filter_map(|id| self.documents.iter().find(|d| &d.id == id))
            .collect()
    }

    pub fn reduce(&mut self, action: LibraryAction) {
        match action {
            LibraryAction::LoadDocuments(documents) => {
                self.selected
                    .retain(|id| documents.iter().any(|d| &d.id == id));
                self.documents = documents;
                self.reset_page();
            }
            LibraryAction::SetSearchTerm(term) => {
                self.criteria.search_term = term;
                self.reset_page();
            }
            LibraryAction::UpdateFilters(patch) => {
                self.criteria.filters.apply_patch(patch);
                self.reset_page();
            }
            LibraryAction::ClearFilter(field) => {
                self.criteria.filters.clear(field);
                self.reset_page();
            }
            LibraryAction::ClearAllFilters => {
                self.criteria.filters = FilterState::default();
                self.reset_page();
            }
            LibraryAction::SetColumnFilter { column, filter } => {
                if filter.is_active() {
                    self.criteria.column_filters.insert(column, filter);
                } else {
                    self.criteria.column_filters.remove(&column);
                }
                self.reset_page();
            }
            LibraryAction::ClearColumnFilters => {
                self.criteria.column_filters.clear();
                self.reset_page();
            }
            LibraryAction::ToggleBookmarksOnly => {
                self.criteria.show_bookmarks_only = !self.criteria.show_bookmarks_only;
                self.reset_page();
            }
            LibraryAction::SetPage(page) => {
                let pages = total_pages(self.filtered_count(), self.pagination.page_size);
                self.pagination.current_page = clamp_page(page, pages);
            }
            LibraryAction::SetPageSize(size) => {
                self.pagination.page_size = size.max(1);
                self.reset_page();
            }
            LibraryAction::ToggleBookmark(id) => {
                if let Some(doc) = self.documents.iter_mut().find(|d| d.id == id) {
                    doc.toggle_bookmark();
                }
            }
            LibraryAction::ToggleSelection(id) => {
                if let Some(pos) = self.selected.iter().position(|s| *s == id) {
                    self.selected.remove(pos);
                } else if self.documents.iter().any(|d| d.id == id) {
                    self.selected.push(id);
                }
            }
            LibraryAction::SelectAll => {
                for doc in &self.documents {
                    if !self.selected.contains(&doc.id) {
                        self.selected.push(doc.id.clone());
                    }
                }
            }
            LibraryAction::ClearSelection => self.selected.clear(),
        }
    }

    fn reset_page(&mut self) {
        self.pagination.current_page = 1;
    }

    fn filtered_count(&self) -> usize {
        filter_documents(&self.documents, &self.criteria, self.today).len()
    }

    /// Filter, then slice out the current page.
    pub fn view(&self) -> LibraryView {
        build_view(
            &self.documents,
            &self.criteria,
            self.pagination,
            self.selected.len(),
            self.today,
        )
    }
}

/// Render one page of `documents` under `criteria`. The page is clamped.
pub fn build_view(
    documents: &[Document],
    criteria: &FilterCriteria,
    pagination: Pagination,
    selected_count: usize,
    today: NaiveDate,
) -> LibraryView {
    let filtered: Vec<Document> = filter_documents(documents, criteria, today)
        .into_iter()
        .cloned()
        .collect();
    let slice = paginate(&filtered, pagination.current_page, pagination.page_size);

    LibraryView {
        filtered_count: filtered.len(),
        total_count: documents.len(),
        current_page: slice.current_page,
        page_size: slice.page_size,
        total_pages: slice.total_pages,
        start_item: slice.start_item,
        end_item: slice.end_item,
        pages: visible_pages(slice.current_page, slice.total_pages),
        selected_count,
        documents: slice.items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filter::MatchType;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 20).unwrap()
    }

    fn catalog(count: usize) -> Vec<Document> {
        (1..=count)
            .map(|i| Document {
                id: i.to_string(),
                title: format!("Document {i}"),
                category: if i <= 12 { "FAQ" } else { "Guidelines" }.to_string(),
                content: String::new(),
                publication_date: "2024-12-01".to_string(),
                level: "Group".to_string(),
                owning_business_group: "Compliance".to_string(),
                region: Some("US".to_string()),
                risk_type: None,
                topic: None,
                source_url: None,
                summary: None,
                is_bookmarked: Some(false),
            })
            .collect()
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut state = LibraryState::new(catalog(47)).with_today(today());
        state.reduce(LibraryAction::SetPage(5));
        let view = state.view();
        assert_eq!(view.current_page, 5);
        assert_eq!(view.documents.len(), 7);

        state.reduce(LibraryAction::UpdateFilters(FilterPatch {
            document_type: Some(vec!["FAQ".to_string()]),
            ..Default::default()
        }));
        let view = state.view();
        assert_eq!(view.filtered_count, 12);
        assert_eq!(view.current_page, 1);
        assert_eq!(state.pagination().current_page, 1);
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let mut state = LibraryState::new(catalog(30)).with_today(today());
        state.reduce(LibraryAction::SetPage(3));
        state.reduce(LibraryAction::SetPageSize(25));
        assert_eq!(state.pagination(), Pagination { current_page: 1, page_size: 25 });
        assert_eq!(state.view().total_pages, 2);
    }

    #[test]
    fn test_search_and_column_filters_reset_page() {
        let mut state = LibraryState::new(catalog(30)).with_today(today());
        state.reduce(LibraryAction::SetPage(2));
        state.reduce(LibraryAction::SetSearchTerm("document 1".to_string()));
        assert_eq!(state.pagination().current_page, 1);

        state.reduce(LibraryAction::SetPage(2));
        state.reduce(LibraryAction::SetColumnFilter {
            column: ColumnKey::Id,
            filter: ColumnFilter::new("1", MatchType::StartsWith),
        });
        assert_eq!(state.pagination().current_page, 1);
        // "1", "10".."19"
        assert_eq!(state.view().filtered_count, 11);
    }

    #[test]
    fn test_inactive_column_filter_is_removed() {
        let mut state = LibraryState::new(catalog(3)).with_today(today());
        state.reduce(LibraryAction::SetColumnFilter {
            column: ColumnKey::Title,
            filter: ColumnFilter::new("x", MatchType::Contains),
        });
        state.reduce(LibraryAction::SetColumnFilter {
            column: ColumnKey::Title,
            filter: ColumnFilter::new("", MatchType::Contains),
        });
        assert!(state.criteria().column_filters.is_empty());
    }

    #[test]
    fn test_toggle_bookmark_then_bookmarks_only() {
        let mut state = LibraryState::new(catalog(5)).with_today(today());
        state.reduce(LibraryAction::ToggleBookmark("3".to_string()));
        state.reduce(LibraryAction::ToggleBookmarksOnly);

        let view = state.view();
        assert_eq!(view.filtered_count, 1);
        assert_eq!(view.documents[0].id, "3");
        assert_eq!(view.documents[0].is_bookmarked, Some(true));
    }

    #[test]
    fn test_set_page_is_clamped() {
        let mut state = LibraryState::new(catalog(15)).with_today(today());
        state.reduce(LibraryAction::SetPage(99));
        assert_eq!(state.pagination().current_page, 2);
        state.reduce(LibraryAction::SetPage(0));
        assert_eq!(state.pagination().current_page, 1);
    }

    #[test]
    fn test_set_page_is_clamped_to_filtered_pages() {
        let mut state = LibraryState::new(catalog(47)).with_today(today());
        state.reduce(LibraryAction::UpdateFilters(FilterPatch {
            document_type: Some(vec!["FAQ".to_string()]),
            ..Default::default()
        }));
        state.reduce(LibraryAction::SetPage(5));

        let view = state.view();
        assert_eq!(view.total_pages, 2);
        assert_eq!(state.pagination().current_page, 2);
        assert_eq!(view.current_page, 2);
        assert_eq!(view.documents.len(), 2);
    }

    #[test]
    fn test_selection_toggle_and_select_all() {
        let mut state = LibraryState::new(catalog(3)).with_today(today());
        state.reduce(LibraryAction::ToggleSelection("2".to_string()));
        state.reduce(LibraryAction::ToggleSelection("missing".to_string()));
        assert_eq!(state.selected_documents().len(), 1);

        state.reduce(LibraryAction::SelectAll);
        assert_eq!(state.view().selected_count, 3);

        state.reduce(LibraryAction::ToggleSelection("2".to_string()));
        let ids: Vec<&str> = state.selected_documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        state.reduce(LibraryAction::ClearSelection);
        assert!(state.selected_documents().is_empty());
    }

    #[test]
    fn test_clear_all_filters() {
        let mut state = LibraryState::new(catalog(20)).with_today(today());
        state.reduce(LibraryAction::UpdateFilters(FilterPatch {
            document_type: Some(vec!["Guidelines".to_string()]),
            publication_date: Some(Some("This month".to_string())),
            ..Default::default()
        }));
        assert_eq!(state.view().filtered_count, 8);

        state.reduce(LibraryAction::ClearAllFilters);
        assert_eq!(state.filters(), &FilterState::default());
        assert_eq!(state.view().filtered_count, 20);
    }
}
