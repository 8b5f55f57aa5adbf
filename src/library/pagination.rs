use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page numbers are shown in full up to this many pages.
const MAX_VISIBLE_PAGES: usize = 7;

/// Pages shown on each side of the current page once the list is windowed.
const WINDOW_RADIUS: usize = 2;

/// Requested page position. `current_page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of a filtered list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    /// 1-based index of the first item on the page (0 when empty).
    pub start_item: usize,
    /// 1-based index of the last item on the page (0 when empty).
    pub end_item: usize,
}

/// `max(1, ceil(total_items / page_size))`.
pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_items.div_ceil(page_size).max(1)
}

/// Clamp a requested page into `1..=total_pages`.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Slice an ordered list into the requested page.
pub fn paginate<T: Clone>(items: &[T], current_page: usize, page_size: usize) -> PageSlice<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_pages(total_items, page_size);
    let current_page = clamp_page(current_page, total_pages);

    let start = ((current_page - 1) * page_size).min(total_items);
    let end = (start + page_size).min(total_items);
    let page_items = items[start..end].to_vec();

    let (start_item, end_item) = if page_items.is_empty() {
        (0, 0)
    } else {
        (start + 1, end)
    };

    PageSlice {
        items: page_items,
        current_page,
        page_size,
        total_pages,
        total_items,
        start_item,
        end_item,
    }
}

/// A page-number button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "page", rename_all = "camelCase")]
pub enum PageButton {
    Page(usize),
    Ellipsis,
}

/// Page buttons to render: every page when there are few, otherwise the
/// first and last pages anchoring a window of `current ± 2`.
pub fn visible_pages(current_page: usize, total_pages: usize) -> Vec<PageButton> {
    let total_pages = total_pages.max(1);
    let current = clamp_page(current_page, total_pages);

    if total_pages <= MAX_VISIBLE_PAGES {
        return (1..=total_pages).map(PageButton::Page).collect();
    }

    let start = current.saturating_sub(WINDOW_RADIUS).max(2);
    let end = (current + WINDOW_RADIUS).min(total_pages - 1);

    let mut pages = vec![PageButton::Page(1)];
    if start > 2 {
        pages.push(PageButton::Ellipsis);
    }
    pages.extend((start..=end).map(PageButton::Page));
    if end < total_pages - 1 {
        pages.push(PageButton::Ellipsis);
    }
    pages.push(PageButton::Page(total_pages));
    pages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_partition_the_list() {
        let items: Vec<usize> = (0..47).collect();
        let pages = total_pages(items.len(), 10);
        assert_eq!(pages, 5);

        let mut seen = Vec::new();
        for page in 1..=pages {
            seen.extend(paginate(&items, page, 10).items);
        }
        assert_eq!(seen, items);
        assert_eq!(paginate(&items, 5, 10).items.len(), 7);
    }

    #[test]
    fn test_empty_list_has_one_page() {
        let items: Vec<u8> = Vec::new();
        let slice = paginate(&items, 3, 10);
        assert_eq!(slice.total_pages, 1);
        assert_eq!(slice.current_page, 1);
        assert!(slice.items.is_empty());
        assert_eq!((slice.start_item, slice.end_item), (0, 0));
    }

    #[test]
    fn test_out_of_range_page_is_clamped() {
        let items: Vec<usize> = (0..12).collect();
        let slice = paginate(&items, 9, 10);
        assert_eq!(slice.current_page, 2);
        assert_eq!(slice.items, vec![10, 11]);
        assert_eq!((slice.start_item, slice.end_item), (11, 12));

        assert_eq!(paginate(&items, 0, 10).current_page, 1);
    }

    #[test]
    fn test_zero_page_size_is_treated_as_one() {
        let items = vec!['a', 'b'];
        let slice = paginate(&items, 2, 0);
        assert_eq!(slice.page_size, 1);
        assert_eq!(slice.items, vec!['b']);
    }

    #[test]
    fn test_visible_pages_small_total() {
        assert_eq!(
            visible_pages(2, 3),
            vec![PageButton::Page(1), PageButton::Page(2), PageButton::Page(3)]
        );
    }

    #[test]
    fn test_visible_pages_windowed() {
        use PageButton::*;
        assert_eq!(
            visible_pages(10, 20),
            vec![Page(1), Ellipsis, Page(8), Page(9), Page(10), Page(11), Page(12), Ellipsis, Page(20)]
        );
        assert_eq!(
            visible_pages(1, 20),
            vec![Page(1), Page(2), Page(3), Ellipsis, Page(20)]
        );
        assert_eq!(
            visible_pages(20, 20),
            vec![Page(1), Ellipsis, Page(18), Page(19), Page(20)]
        );
    }

    #[test]
    fn test_visible_pages_always_bounded_and_contains_current() {
        for total in 1..40 {
            for current in 1..=total {
                let pages = visible_pages(current, total);
                assert!(pages.len() <= 9);
                assert!(pages.contains(&PageButton::Page(current)));
            }
        }
    }
}
