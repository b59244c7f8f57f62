use serde::{Deserialize, Serialize};

/// Smallest page count reported, even for an empty result.
pub const MIN_TOTAL_PAGES: i64 = 1;

/// Pagination envelope shared by the local listings and the technology service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPage<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_items: i64,
    pub total_pages: i64,
}

impl<T> CustomPage<T> {
    /// Build an envelope from one page of results and the total item count.
    pub fn build(data: Vec<T>, page: i64, size: i64, total_items: i64) -> Self {
        let total_pages = if size > 0 {
            total_items / size + i64::from(total_items % size != 0)
        } else {
            0
        };
        Self {
            data,
            page,
            size,
            total_items,
            total_pages: total_pages.max(MIN_TOTAL_PAGES),
        }
    }

    /// Reuse another envelope's pagination metadata around different data.
    pub fn with_metadata_of<U>(data: Vec<T>, other: &CustomPage<U>) -> Self {
        Self {
            data,
            page: other.page,
            size: other.size,
            total_items: other.total_items,
            total_pages: other.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let page = CustomPage::build(vec![1, 2], 0, 2, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 5);
    }

    #[test]
    fn exact_division() {
        let page = CustomPage::build(vec![1, 2], 1, 2, 4);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn empty_result_reports_one_page() {
        let page: CustomPage<i32> = CustomPage::build(Vec::new(), 0, 10, 0);
        assert!(page.data.is_empty());
        assert_eq!(page.total_items, 0);
        assert_eq!(page.total_pages, MIN_TOTAL_PAGES);
    }

    #[test]
    fn huge_size_does_not_overflow() {
        let page: CustomPage<i32> = CustomPage::build(vec![], 0, i64::MAX, 3);
        assert_eq!(page.total_pages, 1);
        let page: CustomPage<i32> = CustomPage::build(vec![], 0, i64::MAX - 1, i64::MAX);
        assert_eq!(page.total_pages, 2);
    }

    #[test]
    fn zero_size_does_not_divide() {
        let page: CustomPage<i32> = CustomPage::build(vec![], 0, 0, 12);
        assert_eq!(page.total_pages, MIN_TOTAL_PAGES);
    }

    #[test]
    fn metadata_is_carried_over() {
        let remote = CustomPage::build(vec!["a"], 2, 1, 9);
        let local: CustomPage<u8> = CustomPage::with_metadata_of(vec![1], &remote);
        assert_eq!(local.page, 2);
        assert_eq!(local.size, 1);
        assert_eq!(local.total_items, 9);
        assert_eq!(local.total_pages, 9);
    }

    #[test]
    fn serializes_camel_case_envelope() {
        let page = CustomPage::build(vec![1], 0, 10, 1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": [1],
                "page": 0,
                "size": 10,
                "totalItems": 1,
                "totalPages": 1
            })
        );
    }
}
