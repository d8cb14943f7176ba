//! Paginated listing fetch.

use std::future::Future;

use crate::github::{GhError, Page};

/// GitHub only allows up to 100 items per page
/// https://docs.github.com/en/rest/using-the-rest-api/using-pagination-in-the-rest-api
pub const PAGE_LIMIT: u32 = 100;

/// Fetch every page of a listing and concatenate the items
///
/// Pages are requested from 1 upward until one reports itself last. Remote
/// ordering is preserved. Any page failure aborts the whole fetch; partial
/// results are discarded so callers only ever swap in complete listings.
pub async fn fetch_all_pages<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, GhError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Page<T>, GhError>>,
{
    let mut items = Vec::new();

    // Page offset starts from 1
    let mut page = 1;
    loop {
        let batch = fetch_page(page).await?;
        items.extend(batch.items);

        if batch.is_last {
            break;
        }
        page += 1;
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: Vec<u32>, is_last: bool) -> Result<Page<u32>, GhError> {
        Ok(Page { items, is_last })
    }

    #[tokio::test]
    async fn test_single_page() {
        let items = fetch_all_pages(|n| async move {
            assert_eq!(n, 1);
            page(vec![1, 2, 3], true)
        })
        .await
        .unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_order() {
        let items = fetch_all_pages(|n| async move {
            match n {
                1 => page(vec![10, 11], false),
                2 => page(vec![12], false),
                3 => page(vec![13, 14], true),
                _ => panic!("fetched past the last page"),
            }
        })
        .await
        .unwrap();
        assert_eq!(items, vec![10, 11, 12, 13, 14]);
    }

    #[tokio::test]
    async fn test_empty_listing() {
        let items = fetch_all_pages(|_| async { page(vec![], true) })
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_mid_sequence_failure_discards_partials() {
        let result = fetch_all_pages(|n| async move {
            match n {
                1 => page(vec![1], false),
                _ => Err(GhError::api(500, "boom".to_string())),
            }
        })
        .await;
        assert!(result.is_err());
    }
}
