//! Name-based lookup across paginated list endpoints.

use std::future::Future;

use tracing::debug;

use crate::client::models::{Named, Page};
use crate::error::ProviderResult;

/// Page size used for name lookups.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Return the first entity whose name equals `name` exactly.
///
/// Pages are fetched in order starting at index 0. The scan stops at the
/// first match, at an empty page, or after the last page reported by the
/// backend. No match yields `Ok(None)`.
pub async fn find_first_by_name<T, F, Fut>(
    name: &str,
    page_size: i32,
    mut fetch: F,
) -> ProviderResult<Option<T>>
where
    T: Named,
    F: FnMut(i32, i32) -> Fut,
    Fut: Future<Output = ProviderResult<Page<T>>>,
{
    let mut page_index = 0;
    loop {
        let page = fetch(page_index, page_size).await?;
        debug!(
            name,
            page_index,
            items = page.content.len(),
            total_pages = page.total_pages,
            "scanning page for name match"
        );

        let has_next = page.has_next();
        if let Some(found) = page.content.into_iter().find(|item| item.name() == name) {
            return Ok(Some(found));
        }
        if !has_next {
            return Ok(None);
        }
        page_index += 1;
    }
}
