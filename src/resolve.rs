//! Resolve shelf and book slugs to remote entities.

use crate::api::{ApiError, BookStackApi};
use crate::model::{BookSummary, Shelf};
use std::collections::HashMap;

/// Look up a shelf by slug and read its detail. `Ok(None)` when no shelf has that slug.
pub fn resolve_shelf(api: &mut dyn BookStackApi, slug: &str) -> Result<Option<Shelf>, ApiError> {
    let ids: HashMap<String, u64> = api
        .list_shelves()?
        .into_iter()
        .map(|s| (s.slug, s.id))
        .collect();
    match ids.get(slug) {
        Some(&id) => api.read_shelf(id).map(Some),
        None => {
            tracing::warn!("{} is not a valid shelf", slug);
            Ok(None)
        }
    }
}

/// First book in the books list whose slug matches. `Ok(None)` when there is none.
pub fn resolve_book(
    api: &mut dyn BookStackApi,
    slug: &str,
) -> Result<Option<BookSummary>, ApiError> {
    let book = api.list_books()?.into_iter().find(|b| b.slug == slug);
    if book.is_none() {
        tracing::warn!("{} is not a valid book", slug);
    }
    Ok(book)
}
