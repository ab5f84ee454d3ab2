//! In-memory BookStack instance for unit tests. Records every call.

use crate::api::{ApiError, BookStackApi};
use crate::model::{Book, BookSummary, Chapter, ContentNode, Page, Shelf, ShelfSummary, SystemInfo};
use chrono::{DateTime, TimeZone, Utc};

pub(crate) fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub(crate) fn page(id: u64, name: &str, updated_at: DateTime<Utc>) -> Page {
    Page {
        id,
        name: name.to_string(),
        updated_at,
    }
}

pub(crate) fn chapter(
    id: u64,
    name: &str,
    updated_at: DateTime<Utc>,
    pages: Vec<Page>,
) -> Chapter {
    Chapter {
        id,
        name: name.to_string(),
        updated_at,
        pages,
    }
}

pub(crate) fn book(
    id: u64,
    name: &str,
    updated_at: DateTime<Utc>,
    contents: Vec<ContentNode>,
) -> Book {
    Book {
        id,
        slug: name.to_lowercase().replace(' ', "-"),
        name: name.to_string(),
        updated_at,
        contents,
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    pub shelves: Vec<Shelf>,
    pub books: Vec<Book>,
    pub calls: Vec<String>,
    /// When set, `system_info` fails with 401.
    pub reject_auth: bool,
    /// Export calls for this id fail with HTTP 500.
    pub fail_export: Option<u64>,
}

impl FakeApi {
    pub fn with_books(books: Vec<Book>) -> Self {
        FakeApi {
            books,
            ..Default::default()
        }
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn not_found(what: &str, id: u64) -> ApiError {
        ApiError::HttpStatus {
            status: 404,
            url: format!("fake://{}/{}", what, id),
            message: None,
        }
    }

    fn pdf(&self, kind: &str, id: u64) -> Result<Vec<u8>, ApiError> {
        if self.fail_export == Some(id) {
            return Err(ApiError::HttpStatus {
                status: 500,
                url: format!("fake://{}s/{}/export/pdf", kind, id),
                message: Some("Server Error".to_string()),
            });
        }
        Ok(format!("%PDF-1.7 {} {}", kind, id).into_bytes())
    }
}

impl BookStackApi for FakeApi {
    fn list_shelves(&mut self) -> Result<Vec<ShelfSummary>, ApiError> {
        self.calls.push("list_shelves".to_string());
        Ok(self
            .shelves
            .iter()
            .map(|s| ShelfSummary {
                id: s.id,
                slug: s.slug.clone(),
                name: s.name.clone(),
            })
            .collect())
    }

    fn read_shelf(&mut self, id: u64) -> Result<Shelf, ApiError> {
        self.calls.push(format!("read_shelf {}", id));
        self.shelves
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("shelves", id))
    }

    fn list_books(&mut self) -> Result<Vec<BookSummary>, ApiError> {
        self.calls.push("list_books".to_string());
        Ok(self
            .books
            .iter()
            .map(|b| BookSummary {
                id: b.id,
                slug: b.slug.clone(),
                name: b.name.clone(),
            })
            .collect())
    }

    fn read_book(&mut self, id: u64) -> Result<Book, ApiError> {
        self.calls.push(format!("read_book {}", id));
        self.books
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("books", id))
    }

    fn export_book_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError> {
        self.calls.push(format!("export_book {}", id));
        self.pdf("book", id)
    }

    fn export_chapter_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError> {
        self.calls.push(format!("export_chapter {}", id));
        self.pdf("chapter", id)
    }

    fn export_page_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError> {
        self.calls.push(format!("export_page {}", id));
        self.pdf("page", id)
    }

    fn system_info(&mut self) -> Result<SystemInfo, ApiError> {
        self.calls.push("system_info".to_string());
        if self.reject_auth {
            return Err(ApiError::Unauthorized {
                status: 401,
                url: "fake://api/system".to_string(),
            });
        }
        Ok(SystemInfo {
            app_name: "BookStack".to_string(),
            version: "v24.02".to_string(),
        })
    }
}
