//! BookStack REST API access: the call surface used by the exporter, and its HTTP client.

mod client;
mod error;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{BookStackClient, BookStackClientBuilder};
pub use error::ApiError;

use crate::model::{Book, BookSummary, Shelf, ShelfSummary, SystemInfo};

/// Remote operations the exporter needs from a BookStack instance.
///
/// [BookStackClient] talks HTTP; tests substitute an in-memory instance.
pub trait BookStackApi {
    /// All shelves, across every list page.
    fn list_shelves(&mut self) -> Result<Vec<ShelfSummary>, ApiError>;

    fn read_shelf(&mut self, id: u64) -> Result<Shelf, ApiError>;

    /// All books, across every list page.
    fn list_books(&mut self) -> Result<Vec<BookSummary>, ApiError>;

    /// Book detail including its chapter/page tree.
    fn read_book(&mut self, id: u64) -> Result<Book, ApiError>;

    fn export_book_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError>;

    fn export_chapter_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError>;

    fn export_page_pdf(&mut self, id: u64) -> Result<Vec<u8>, ApiError>;

    fn system_info(&mut self) -> Result<SystemInfo, ApiError>;
}
