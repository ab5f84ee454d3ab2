//! bookstack-export: export BookStack shelves and books to PDF files.

pub mod api;
pub mod cli;
pub mod config;
pub mod export;
pub mod last_run;
pub mod logging;
pub mod model;
pub mod resolve;
pub mod selector;

// Re-exports for CLI and consumers.
pub use api::{ApiError, BookStackApi, BookStackClient, BookStackClientBuilder};
pub use export::{BookExport, ExportConfig, ExportError, Exporter};
pub use last_run::{read_last_run, write_last_run, LastRunError};
pub use resolve::{resolve_book, resolve_shelf};
pub use selector::needs_export;
