//! Export orchestration: fetch a book, decide whether it changed, and write its PDF(s).

use crate::api::{ApiError, BookStackApi};
use crate::model::{Book, ContentNode, Node};
use crate::selector::needs_export;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Settings fixed for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    /// Root output directory. Must exist before exporting.
    pub download_dir: PathBuf,
    /// Perform all remote reads but write nothing.
    pub test_mode: bool,
    /// One PDF per top-level chapter/page instead of one per book.
    pub split_book: bool,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookExport {
    /// Nothing in the book changed since the last run.
    Skipped { name: String },
    /// Files written, or in test mode the files that would have been written.
    Exported { name: String, files: Vec<PathBuf> },
}

impl BookExport {
    pub fn files(&self) -> &[PathBuf] {
        match self {
            BookExport::Skipped { .. } => &[],
            BookExport::Exported { files, .. } => files,
        }
    }
}

/// Exports books from one BookStack instance into [ExportConfig::download_dir].
pub struct Exporter<'a> {
    api: &'a mut dyn BookStackApi,
    config: ExportConfig,
}

impl<'a> Exporter<'a> {
    pub fn new(api: &'a mut dyn BookStackApi, config: ExportConfig) -> Self {
        Self { api, config }
    }

    /// Export one book if it, or anything in it, changed since `since`.
    ///
    /// The modified check gates the whole book: in split mode every chapter and page
    /// is written once any part of the book qualifies.
    pub fn export_book(
        &mut self,
        book_id: u64,
        since: Option<DateTime<Utc>>,
    ) -> Result<BookExport, ExportError> {
        let book = self.api.read_book(book_id)?;

        if !needs_export(Node::Book(&book), since) {
            tracing::debug!(book = %book.name, "unchanged, skipping");
            return Ok(BookExport::Skipped { name: book.name });
        }

        tracing::info!("Extracting {}", book.name);

        let files = if self.config.test_mode {
            self.plan(&book)
        } else if self.config.split_book {
            self.write_split(&book)?
        } else {
            vec![self.write_whole(&book)?]
        };

        Ok(BookExport::Exported {
            name: book.name,
            files,
        })
    }

    fn book_pdf_path(&self, book: &Book) -> PathBuf {
        self.config
            .download_dir
            .join(format!("{}.pdf", file_stem(&book.name)))
    }

    fn book_dir(&self, book: &Book) -> PathBuf {
        self.config.download_dir.join(file_stem(&book.name))
    }

    /// Test mode: report what would be saved without fetching any PDF.
    fn plan(&self, book: &Book) -> Vec<PathBuf> {
        for item in &book.contents {
            tracing::info!("Saving {}: {}", item.name(), item.kind());
        }
        if self.config.split_book {
            let dir = self.book_dir(book);
            book.contents
                .iter()
                .map(|item| item_pdf_path(&dir, item))
                .collect()
        } else {
            vec![self.book_pdf_path(book)]
        }
    }

    fn write_whole(&mut self, book: &Book) -> Result<PathBuf, ExportError> {
        let pdf = self.api.export_book_pdf(book.id)?;
        let path = self.book_pdf_path(book);
        write_file(&path, &pdf)?;
        Ok(path)
    }

    fn write_split(&mut self, book: &Book) -> Result<Vec<PathBuf>, ExportError> {
        let dir = self.book_dir(book);
        std::fs::create_dir_all(&dir).map_err(|e| ExportError::Io {
            path: dir.clone(),
            source: e,
        })?;

        let mut files = Vec::with_capacity(book.contents.len());
        for item in &book.contents {
            tracing::info!("Saving {}: {}", item.name(), item.kind());
            let pdf = match item {
                ContentNode::Chapter(c) => self.api.export_chapter_pdf(c.id)?,
                ContentNode::Page(p) => self.api.export_page_pdf(p.id)?,
            };
            // Same-named items overwrite each other; last write wins.
            let path = item_pdf_path(&dir, item);
            write_file(&path, &pdf)?;
            files.push(path);
        }
        Ok(files)
    }
}

fn item_pdf_path(dir: &Path, item: &ContentNode) -> PathBuf {
    dir.join(format!("{}.pdf", file_stem(item.name())))
}

/// Entity name usable as a single path component. Only separators and control
/// characters are replaced; everything else is kept as BookStack shows it.
pub fn file_stem(name: &str) -> String {
    let s: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();
    match s.trim() {
        "" | "." | ".." => "untitled".to_string(),
        t => t.to_string(),
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    tracing::debug!(path = %path.display(), bytes = contents.len(), "writing");
    std::fs::write(path, contents).map_err(|e| ExportError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}
