//! # pdf2txt
//!
//! Converts PDF documents into plain text and bundles batches into a zip
//! archive, behind a small browser upload form.
//!
//! ## What this crate does
//!
//! 1. **Open the document**: parses the bytes with lopdf and checks the
//!    catalog and trailer are present.
//! 2. **Resolve encryption**: a document protected by a user password stays
//!    locked until the password that opens it is supplied; otherwise
//!    extraction stops before any page is read.
//! 3. **Extract page text**: pdf-extract interprets each page's content
//!    stream and the glyph positions it reports are rebuilt into lines using
//!    horizontal and vertical tolerances.
//! 4. **Compose the output**: joins pages with `--- Page n ---` headers when
//!    the document has more than one page and collects warnings for pages that
//!    yield no text.
//! 5. **Batch**: converts every uploaded file in order, isolates failures per
//!    document and packs the successful results into `txt_convertidos.zip`.
//!
//! ## Quick example
//!
//! ```no_run
//! use pdf2txt::{Extractor, LogSink};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = std::fs::read("report.pdf")?;
//! let extractor = Extractor::new(LogSink::new());
//!
//! let result = extractor.extract(&bytes, None)?;
//! println!("{}", result.text);
//! for warning in &result.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;

use thiserror::Error;

mod archive;
mod batch;
mod document;
mod extractor;
mod layout;
mod log_sink;
mod output;
mod validator;
pub mod web;

pub use archive::{build_archive, ARCHIVE_MIME_TYPE, ARCHIVE_NAME};
pub use batch::{BatchReport, Converter, DocumentOutcome, DocumentReport, RunOptions, Upload};
pub use document::PdfDocument;
pub use extractor::{ExtractionResult, Extractor, PdfSource};
pub use layout::TextLayout;
pub use log_sink::{Level, LogSink};
pub use output::{strip_page_separators, to_txt_filename, TextFile, TEXT_MIME_TYPE};

// ── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration for a [`Converter`].
///
/// The two toggles are the defaults offered by the upload form; every run may
/// override them through [`RunOptions`].
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// When `true` every uploaded file is converted. When `false` only the
    /// first one is, matching a single-file upload widget.
    pub batch_mode: bool,

    /// When `false` the `--- Page n ---` headers are removed from the text
    /// after extraction.
    pub page_separators: bool,

    /// Tolerances used to rebuild lines from glyph positions.
    pub layout: TextLayout,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            batch_mode: true,
            page_separators: true,
            layout: TextLayout::default(),
        }
    }
}

impl ConverterConfig {
    /// The per-run options this configuration implies.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            batch_mode: self.batch_mode,
            page_separators: self.page_separators,
        }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

/// Why an encrypted document could not be opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// The document is encrypted and no password was supplied.
    PasswordRequired,
    /// The supplied password does not unlock the document.
    IncorrectPassword,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessDenied::PasswordRequired => {
                f.write_str("the PDF is protected; a password is required")
            }
            AccessDenied::IncorrectPassword => {
                f.write_str("incorrect password for the protected PDF")
            }
        }
    }
}

/// Every error that this crate can produce.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The document is encrypted and could not be unlocked.
    #[error("{0}")]
    AccessDenied(AccessDenied),

    /// The bytes could not be parsed or read as a PDF document.
    #[error("corrupt PDF: {0}")]
    CorruptDocument(String),

    /// A run was requested without any uploaded file.
    #[error("no PDF files were uploaded")]
    NoDocuments,

    /// The zip archive could not be written.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A filesystem or buffer I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// `true` for the user-correctable missing or wrong password case.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, ConvertError::AccessDenied(_))
    }
}

impl From<lopdf::Error> for ConvertError {
    fn from(err: lopdf::Error) -> Self {
        ConvertError::CorruptDocument(err.to_string())
    }
}

impl From<AccessDenied> for ConvertError {
    fn from(reason: AccessDenied) -> Self {
        ConvertError::AccessDenied(reason)
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, ConvertError>;
