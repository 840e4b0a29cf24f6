use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;

use crate::extractor::PdfSource;
use crate::layout::{self, GlyphCollector, TextLayout};
use crate::validator::PdfValidator;
use crate::{AccessDenied, ConvertError, Result};

// ── PdfDocument ──────────────────────────────────────────────────────────────

/// A PDF loaded into memory.
///
/// lopdf parses the file, resolves its encryption and checks its structure;
/// pdf-extract then interprets the pages. This is the [`PdfSource`] the
/// [`Extractor`](crate::Extractor) uses for real documents.
///
/// ```no_run
/// use pdf2txt::{PdfDocument, PdfSource, TextLayout};
///
/// let bytes = std::fs::read("report.pdf").unwrap();
/// let doc = PdfDocument::from_bytes(&bytes).unwrap();
/// println!("{} page(s), locked: {}", doc.page_count(), doc.is_encrypted());
/// let first = doc.page_text(1, &TextLayout::default()).unwrap();
/// ```
pub struct PdfDocument {
    state: State,
}

enum State {
    /// Encrypted with a user password. Only the raw bytes are kept until a
    /// password unlocks them.
    Locked(Vec<u8>),
    Open(pdf_extract::Document),
}

impl PdfDocument {
    /// Parse an in-memory PDF.
    ///
    /// A document protected by a user password is not an error here: it
    /// comes back locked, with [`PdfSource::is_encrypted`] returning `true`
    /// until [`PdfSource::unlock`] succeeds. Documents that only carry an
    /// owner password open straight away.
    ///
    /// Fails with [`ConvertError::CorruptDocument`] when the bytes are not a
    /// readable PDF.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(classify_load_error)?;

        // lopdf decrypts with the empty user password on its own; when that
        // fails the trailer still points at /Encrypt and nothing else is loaded.
        if document.is_encrypted() {
            return Ok(Self {
                state: State::Locked(data.to_vec()),
            });
        }
        Self::open(data, document)
    }

    fn open(data: &[u8], mut document: Document) -> Result<Self> {
        PdfValidator::new(&document).validate_structure()?;

        // pdf-extract reads the decrypted objects back from a plain copy.
        let text = if document.was_encrypted() {
            let mut plain = Vec::new();
            document.save_to(&mut plain)?;
            pdf_extract::Document::load_mem(&plain)
        } else {
            pdf_extract::Document::load_mem(data)
        }
        .map_err(corrupt)?;

        Ok(Self {
            state: State::Open(text),
        })
    }

    fn text_document(&self) -> Option<&pdf_extract::Document> {
        match &self.state {
            State::Open(document) => Some(document),
            State::Locked(_) => None,
        }
    }
}

impl PdfSource for PdfDocument {
    fn is_encrypted(&self) -> bool {
        matches!(self.state, State::Locked(_))
    }

    fn unlock(&mut self, password: &str) -> Result<bool> {
        let State::Locked(data) = &self.state else {
            return Ok(true);
        };

        let document = match Document::load_mem_with_password(data, password) {
            Ok(document) => document,
            Err(lopdf::Error::InvalidPassword) => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        *self = Self::open(data, document)?;
        Ok(true)
    }

    fn page_count(&self) -> usize {
        self.text_document().map_or(0, |doc| doc.get_pages().len())
    }

    fn page_text(&self, page: u32, layout: &TextLayout) -> Result<Option<String>> {
        let document = self
            .text_document()
            .ok_or(ConvertError::AccessDenied(AccessDenied::PasswordRequired))?;
        if page == 0 || page as usize > document.get_pages().len() {
            return Err(ConvertError::CorruptDocument(format!("page {page} does not exist")));
        }

        // pdf-extract panics on some malformed content instead of failing.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut collector = GlyphCollector::default();
            pdf_extract::output_doc_page(document, &mut collector, page).map(|()| collector.into_glyphs())
        }));

        let glyphs = match outcome {
            Ok(Ok(glyphs)) => glyphs,
            Ok(Err(err)) => return Err(corrupt(format_args!("page {page}: {err}"))),
            Err(_) => return Err(corrupt(format_args!("page {page} could not be interpreted"))),
        };
        Ok(layout::assemble_text(&glyphs, layout))
    }
}

fn corrupt(err: impl Display) -> ConvertError {
    ConvertError::CorruptDocument(err.to_string())
}

/// A broken encryption dictionary stops lopdf before any password is tried.
fn classify_load_error(err: lopdf::Error) -> ConvertError {
    match err {
        lopdf::Error::Decryption(_) | lopdf::Error::InvalidPassword => {
            ConvertError::AccessDenied(AccessDenied::PasswordRequired)
        }
        err => err.into(),
    }
}
