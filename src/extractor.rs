use serde::Serialize;

use crate::document::PdfDocument;
use crate::layout::TextLayout;
use crate::log_sink::LogSink;
use crate::output::page_header;
use crate::{AccessDenied, ConvertError, Result};

/// Warning appended when the whole document produced no text.
pub(crate) const NO_TEXT_WARNING: &str =
    "No text was extracted. The PDF may be a scanned image without OCR.";

// ── PdfSource ────────────────────────────────────────────────────────────────

/// What the [`Extractor`] needs from an opened document.
///
/// [`PdfDocument`] implements it on top of lopdf; tests substitute in-memory
/// documents.
pub trait PdfSource {
    /// `true` while the document is encrypted and needs a password to open.
    fn is_encrypted(&self) -> bool;

    /// Try to decrypt with `password`. Returns `Ok(false)` when it does not
    /// unlock the document, and an error when the decrypted document turns
    /// out to be unreadable.
    fn unlock(&mut self, password: &str) -> Result<bool>;

    /// Number of pages.
    fn page_count(&self) -> usize;

    /// Text of the 1-based `page`, or `None` when the page yields no text.
    fn page_text(&self, page: u32, layout: &TextLayout) -> Result<Option<String>>;
}

// ── ExtractionResult ─────────────────────────────────────────────────────────

/// Text of a whole document plus the warnings gathered while reading it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Page texts in page order, trimmed, with `--- Page n ---` headers when
    /// the document has more than one page.
    pub text: String,

    /// One entry per page without text, plus a final entry when the whole
    /// document yielded nothing.
    pub warnings: Vec<String>,
}

// ── Extractor ────────────────────────────────────────────────────────────────

/// Turns a PDF into an [`ExtractionResult`] in a single pass over its pages.
///
/// Every step is recorded in the [`LogSink`] the extractor was built with.
#[derive(Debug, Clone)]
pub struct Extractor {
    sink: LogSink,
    layout: TextLayout,
}

impl Extractor {
    pub fn new(sink: LogSink) -> Self {
        Self::with_layout(sink, TextLayout::default())
    }

    pub fn with_layout(sink: LogSink, layout: TextLayout) -> Self {
        Self { sink, layout }
    }

    /// Extract the text of an in-memory PDF.
    ///
    /// An empty password counts as no password. A password given for an
    /// unencrypted document is ignored.
    ///
    /// # Errors
    ///
    /// - [`ConvertError::AccessDenied`] when the document is encrypted and the
    ///   password is missing or wrong. No page is read in that case.
    /// - [`ConvertError::CorruptDocument`] when the bytes cannot be parsed or a
    ///   page cannot be read.
    pub fn extract(&self, bytes: &[u8], password: Option<&str>) -> Result<ExtractionResult> {
        let password = password.filter(|p| !p.is_empty());

        let document = PdfDocument::from_bytes(bytes).map_err(|err| match (err, password) {
            // The encryption dictionary itself is unusable, so no password
            // can open the document.
            (ConvertError::AccessDenied(_), Some(_)) => AccessDenied::IncorrectPassword.into(),
            (err, _) => err,
        })?;
        self.extract_from(document, password)
    }

    /// Run the extraction over an already opened document.
    pub fn extract_from<S: PdfSource>(&self, mut source: S, password: Option<&str>) -> Result<ExtractionResult> {
        self.unlock(&mut source, password)?;

        let page_count = source.page_count();
        self.sink.info(format!("Pages detected: {page_count}"));

        let mut warnings = Vec::new();
        let mut chunks = String::new();

        for page in 1..=page_count as u32 {
            match source.page_text(page, &self.layout)? {
                Some(text) => {
                    if page_count > 1 {
                        chunks.push_str(&page_header(page));
                    }
                    chunks.push_str(&text);
                }
                None => {
                    warnings.push(format!(
                        "Page {page}: no text could be extracted (it may be a scanned image)."
                    ));
                    self.sink.warning(format!("Page {page} has no extractable text."));
                }
            }
        }

        let text = chunks.trim().to_owned();
        if text.is_empty() {
            warnings.push(NO_TEXT_WARNING.to_owned());
            self.sink
                .warning("Empty extraction; consider external OCR if the PDF is an image.");
        }

        Ok(ExtractionResult { text, warnings })
    }

    fn unlock<S: PdfSource>(&self, source: &mut S, password: Option<&str>) -> Result<()> {
        if !source.is_encrypted() {
            return Ok(());
        }
        self.sink.info("The PDF is encrypted.");

        let password = password.ok_or(ConvertError::AccessDenied(AccessDenied::PasswordRequired))?;
        if !source.unlock(password)? {
            return Err(AccessDenied::IncorrectPassword.into());
        }
        self.sink.info("Decrypted with the supplied password.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    /// In-memory document that counts page reads.
    struct FakeDocument {
        pages: Vec<Option<&'static str>>,
        password: Option<&'static str>,
        reads: Cell<usize>,
    }

    impl FakeDocument {
        fn plain(pages: Vec<Option<&'static str>>) -> Self {
            Self {
                pages,
                password: None,
                reads: Cell::new(0),
            }
        }

        fn encrypted(pages: Vec<Option<&'static str>>, password: &'static str) -> Self {
            Self {
                password: Some(password),
                ..Self::plain(pages)
            }
        }
    }

    impl PdfSource for &FakeDocument {
        fn is_encrypted(&self) -> bool {
            self.password.is_some()
        }

        fn unlock(&mut self, password: &str) -> Result<bool> {
            Ok(self.password == Some(password))
        }

        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn page_text(&self, page: u32, _layout: &TextLayout) -> Result<Option<String>> {
            self.reads.set(self.reads.get() + 1);
            Ok(self.pages[page as usize - 1].map(str::to_owned))
        }
    }

    fn extractor() -> (Extractor, LogSink) {
        let sink = LogSink::new();
        (Extractor::new(sink.clone()), sink)
    }

    #[test]
    fn two_pages_get_headers() {
        let (extractor, _) = extractor();
        let doc = FakeDocument::plain(vec![Some("Hello"), Some("World")]);

        let result = extractor.extract_from(&doc, None).unwrap();
        assert_eq!(result.text, "--- Page 1 ---\n\nHello\n\n--- Page 2 ---\n\nWorld");
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn single_page_never_gets_a_header() {
        let (extractor, _) = extractor();
        let doc = FakeDocument::plain(vec![Some("  only page \n")]);

        let result = extractor.extract_from(&doc, None).unwrap();
        assert_eq!(result.text, "only page");
    }

    #[test]
    fn empty_pages_are_warned_and_skipped() {
        let (extractor, sink) = extractor();
        let doc = FakeDocument::plain(vec![Some("one"), None, Some("three")]);

        let result = extractor.extract_from(&doc, None).unwrap();
        assert_eq!(result.text, "--- Page 1 ---\n\none\n\n--- Page 3 ---\n\nthree");
        assert_eq!(
            result.warnings,
            vec!["Page 2: no text could be extracted (it may be a scanned image).".to_string()]
        );
        assert_eq!(doc.reads.get(), 3);
        assert!(sink.contents().contains("| WARNING | Page 2 has no extractable text."));
    }

    #[test]
    fn all_empty_pages_add_the_document_warning_once() {
        let (extractor, _) = extractor();
        let doc = FakeDocument::plain(vec![None, None]);

        let result = extractor.extract_from(&doc, None).unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.warnings.len(), 3);
        assert_eq!(result.warnings.iter().filter(|w| *w == NO_TEXT_WARNING).count(), 1);
    }

    #[test]
    fn zero_pages_yield_only_the_document_warning() {
        let (extractor, _) = extractor();
        let doc = FakeDocument::plain(vec![]);

        let result = extractor.extract_from(&doc, None).unwrap();
        assert_eq!(result.warnings, vec![NO_TEXT_WARNING.to_string()]);
    }

    #[test]
    fn encrypted_without_password_reads_no_page() {
        let (extractor, _) = extractor();
        let doc = FakeDocument::encrypted(vec![Some("secret text")], "s3cret");

        let err = extractor.extract_from(&doc, None).unwrap_err();
        assert!(matches!(err, ConvertError::AccessDenied(AccessDenied::PasswordRequired)));
        assert_eq!(doc.reads.get(), 0);
    }

    #[test]
    fn encrypted_with_wrong_password_is_denied() {
        let (extractor, _) = extractor();
        let doc = FakeDocument::encrypted(vec![Some("secret text")], "s3cret");

        let err = extractor.extract_from(&doc, Some("guess")).unwrap_err();
        assert!(matches!(err, ConvertError::AccessDenied(AccessDenied::IncorrectPassword)));
        assert_eq!(doc.reads.get(), 0);
    }

    #[test]
    fn encrypted_with_right_password_matches_plain_document() {
        let (extractor, sink) = extractor();
        let pages = vec![Some("alpha"), None, Some("gamma")];
        let locked = FakeDocument::encrypted(pages.clone(), "s3cret");
        let plain = FakeDocument::plain(pages);

        let unlocked = extractor.extract_from(&locked, Some("s3cret")).unwrap();
        assert_eq!(unlocked, extractor.extract_from(&plain, None).unwrap());
        assert!(sink.contents().contains("Decrypted with the supplied password."));
    }

    #[test]
    fn password_for_plain_document_is_ignored() {
        let (extractor, _) = extractor();
        let doc = FakeDocument::plain(vec![Some("open")]);

        let result = extractor.extract_from(&doc, Some("whatever")).unwrap();
        assert_eq!(result.text, "open");
    }

    #[test]
    fn extraction_is_repeatable() {
        let (extractor, _) = extractor();
        let doc = FakeDocument::plain(vec![Some("a"), None, Some("c")]);

        let first = extractor.extract_from(&doc, None).unwrap();
        let second = extractor.extract_from(&doc, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn garbage_bytes_are_a_corrupt_document() {
        let (extractor, sink) = extractor();
        let err = extractor.extract(b"definitely not a pdf", None).unwrap_err();
        assert!(matches!(err, ConvertError::CorruptDocument(_)));
        // Failures are logged once, by the batch runner.
        assert!(!sink.contents().contains("| ERROR |"));
    }
}
