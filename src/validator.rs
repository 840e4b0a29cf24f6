use crate::{ConvertError, Result};
use lopdf::Document;

// ── PdfValidator ──────────────────────────────────────────────────────────────
//
// Internal type. PdfDocument runs it right after loading.

pub(crate) struct PdfValidator<'a> {
    document: &'a Document,
}

impl<'a> PdfValidator<'a> {
    pub(crate) fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Check the mandatory structure lopdf does not enforce on load.
    ///
    /// A document may legitimately have zero pages, so only the catalog, its
    /// page tree root and the trailer are required.
    pub(crate) fn validate_structure(&self) -> Result<()> {
        if self.document.trailer.is_empty() {
            return Err(ConvertError::CorruptDocument("missing trailer dictionary".into()));
        }

        let catalog = self
            .document
            .catalog()
            .map_err(|e| ConvertError::CorruptDocument(format!("missing or invalid catalog: {e}")))?;

        catalog
            .get(b"Pages")
            .map_err(|_| ConvertError::CorruptDocument("catalog has no /Pages entry".into()))?;

        Ok(())
    }
}
