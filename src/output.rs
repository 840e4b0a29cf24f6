use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Media type offered with every per-document download.
pub const TEXT_MIME_TYPE: &str = "text/plain";

/// A separator line plus the blank-line whitespace around it.
static PAGE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n*\s*--- Page \d+ ---\s*\n*").expect("valid separator pattern"));

/// Header placed before each page's text in a multi-page document.
pub(crate) fn page_header(page: u32) -> String {
    format!("\n\n--- Page {page} ---\n\n")
}

// ── TextFile ─────────────────────────────────────────────────────────────────

/// One converted document, ready to be offered as a `.txt` download or
/// packed into the batch archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextFile {
    /// Output name: the source name with its extension replaced by `.txt`.
    pub filename: String,

    /// Extracted text, after any caller-side formatting.
    pub text: String,

    /// Warnings produced while extracting this document.
    pub warnings: Vec<String>,
}

impl TextFile {
    /// Name the output after `source_name`.
    ///
    /// ```
    /// # use pdf2txt::TextFile;
    /// let file = TextFile::for_source("minutes.2024.pdf", "text".into(), vec![]);
    /// assert_eq!(file.filename, "minutes.2024.txt");
    /// ```
    pub fn for_source(source_name: &str, text: String, warnings: Vec<String>) -> Self {
        Self {
            filename: to_txt_filename(source_name),
            text,
            warnings,
        }
    }

    /// UTF-8 bytes of the download.
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

// ── Formatting helpers ───────────────────────────────────────────────────────

/// Replace the extension of `source_name` with `.txt`.
///
/// Only the part after the last `.` is dropped; a name without a `.` keeps
/// its full stem.
///
/// ```
/// # use pdf2txt::to_txt_filename;
/// assert_eq!(to_txt_filename("report.pdf"), "report.txt");
/// assert_eq!(to_txt_filename("a.b.PDF"), "a.b.txt");
/// assert_eq!(to_txt_filename("README"), "README.txt");
/// ```
pub fn to_txt_filename(source_name: &str) -> String {
    let stem = source_name.rsplit_once('.').map_or(source_name, |(stem, _)| stem);
    format!("{stem}.txt")
}

/// Remove every `--- Page n ---` header from extracted text.
///
/// Each header and the blank lines around it collapse into one newline and
/// the result is trimmed, which is what extraction without headers would
/// have produced for the same pages.
///
/// ```
/// # use pdf2txt::strip_page_separators;
/// let text = "--- Page 1 ---\n\nHello\n\n--- Page 2 ---\n\nWorld";
/// assert_eq!(strip_page_separators(text), "Hello\nWorld");
/// ```
pub fn strip_page_separators(text: &str) -> String {
    PAGE_SEPARATOR.replace_all(text, "\n").trim().to_owned()
}
