use serde::Serialize;

use crate::archive::build_archive;
use crate::extractor::Extractor;
use crate::log_sink::LogSink;
use crate::output::{strip_page_separators, TextFile};
use crate::{ConvertError, ConverterConfig, Result};

/// Message shown for any failure that is not a password problem; the detail
/// goes to the log.
const GENERIC_FAILURE: &str = "Processing error, check the logs.";

// ── Inputs ───────────────────────────────────────────────────────────────────

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name the file had on the user's machine.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Toggles chosen for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunOptions {
    /// Convert every upload, or only the first one.
    pub batch_mode: bool,
    /// Keep the `--- Page n ---` headers in the output.
    pub page_separators: bool,
}

// ── Reports ──────────────────────────────────────────────────────────────────

/// Result of converting one upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Converted(TextFile),
    Failed {
        /// `true` for a missing or wrong password.
        access_denied: bool,
        /// Message to show next to the file name.
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    /// Name of the uploaded file.
    pub source: String,
    pub outcome: DocumentOutcome,
}

impl DocumentReport {
    pub fn converted(&self) -> Option<&TextFile> {
        match &self.outcome {
            DocumentOutcome::Converted(file) => Some(file),
            DocumentOutcome::Failed { .. } => None,
        }
    }
}

/// Everything one run produced, in upload order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub options: RunOptions,
    pub documents: Vec<DocumentReport>,
    /// Uploads received, including any ignored in single-file mode.
    pub uploaded: usize,
}

impl BatchReport {
    /// Successfully converted documents, in upload order.
    pub fn converted(&self) -> impl Iterator<Item = &TextFile> {
        self.documents.iter().filter_map(DocumentReport::converted)
    }

    pub fn converted_count(&self) -> usize {
        self.converted().count()
    }

    /// The zip of every converted document, offered only when more than one
    /// document succeeded.
    pub fn archive(&self) -> Result<Option<Vec<u8>>> {
        let files: Vec<TextFile> = self.converted().cloned().collect();
        if files.len() < 2 {
            return Ok(None);
        }
        build_archive(&files).map(Some)
    }
}

// ── Converter ────────────────────────────────────────────────────────────────

/// Runs a batch of uploads through the [`Extractor`].
///
/// Documents are converted one after the other. A failure is recorded
/// against its document and the run moves on to the next one.
#[derive(Debug, Clone)]
pub struct Converter {
    extractor: Extractor,
    sink: LogSink,
    config: ConverterConfig,
}

impl Converter {
    pub fn new(config: ConverterConfig, sink: LogSink) -> Self {
        Self {
            extractor: Extractor::with_layout(sink.clone(), config.layout),
            sink,
            config,
        }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Convert `uploads` with one shared `password`.
    ///
    /// `on_progress(done, total)` is called after every document.
    ///
    /// # Errors
    ///
    /// Only [`ConvertError::NoDocuments`], when there is nothing to convert.
    /// Per-document failures are part of the report.
    pub fn run<F>(
        &self,
        uploads: Vec<Upload>,
        password: Option<&str>,
        options: RunOptions,
        mut on_progress: F,
    ) -> Result<BatchReport>
    where
        F: FnMut(usize, usize),
    {
        if uploads.is_empty() {
            self.sink.warning("Conversion requested without any uploaded file.");
            return Err(ConvertError::NoDocuments);
        }

        let uploaded = uploads.len();
        let mut uploads = uploads;
        if !options.batch_mode && uploaded > 1 {
            for ignored in uploads.drain(1..) {
                self.sink
                    .warning(format!("{}: ignored, batch mode is off.", ignored.filename));
            }
        }

        let total = uploads.len();
        let mut documents = Vec::with_capacity(total);
        for (index, upload) in uploads.into_iter().enumerate() {
            let outcome = self.convert_one(&upload, password, options);
            documents.push(DocumentReport {
                source: upload.filename,
                outcome,
            });
            on_progress(index + 1, total);
        }

        Ok(BatchReport {
            options,
            documents,
            uploaded,
        })
    }

    fn convert_one(&self, upload: &Upload, password: Option<&str>, options: RunOptions) -> DocumentOutcome {
        match self.extractor.extract(&upload.bytes, password) {
            Ok(result) => {
                let text = if options.page_separators {
                    result.text
                } else {
                    strip_page_separators(&result.text)
                };
                self.sink.info(format!("Converted: {}", upload.filename));
                DocumentOutcome::Converted(TextFile::for_source(&upload.filename, text, result.warnings))
            }
            Err(ConvertError::AccessDenied(reason)) => {
                self.sink.error(format!("{}: {reason}", upload.filename));
                DocumentOutcome::Failed {
                    access_denied: true,
                    message: reason.to_string(),
                }
            }
            Err(err) => {
                self.sink
                    .error(format!("{}: unexpected error: {err:?}", upload.filename));
                DocumentOutcome::Failed {
                    access_denied: false,
                    message: GENERIC_FAILURE.to_owned(),
                }
            }
        }
    }
}
