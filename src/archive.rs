use std::collections::HashSet;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::output::TextFile;
use crate::Result;

/// Download name of the batch archive.
pub const ARCHIVE_NAME: &str = "txt_convertidos.zip";

/// Media type of the batch archive.
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Pack converted documents into one deflate-compressed zip.
///
/// Entries keep the order of `files` and hold exactly the bytes of each
/// standalone download. Two uploads with the same name would collide, so
/// repeated names get a ` (2)`, ` (3)`, … suffix before the extension.
///
/// ```
/// # use pdf2txt::{build_archive, TextFile};
/// let files = vec![
///     TextFile::for_source("a.pdf", "first".into(), vec![]),
///     TextFile::for_source("b.pdf", "second".into(), vec![]),
/// ];
/// let zip_bytes = build_archive(&files).unwrap();
/// assert!(zip_bytes.starts_with(b"PK"));
/// ```
pub fn build_archive(files: &[TextFile]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut used: HashSet<String> = HashSet::new();
    for file in files {
        let name = unique_name(&file.filename, &mut used);
        writer.start_file(name, options)?;
        writer.write_all(file.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

fn unique_name(filename: &str, used: &mut HashSet<String>) -> String {
    if used.insert(filename.to_owned()) {
        return filename.to_owned();
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (filename, String::new()),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
