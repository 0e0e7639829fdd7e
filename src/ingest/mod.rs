//! Upload intake and zip archive ingestion.
//!
//! Turns what the user handed us (source files or a single zip archive)
//! into a [`ContentMap`] of relative path → UTF-8 text. Archives are
//! extracted into a scratch directory that is removed on every exit
//! path; individual archive entries that are hidden, too large or not
//! text are dropped silently. Direct uploads are validated strictly.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Component, Path};

use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::constants::{MAX_ARCHIVE_ENTRY_BYTES, MAX_UPLOAD_BYTES};
use crate::languages;
use crate::models::{ContentMap, SourceInput};

/// Errors from upload intake.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("no files were provided")]
    NoFiles,

    #[error("the archive contains no readable text files")]
    EmptyArchive,

    #[error("unsupported file type: {0}")]
    UnsupportedExtension(String),

    #[error("{filename} is {size} bytes, over the {limit}-byte upload limit")]
    TooLarge {
        filename: String,
        size: usize,
        limit: usize,
    },

    #[error("{0} is not valid UTF-8 text")]
    Decode(String),

    #[error("invalid zip archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to prepare extraction directory: {0}")]
    Scratch(#[from] std::io::Error),
}

/// One uploaded file: its name as given by the user and its raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

/// Decoded uploads, ready for prompting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedFiles {
    pub files: ContentMap,
    /// Whether the files came out of a zip archive.
    pub from_archive: bool,
}

impl IngestedFiles {
    /// Archives and multi-file uploads are prompted as labelled sections.
    pub fn is_multiple(&self) -> bool {
        self.from_archive || self.files.len() > 1
    }

    /// The input a README request is built from.
    pub fn to_source_input(&self) -> SourceInput {
        if self.is_multiple() {
            SourceInput::Files(self.files.clone())
        } else {
            SourceInput::Single(self.files.values().next().cloned().unwrap_or_default())
        }
    }
}

/// Validate and decode a batch of uploads.
///
/// A lone `.zip` upload is expanded through [`ingest_archive`]; every
/// other upload is decoded directly and must be UTF-8. Extensions are
/// checked against the registry before anything is decoded.
pub fn collect_uploads(uploads: Vec<Upload>) -> Result<IngestedFiles, IngestError> {
    if uploads.is_empty() {
        return Err(IngestError::NoFiles);
    }

    for upload in &uploads {
        if !languages::is_allowed_upload(&upload.filename) {
            return Err(IngestError::UnsupportedExtension(upload.filename.clone()));
        }
        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(IngestError::TooLarge {
                filename: upload.filename.clone(),
                size: upload.bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }
    }

    if uploads.len() == 1 && languages::is_archive(&uploads[0].filename) {
        let files = ingest_archive(&uploads[0].bytes)?;
        if files.is_empty() {
            return Err(IngestError::EmptyArchive);
        }
        return Ok(IngestedFiles {
            files,
            from_archive: true,
        });
    }

    let mut files = ContentMap::new();
    for upload in uploads {
        let text = String::from_utf8(upload.bytes)
            .map_err(|_| IngestError::Decode(upload.filename.clone()))?;
        files.insert(upload.filename, text);
    }

    tracing::debug!(files = files.len(), "decoded direct uploads");
    Ok(IngestedFiles {
        files,
        from_archive: false,
    })
}

/// Extract a zip archive and read every eligible text file in it.
///
/// Skips entries whose path has any segment starting with `.`, entries
/// whose name would land outside the archive root, files over
/// [`MAX_ARCHIVE_ENTRY_BYTES`], and anything that cannot be read or is
/// not UTF-8. Keys are `/`-separated paths relative to the archive root,
/// ordered by path. An empty archive yields an empty map.
pub fn ingest_archive(bytes: &[u8]) -> Result<ContentMap, IngestError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    // Removed on drop, including on the error paths below.
    let scratch = tempfile::tempdir()?;
    extract_entries(&mut archive, scratch.path())?;

    let files = read_tree(scratch.path());
    tracing::debug!(
        entries = archive.len(),
        files = files.len(),
        "ingested zip archive"
    );
    Ok(files)
}

/// Write every safely named entry under `dest`.
fn extract_entries(
    archive: &mut zip::ZipArchive<Cursor<&[u8]>>,
    dest: &Path,
) -> Result<(), IngestError> {
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::debug!(name = entry.name(), "skipping entry outside archive root");
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if entry.size() > MAX_ARCHIVE_ENTRY_BYTES {
            tracing::debug!(name = entry.name(), size = entry.size(), "skipping oversized entry");
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = fs::File::create(&target)?;
        io::copy(&mut entry, &mut out).map_err(|e| IngestError::Archive(e.into()))?;
    }
    Ok(())
}

fn read_tree(root: &Path) -> ContentMap {
    let mut files = ContentMap::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if metadata.len() > MAX_ARCHIVE_ENTRY_BYTES {
            tracing::debug!(path = %entry.path().display(), size = metadata.len(), "skipping oversized file");
            continue;
        }

        let Some(key) = relative_key(root, entry.path()) else {
            continue;
        };
        let Ok(raw) = fs::read(entry.path()) else {
            continue;
        };
        match String::from_utf8(raw) {
            Ok(text) => {
                files.insert(key, text);
            }
            Err(_) => tracing::debug!(path = %key, "skipping non-UTF-8 file"),
        }
    }

    files
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Path of `path` relative to `root`, joined with `/`.
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}
