//! Writing generated files to disk, individually or as one zip bundle.

use std::io::{Cursor, Write};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use zip::write::SimpleFileOptions;

use crate::models::ContentMap;

/// Default name of the bundle holding commented files.
pub const BUNDLE_FILENAME: &str = "commented_files.zip";

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("refusing to write outside the output directory: {0}")]
    UnsafePath(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build zip bundle: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Resolve a content-map key under `dir`, rejecting absolute paths and `..`.
fn safe_join(dir: &Path, relative: &str) -> Result<PathBuf, OutputError> {
    let relative_path = Path::new(relative);
    let mut out = dir.to_path_buf();
    let mut pushed = false;
    for component in relative_path.components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                pushed = true;
            }
            Component::CurDir => {}
            _ => return Err(OutputError::UnsafePath(relative.to_string())),
        }
    }
    if pushed {
        Ok(out)
    } else {
        Err(OutputError::UnsafePath(relative.to_string()))
    }
}

/// Write every file under `dir`, creating parent directories as needed.
///
/// Returns the paths written, in map order.
pub fn write_files(dir: &Path, files: &ContentMap) -> Result<Vec<PathBuf>, OutputError> {
    let mut written = Vec::with_capacity(files.len());
    for (relative, content) in files {
        let target = safe_join(dir, relative)?;
        let io_err = |source| OutputError::Io {
            path: target.display().to_string(),
            source,
        };
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&target, content).map_err(io_err)?;
        tracing::debug!(path = %target.display(), "wrote generated file");
        written.push(target);
    }
    Ok(written)
}

/// Pack every file into an in-memory zip archive, in map order.
pub fn bundle_zip(files: &ContentMap) -> Result<Vec<u8>, OutputError> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (path, content) in files {
        writer.start_file(path.as_str(), options)?;
        writer
            .write_all(content.as_bytes())
            .map_err(|source| OutputError::Io {
                path: path.clone(),
                source,
            })?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Write `files` as a zip bundle at `path`.
pub fn write_bundle(path: &Path, files: &ContentMap) -> Result<(), OutputError> {
    let bytes = bundle_zip(files)?;
    std::fs::write(path, bytes).map_err(|source| OutputError::Io {
        path: path.display().to_string(),
        source,
    })
}
