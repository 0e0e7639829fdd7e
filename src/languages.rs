//! Extension registry: file extension → human-readable language name.
//!
//! Used to label files in prompts and to decide which uploads are
//! accepted at all. Lookup is by the lowercased text after the last `.`
//! of the file name; anything unrecognised resolves to [`UNKNOWN_LANGUAGE`].

/// Label used when a file's extension is missing or unrecognised.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// Extension of the single archive upload routed through the ingestor.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Supported source extensions and their display names.
const SUPPORTED: &[(&str, &str)] = &[
    ("py", "Python"),
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("jsx", "React JSX"),
    ("tsx", "React TSX"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("java", "Java"),
    ("c", "C"),
    ("cpp", "C++"),
    ("cs", "C#"),
    ("go", "Go"),
    ("rs", "Rust"),
    ("php", "PHP"),
    ("rb", "Ruby"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("sh", "Shell"),
    ("json", "JSON"),
    ("md", "Markdown"),
    ("sql", "SQL"),
    ("yml", "YAML"),
    ("yaml", "YAML"),
    ("xml", "XML"),
    ("txt", "Text"),
];

/// Return the raw extension of a path's file name (text after the last `.`).
///
/// Returns `None` when the file name has no `.` at all. Directory
/// components are ignored, so `a.b/c` has no extension.
pub fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    file_name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Look up the language for a bare extension (case-insensitive).
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    SUPPORTED
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, name)| *name)
}

/// Resolve the display language of a path, falling back to `"Unknown"`.
pub fn language_for_path(path: &str) -> &'static str {
    extension(path)
        .and_then(language_for_extension)
        .unwrap_or(UNKNOWN_LANGUAGE)
}

/// Whether a file with this name may be uploaded (source file or archive).
pub fn is_allowed_upload(filename: &str) -> bool {
    match extension(filename) {
        Some(ext) => {
            ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION) || language_for_extension(ext).is_some()
        }
        None => false,
    }
}

/// Whether a file name denotes a zip archive.
pub fn is_archive(filename: &str) -> bool {
    extension(filename).is_some_and(|ext| ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION))
}

/// All supported source extensions, in registry order.
pub fn supported_extensions() -> impl Iterator<Item = &'static str> {
    SUPPORTED.iter().map(|(ext, _)| *ext)
}
