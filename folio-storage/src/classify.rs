//! Filename-based text/binary classification.
//!
//! Whether a path holds text or bytes is decided here, by extension, never
//! by the caller. Unknown extensions are treated as binary so content
//! round-trips without lossy UTF-8 conversion.

/// How a file's content should be represented in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Binary,
}

/// Extensions read and written as UTF-8 text.
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "tex", "bib", "sty", "cls", "json", "csv", "tsv", "log", "yml", "yaml", "toml",
    "xml", "html", "css", "js", "ts", "svg",
];

/// Classifies a path by its extension.
///
/// CRDT snapshot files (`.snapshot`) are always binary.
#[must_use]
pub fn content_kind(path: &str) -> ContentKind {
    let name = path.rsplit('/').next().unwrap_or(path);
    let Some((_, ext)) = name.rsplit_once('.') else {
        return ContentKind::Binary;
    };
    let ext = ext.to_ascii_lowercase();
    if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        ContentKind::Text
    } else {
        ContentKind::Binary
    }
}
