//! Extension-based media classification and preview dispatch.

use serde::{Deserialize, Serialize};

use crate::records::{FileKind, FileRecord};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "flv", "wmv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "m4a", "flac", "ogg", "wma"];
const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "doc", "docx", "json", "xml", "csv", "md"];
const OFFICE_EXTENSIONS: &[&str] = &["ppt", "pptx", "xls", "xlsx"];
const CODE_EXTENSIONS: &[&str] = &["py", "rs", "js", "ts"];

/// Extensions the viewer renders in place; everything else is offered as a download.
/// Word-processor and office formats are binary containers, so they download.
const INLINE_EXTENSIONS: &[&str] = &[
    "pdf", "mp3", "wav", "aac", "m4a", "flac", "ogg", "jpg", "jpeg", "png", "gif", "webp", "bmp",
    "mp4", "webm", "csv", "py", "txt", "md", "json", "xml",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// Broad media family derived from a file name.
pub enum MediaKind {
    /// Raster images.
    Image,
    /// Video containers.
    Video,
    /// Audio files.
    Audio,
    /// PDF documents.
    Pdf,
    /// Plain text and word-processor documents.
    Document,
    /// Presentations and spreadsheets.
    Office,
    /// Source code.
    Code,
    /// Anything else.
    #[default]
    Unknown,
}

impl MediaKind {
    /// Classifies a file by its (case-insensitive) extension.
    pub fn from_name(name: &str) -> Self {
        let Some(ext) = extension_of(name) else {
            return Self::Unknown;
        };
        let ext = ext.as_str();
        if IMAGE_EXTENSIONS.contains(&ext) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext) {
            Self::Video
        } else if AUDIO_EXTENSIONS.contains(&ext) {
            Self::Audio
        } else if ext == "pdf" {
            Self::Pdf
        } else if DOCUMENT_EXTENSIONS.contains(&ext) {
            Self::Document
        } else if OFFICE_EXTENSIONS.contains(&ext) {
            Self::Office
        } else if CODE_EXTENSIONS.contains(&ext) {
            Self::Code
        } else {
            Self::Unknown
        }
    }

    /// Stable lowercase label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Pdf => "pdf",
            Self::Document => "document",
            Self::Office => "office",
            Self::Code => "code",
            Self::Unknown => "unknown",
        }
    }

    /// Short glyph used in list rows.
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Image => "[img]",
            Self::Video => "[vid]",
            Self::Audio => "[aud]",
            Self::Pdf => "[pdf]",
            Self::Document => "[doc]",
            Self::Office => "[ofc]",
            Self::Code => "[src]",
            Self::Unknown => "[file]",
        }
    }
}

/// Returns the lowercase extension after the last `.`, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Best-effort MIME type for a file name, used when building data URLs.
pub fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        Some("aac") => "audio/aac",
        Some("m4a") => "audio/mp4",
        Some("pdf") => "application/pdf",
        Some("txt" | "py" | "rs" | "ts") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("js") => "text/javascript",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("pptx") => {
            "application/vnd.openxmlformats-officedocument.presentationml.presentation"
        }
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What the viewer should do when a record is opened.
pub enum PreviewAction {
    /// Render the bytes in place using the given media family.
    Inline(MediaKind),
    /// Hand the bytes to the user as a download.
    Download,
}

impl PreviewAction {
    /// Chooses the preview branch for a record. Folders have no preview.
    pub fn for_record(record: &FileRecord) -> Option<Self> {
        if record.kind == FileKind::Folder {
            return None;
        }
        Some(Self::for_name(&record.display_name))
    }

    /// Chooses the preview branch from a file name alone.
    pub fn for_name(name: &str) -> Self {
        match extension_of(name) {
            Some(ext) if INLINE_EXTENSIONS.contains(&ext.as_str()) => {
                Self::Inline(MediaKind::from_name(name))
            }
            _ => Self::Download,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_case_insensitive_extension() {
        let cases = [
            ("photo.JPG", MediaKind::Image),
            ("clip.webm", MediaKind::Video),
            ("song.flac", MediaKind::Audio),
            ("paper.pdf", MediaKind::Pdf),
            ("notes.md", MediaKind::Document),
            ("deck.pptx", MediaKind::Office),
            ("script.py", MediaKind::Code),
            ("archive.zip", MediaKind::Unknown),
            ("README", MediaKind::Unknown),
            (".bashrc", MediaKind::Unknown),
        ];
        for (name, expected) in cases {
            assert_eq!(MediaKind::from_name(name), expected, "name={name:?}");
        }
    }

    #[test]
    fn extension_requires_stem_and_suffix() {
        assert_eq!(extension_of("a.tar.GZ"), Some("gz".to_string()));
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(extension_of(".hidden"), None);
    }

    #[test]
    fn preview_dispatch_inlines_known_types_and_downloads_the_rest() {
        assert_eq!(
            PreviewAction::for_name("scan.png"),
            PreviewAction::Inline(MediaKind::Image)
        );
        assert_eq!(PreviewAction::for_name("backup.zip"), PreviewAction::Download);
        assert_eq!(PreviewAction::for_name("movie.mkv"), PreviewAction::Download);
    }

    #[test]
    fn office_formats_are_never_dispatched_inline() {
        for name in ["budget.xlsx", "deck.pptx", "slides.ppt", "report.docx", "sheet.xls"] {
            assert_eq!(PreviewAction::for_name(name), PreviewAction::Download, "name={name:?}");
        }
        assert_eq!(MediaKind::from_name("deck.pptx"), MediaKind::Office);
    }

    #[test]
    fn mime_falls_back_to_octet_stream() {
        assert_eq!(mime_for_name("a.PNG"), "image/png");
        assert_eq!(mime_for_name("a.bin"), "application/octet-stream");
        assert_eq!(mime_for_name("noext"), "application/octet-stream");
    }
}
