//! Uploaded meeting artifacts and their classification by media type.

use std::path::Path;
use std::time::Duration;

use crate::error::ProcessError;

const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/avi",
    "video/x-msvideo",
    "video/mov",
    "video/quicktime",
    "video/wmv",
    "video/x-ms-wmv",
    "video/flv",
    "video/x-flv",
    "video/webm",
    "video/mkv",
    "video/x-matroska",
    "video/m4v",
    "video/x-m4v",
];

const TEXT_TYPES: &[&str] = &["text/plain", "text/csv", "text/html", "text/markdown"];

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Broad artifact classification used for strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Video,
    Audio,
    Text,
    Pdf,
    Word,
    Unknown,
}

impl ArtifactKind {
    /// Classifies a declared media type by prefix.
    pub fn from_media_type(media_type: &str) -> Self {
        let media_type = media_type.trim().to_ascii_lowercase();
        if media_type.starts_with("video/") {
            ArtifactKind::Video
        } else if media_type.starts_with("audio/") {
            ArtifactKind::Audio
        } else if media_type.starts_with("text/") {
            ArtifactKind::Text
        } else if media_type.starts_with("application/pdf") {
            ArtifactKind::Pdf
        } else if media_type.starts_with("application/") && media_type.contains("word") {
            ArtifactKind::Word
        } else {
            ArtifactKind::Unknown
        }
    }
}

/// Optional audio/video metadata supplied alongside the bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaMetadata {
    pub duration: Option<Duration>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// An uploaded file. Immutable once created.
#[derive(Debug, Clone)]
pub struct Artifact {
    filename: String,
    media_type: String,
    bytes: Vec<u8>,
    metadata: MediaMetadata,
}

impl Artifact {
    pub fn new(filename: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            media_type: media_type.into(),
            bytes,
            metadata: MediaMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: MediaMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Reads an artifact from disk. The media type is guessed from the extension
    /// unless one is given explicitly.
    pub fn from_path(path: &Path, media_type: Option<&str>) -> Result<Self, ProcessError> {
        let bytes = std::fs::read(path).map_err(|e| ProcessError::ReadArtifact {
            path: path.to_path_buf(),
            source: e,
        })?;

        let media_type = media_type
            .map(|m| m.to_string())
            .unwrap_or_else(|| guess_media_type(path));

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact")
            .to_string();

        Ok(Self::new(filename, media_type, bytes))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn metadata(&self) -> &MediaMetadata {
        &self.metadata
    }

    pub fn kind(&self) -> ArtifactKind {
        ArtifactKind::from_media_type(&self.media_type)
    }

    /// True for the enumerated container formats the video pipeline accepts.
    pub fn is_video(&self) -> bool {
        VIDEO_TYPES.contains(&self.media_type.to_ascii_lowercase().as_str())
    }

    pub fn is_plain_text(&self) -> bool {
        TEXT_TYPES.contains(&self.media_type.to_ascii_lowercase().as_str())
    }

    pub fn is_document(&self) -> bool {
        DOCUMENT_TYPES.contains(&self.media_type.to_ascii_lowercase().as_str())
    }

    /// File extension matching the media type, used for temp files handed to ffmpeg.
    pub fn extension(&self) -> &str {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or(match self.kind() {
                ArtifactKind::Video => "mp4",
                ArtifactKind::Audio => "mp3",
                ArtifactKind::Pdf => "pdf",
                ArtifactKind::Word => "docx",
                ArtifactKind::Text => "txt",
                ArtifactKind::Unknown => "bin",
            })
    }

    pub fn size_mb(&self) -> f64 {
        self.bytes.len() as f64 / 1024.0 / 1024.0
    }
}

/// Guesses a media type from the file extension, defaulting to octet-stream.
pub fn guess_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_kind_from_media_type_prefix() {
        assert_eq!(ArtifactKind::from_media_type("text/plain"), ArtifactKind::Text);
        assert_eq!(ArtifactKind::from_media_type("TEXT/CSV"), ArtifactKind::Text);
        assert_eq!(ArtifactKind::from_media_type("audio/mpeg"), ArtifactKind::Audio);
        assert_eq!(ArtifactKind::from_media_type("video/mp4"), ArtifactKind::Video);
        assert_eq!(
            ArtifactKind::from_media_type("application/pdf"),
            ArtifactKind::Pdf
        );
        assert_eq!(
            ArtifactKind::from_media_type("application/msword"),
            ArtifactKind::Word
        );
        assert_eq!(
            ArtifactKind::from_media_type(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            ArtifactKind::Word
        );
        assert_eq!(
            ArtifactKind::from_media_type("application/zip"),
            ArtifactKind::Unknown
        );
    }

    #[test]
    fn test_is_video_only_for_enumerated_types() {
        assert!(Artifact::new("a.mp4", "video/mp4", vec![]).is_video());
        assert!(Artifact::new("a.mkv", "video/x-matroska", vec![]).is_video());
        assert!(!Artifact::new("a.ogv", "video/ogg", vec![]).is_video());
        assert!(!Artifact::new("a.mp3", "audio/mpeg", vec![]).is_video());
    }

    #[test]
    fn test_from_path_guesses_media_type() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "Weekly sync notes").unwrap();

        let artifact = Artifact::from_path(file.path(), None).unwrap();
        assert_eq!(artifact.media_type(), "text/plain");
        assert_eq!(artifact.kind(), ArtifactKind::Text);
        assert!(artifact.byte_size() > 0);
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = Artifact::from_path(Path::new("/nonexistent/meeting.txt"), None);
        assert!(matches!(result, Err(ProcessError::ReadArtifact { .. })));
    }

    #[test]
    fn test_extension_falls_back_to_kind() {
        let artifact = Artifact::new("recording", "video/webm", vec![]);
        assert_eq!(artifact.extension(), "mp4");

        let artifact = Artifact::new("recording.webm", "video/webm", vec![]);
        assert_eq!(artifact.extension(), "webm");
    }
}
