//! Request and result types for the download engine.
//!
//! A [`DownloadRequest`] is produced by the scraper boundary (typically
//! deserialized from JSON) and is immutable once submitted. The engine
//! answers with a [`DownloadResult`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::constants::PART_FILE_SUFFIX;

/// File extensions recognized as images.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "svg", "tiff",
];

/// File extensions recognized as videos.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "mov", "avi", "mkv", "webm", "flv", "m3u8",
];

/// Broad media family a download is expected to belong to.
///
/// Derived from the target filename's extension when the scraper does not
/// state it explicitly. Used by validation to pick the extension whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFamily {
    /// Still image (JPEG, PNG, GIF, WEBP, ...).
    Image,
    /// Video container (MP4, MOV, WEBM, ...).
    Video,
    /// Extension not recognized; validation accepts either family.
    Unknown,
}

impl MediaFamily {
    /// Derives the media family from a filename's extension.
    #[must_use]
    pub fn from_filename(filename: &str) -> Self {
        let Some((_, ext)) = filename.rsplit_once('.') else {
            return Self::Unknown;
        };
        let ext = ext.to_ascii_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Self::Image
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Self::Video
        } else {
            Self::Unknown
        }
    }
}

/// A single media artifact to retrieve.
///
/// Immutable once submitted to the engine. Headers are forwarded verbatim
/// on every request the engine issues for this artifact (size probe, chunk
/// requests, single-stream transfer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRequest {
    /// Source URL of the remote object.
    pub url: String,
    /// Target filename (already sanitized by the scraper boundary).
    pub filename: String,
    /// Destination directory; created if missing.
    pub dest_dir: PathBuf,
    /// Plain key/value request headers (Referer, User-Agent, Cookie, ...).
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Media family the completed file is expected to match.
    pub expected_family: MediaFamily,
}

impl DownloadRequest {
    /// Creates a request with the media family derived from the filename.
    #[must_use]
    pub fn new(
        url: impl Into<String>,
        filename: impl Into<String>,
        dest_dir: impl Into<PathBuf>,
    ) -> Self {
        let filename = filename.into();
        let expected_family = MediaFamily::from_filename(&filename);
        Self {
            url: url.into(),
            filename,
            dest_dir: dest_dir.into(),
            headers: Vec::new(),
            expected_family,
        }
    }

    /// Adds a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Replaces the header set.
    #[must_use]
    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    /// Final published path: `dest_dir/filename`.
    #[must_use]
    pub fn final_path(&self) -> PathBuf {
        self.dest_dir.join(&self.filename)
    }

    /// In-progress artifact path: `dest_dir/filename.part`.
    #[must_use]
    pub(crate) fn part_path(&self) -> PathBuf {
        self.dest_dir.join(format!("{}{PART_FILE_SUFFIX}", self.filename))
    }
}

/// Terminal outcome of a download. The engine holds no state once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Whether a validated artifact now exists at `final_path`.
    pub success: bool,
    /// Path the artifact was (or would have been) published to.
    pub final_path: PathBuf,
    /// Bytes at the final path on success; 0 on failure.
    pub total_bytes: u64,
    /// Transfer attempts consumed across strategies (0 when skipped).
    pub attempts_used: u32,
    /// Description of the terminal failure, if any.
    pub error: Option<String>,
}

impl DownloadResult {
    /// A successful download (or skip) with a published artifact.
    pub(crate) fn completed(final_path: PathBuf, total_bytes: u64, attempts_used: u32) -> Self {
        Self {
            success: true,
            final_path,
            total_bytes,
            attempts_used,
            error: None,
        }
    }

    /// A terminal failure; no file remains at the final path.
    pub(crate) fn failed(
        final_path: PathBuf,
        attempts_used: u32,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            final_path,
            total_bytes: 0,
            attempts_used,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_family_from_image_extensions() {
        assert_eq!(MediaFamily::from_filename("photo.jpg"), MediaFamily::Image);
        assert_eq!(MediaFamily::from_filename("photo.jpeg"), MediaFamily::Image);
        assert_eq!(MediaFamily::from_filename("banner.webp"), MediaFamily::Image);
    }

    #[test]
    fn test_family_from_video_extensions() {
        assert_eq!(MediaFamily::from_filename("clip.mp4"), MediaFamily::Video);
        assert_eq!(MediaFamily::from_filename("live.mov"), MediaFamily::Video);
    }

    #[test]
    fn test_family_is_case_insensitive() {
        assert_eq!(MediaFamily::from_filename("Photo.JPG"), MediaFamily::Image);
        assert_eq!(MediaFamily::from_filename("CLIP.Mp4"), MediaFamily::Video);
    }

    #[test]
    fn test_family_unknown_for_unrecognized_or_missing_extension() {
        assert_eq!(MediaFamily::from_filename("data.bin"), MediaFamily::Unknown);
        assert_eq!(MediaFamily::from_filename("noextension"), MediaFamily::Unknown);
    }

    #[test]
    fn test_request_derives_family_and_paths() {
        let request = DownloadRequest::new("https://example.com/a.jpg", "a.jpg", "/tmp/out");
        assert_eq!(request.expected_family, MediaFamily::Image);
        assert_eq!(request.final_path(), PathBuf::from("/tmp/out/a.jpg"));
        assert_eq!(request.part_path(), PathBuf::from("/tmp/out/a.jpg.part"));
    }

    #[test]
    fn test_request_header_builders() {
        let request = DownloadRequest::new("https://example.com/a.jpg", "a.jpg", "/tmp/out")
            .with_header("Referer", "https://example.com/")
            .with_header("Cookie", "session=abc");
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.headers[0].0, "Referer");
    }

    #[test]
    fn test_request_round_trips_through_json() {
        let json = r#"{
            "url": "https://example.com/clip.mp4",
            "filename": "clip.mp4",
            "dest_dir": "/tmp/media",
            "headers": [["Referer", "https://example.com/"]],
            "expected_family": "video"
        }"#;
        let request: DownloadRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.expected_family, MediaFamily::Video);
        assert_eq!(request.headers.len(), 1);

        let back = serde_json::to_string(&request).unwrap();
        assert!(back.contains("\"video\""));
    }

    #[test]
    fn test_request_headers_default_to_empty() {
        let json = r#"{
            "url": "https://example.com/a.png",
            "filename": "a.png",
            "dest_dir": "/tmp/media",
            "expected_family": "image"
        }"#;
        let request: DownloadRequest = serde_json::from_str(json).unwrap();
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_result_constructors() {
        let ok = DownloadResult::completed(PathBuf::from("/tmp/a.jpg"), 1024, 1);
        assert!(ok.success);
        assert_eq!(ok.total_bytes, 1024);
        assert!(ok.error.is_none());

        let failed = DownloadResult::failed(PathBuf::from("/tmp/a.jpg"), 3, "validation failed");
        assert!(!failed.success);
        assert_eq!(failed.total_bytes, 0);
        assert_eq!(failed.error.as_deref(), Some("validation failed"));
    }
}
