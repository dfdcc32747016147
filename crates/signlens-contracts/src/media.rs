use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

/// A user-selected video or audio file, held fully in memory.
///
/// Immutable once constructed; selecting a new file replaces the whole asset.
#[derive(Clone, PartialEq, Eq)]
pub struct MediaAsset {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl MediaAsset {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into().trim().to_ascii_lowercase(),
            bytes,
        }
    }

    /// Reads `path` and infers its MIME type from the extension unless
    /// `mime_override` is given. The declared type is never checked against
    /// the content.
    pub fn from_path(path: &Path, mime_override: Option<&str>) -> Result<Self> {
        let mime_type = match mime_override.map(str::trim).filter(|value| !value.is_empty()) {
            Some(mime) => mime.to_string(),
            None => match mime_for_path(path) {
                Some(mime) => mime.to_string(),
                None => bail!(
                    "cannot infer a media type for {} (pass an explicit MIME type)",
                    path.display()
                ),
            },
        };
        let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
        let name = path
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True for `video/*` and `audio/*` declared types.
    pub fn is_supported(&self) -> bool {
        is_supported_mime(&self.mime_type)
    }

    pub fn size_label(&self) -> String {
        format_size(self.bytes.len() as u64)
    }
}

impl fmt::Debug for MediaAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaAsset")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

pub fn is_supported_mime(mime: &str) -> bool {
    let lowered = mime.trim().to_ascii_lowercase();
    ["video/", "audio/"].iter().any(|prefix| {
        lowered
            .strip_prefix(prefix)
            .map(|subtype| !subtype.is_empty())
            .unwrap_or(false)
    })
}

pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())?;
    match ext.as_str() {
        "mp4" | "m4v" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        "mkv" => Some("video/x-matroska"),
        "avi" => Some("video/x-msvideo"),
        "mpeg" | "mpg" => Some("video/mpeg"),
        "3gp" => Some("video/3gpp"),
        "mp3" => Some("audio/mpeg"),
        "wav" => Some("audio/wav"),
        "m4a" => Some("audio/mp4"),
        "aac" => Some("audio/aac"),
        "ogg" | "oga" => Some("audio/ogg"),
        "opus" => Some("audio/opus"),
        "flac" => Some("audio/flac"),
        _ => None,
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    #[test]
    fn from_path_infers_mime_and_name() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("Greeting.MOV");
        fs::write(&path, b"fake-video")?;

        let asset = MediaAsset::from_path(&path, None)?;
        assert_eq!(asset.name(), "Greeting.MOV");
        assert_eq!(asset.mime_type(), "video/quicktime");
        assert_eq!(asset.bytes(), b"fake-video");
        assert!(asset.is_supported());
        Ok(())
    }

    #[test]
    fn explicit_mime_is_passed_through() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("clip.bin");
        fs::write(&path, b"not really audio")?;

        let asset = MediaAsset::from_path(&path, Some(" Audio/WAV "))?;
        assert_eq!(asset.mime_type(), "audio/wav");
        assert!(asset.is_supported());
        Ok(())
    }

    #[test]
    fn unknown_extension_without_override_fails() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("notes.txt");
        fs::write(&path, b"hello")?;
        assert!(MediaAsset::from_path(&path, None).is_err());
        Ok(())
    }

    #[test]
    fn supported_mime_requires_media_family_and_subtype() {
        assert!(is_supported_mime("video/mp4"));
        assert!(is_supported_mime("AUDIO/ogg"));
        assert!(!is_supported_mime("image/png"));
        assert!(!is_supported_mime("video/"));
        assert!(!is_supported_mime("application/octet-stream"));
    }

    #[test]
    fn mime_lookup_covers_common_containers() {
        assert_eq!(mime_for_path(Path::new("a.webm")), Some("video/webm"));
        assert_eq!(mime_for_path(Path::new("a.m4a")), Some("audio/mp4"));
        assert_eq!(mime_for_path(Path::new("noext")), None);
    }

    #[test]
    fn size_label_scales_units() {
        assert_eq!(MediaAsset::new("a", "video/mp4", vec![0; 512]).size_label(), "512 B");
        assert_eq!(
            MediaAsset::new("a", "video/mp4", vec![0; 1536]).size_label(),
            "1.5 KB"
        );
    }

    #[test]
    fn debug_output_omits_payload() {
        let asset = MediaAsset::new("clip.mp4", "video/mp4", vec![7; 4]);
        let rendered = format!("{asset:?}");
        assert!(rendered.contains("len: 4"));
        assert!(!rendered.contains("[7, 7"));
    }
}
