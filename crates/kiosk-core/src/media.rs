//! Media encoding for attachments
//!
//! A chosen file is read into a `data:` URL, then split back into the MIME
//! type and base64 payload that the Gemini inline-data part wants.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::MediaError;

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Which upload control picked the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Accept filter for the file picker, in `input[type=file]` notation.
    pub fn accept(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/*",
            MediaKind::Video => "video/*",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MediaKind::Image => "Image",
            MediaKind::Video => "Video",
        }
    }

    /// Whether the picker should offer `path` for this kind.
    pub fn accepts(&self, path: &Path) -> bool {
        let prefix = self.accept().trim_end_matches('*');
        guess_mime_type(path).starts_with(prefix)
    }
}

/// A single staged image or video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttachment {
    /// Base64 payload, without the `data:` prefix
    pub data: String,
    pub mime_type: String,
}

impl MediaAttachment {
    /// Split `data:<mime>;base64,<payload>` into its parts.
    pub fn from_data_url(url: &str) -> Result<Self, MediaError> {
        let rest = url.strip_prefix("data:").ok_or(MediaError::MalformedDataUrl)?;
        let semicolon = rest.find(';').ok_or(MediaError::MalformedDataUrl)?;
        let comma = rest.find(',').ok_or(MediaError::MalformedDataUrl)?;
        if comma < semicolon {
            return Err(MediaError::MalformedDataUrl);
        }

        Ok(Self {
            mime_type: rest[..semicolon].to_string(),
            data: rest[comma + 1..].to_string(),
        })
    }

    /// Read a file from disk into an attachment.
    pub async fn load(path: &Path) -> Result<Self, MediaError> {
        let url = read_as_data_url(path).await?;
        Self::from_data_url(&url)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    /// Size of the payload once base64 is undone.
    pub fn decoded_len(&self) -> usize {
        let padding = self.data.bytes().rev().take_while(|b| *b == b'=').count();
        (self.data.len() / 4 * 3).saturating_sub(padding)
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// Read a file and encode it as a base64 `data:` URL.
pub async fn read_as_data_url(path: &Path) -> Result<String, MediaError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| MediaError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(encode_data_url(guess_mime_type(path), &bytes))
}

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// MIME type from the file extension.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "mpeg" | "mpg" => "video/mpeg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        "wmv" => "video/x-ms-wmv",
        "3gp" => "video/3gpp",
        "mkv" => "video/x-matroska",
        _ => FALLBACK_MIME_TYPE,
    }
}
