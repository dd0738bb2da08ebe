//! Attached file payloads

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// How an attached file is stored and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Stored as a data URI and used as its own thumbnail
    Image,
    /// Stored as raw HTML text
    Html,
    /// Any other file, stored as a data URI
    File,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

impl FileType {
    /// Classify a file by MIME type, falling back to its extension.
    pub fn classify(mime: Option<&str>, file_name: &str) -> FileType {
        let lower = file_name.to_lowercase();
        match mime {
            Some(m) if m.starts_with("image/") => FileType::Image,
            Some("text/html") => FileType::Html,
            _ if lower.ends_with(".html") || lower.ends_with(".htm") => FileType::Html,
            None if IMAGE_EXTENSIONS.contains(&extension(&lower)) => FileType::Image,
            _ => FileType::File,
        }
    }
}

fn extension(file_name: &str) -> &str {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
}

/// Guess a MIME type from a file name
pub fn guess_mime(file_name: &str) -> &'static str {
    match extension(&file_name.to_lowercase()) {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "hwp" => "application/x-hwp",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Optional file carried by every record, flattened into the record's JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Base64 data URI, or raw HTML text for [`FileType::Html`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_data: Option<String>,
    /// Data URI of an image representing the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl Attachment {
    pub fn is_empty(&self) -> bool {
        self.file_type.is_none() && self.file_data.is_none()
    }

    /// All four fields as an update patch; absent values clear the stored ones
    pub fn to_patch(&self) -> Map<String, Value> {
        let mut patch = Map::new();
        patch.insert(
            "fileType".to_string(),
            self.file_type
                .and_then(|t| serde_json::to_value(t).ok())
                .unwrap_or(Value::Null),
        );
        for (key, value) in [
            ("fileName", &self.file_name),
            ("fileData", &self.file_data),
            ("thumbnail", &self.thumbnail),
        ] {
            patch.insert(
                key.to_string(),
                value.clone().map(Value::String).unwrap_or(Value::Null),
            );
        }
        patch
    }
}

// Records saved by older clients carry `"fileType": ""` when nothing is attached.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<FileType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some("image") => Ok(Some(FileType::Image)),
        Some("html") => Ok(Some(FileType::Html)),
        Some(_) => Ok(Some(FileType::File)),
    }
}
