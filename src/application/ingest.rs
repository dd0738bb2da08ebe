//! Turn a file on disk into a record attachment

use crate::domain::attachment::guess_mime;
use crate::domain::thumbnail::html_thumbnail;
use crate::domain::{Attachment, FileType};
use crate::error::{CbciError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;
use tracing::{debug, instrument};

/// Encode bytes as a `data:` URI
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

pub struct IngestService;

impl IngestService {
    /// Read, classify and encode a file.
    ///
    /// Images keep their data URI as thumbnail, HTML is stored as text with
    /// its first image (or a rendered snapshot) as thumbnail, other files get
    /// no thumbnail.
    #[instrument(name = "ingest_file", skip_all, fields(path = %path.display()))]
    pub async fn ingest(path: &Path) -> Result<Attachment> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CbciError::Ingest(format!("not a file path: {}", path.display())))?
            .to_string();
        let mime = guess_mime(&file_name);
        let file_type = FileType::classify(Some(mime), &file_name);

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CbciError::Ingest(format!("cannot read {}: {}", path.display(), e)))?;
        debug!(file_name, ?file_type, len = bytes.len(), "file read");

        Ok(Self::encode(file_type, mime, file_name, &bytes))
    }

    /// Build the attachment from bytes already in memory
    pub fn encode(file_type: FileType, mime: &str, file_name: String, bytes: &[u8]) -> Attachment {
        let (file_data, thumbnail) = match file_type {
            FileType::Image => {
                let uri = data_uri(mime, bytes);
                (uri.clone(), Some(uri))
            }
            FileType::Html => {
                let html = String::from_utf8_lossy(bytes).into_owned();
                let thumbnail = html_thumbnail(&html);
                (html, Some(thumbnail))
            }
            FileType::File => (data_uri(mime, bytes), None),
        };

        Attachment {
            file_type: Some(file_type),
            file_name: Some(file_name),
            file_data: Some(file_data),
            thumbnail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_ingest_image() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("graph.png");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let attachment = IngestService::ingest(&path).await.unwrap();
        assert_eq!(attachment.file_type, Some(FileType::Image));
        assert_eq!(attachment.file_name.as_deref(), Some("graph.png"));
        let data = attachment.file_data.unwrap();
        assert!(data.starts_with("data:image/png;base64,"));
        assert_eq!(attachment.thumbnail, Some(data));
    }

    #[tokio::test]
    async fn test_ingest_html_with_image_uses_it_as_thumbnail() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lesson.html");
        fs::write(&path, "<html><body><img src=\"x.png\"><p>hi</p></body></html>").unwrap();

        let attachment = IngestService::ingest(&path).await.unwrap();
        assert_eq!(attachment.file_type, Some(FileType::Html));
        assert!(attachment.file_data.unwrap().contains("<p>hi</p>"));
        assert_eq!(attachment.thumbnail.as_deref(), Some("x.png"));
    }

    #[tokio::test]
    async fn test_ingest_html_without_image_renders_snapshot() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("plain.htm");
        fs::write(&path, "<h1>일차함수</h1><p>기울기</p>").unwrap();

        let attachment = IngestService::ingest(&path).await.unwrap();
        assert!(attachment
            .thumbnail
            .unwrap()
            .starts_with("data:image/svg+xml;base64,"));
    }

    #[tokio::test]
    async fn test_ingest_generic_file_has_no_thumbnail() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("worksheet.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let attachment = IngestService::ingest(&path).await.unwrap();
        assert_eq!(attachment.file_type, Some(FileType::File));
        assert!(attachment
            .file_data
            .unwrap()
            .starts_with("data:application/pdf;base64,"));
        assert!(attachment.thumbnail.is_none());
    }

    #[tokio::test]
    async fn test_ingest_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let result = IngestService::ingest(&temp.path().join("missing.png")).await;
        assert!(matches!(result, Err(CbciError::Ingest(_))));
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(data_uri("text/plain", b"hi"), "data:text/plain;base64,aGk=");
    }
}
