// Photo-evidence validation and file sources

use anyhow::{Context, Result};
use bytes::Bytes;
use std::path::Path;
use uuid::Uuid;

use super::errors::RejectReason;
use super::types::Attachment;
use crate::config::AttachmentConfig;

pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];

/// A file offered for staging, from a picker, a drop or the filesystem
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub content: Bytes,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            mime_type: mime_type.into(),
            content,
        }
    }

    /// Read a file from disk, inferring its mime type from the extension
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read attachment {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let mime_type = mime_type_for(&name).to_string();

        tracing::debug!(
            name = %name,
            size_bytes = content.len(),
            mime_type = %mime_type,
            "Loaded attachment from disk"
        );

        Ok(Self::new(name, mime_type, content))
    }
}

/// Map a filename extension to the content type a browser would report
pub fn mime_type_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Type and size rules applied before a file is staged
#[derive(Debug, Clone)]
pub struct AttachmentPolicy {
    max_size_bytes: u64,
    allowed_mime_types: Vec<String>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: MAX_ATTACHMENT_BYTES,
            allowed_mime_types: ALLOWED_MIME_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl AttachmentPolicy {
    pub fn new(max_size_bytes: u64, allowed_mime_types: Vec<String>) -> Self {
        Self {
            max_size_bytes,
            allowed_mime_types: allowed_mime_types
                .into_iter()
                .map(|t| t.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &AttachmentConfig) -> Self {
        Self::new(config.max_size_bytes, config.allowed_mime_types.clone())
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Check type first, then size; the first failing rule wins
    pub fn validate(&self, file: &PendingFile) -> Result<(), RejectReason> {
        let normalized = file.mime_type.to_lowercase();
        if !self.allowed_mime_types.iter().any(|t| *t == normalized) {
            return Err(RejectReason::InvalidType);
        }

        if file.size_bytes > self.max_size_bytes {
            return Err(RejectReason::TooLarge);
        }

        Ok(())
    }

    /// Validate and convert into a staged attachment
    pub fn admit(&self, file: PendingFile) -> Result<Attachment, RejectReason> {
        self.validate(&file)?;
        Ok(Attachment {
            id: Uuid::new_v4(),
            name: file.name,
            size_bytes: file.size_bytes,
            mime_type: file.mime_type,
            content: file.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(name: &str, mime: &str, size_bytes: u64) -> PendingFile {
        PendingFile {
            name: name.to_string(),
            size_bytes,
            mime_type: mime.to_string(),
            content: Bytes::new(),
        }
    }

    #[test]
    fn test_accepts_allowed_images() {
        let policy = AttachmentPolicy::default();
        for mime in ALLOWED_MIME_TYPES {
            assert!(policy.validate(&sized("shelf", mime, 1024)).is_ok());
        }
        assert!(policy.validate(&sized("shelf.JPG", "IMAGE/JPEG", 1024)).is_ok());
    }

    #[test]
    fn test_rejects_wrong_type_before_size() {
        let policy = AttachmentPolicy::default();
        let huge_pdf = sized("manifest.pdf", "application/pdf", 50 * 1024 * 1024);
        assert_eq!(policy.validate(&huge_pdf), Err(RejectReason::InvalidType));
    }

    #[test]
    fn test_size_limit_is_inclusive() {
        let policy = AttachmentPolicy::default();
        assert!(policy
            .validate(&sized("a.png", "image/png", MAX_ATTACHMENT_BYTES))
            .is_ok());
        assert_eq!(
            policy.validate(&sized("a.png", "image/png", MAX_ATTACHMENT_BYTES + 1)),
            Err(RejectReason::TooLarge)
        );
    }

    #[test]
    fn test_mime_type_inference() {
        assert_eq!(mime_type_for("bin-04.JPEG"), "image/jpeg");
        assert_eq!(mime_type_for("rack.png"), "image/png");
        assert_eq!(mime_type_for("spin.gif"), "image/gif");
        assert_eq!(mime_type_for("count.pdf"), "application/pdf");
        assert_eq!(mime_type_for("README"), "application/octet-stream");
    }

    #[test]
    fn test_policy_from_config_limit() {
        let config = AttachmentConfig {
            max_size_bytes: 1024,
            allowed_mime_types: vec!["IMAGE/PNG".to_string()],
        };
        let policy = AttachmentPolicy::from_config(&config);
        assert_eq!(policy.max_size_bytes(), 1024);
        assert!(policy.validate(&sized("a.png", "image/png", 1024)).is_ok());
        assert_eq!(
            policy.validate(&sized("a.png", "image/png", 1025)),
            Err(RejectReason::TooLarge)
        );
        assert_eq!(
            policy.validate(&sized("a.jpg", "image/jpeg", 10)),
            Err(RejectReason::InvalidType)
        );
    }

    #[test]
    fn test_admit_assigns_distinct_ids() {
        let policy = AttachmentPolicy::default();
        let first = policy.admit(sized("a.jpg", "image/jpeg", 10)).unwrap();
        let second = policy.admit(sized("a.jpg", "image/jpeg", 10)).unwrap();
        assert_eq!(first.name, second.name);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_from_path_reads_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pallet.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let file = PendingFile::from_path(&path).await.unwrap();
        assert_eq!(file.name, "pallet.png");
        assert_eq!(file.mime_type, "image/png");
        assert_eq!(file.size_bytes, 4);
    }
}
