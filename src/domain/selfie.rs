//! The client photo held by a session.

use bytes::Bytes;

use super::error::DomainError;

/// A client selfie. Lives only in memory and is dropped by the session once the
/// rendered result has been delivered or the barber clears it.
#[derive(Clone, PartialEq, Eq)]
pub struct Selfie {
    file_name: String,
    content_type: String,
    bytes: Bytes,
}

impl Selfie {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Result<Self, DomainError> {
        let file_name = file_name.into();
        let content_type = content_type.into();
        let bytes = bytes.into();

        if bytes.is_empty() {
            return Err(DomainError::validation("selfie", "image is empty"));
        }
        if !content_type.starts_with("image/") {
            return Err(DomainError::validation(
                "selfie",
                format!("`{content_type}` is not an image type"),
            ));
        }

        let file_name = if file_name.trim().is_empty() {
            "selfie".to_string()
        } else {
            file_name
        };

        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Image bytes stay out of logs.
impl std::fmt::Debug for Selfie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selfie")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
