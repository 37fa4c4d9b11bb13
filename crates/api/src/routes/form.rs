//! Buffered multipart form reader shared by the upload endpoints.

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::services::uploads::UploadedFile;

#[derive(Debug)]
struct Part {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

/// All parts of a multipart request, read into memory.
///
/// Per-file size limits are enforced by the upload store; the overall body
/// size is capped by the router's body limit.
#[derive(Debug, Default)]
pub struct MultipartForm {
    parts: Vec<Part>,
}

impl MultipartForm {
    /// Drain a multipart stream.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the body is not valid multipart.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut parts = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };
            let file_name = field.file_name().map(str::to_owned);
            let content_type = field.content_type().map(str::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;

            parts.push(Part {
                name,
                file_name,
                content_type,
                bytes,
            });
        }

        Ok(Self { parts })
    }

    /// Text value of the first part named `name`.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| std::str::from_utf8(&p.bytes).ok())
    }

    /// Deserialize the first part named `name` as JSON. Works for both plain
    /// text parts and `application/json` blobs.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the part is missing or malformed.
    pub fn json<T: DeserializeOwned>(&self, name: &str) -> Result<T, AppError> {
        let part = self
            .parts
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| AppError::BadRequest(format!("{name} part is required")))?;
        serde_json::from_slice(&part.bytes)
            .map_err(|e| AppError::BadRequest(format!("invalid {name} part: {e}")))
    }

    /// Remove and return every non-empty file part named `name`.
    ///
    /// Browsers send an empty, nameless file part when no file was chosen;
    /// those are dropped.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (taken, rest): (Vec<Part>, Vec<Part>) = std::mem::take(&mut self.parts)
            .into_iter()
            .partition(|p| p.name == name && p.file_name.is_some());
        self.parts = rest;

        taken
            .into_iter()
            .filter_map(|p| {
                let file_name = p.file_name.filter(|n| !n.is_empty())?;
                if p.bytes.is_empty() {
                    return None;
                }
                Some(UploadedFile {
                    file_name,
                    content_type: p.content_type,
                    bytes: p.bytes,
                })
            })
            .collect()
    }

    /// Remove and return the first non-empty file part named `name`.
    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.take_files(name).into_iter().next()
    }
}

impl<S: Send + Sync> FromRequest<S> for MultipartForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Self::read(multipart).await
    }
}
