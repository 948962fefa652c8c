// src/handlers/mod.rs

use std::collections::HashMap;

use axum::extract::{FromRequest, Multipart, Request};
use uuid::Uuid;

use crate::{error::AppError, utils::media::Upload};

pub mod comment;
pub mod feed;
pub mod thread;
pub mod user;

/// Parses a path identifier, mapping malformed input to a validation error.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Ok(raw.trim().parse::<Uuid>()?)
}

/// A drained `multipart/form-data` body: text fields plus file parts.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub uploads: Vec<Upload>,
}

impl MultipartForm {
    /// Parts carrying a file name are files; everything else is a text field.
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    if bytes.is_empty() && file_name.is_empty() {
                        // Browsers send an empty part for an untouched file input.
                        continue;
                    }
                    form.uploads.push(Upload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                None => {
                    let value = field.text().await?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Extracting a `MultipartForm` drains the body up front, so every rejection
/// (wrong content type, oversized body, broken part) uses the `AppError` body.
impl<S: Send + Sync> FromRequest<S> for MultipartForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        MultipartForm::read(multipart).await
    }
}
