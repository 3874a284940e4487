// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Buffered `multipart/form-data` reading for the registration and avatar
//! endpoints.

use std::collections::HashMap;

use axum::extract::Multipart;

use crate::error::ApiError;

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Every part of a form, read into memory.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, FilePart>,
}

impl FormData {
    /// Read the whole form. Parts named in `file_fields` are kept as bytes,
    /// everything else must be UTF-8 text.
    pub async fn read(mut multipart: Multipart, file_fields: &[&str]) -> Result<Self, ApiError> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::bad_request(format!("Malformed form data: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if file_fields.contains(&name.as_str()) {
                let content_type = field.content_type().map(str::to_string);
                let no_file_chosen = field.file_name().is_some_and(str::is_empty);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read '{name}': {e}")))?;
                // An untouched file input arrives as an empty part with an empty filename.
                if no_file_chosen && bytes.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    FilePart {
                        bytes: bytes.to_vec(),
                        content_type,
                    },
                );
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read '{name}': {e}")))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    /// A required text field.
    pub fn text(&self, name: &str) -> Result<&str, ApiError> {
        self.fields
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ApiError::bad_request(format!("Missing form field '{name}'")))
    }

    pub fn take_file(&mut self, name: &str) -> Option<FilePart> {
        self.files.remove(name)
    }
}

impl FilePart {
    /// Declared content type; a file without one cannot be an avatar.
    pub fn require_content_type(&self) -> Result<&str, ApiError> {
        self.content_type
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("Uploaded file has no content type"))
    }
}
