use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AppError;

/// A pretty-printed UTF-8 JSON document offered as a file download.
pub struct JsonDownload {
    pub filename: String,
    pub body: String,
}

impl JsonDownload {
    /// Builds `<stem>-<YYYY-MM-DD>.json` around the serialized items.
    pub fn new<T: Serialize + ?Sized>(stem: &str, date: NaiveDate, items: &T) -> Result<Self, AppError> {
        let body = serde_json::to_string_pretty(items)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("export serialization failed: {e}")))?;
        Ok(Self {
            filename: format!("{}-{}.json", slugify(stem), date.format("%Y-%m-%d")),
            body,
        })
    }
}

impl IntoResponse for JsonDownload {
    fn into_response(self) -> Response {
        (
            [
                (header::CONTENT_TYPE, "application/json; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", self.filename),
                ),
            ],
            self.body,
        )
            .into_response()
    }
}

/// Lowercases and collapses every run of non-alphanumerics into one `-`.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "export".to_string()
    } else {
        trimmed.to_string()
    }
}
