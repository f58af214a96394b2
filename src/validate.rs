use serde_json::Value;

use crate::errors::{AppError, AppResult};

/// Body of `POST /read` after shape checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub filename: String,
}

impl ReadRequest {
    /// The name is used exactly as sent. Unlike the Express lab this was
    /// modelled on, surrounding whitespace is not trimmed, so `" hello.txt "`
    /// names a different file than `"hello.txt"`. The empty string is let
    /// through as well: it resolves to the root and the read layer answers
    /// with `is-directory`.
    pub fn from_json(body: &Value) -> AppResult<Self> {
        let raw = body
            .get("filename")
            .filter(|v| !v.is_null())
            .ok_or_else(|| AppError::Validation("filename required".into()))?;
        let filename = raw
            .as_str()
            .ok_or_else(|| AppError::Validation("filename must be a string".into()))?;
        if filename.contains('\0') {
            return Err(AppError::Validation("null byte not allowed".into()));
        }
        Ok(Self {
            filename: filename.to_string(),
        })
    }
}
