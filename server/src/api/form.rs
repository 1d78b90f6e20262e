//! Request field extraction and validation
//!
//! Multipart forms carry text fields plus an optional `imgFile` part,
//! which is staged in the upload temp directory while the request is
//! read. JSON bodies are read into an object. Both report the first
//! missing field as `"<field>" is required`, so callers read fields in
//! their declared order.

use crate::config::{parse_flag, IMAGE_FIELD};
use crate::error::{AppError, Result};
use crate::storage::{StagedUpload, UploadStore};
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Parse a numeric path segment
pub fn parse_id(raw: &str, field: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| AppError::invalid(field, "a number"))
}

/// Text fields and staged image of a multipart request
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    image: Option<StagedUpload>,
}

impl FormData {
    /// Read every part. On failure the staged image is removed.
    pub async fn read(
        store: &UploadStore,
        multipart: std::result::Result<Multipart, MultipartRejection>,
    ) -> Result<Self> {
        let mut multipart = multipart.map_err(|e| AppError::Multipart(e.body_text()))?;

        let mut form = FormData::default();
        if let Err(e) = form.fill(store, &mut multipart).await {
            form.discard(store).await;
            return Err(e);
        }

        Ok(form)
    }

    async fn fill(&mut self, store: &UploadStore, multipart: &mut Multipart) -> Result<()> {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await?;

                // Browsers send an empty part for an untouched file input
                if data.is_empty() {
                    continue;
                }

                let staged = store.stage(file_name.as_deref(), &data).await?;
                if let Some(previous) = self.image.replace(staged) {
                    store.discard(previous).await;
                }
            } else {
                let value = field.text().await?;
                self.fields.insert(name, value);
            }
        }

        Ok(())
    }

    /// Hand the staged image to a service
    pub fn take_image(&mut self) -> Option<StagedUpload> {
        self.image.take()
    }

    /// Remove the staged image of a rejected request
    pub async fn discard(&mut self, store: &UploadStore) {
        if let Some(staged) = self.image.take() {
            store.discard(staged).await;
        }
    }

    /// Present and non-blank. Form clients send `"null"` for unset values.
    pub fn optional(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty() && *v != "null" && *v != "undefined")
    }

    pub fn required(&self, field: &str) -> Result<&str> {
        self.optional(field).ok_or_else(|| AppError::required(field))
    }

    pub fn required_id(&self, field: &str) -> Result<i64> {
        parse_id(self.required(field)?, field)
    }

    pub fn optional_id(&self, field: &str) -> Result<Option<i64>> {
        self.optional(field).map(|v| parse_id(v, field)).transpose()
    }

    /// Missing flags read as `false`
    pub fn flag(&self, field: &str) -> Result<bool> {
        match self.optional(field) {
            Some(v) => parse_flag(v).ok_or_else(|| AppError::invalid(field, "a boolean")),
            None => Ok(false),
        }
    }

    /// RFC 3339 timestamp
    pub fn optional_datetime(&self, field: &str) -> Result<Option<DateTime<Utc>>> {
        self.optional(field)
            .map(|v| {
                DateTime::parse_from_rfc3339(v)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|_| AppError::invalid(field, "a valid date"))
            })
            .transpose()
    }
}

/// Fields of a JSON object body
#[derive(Debug)]
pub struct JsonFields(Map<String, Value>);

impl JsonFields {
    pub fn parse(body: &Bytes) -> Result<Self> {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => Ok(JsonFields(map)),
            Ok(_) => Err(AppError::Validation("\"value\" must be of type object".to_string())),
            Err(_) => Err(AppError::Validation("request body is not valid JSON".to_string())),
        }
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        JsonFields(map)
    }

    fn present(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    pub fn required_str(&self, field: &str) -> Result<&str> {
        match self.present(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
            Some(Value::String(_)) | None => Err(AppError::required(field)),
            Some(_) => Err(AppError::invalid(field, "a string")),
        }
    }

    /// Numbers may arrive as JSON numbers or numeric strings
    pub fn optional_id(&self, field: &str) -> Result<Option<i64>> {
        match self.present(field) {
            None => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| AppError::invalid(field, "a number")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => parse_id(s, field).map(Some),
            Some(_) => Err(AppError::invalid(field, "a number")),
        }
    }

    pub fn required_id(&self, field: &str) -> Result<i64> {
        self.optional_id(field)?
            .ok_or_else(|| AppError::required(field))
    }

    pub fn required_value(&self, field: &str) -> Result<&Value> {
        self.present(field).ok_or_else(|| AppError::required(field))
    }

    pub fn required_array(&self, field: &str) -> Result<&Vec<Value>> {
        match self.present(field) {
            Some(Value::Array(values)) => Ok(values),
            Some(_) => Err(AppError::invalid(field, "an array")),
            None => Err(AppError::required(field)),
        }
    }
}
