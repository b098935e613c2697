//! Content-negotiated response bodies.
//!
//! The same `serde_json::Value` is rendered either as a JSON document or as
//! a `<response>` element tree. Scalars are stringified identically in both
//! encodings so a record carries the same field/text pairs either way.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::AppError;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XML_CONTENT_TYPE: &str = "application/xml";

const ROOT_TAG: &str = "response";
const ITEM_TAG: &str = "item";

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("xml encoding failed: {0}")]
    Xml(#[from] quick_xml::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

#[derive(Debug, Deserialize)]
struct FormatParams {
    format: Option<String>,
}

impl Format {
    /// Unknown or missing hints fall back to JSON.
    pub fn parse(hint: Option<&str>) -> Self {
        match hint {
            Some(h) if h.eq_ignore_ascii_case("xml") => Self::Xml,
            _ => Self::Json,
        }
    }

    pub fn from_uri(uri: &Uri) -> Self {
        let hint = Query::<FormatParams>::try_from_uri(uri)
            .ok()
            .and_then(|Query(params)| params.format);
        Self::parse(hint.as_deref())
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => JSON_CONTENT_TYPE,
            Self::Xml => XML_CONTENT_TYPE,
        }
    }

    /// Render `data` with `status`, or render the error if serialization fails.
    pub fn render<T: Serialize>(self, status: StatusCode, data: &T) -> Response {
        match serde_json::to_value(data)
            .map_err(SerializeError::from)
            .and_then(|value| render(&value, self))
        {
            Ok(body) => (status, [(header::CONTENT_TYPE, self.content_type())], body).into_response(),
            Err(e) => self.error(AppError::Internal(e.to_string())),
        }
    }

    /// Render the `{"error": message}` envelope for `err`.
    pub fn error(self, err: AppError) -> Response {
        err.log();
        let status = err.status();
        let envelope = serde_json::json!({ "error": err.to_string() });
        match render(&envelope, self) {
            Ok(body) => (status, [(header::CONTENT_TYPE, self.content_type())], body).into_response(),
            // the envelope is a flat string map, this only fails on a broken writer
            Err(_) => status.into_response(),
        }
    }

    pub fn respond<T: Serialize>(self, status: StatusCode, result: Result<T, AppError>) -> Response {
        match result {
            Ok(data) => self.render(status, &data),
            Err(err) => self.error(err),
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Format {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_uri(&parts.uri))
    }
}

/// Encode `data` in the requested format.
pub fn render(data: &Value, format: Format) -> Result<Vec<u8>, SerializeError> {
    match format {
        Format::Json => Ok(serde_json::to_vec(data)?),
        Format::Xml => to_xml(data),
    }
}

/// Text form of a scalar, shared by both encodings. `null` is empty.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        // numbers and booleans keep their JSON spelling
        other => other.to_string(),
    }
}

fn to_xml(data: &Value) -> Result<Vec<u8>, SerializeError> {
    let mut writer = Writer::new(Vec::new());
    write_element(&mut writer, ROOT_TAG, data)?;
    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, tag: &str, value: &Value) -> Result<(), SerializeError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, ITEM_TAG, item)?;
            }
        }
        Value::Object(map) => {
            for (key, child) in map {
                write_element(writer, key, child)?;
            }
        }
        scalar => {
            let text = scalar_text(scalar);
            if !text.is_empty() {
                writer.write_event(Event::Text(BytesText::new(&text)))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
