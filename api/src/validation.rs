//! Field rules for incoming product payloads.
//!
//! Rules run in a fixed order and the first violation wins, so every
//! rejection names exactly one field.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::product::{NewProduct, ProductPatch};

pub const NAME_MAX_CHARS: usize = 45;
pub const DESCRIPTION_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(msg: &str) -> Self {
        Self(msg.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    PartialUpdate,
}

/// Check `payload` against the product rules and extract the typed fields
/// that were supplied.
pub fn validate(payload: &Map<String, Value>, mode: Mode) -> Result<ProductPatch, ValidationError> {
    if mode == Mode::Create {
        let name_ok = match payload.get("name") {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            // wrong type is reported by the name rule below
            Some(_) => true,
        };
        if !name_ok {
            return Err(ValidationError::new("Name is required and cannot be empty"));
        }
        if !payload.contains_key("price") {
            return Err(ValidationError::new("Price is required"));
        }
    }

    let mut fields = ProductPatch::default();

    if let Some(name) = payload.get("name") {
        let Value::String(name) = name else {
            return Err(ValidationError::new("Name must be a string"));
        };
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("Name cannot be empty"));
        }
        if name.chars().count() > NAME_MAX_CHARS {
            return Err(ValidationError::new("Name must not exceed 45 characters"));
        }
        fields.name = Some(trimmed.to_string());
    }

    match payload.get("description") {
        None => {}
        Some(Value::Null) => fields.description = Some(None),
        Some(Value::String(desc)) => {
            if desc.chars().count() > DESCRIPTION_MAX_CHARS {
                return Err(ValidationError::new(
                    "Description must not exceed 100 characters",
                ));
            }
            fields.description = Some(Some(desc.clone()));
        }
        Some(_) => return Err(ValidationError::new("Description must be a string")),
    }

    if let Some(price) = payload.get("price") {
        let price =
            as_number(price).ok_or_else(|| ValidationError::new("Price must be a valid number"))?;
        if price <= 0.0 {
            return Err(ValidationError::new("Price must be greater than 0"));
        }
        fields.price = Some(price);
    }

    match payload.get("stocks") {
        None => {}
        // null falls back to the column default
        Some(Value::Null) => fields.stocks = Some(0),
        Some(stocks) => {
            let stocks = as_integer(stocks)
                .ok_or_else(|| ValidationError::new("Stocks must be a valid integer"))?;
            if stocks < 0 {
                return Err(ValidationError::new("Stocks cannot be negative"));
            }
            fields.stocks = Some(stocks);
        }
    }

    Ok(fields)
}

/// Full validation for a create payload. Omitted `stocks` defaults to 0.
pub fn validate_new(payload: &Map<String, Value>) -> Result<NewProduct, ValidationError> {
    let fields = validate(payload, Mode::Create)?;
    match (fields.name, fields.price) {
        (Some(name), Some(price)) => Ok(NewProduct {
            name,
            description: fields.description.flatten(),
            price,
            stocks: fields.stocks.unwrap_or(0),
        }),
        (None, _) => Err(ValidationError::new("Name is required and cannot be empty")),
        (_, None) => Err(ValidationError::new("Price is required")),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            let f = n.as_f64()?;
            (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
