//! Feed payload → [`Trade`].
//!
//! Exchanges are inconsistent about number encoding (Bitstamp sends
//! `timestamp` as a string and `amount`/`price` as numbers), so every
//! numeric field accepts either a JSON number or a numeric string.

use serde_json::{Map, Value};

use crate::error::MalformedTradeError;
use crate::types::Trade;

pub const FIELD_TIMESTAMP: &str = "timestamp";
pub const FIELD_AMOUNT: &str = "amount";
pub const FIELD_PRICE: &str = "price";
pub const FIELD_PRICE_DISPLAY: &str = "price_str";

/// Converts the `data` object of a trade event into a [`Trade`].
pub fn normalize(payload: &Value) -> Result<Trade, MalformedTradeError> {
    let obj = payload.as_object().ok_or(MalformedTradeError::NotAnObject)?;

    let timestamp = number(FIELD_TIMESTAMP, field(obj, FIELD_TIMESTAMP)?)?;
    let amount = non_negative(FIELD_AMOUNT, number(FIELD_AMOUNT, field(obj, FIELD_AMOUNT)?)?)?;
    let price = non_negative(FIELD_PRICE, number(FIELD_PRICE, field(obj, FIELD_PRICE)?)?)?;
    let price_display = display(field(obj, FIELD_PRICE_DISPLAY)?)?;

    Ok(Trade {
        timestamp,
        amount,
        price,
        price_display,
    })
}

/// `null` counts as missing.
fn field<'a>(obj: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, MalformedTradeError> {
    obj.get(name)
        .filter(|v| !v.is_null())
        .ok_or(MalformedTradeError::MissingField(name))
}

fn number(field: &'static str, v: &Value) -> Result<f64, MalformedTradeError> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|x| x.is_finite())
        .ok_or_else(|| MalformedTradeError::NotNumeric {
            field,
            value: v.to_string(),
        })
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, MalformedTradeError> {
    if value < 0.0 {
        return Err(MalformedTradeError::OutOfRange { field, value });
    }
    Ok(value)
}

/// The display string must itself be numeric, but is kept exactly as sent.
fn display(v: &Value) -> Result<String, MalformedTradeError> {
    let text = match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    };

    if text.trim().parse::<f64>().is_err() {
        return Err(MalformedTradeError::NotNumeric {
            field: FIELD_PRICE_DISPLAY,
            value: v.to_string(),
        });
    }

    Ok(text)
}
