//! Request validation from descriptor rules: required fields, type coercion, per-column checks.

use crate::config::{ColumnInfo, ColumnKind, KeyKind, ResolvedEntity, ValidationRule, CREATED_AT, UPDATED_AT};
use crate::error::AppError;
use crate::store::{Record, RecordKey};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use regex::Regex;
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

pub struct RequestValidator;

impl RequestValidator {
    /// Turn a raw JSON body into a storable record: unknown and audit fields dropped,
    /// values coerced to their column kind, required fields checked on create, rules
    /// applied, absent columns set to null and audit stamps added.
    pub fn prepare(entity: &ResolvedEntity, body: &Value, mode: WriteMode) -> Result<Record, AppError> {
        let input = body
            .as_object()
            .ok_or_else(|| AppError::BadRequest("Request body must be a JSON object".into()))?;

        let mut record = Record::new();
        for col in entity.columns.iter().filter(|c| !c.is_audit()) {
            let raw = input.get(&col.name).unwrap_or(&Value::Null);
            record.insert(col.name.clone(), coerce(col, raw)?);
        }

        let missing: Vec<&str> = match mode {
            WriteMode::Create => entity
                .required
                .iter()
                .filter(|r| is_blank(record.get(r.as_str()).unwrap_or(&Value::Null)))
                .map(String::as_str)
                .collect(),
            WriteMode::Update => Vec::new(),
        };
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        for (col, rule) in &entity.validation {
            if let Some(v) = record.get(col) {
                validate_field(col, v, rule)?;
            }
        }

        let key = entity.key_column();
        match mode {
            WriteMode::Create => {
                let key_absent = record.get(key).map(Value::is_null).unwrap_or(true);
                if entity.key.generated && key_absent {
                    record.remove(key);
                }
            }
            WriteMode::Update => {
                record.remove(key);
            }
        }

        if entity.audit {
            let now = now_stamp();
            if mode == WriteMode::Create {
                record.insert(CREATED_AT.into(), Value::String(now.clone()));
            }
            record.insert(UPDATED_AT.into(), Value::String(now));
        }
        Ok(record)
    }

    /// Parse a path key according to the entity's key kind.
    pub fn parse_key(entity: &ResolvedEntity, raw: &str) -> Result<Value, AppError> {
        match entity.key.kind {
            KeyKind::Text => Ok(Value::String(raw.to_string())),
            KeyKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| AppError::InvalidKey(format!("Invalid {} '{}'", entity.key_column(), raw))),
        }
    }

    /// Composite key from the lookup columns; absent or blank fields become null.
    pub fn composite_key(entity: &ResolvedEntity, input: &Record) -> Result<RecordKey, AppError> {
        if entity.lookup.is_empty() {
            return Err(AppError::BadRequest(format!("{} has no composite lookup", entity.label)));
        }
        let mut parts = Vec::with_capacity(entity.lookup.len());
        for name in &entity.lookup {
            let raw = input.get(name).unwrap_or(&Value::Null);
            let v = match entity.column(name) {
                Some(col) => coerce(col, raw)?,
                None => raw.clone(),
            };
            let v = if is_blank(&v) { Value::Null } else { v };
            parts.push((name.clone(), v));
        }
        Ok(RecordKey::Composite(parts))
    }
}

/// Current time as stored in audit columns (UTC, microsecond precision).
pub fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn coerce(col: &ColumnInfo, v: &Value) -> Result<Value, AppError> {
    if v.is_null() {
        return Ok(Value::Null);
    }
    match col.kind {
        ColumnKind::Text => Ok(match v {
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => other.clone(),
        }),
        ColumnKind::Integer | ColumnKind::Numeric => coerce_number(col, v),
        ColumnKind::Boolean => Ok(if is_blank(v) { Value::Null } else { v.clone() }),
        // Calendar date as written, in the value's own offset.
        ColumnKind::Date => Ok(parse_datetime(v)
            .map(|dt| Value::String(dt.date_naive().format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null)),
        ColumnKind::Timestamp => Ok(parse_datetime(v)
            .map(|dt| Value::String(dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Micros, true)))
            .unwrap_or(Value::Null)),
    }
}

fn coerce_number(col: &ColumnInfo, v: &Value) -> Result<Value, AppError> {
    let invalid = || AppError::Validation(format!("{} must be a number", col.name));
    let n: serde_json::Number = match v {
        Value::Number(n) => n.clone(),
        Value::Bool(b) => serde_json::Number::from(*b as i64),
        Value::String(s) if s.trim().is_empty() => return Ok(Value::Null),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => i.into(),
                Err(_) => s
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .ok_or_else(invalid)?,
            }
        }
        _ => return Err(invalid()),
    };
    if col.kind == ColumnKind::Integer && n.as_i64().is_none() {
        match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => return Ok(Value::from(f as i64)),
            _ => return Err(AppError::Validation(format!("{} must be an integer", col.name))),
        }
    }
    Ok(Value::Number(n))
}

/// Lenient date/time parsing. Integers are epoch milliseconds; values without an
/// offset are UTC. None when not a real date.
fn parse_datetime(v: &Value) -> Option<DateTime<FixedOffset>> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.fixed_offset()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt);
            }
            let naive = NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .or_else(|| {
                    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
                        .iter()
                        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                })?;
            Some(naive.and_utc().fixed_offset())
        }
        _ => None,
    }
}

fn validate_field(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), AppError> {
    if v.is_null() {
        return Ok(());
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.chars().count() < min as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    col, min
                )));
            }
        }
    }
    if let Some(ref pattern) = rule.pattern {
        let re = Regex::new(pattern).map_err(|_| AppError::Validation(format!("invalid pattern for {}", col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(ref allowed) = rule.allowed {
        if !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {:?}",
                col,
                allowed.iter().take(5).collect::<Vec<_>>()
            )));
        }
    }
    Ok(())
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}
