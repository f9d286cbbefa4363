//! Front-matter parsing for content files.
//!
//! A content file starts with a metadata block, either YAML delimited by
//! `---` or TOML delimited by `+++`, followed by the markdown body:
//!
//! ```text
//! ---
//! title: Hello
//! ---
//!
//! Hi there
//! ```
//!
//! `title` is required. `date` and `slug` are recognized; everything else is
//! kept as free-form extras and passed to templates unchanged.

use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;

/// Parsed front-matter block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    /// Item title (required).
    pub title: String,

    /// Publication date, posts only.
    pub date: Option<NaiveDate>,

    /// Slug override. Defaults to the slugified file stem.
    pub slug: Option<String>,

    /// Remaining fields, passed through to templates.
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Delimiter types for front-matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// YAML front-matter delimited by `---`.
    Yaml,
    /// TOML front-matter delimited by `+++`.
    Toml,
}

impl Format {
    const fn delimiter(self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split content into front-matter block and body.
pub fn split(content: &str) -> Option<(Format, &str, &str)> {
    let content = content.trim_start();

    let format = if content.starts_with("---") {
        Format::Yaml
    } else if content.starts_with("+++") {
        Format::Toml
    } else {
        return None;
    };

    let delimiter = format.delimiter();
    let after_first = &content[delimiter.len()..];
    let closing_pos = after_first.find(delimiter)?;

    let front = after_first[..closing_pos].trim();
    let body = after_first[closing_pos + delimiter.len()..].trim_start();

    Some((format, front, body))
}

/// Parse front-matter from a content file, returning metadata and body.
///
/// Errors carry a human-readable reason; the caller attaches the file path.
pub fn parse(content: &str) -> Result<(FrontMatter, &str), String> {
    let Some((format, raw, body)) = split(content) else {
        return Err("missing front-matter block (`---` or `+++`)".into());
    };

    let mut fields = match format {
        Format::Yaml => yaml_fields(raw)?,
        Format::Toml => toml_fields(raw)?,
    };

    let title = match fields.remove("title") {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Some(_) => return Err("`title` must be a non-empty string".into()),
        None => return Err("`title` is required".into()),
    };

    let date = match fields.remove("date") {
        Some(serde_json::Value::String(s)) => {
            Some(parse_date(&s).ok_or_else(|| format!("invalid `date`: {s}"))?)
        }
        Some(other) => return Err(format!("invalid `date`: {other}")),
        None => None,
    };

    let slug = match fields.remove("slug") {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(_) => return Err("`slug` must be a non-empty string".into()),
        None => None,
    };

    Ok((
        FrontMatter {
            title,
            date,
            slug,
            extra: fields,
        },
        body,
    ))
}

/// Parse a date as `YYYY-MM-DD` or RFC 3339.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

// ============================================================================
// Field conversion
// ============================================================================

fn yaml_fields(raw: &str) -> Result<BTreeMap<String, serde_json::Value>, String> {
    let value: serde_yaml::Value = serde_yaml::from_str(raw).map_err(|e| e.to_string())?;
    let json = serde_json::to_value(value).map_err(|e| e.to_string())?;
    match json {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        serde_json::Value::Null => Err("front-matter block is empty".into()),
        _ => Err("front-matter must be a key-value mapping".into()),
    }
}

fn toml_fields(raw: &str) -> Result<BTreeMap<String, serde_json::Value>, String> {
    let table: toml::Table = toml::from_str(raw).map_err(|e| e.to_string())?;
    Ok(table
        .into_iter()
        .map(|(k, v)| (k, toml_to_json(v)))
        .collect())
}

/// Convert a TOML value to JSON, flattening datetimes to their string form.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================
