//! YAML front matter
//!
//! A post file is an optional `---` delimited YAML block followed by the
//! markdown body. Keys keep their file order so rewriting a post does not
//! shuffle fields the author wrote by hand.

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

const DELIMITER: &str = "---";

/// A post file split into its metadata and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub data: Mapping,
    pub body: String,
}

impl Document {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// String value of `key`, if it is a non-empty scalar.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(super::text::scalar_to_string)
            .filter(|value| !value.is_empty())
    }
}

/// Split a file into front matter and body.
///
/// Text without a leading delimiter, or without a closing one, is all body.
pub fn parse(raw: &str) -> Result<Document> {
    let Some((yaml, body)) = split(raw) else {
        return Ok(Document {
            data: Mapping::new(),
            body: raw.to_string(),
        });
    };

    let data = if yaml.trim().is_empty() {
        Mapping::new()
    } else {
        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => {
                return Err(Error::FrontMatter {
                    message: "front matter is not a mapping".to_string(),
                })
            }
        }
    };

    Ok(Document {
        data,
        body: body.to_string(),
    })
}

/// Locate the YAML block and the body that follows it.
fn split(raw: &str) -> Option<(&str, &str)> {
    let first_line_end = raw.find('\n')?;
    if raw[..first_line_end].trim_end() != DELIMITER {
        return None;
    }

    let yaml_start = first_line_end + 1;
    let mut line_start = yaml_start;
    while line_start <= raw.len() {
        let line_end = raw[line_start..]
            .find('\n')
            .map_or(raw.len(), |i| line_start + i);
        if raw[line_start..line_end].trim_end() == DELIMITER {
            let body_start = (line_end + 1).min(raw.len());
            return Some((&raw[yaml_start..line_start], &raw[body_start..]));
        }
        if line_end == raw.len() {
            break;
        }
        line_start = line_end + 1;
    }
    None
}

/// Write front matter and body back into file form.
///
/// An empty mapping produces a bare body. The output always ends with a
/// newline.
pub fn stringify(body: &str, data: &Mapping) -> Result<String> {
    let mut out = String::new();
    if !data.is_empty() {
        let yaml = serde_yaml::to_string(data)?;
        out.push_str(DELIMITER);
        out.push('\n');
        out.push_str(yaml.trim_end());
        out.push('\n');
        out.push_str(DELIMITER);
        out.push('\n');
    }
    out.push_str(body);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
