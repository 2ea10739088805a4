//! Best-effort extraction of metadata from a model reply.
//!
//! A JSON object anywhere in the reply wins; otherwise `Label: value` lines are
//! read. Anything unrecognised is dropped, so parsing never fails.

use serde_json::Value;
use theframe_catalog::is_placeholder;
use theframe_core::{ArtworkRecord, MetadataField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Field(MetadataField),
    Style,
    Year,
    Wikipedia,
}

/// Values found in a reply; `None` means the reply said nothing usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub century: Option<String>,
    pub location: Option<String>,
    pub style: Option<String>,
    pub year: Option<String>,
    pub wikipedia_url: Option<String>,
}

impl ParsedMetadata {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn field(&self, field: MetadataField) -> Option<&str> {
        match field {
            MetadataField::Title => self.title.as_deref(),
            MetadataField::Author => self.author.as_deref(),
            MetadataField::Century => self.century.as_deref(),
            MetadataField::Location => self.location.as_deref(),
        }
    }

    fn set(&mut self, key: Key, raw: &str) {
        let value = clean_value(raw);
        if is_placeholder(&value) {
            return;
        }
        let slot = match key {
            Key::Field(MetadataField::Title) => &mut self.title,
            Key::Field(MetadataField::Author) => &mut self.author,
            Key::Field(MetadataField::Century) => &mut self.century,
            Key::Field(MetadataField::Location) => &mut self.location,
            Key::Style => &mut self.style,
            Key::Year => &mut self.year,
            Key::Wikipedia => &mut self.wikipedia_url,
        };
        // First mention wins.
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// Fill the gaps in `record`; returns the names of the fields written.
    ///
    /// Curated values are never replaced: tracked fields are only written
    /// when missing, optional ones only when absent.
    pub fn apply(&self, record: &mut ArtworkRecord) -> Vec<&'static str> {
        let mut changed = Vec::new();
        for field in MetadataField::ALL {
            if let Some(value) = self.field(field) {
                if is_placeholder(record.field(field)) {
                    record.set_field(field, value);
                    changed.push(field.label());
                }
            }
        }

        let optional = [
            (&self.style, &mut record.style, "style"),
            (&self.year, &mut record.year, "year"),
            (&self.wikipedia_url, &mut record.wikipedia_url, "wikipedia_url"),
        ];
        for (parsed, current, name) in optional {
            let absent = current.as_deref().map_or(true, is_placeholder);
            if let (Some(value), true) = (parsed, absent) {
                *current = Some(value.clone());
                changed.push(name);
            }
        }
        changed
    }
}

pub fn parse_response(text: &str) -> ParsedMetadata {
    let from_json = parse_json(text);
    if !from_json.is_empty() {
        return from_json;
    }
    parse_lines(text)
}

fn parse_json(text: &str) -> ParsedMetadata {
    let mut parsed = ParsedMetadata::default();
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return parsed;
    };
    if end <= start {
        return parsed;
    }
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&text[start..=end]) else {
        return parsed;
    };

    for (key, value) in &map {
        let Some(key) = canonical_key(key) else {
            continue;
        };
        match value {
            Value::String(s) => parsed.set(key, s),
            Value::Number(n) => parsed.set(key, &n.to_string()),
            _ => {}
        }
    }
    parsed
}

fn parse_lines(text: &str) -> ParsedMetadata {
    let mut parsed = ParsedMetadata::default();
    for line in text.lines() {
        let line = strip_bullet(line.trim()).replace("**", "").replace("__", "");
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        if let Some(key) = canonical_key(label) {
            parsed.set(key, value);
        }
    }
    parsed
}

fn strip_bullet(line: &str) -> &str {
    let line = line.trim_start_matches(['-', '*', '•', '>']).trim_start();
    // "1. Title: ..." / "2) Author: ..."
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim_start();
        }
    }
    line
}

fn canonical_key(label: &str) -> Option<Key> {
    let label = label.trim().trim_matches(['"', '\'', '*', '_']).trim().to_lowercase();
    let key = match label.as_str() {
        "title" | "artwork" | "painting" | "name" | "artwork title" | "complete title" => {
            Key::Field(MetadataField::Title)
        }
        "author" | "artist" | "painter" | "creator" | "artist name" => Key::Field(MetadataField::Author),
        "century" | "period" => Key::Field(MetadataField::Century),
        "location" | "museum" | "gallery" | "collection" | "current location" => {
            Key::Field(MetadataField::Location)
        }
        "style" | "movement" | "art movement" => Key::Style,
        "year" | "date" | "year created" => Key::Year,
        "wikipedia" | "wikipedia_url" | "wikipedia url" => Key::Wikipedia,
        _ => return None,
    };
    Some(key)
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_end_matches([',', ';'])
        .trim()
        .trim_matches(['"', '\'', '*', '_'])
        .trim()
        .to_string()
}
