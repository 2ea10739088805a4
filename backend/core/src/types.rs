use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// One artwork entry in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArtworkRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub century: String,
    #[serde(default)]
    pub location: String,
    #[serde(
        default,
        alias = "bg_url",
        alias = "url",
        deserialize_with = "optional_image",
        skip_serializing_if = "Option::is_none"
    )]
    pub image: Option<ImageRef>,
    #[serde(default)]
    pub enriched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wikipedia_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Fields this tool does not interpret, written back unchanged on save.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ArtworkRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Value of one of the four tracked metadata fields.
    pub fn field(&self, field: MetadataField) -> &str {
        match field {
            MetadataField::Title => &self.title,
            MetadataField::Author => &self.author,
            MetadataField::Century => &self.century,
            MetadataField::Location => &self.location,
        }
    }

    pub fn set_field(&mut self, field: MetadataField, value: impl Into<String>) {
        let value = value.into();
        match field {
            MetadataField::Title => self.title = value,
            MetadataField::Author => self.author = value,
            MetadataField::Century => self.century = value,
            MetadataField::Location => self.location = value,
        }
    }

    /// Human readable "Title by Author" label used in logs.
    pub fn display_name(&self) -> String {
        let title = if self.title.trim().is_empty() { "Untitled" } else { self.title.as_str() };
        let author = if self.author.trim().is_empty() { "unknown artist" } else { self.author.as_str() };
        format!("{title} by {author}")
    }
}

/// The metadata fields that must be filled for a record to count as complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MetadataField {
    Title,
    Author,
    Century,
    Location,
}

impl MetadataField {
    pub const ALL: [MetadataField; 4] = [
        MetadataField::Title,
        MetadataField::Author,
        MetadataField::Century,
        MetadataField::Location,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MetadataField::Title => "title",
            MetadataField::Author => "author",
            MetadataField::Century => "century",
            MetadataField::Location => "location",
        }
    }
}

impl fmt::Display for MetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where an artwork's image lives: a file on this host or a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Local(PathBuf),
    Remote(String),
}

impl ImageRef {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Some(ImageRef::Remote(raw.to_string()))
        } else {
            Some(ImageRef::Local(PathBuf::from(raw)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ImageRef::Remote(_))
    }

    /// Final path segment, used for type detection and filename checks.
    pub fn file_name(&self) -> Option<String> {
        match self {
            ImageRef::Local(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
            ImageRef::Remote(url) => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                path.rsplit('/').next().filter(|s| !s.is_empty()).map(str::to_string)
            }
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::Local(path) => write!(f, "{}", path.display()),
            ImageRef::Remote(url) => f.write_str(url),
        }
    }
}

impl Serialize for ImageRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ImageRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ImageRef::parse(&raw).ok_or_else(|| de::Error::custom("image reference is empty"))
    }
}

/// Image encodings the TV accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFileType {
    Jpeg,
    Png,
}

impl ImageFileType {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageFileType::Jpeg),
            "png" => Some(ImageFileType::Png),
            _ => None,
        }
    }

    /// Name used in the TV's `send_image` request.
    pub fn wire_name(self) -> &'static str {
        match self {
            ImageFileType::Jpeg => "jpg",
            ImageFileType::Png => "png",
        }
    }
}

/// Ordered collection of artwork records, persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Catalog {
    records: Vec<ArtworkRecord>,
}

impl Catalog {
    pub fn new(records: Vec<ArtworkRecord>) -> Self {
        Self { records }
    }

    /// Build a catalog from either the array layout or the keyed-object layout.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(_) => {
                let records: Vec<ArtworkRecord> = serde_json::from_value(value)?;
                Ok(Self { records })
            }
            Value::Object(map) => {
                let mut records = Vec::with_capacity(map.len());
                for (key, entry) in map {
                    let mut record: ArtworkRecord = serde_json::from_value(entry)?;
                    if record.id.trim().is_empty() {
                        record.id = key;
                    }
                    records.push(record);
                }
                Ok(Self { records })
            }
            other => Err(de::Error::custom(format!(
                "expected an array or object of artworks, found {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn records(&self) -> &[ArtworkRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [ArtworkRecord] {
        &mut self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArtworkRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ArtworkRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn push(&mut self, record: ArtworkRecord) {
        self.records.push(record);
    }

    /// Highest assigned catalog number, 0 when none is set.
    pub fn max_number(&self) -> u32 {
        self.records.iter().filter_map(|r| r.number).max().unwrap_or(0)
    }
}

impl<'de> Deserialize<'de> for Catalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Catalog::from_value(value).map_err(de::Error::custom)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(optional_string_or_number(deserializer)?.unwrap_or_default())
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, found {}",
            json_kind(&other)
        ))),
    }
}

/// A blank or null image counts as no image.
fn optional_image<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ImageRef>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|raw| ImageRef::parse(&raw)))
}
