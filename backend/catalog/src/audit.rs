//! Completeness and consistency checks behind `errors` and `populate`.

use std::collections::{BTreeSet, HashMap};

use theframe_core::{ArtworkRecord, Catalog, ImageRef, MetadataField};

/// Values that count as "not filled in" (compared trimmed, case-insensitive).
pub const PLACEHOLDERS: &[&str] = &[
    "unknown",
    "untitled",
    "n/a",
    "na",
    "none",
    "null",
    "?",
    "-",
    "unknown author",
    "unknown title",
    "unknown century",
    "unknown location",
];

pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || PLACEHOLDERS.iter().any(|p| p.eq_ignore_ascii_case(value))
}

/// Tracked fields of `record` that are empty or hold a placeholder.
pub fn missing_fields(record: &ArtworkRecord) -> Vec<MetadataField> {
    MetadataField::ALL
        .into_iter()
        .filter(|field| is_placeholder(record.field(*field)))
        .collect()
}

pub fn is_complete(record: &ArtworkRecord) -> bool {
    missing_fields(record).is_empty()
}

/// Records with at least one empty or placeholder field, in catalog order.
pub fn find_missing_fields(catalog: &Catalog) -> Vec<&ArtworkRecord> {
    catalog.iter().filter(|r| !is_complete(r)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteRecord {
    pub id: String,
    pub missing: Vec<MetadataField>,
}

/// Several records describing the same (title, author) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateArtwork {
    pub title: String,
    pub author: String,
    pub ids: Vec<String>,
}

/// Everything `errors` reports about a catalog.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub incomplete: Vec<IncompleteRecord>,
    pub duplicate_artworks: Vec<DuplicateArtwork>,
    pub duplicate_ids: Vec<String>,
    /// Records pointing at a local file that does not exist.
    pub missing_images: Vec<(String, String)>,
    /// Records with no image reference at all.
    pub without_image: Vec<String>,
    /// Image references used by more than one record, with the record ids.
    pub shared_images: Vec<(String, Vec<String>)>,
    /// Gaps in the 1..=max catalog number sequence.
    pub missing_numbers: Vec<u32>,
    pub duplicate_numbers: Vec<u32>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    pub fn issue_count(&self) -> usize {
        self.incomplete.len()
            + self.duplicate_artworks.len()
            + self.duplicate_ids.len()
            + self.missing_images.len()
            + self.without_image.len()
            + self.shared_images.len()
            + self.missing_numbers.len()
            + self.duplicate_numbers.len()
    }
}

/// Run every check over the catalog.
pub fn audit(catalog: &Catalog) -> AuditReport {
    let mut report = AuditReport::default();

    report.incomplete = catalog
        .iter()
        .filter_map(|record| {
            let missing = missing_fields(record);
            (!missing.is_empty()).then(|| IncompleteRecord {
                id: record.id.clone(),
                missing,
            })
        })
        .collect();

    report.duplicate_artworks = duplicate_artworks(catalog);
    report.duplicate_ids = repeated(catalog.iter().map(|r| r.id.clone()));

    let mut by_image: Vec<(String, Vec<String>)> = Vec::new();
    for record in catalog.iter() {
        match &record.image {
            None => report.without_image.push(record.id.clone()),
            Some(image) => {
                if let ImageRef::Local(path) = image {
                    if !path.exists() {
                        report.missing_images.push((record.id.clone(), image.to_string()));
                    }
                }
                let key = image.to_string();
                match by_image.iter_mut().find(|(k, _)| *k == key) {
                    Some((_, ids)) => ids.push(record.id.clone()),
                    None => by_image.push((key, vec![record.id.clone()])),
                }
            }
        }
    }
    report.shared_images = by_image.into_iter().filter(|(_, ids)| ids.len() > 1).collect();

    let numbers: Vec<u32> = catalog.iter().filter_map(|r| r.number).collect();
    report.duplicate_numbers = repeated(numbers.iter().copied());
    if let Some(max) = numbers.iter().copied().max() {
        let present: BTreeSet<u32> = numbers.into_iter().collect();
        report.missing_numbers = (1..=max).filter(|n| !present.contains(n)).collect();
    }

    report
}

fn duplicate_artworks(catalog: &Catalog) -> Vec<DuplicateArtwork> {
    let mut groups: Vec<DuplicateArtwork> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in catalog.iter() {
        // Without a title there is nothing to compare; those show up as incomplete.
        if record.title.trim().is_empty() {
            continue;
        }
        let key = (
            record.title.trim().to_lowercase(),
            record.author.trim().to_lowercase(),
        );
        match index.get(&key) {
            Some(&i) => groups[i].ids.push(record.id.clone()),
            None => {
                index.insert(key, groups.len());
                groups.push(DuplicateArtwork {
                    title: record.title.clone(),
                    author: record.author.clone(),
                    ids: vec![record.id.clone()],
                });
            }
        }
    }

    groups.into_iter().filter(|g| g.ids.len() > 1).collect()
}

/// Values that appear more than once, each reported once, in first-seen order.
fn repeated<T: Eq + std::hash::Hash + Clone>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    let mut order = Vec::new();
    for value in values {
        let count = counts.entry(value.clone()).or_insert(0);
        *count += 1;
        if *count == 2 {
            order.push(value);
        }
    }
    order
}
