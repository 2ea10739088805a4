//! Image directory scan behind `generate`.
//!
//! File names follow the `Author - Title.jpg` convention; a file with no
//! separator takes its author from the directory it sits in. Images filed as
//! `Style/Author/Title.jpg` also get a style.

use std::collections::HashSet;
use std::path::{Component, Path};

use theframe_core::{ArtworkRecord, Catalog, FrameError, FrameResult, ImageRef};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Directories below the images root that are still scanned.
const MAX_NESTING: usize = 3;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tiff", "tif"];

/// What a scan added to the catalog.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub added: Vec<String>,
    pub skipped_known: usize,
    pub skipped_duplicates: usize,
}

/// Walk `images_dir` and append a record for every new image to `catalog`.
///
/// Images already referenced by the catalog, and images whose (author, title)
/// is already present, are skipped. New records get the next catalog numbers.
pub fn scan_images(
    images_dir: &Path,
    base_url: Option<&str>,
    catalog: &mut Catalog,
) -> FrameResult<ScanOutcome> {
    if !images_dir.is_dir() {
        return Err(FrameError::Config(format!(
            "images directory {} does not exist",
            images_dir.display()
        )));
    }

    let mut known_images: HashSet<String> = catalog
        .iter()
        .filter_map(|r| r.image.as_ref().map(ToString::to_string))
        .collect();
    let mut known_pairs: HashSet<(String, String)> = catalog
        .iter()
        .map(|r| pair_key(&r.author, &r.title))
        .collect();

    let mut outcome = ScanOutcome::default();
    let mut next_number = catalog.max_number() + 1;

    let walker = WalkDir::new(images_dir)
        .max_depth(MAX_NESTING + 1)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_image_extension(entry.path()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(images_dir) else {
            continue;
        };

        let image = image_ref(images_dir, relative, base_url);
        if known_images.contains(&image.to_string()) {
            outcome.skipped_known += 1;
            continue;
        }

        let (author, title) = derive_names(relative);
        if !known_pairs.insert(pair_key(&author, &title)) {
            debug!(path = %relative.display(), "Duplicate artwork, skipping");
            outcome.skipped_duplicates += 1;
            continue;
        }
        known_images.insert(image.to_string());

        let number = next_number;
        next_number += 1;
        let slug = slugify(&format!("{author} {title}"));
        let id = if slug.is_empty() {
            format!("{number:04}")
        } else {
            format!("{number:04}-{slug}")
        };

        debug!(id = %id, path = %relative.display(), "Found new image");
        outcome.added.push(id.clone());
        catalog.push(ArtworkRecord {
            id,
            title,
            author,
            image: Some(image),
            number: Some(number),
            style: derive_style(relative),
            ..Default::default()
        });
    }

    Ok(outcome)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

fn image_ref(images_dir: &Path, relative: &Path, base_url: Option<&str>) -> ImageRef {
    match base_url {
        Some(base) => {
            let encoded: Vec<String> = relative
                .components()
                .filter_map(|c| match c {
                    Component::Normal(part) => {
                        Some(urlencoding::encode(&part.to_string_lossy()).into_owned())
                    }
                    _ => None,
                })
                .collect();
            ImageRef::Remote(format!("{}/{}", base.trim_end_matches('/'), encoded.join("/")))
        }
        None => ImageRef::Local(images_dir.join(relative)),
    }
}

/// (author, title) from a path relative to the images root.
fn derive_names(relative: &Path) -> (String, String) {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let split = stem.split_once(" - ").or_else(|| stem.split_once('-'));
    if let Some((author, title)) = split {
        let (author, title) = (clean_name(author), clean_name(title));
        if !author.is_empty() && !title.is_empty() {
            return (author, title);
        }
    }

    let author = relative
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| clean_name(&n.to_string_lossy()))
        .unwrap_or_default();
    (author, clean_name(&stem))
}

/// Top-level directory of a `Style/Author/Title.jpg` layout.
fn derive_style(relative: &Path) -> Option<String> {
    let dirs: Vec<_> = relative.parent()?.components().collect();
    if dirs.len() < 2 {
        return None;
    }
    match dirs[0] {
        Component::Normal(name) => Some(clean_name(&name.to_string_lossy())).filter(|s| !s.is_empty()),
        _ => None,
    }
}

/// Underscores become spaces and runs of whitespace collapse.
pub fn clean_name(raw: &str) -> String {
    raw.replace('_', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercase, alphanumeric runs joined by single dashes.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn pair_key(author: &str, title: &str) -> (String, String) {
    (author.trim().to_lowercase(), title.trim().to_lowercase())
}
