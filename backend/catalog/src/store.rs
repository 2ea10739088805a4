//! Catalog file read/write with atomic replacement.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::anyhow;
use theframe_core::{Catalog, FrameError, FrameResult};
use tokio::fs;
use tracing::{debug, info};

/// Load and parse the catalog from disk.
///
/// A missing file is `CatalogNotFound`; invalid JSON is `CatalogParse`.
pub async fn load(path: &Path) -> FrameResult<Catalog> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(FrameError::CatalogNotFound(path.to_path_buf()))
        }
        Err(e) => {
            return Err(FrameError::Other(
                anyhow!(e).context(format!("Failed to read catalog: {}", path.display())),
            ))
        }
    };

    let catalog: Catalog = serde_json::from_str(&raw).map_err(|source| FrameError::CatalogParse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), records = catalog.len(), "Loaded catalog");
    Ok(catalog)
}

/// Like [`load`], but a missing file yields an empty catalog (first `generate`).
pub async fn load_or_empty(path: &Path) -> FrameResult<Catalog> {
    match load(path).await {
        Err(FrameError::CatalogNotFound(_)) => {
            debug!(path = %path.display(), "Catalog does not exist yet; starting empty");
            Ok(Catalog::default())
        }
        other => other,
    }
}

/// Write the catalog atomically (write to a sibling temp file, then rename).
pub async fn save(path: &Path, catalog: &Catalog) -> FrameResult<()> {
    let write_err = |message: String| FrameError::CatalogWrite {
        path: path.to_path_buf(),
        message,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| write_err(format!("cannot create {}: {e}", parent.display())))?;
    }

    let mut json = serde_json::to_string_pretty(catalog)
        .map_err(|e| write_err(format!("cannot serialize: {e}")))?;
    json.push('\n');

    let tmp_path = temp_path(path);
    fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| write_err(format!("cannot write {}: {e}", tmp_path.display())))?;

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(write_err(format!("cannot replace file: {e}")));
    }

    info!(path = %path.display(), records = catalog.len(), "Saved catalog");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use theframe_core::{ArtworkRecord, ImageRef};

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("theframe-store-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample() -> Catalog {
        let mut vermeer = ArtworkRecord::new("0001-vermeer");
        vermeer.title = "Girl with a Pearl Earring".into();
        vermeer.author = "Johannes Vermeer".into();
        vermeer.century = "XVII".into();
        vermeer.location = "Mauritshuis, The Hague, Netherlands".into();
        vermeer.image = ImageRef::parse("https://art.example.com/vermeer.jpg");
        vermeer.number = Some(1);
        vermeer.enriched = true;

        let mut goya = ArtworkRecord::new("0002-goya");
        goya.title = "El quitasol".into();
        goya.author = "Francisco de Goya".into();
        goya.image = ImageRef::parse("/srv/art/goya.jpg");
        goya.number = Some(2);

        Catalog::new(vec![vermeer, goya])
    }

    #[tokio::test]
    async fn round_trip_is_identity() {
        let dir = scratch_dir();
        let path = dir.join("artworks.json");
        let catalog = sample();

        save(&path, &catalog).await.unwrap();
        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded, catalog);

        save(&path, &loaded).await.unwrap();
        assert_eq!(load(&path).await.unwrap(), catalog);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn save_leaves_no_temp_file_and_creates_parents() {
        let dir = scratch_dir();
        let path = dir.join("nested").join("artworks.json");

        save(&path, &sample()).await.unwrap();
        assert!(path.exists());
        assert!(!temp_path(&path).exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = scratch_dir();
        let err = load(&dir.join("absent.json")).await.unwrap_err();
        assert!(matches!(err, FrameError::CatalogNotFound(_)));
        assert!(load_or_empty(&dir.join("absent.json")).await.unwrap().is_empty());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn malformed_file_is_parse_error() {
        let dir = scratch_dir();
        let path = dir.join("broken.json");
        std::fs::write(&path, "[{\"id\": \"a1\",").unwrap();

        let err = load(&path).await.unwrap_err();
        assert!(matches!(err, FrameError::CatalogParse { .. }));
        // A broken catalog must never be silently replaced by an empty one.
        assert!(matches!(
            load_or_empty(&path).await.unwrap_err(),
            FrameError::CatalogParse { .. }
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn non_ascii_text_is_written_verbatim() {
        let dir = scratch_dir();
        let path = dir.join("artworks.json");
        let mut record = ArtworkRecord::new("a");
        record.location = "Museo del Prado, Madrid, España".into();

        save(&path, &Catalog::new(vec![record])).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("España"));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn fields_outside_the_record_model_survive_a_save() {
        let dir = scratch_dir();
        let path = dir.join("artworks.json");
        std::fs::write(
            &path,
            r#"{"0001": {
                "title": "Judith and Holofernes",
                "filename": "0001.jpg",
                "bg_url": "https://art.example.com/0001.jpg",
                "languages": {"es": {"title": "Judit y Holofernes"}}
            }}"#,
        )
        .unwrap();

        let catalog = load(&path).await.unwrap();
        save(&path, &catalog).await.unwrap();

        let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entry = &written[0];
        assert_eq!(entry["id"], "0001");
        assert_eq!(entry["filename"], "0001.jpg");
        assert_eq!(entry["image"], "https://art.example.com/0001.jpg");
        assert_eq!(entry["languages"]["es"]["title"], "Judit y Holofernes");
        assert_eq!(load(&path).await.unwrap(), catalog);
        let _ = std::fs::remove_dir_all(dir);
    }
}
