//! `theframe generate`: build or extend the catalog from an images directory.

use anyhow::{anyhow, bail, Result};
use tracing::info;

use theframe_catalog::{load_or_empty, save, scan_images, ScanOutcome};
use theframe_config::Settings;

use crate::terminal_output::{note_info, note_success};

pub async fn run(settings: &Settings) -> Result<ScanOutcome> {
    let images_dir = settings
        .images_dir
        .as_deref()
        .ok_or_else(|| anyhow!("no images directory configured"))?;

    let mut catalog = load_or_empty(&settings.catalog_path).await?;
    let before = catalog.len();
    let outcome = scan_images(images_dir, settings.base_url.as_deref(), &mut catalog)?;
    info!(
        added = outcome.added.len(),
        skipped_known = outcome.skipped_known,
        skipped_duplicates = outcome.skipped_duplicates,
        "Scan finished"
    );

    if catalog.is_empty() {
        bail!("no images found under {}", images_dir.display());
    }
    if outcome.added.is_empty() {
        note_info(&format!(
            "No new artworks; catalog {} unchanged ({before} records)",
            settings.catalog_path.display()
        ));
        return Ok(outcome);
    }

    save(&settings.catalog_path, &catalog).await?;
    note_success(&format!(
        "Added {} artworks to {} ({} records)",
        outcome.added.len(),
        settings.catalog_path.display(),
        catalog.len()
    ));
    Ok(outcome)
}
