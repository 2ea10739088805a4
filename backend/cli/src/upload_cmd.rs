//! `theframe upload`: pick an artwork, optionally annotate it, send it to the TV.

use std::future::Future;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use theframe_catalog::pick_random;
use theframe_config::Settings;
use theframe_core::{ArtDisplay, ArtworkRecord, FrameResult, ImageFileType};
use theframe_logging::{EventLogger, RunEvent};
use theframe_media::{default_font_candidates, detect_image_type, fetch_image, Annotator};
use theframe_tv::{retry_on_reset, ArtSession, TvEndpoint};

use crate::terminal_output::{note_info, note_success, note_warn};

/// Port the TV serves plain `ws://` on; everything else is `wss://`.
const PLAIN_WS_PORT: u16 = 8001;

#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub embed: bool,
    pub dry_run: bool,
    pub keep_old: bool,
    pub no_activate: bool,
}

/// Image bytes ready to send, plus the annotated file they came from.
struct PreparedImage {
    bytes: Vec<u8>,
    file_type: ImageFileType,
    annotated: Option<PathBuf>,
}

#[derive(Debug)]
pub struct UploadSummary {
    pub artwork_id: String,
    pub content_id: Option<String>,
    pub annotated: Option<PathBuf>,
}

pub async fn run(settings: &Settings, options: &UploadOptions) -> Result<UploadSummary> {
    let catalog = theframe_catalog::load(&settings.catalog_path).await?;
    let record = pick_random(&catalog)
        .ok_or_else(|| {
            anyhow!(
                "catalog {} has no artwork with a reachable image",
                settings.catalog_path.display()
            )
        })?
        .clone();
    info!(id = %record.id, "Selected {}", record.display_name());

    let prepared = prepare_image(settings, &record, options.embed).await?;

    if options.dry_run {
        match &prepared.annotated {
            Some(path) => note_success(&format!("Annotated image written to {}", path.display())),
            None => note_info(&format!(
                "Dry run: would upload {} ({} bytes)",
                record.display_name(),
                prepared.bytes.len()
            )),
        }
        return Ok(UploadSummary {
            artwork_id: record.id,
            content_id: None,
            annotated: prepared.annotated,
        });
    }

    let endpoint = endpoint_for(settings)?;
    let (mut session, content_id) = store_with_retry(
        || ArtSession::connect(&endpoint),
        &record,
        &prepared.bytes,
        prepared.file_type,
    )
    .await?;
    let finished = finish(&mut session, &content_id, options).await;
    let issued_token = session.issued_token().map(str::to_string);
    session.close().await;
    finished?;

    if let Some(path) = &prepared.annotated {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "Could not remove annotated image");
        }
    }
    if let Some(token) = issued_token.filter(|t| settings.tv_token.as_deref() != Some(t.as_str())) {
        note_warn(&format!("The TV issued a new pairing token; set THEFRAME_TV_TOKEN={token}"));
    }
    note_success(&format!("Uploaded {} as {content_id}", record.display_name()));

    Ok(UploadSummary {
        artwork_id: record.id,
        content_id: Some(content_id),
        annotated: None,
    })
}

async fn prepare_image(settings: &Settings, record: &ArtworkRecord, embed: bool) -> Result<PreparedImage> {
    let image = record
        .image
        .as_ref()
        .ok_or_else(|| anyhow!("artwork {} has no image", record.id))?;
    let client = reqwest::Client::new();
    let bytes = fetch_image(image, &client).await?;

    if !embed {
        let file_type = detect_image_type(&PathBuf::from(image.file_name().unwrap_or_default()), &bytes);
        return Ok(PreparedImage {
            bytes,
            file_type,
            annotated: None,
        });
    }

    let candidates = default_font_candidates(settings.font_path.as_deref());
    let annotator = Annotator::new(&candidates, &settings.annotated_path)?;
    info!(font = %annotator.font_path().display(), "Annotating image");
    let path = annotator.annotate_bytes(&bytes, record)?;
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read annotated image {}", path.display()))?;
    Ok(PreparedImage {
        bytes,
        file_type: ImageFileType::Jpeg,
        annotated: Some(path),
    })
}

fn endpoint_for(settings: &Settings) -> Result<TvEndpoint> {
    let host = settings
        .tv_ip
        .clone()
        .ok_or_else(|| anyhow!("TV IP address is not set"))?;
    let mut endpoint = TvEndpoint::new(host, settings.tv_port)
        .with_client_name(&settings.tv_client_name)
        .with_timeout(settings.tv_timeout());
    if let Some(token) = &settings.tv_token {
        endpoint = endpoint.with_token(token);
    }
    if settings.tv_port == PLAIN_WS_PORT {
        endpoint = endpoint.insecure();
    }
    Ok(endpoint)
}

/// Connect and store the image, reconnecting once if the connection is reset.
///
/// Only this step is retried. Once the TV has accepted the image, a second
/// attempt would store it twice.
pub(crate) async fn store_with_retry<D, C, Fut>(
    mut connect: C,
    record: &ArtworkRecord,
    image: &[u8],
    file_type: ImageFileType,
) -> FrameResult<(D, String)>
where
    D: ArtDisplay,
    C: FnMut() -> Fut,
    Fut: Future<Output = FrameResult<D>>,
{
    retry_on_reset("upload", move || {
        let connecting = connect();
        async move {
            let mut display = connecting.await?;
            let content_id = store(&mut display, record, image, file_type).await?;
            Ok((display, content_id))
        }
    })
    .await
}

async fn store<D: ArtDisplay + ?Sized>(
    display: &mut D,
    record: &ArtworkRecord,
    image: &[u8],
    file_type: ImageFileType,
) -> FrameResult<String> {
    let content_id = display.upload(image, file_type).await?;
    EventLogger::log_event(
        "upload",
        RunEvent::Uploaded {
            artwork_id: record.id.clone(),
            content_id: content_id.clone(),
        },
    );
    Ok(content_id)
}

/// Select the stored artwork and prune older uploads.
///
/// Pruning failures only warn: the new artwork is already on the TV.
pub(crate) async fn finish<D: ArtDisplay + ?Sized>(
    display: &mut D,
    content_id: &str,
    options: &UploadOptions,
) -> FrameResult<()> {
    if !options.no_activate {
        let show = display.artmode_enabled().await?;
        display.set_active(content_id, show).await?;
    }

    if !options.keep_old {
        if let Err(e) = prune(display, content_id).await {
            warn!(error = %e, "Could not remove older artworks from the TV");
        }
    }
    Ok(())
}

/// Delete every user artwork except the new one and whatever is on screen.
async fn prune<D: ArtDisplay + ?Sized>(display: &mut D, new_content_id: &str) -> FrameResult<()> {
    let current = display.current_content().await?;
    let stale: Vec<String> = display
        .list_content()
        .await?
        .into_iter()
        .filter(|id| id != new_content_id && Some(id) != current.as_ref())
        .collect();
    if stale.is_empty() {
        return Ok(());
    }
    display.delete_content(&stale).await?;
    EventLogger::log_event("upload", RunEvent::Pruned { content_ids: stale });
    Ok(())
}
