//! `theframe populate`: fill missing metadata with an LLM.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use theframe_catalog::save;
use theframe_config::Settings;
use theframe_core::LlmProvider;
use theframe_enricher::{EnrichmentState, Enricher};

use crate::terminal_output::{note_info, note_success, note_warn, render_table, Column};

/// Enrich the catalog and save it once if anything changed.
///
/// Returns `false` when records were attempted and none succeeded.
pub async fn run(
    settings: &Settings,
    provider: Arc<dyn LlmProvider>,
    increment: Option<usize>,
) -> Result<bool> {
    let mut catalog = theframe_catalog::load(&settings.catalog_path).await?;
    let enricher = Enricher::new(provider, &settings.ai_model);
    let report = enricher.enrich_catalog(&mut catalog, increment).await;

    if report.candidates == 0 {
        note_success("Every artwork already has complete metadata");
        return Ok(true);
    }
    if report.outcomes.is_empty() {
        note_info(&format!(
            "{} records need metadata; none attempted with --increment 0",
            report.candidates
        ));
        return Ok(true);
    }

    if report.changed() {
        save(&settings.catalog_path, &catalog).await?;
        info!(path = %settings.catalog_path.display(), "Saved enriched catalog");
    }

    let rows: Vec<Vec<String>> = report
        .outcomes
        .iter()
        .map(|o| {
            let result = match o.state {
                EnrichmentState::Enriched if o.updated_fields.is_empty() => "no new data".to_string(),
                EnrichmentState::Enriched => o.updated_fields.join(", "),
                _ => o.error.clone().unwrap_or_else(|| "failed".to_string()),
            };
            vec![o.id.clone(), format!("{:?}", o.state), result]
        })
        .collect();
    print!(
        "{}",
        render_table(
            &[Column::left("ID").max(48), Column::left("State"), Column::left("Updated").max(60)],
            &rows
        )
    );

    let remaining = report.candidates - report.succeeded();
    let summary = format!(
        "Enriched {} of {} attempted ({} candidates, {} failed)",
        report.succeeded(),
        report.outcomes.len(),
        report.candidates,
        report.failed()
    );
    if report.failed() > 0 {
        note_warn(&summary);
    } else {
        note_success(&summary);
    }
    if remaining > 0 {
        note_info(&format!("{remaining} records still need metadata; run populate again"));
    }

    Ok(report.succeeded() > 0)
}
