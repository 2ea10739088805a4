//! Batch enrichment of incomplete catalog records.

use std::sync::Arc;

use theframe_catalog::{is_complete, missing_fields};
use theframe_core::{ArtworkRecord, Catalog, FrameError, FrameResult, LlmProvider};
use theframe_logging::{EventLogger, RunEvent};
use tracing::{debug, info, warn};

use crate::parse::parse_response;
use crate::prompt::build_request;

/// Where a record is in one `populate` run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentState {
    Pending,
    Enriching,
    Enriched,
    /// Left untouched; picked up again by the next run.
    Failed,
}

#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub id: String,
    pub state: EnrichmentState,
    pub updated_fields: Vec<&'static str>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct EnrichmentReport {
    /// Records that were missing metadata before the run.
    pub candidates: usize,
    pub outcomes: Vec<EnrichmentOutcome>,
}

impl EnrichmentReport {
    pub fn succeeded(&self) -> usize {
        self.count(EnrichmentState::Enriched)
    }

    pub fn failed(&self) -> usize {
        self.count(EnrichmentState::Failed)
    }

    /// Whether any record was modified and the catalog needs saving.
    pub fn changed(&self) -> bool {
        self.outcomes.iter().any(|o| !o.updated_fields.is_empty())
    }

    fn count(&self, state: EnrichmentState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}

pub struct Enricher {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl Enricher {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model about `record` and return an updated copy.
    ///
    /// The copy has `enriched` set once none of the tracked fields is missing.
    /// A reply with no recognisable field lines is an error.
    pub async fn enrich(&self, record: &ArtworkRecord) -> FrameResult<ArtworkRecord> {
        let request = build_request(record, &self.model);
        debug!(id = %record.id, provider = self.provider.name(), "Requesting metadata");

        let response = self
            .provider
            .complete(&request)
            .await
            .map_err(|e| FrameError::EnrichmentService(format!("{e:#}")))?;
        debug!(
            id = %record.id,
            tokens = response.tokens_used,
            latency_ms = response.latency_ms,
            "Model replied"
        );

        let parsed = parse_response(&response.content);
        if parsed.is_empty() {
            return Err(FrameError::EnrichmentService(
                "reply contained no usable metadata".to_string(),
            ));
        }
        let mut updated = record.clone();
        parsed.apply(&mut updated);
        updated.enriched = is_complete(&updated);
        Ok(updated)
    }

    /// Enrich incomplete records one at a time, in catalog order.
    ///
    /// `limit` caps how many candidates are attempted. A failure is logged and
    /// leaves its record unchanged; the batch carries on.
    pub async fn enrich_catalog(&self, catalog: &mut Catalog, limit: Option<usize>) -> EnrichmentReport {
        let candidates: Vec<usize> = catalog
            .iter()
            .enumerate()
            .filter(|(_, record)| !is_complete(record))
            .map(|(index, _)| index)
            .collect();

        let mut report = EnrichmentReport {
            candidates: candidates.len(),
            outcomes: Vec::new(),
        };
        let selected = &candidates[..limit.unwrap_or(candidates.len()).min(candidates.len())];
        info!(
            candidates = candidates.len(),
            selected = selected.len(),
            model = %self.model,
            "Starting enrichment"
        );

        report.outcomes = selected
            .iter()
            .map(|&index| EnrichmentOutcome {
                id: catalog.records()[index].id.clone(),
                state: EnrichmentState::Pending,
                updated_fields: Vec::new(),
                error: None,
            })
            .collect();

        for (position, &index) in selected.iter().enumerate() {
            let outcome = &mut report.outcomes[position];
            outcome.state = EnrichmentState::Enriching;
            let record = &catalog.records()[index];
            info!(
                id = %outcome.id,
                position = position + 1,
                total = selected.len(),
                missing = ?missing_fields(record),
                "Enriching {}",
                record.display_name()
            );

            match self.enrich(record).await {
                Ok(updated) => {
                    let target = &mut catalog.records_mut()[index];
                    let mut updated_fields = changed_fields(target, &updated);
                    if updated.enriched != target.enriched {
                        updated_fields.push("enriched");
                    }
                    *target = updated;
                    EventLogger::log_event(
                        "populate",
                        RunEvent::Enriched {
                            artwork_id: outcome.id.clone(),
                            fields: updated_fields.iter().map(|f| f.to_string()).collect(),
                        },
                    );
                    outcome.state = EnrichmentState::Enriched;
                    outcome.updated_fields = updated_fields;
                }
                Err(e) => {
                    warn!(id = %outcome.id, error = %e, "Enrichment failed");
                    EventLogger::log_event(
                        "populate",
                        RunEvent::EnrichmentFailed {
                            artwork_id: outcome.id.clone(),
                            error_msg: e.to_string(),
                        },
                    );
                    outcome.state = EnrichmentState::Failed;
                    outcome.error = Some(e.to_string());
                }
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Enrichment finished"
        );
        report
    }
}

/// Names of the fields that differ between `before` and `after`.
fn changed_fields(before: &ArtworkRecord, after: &ArtworkRecord) -> Vec<&'static str> {
    let mut changed: Vec<&'static str> = theframe_core::MetadataField::ALL
        .into_iter()
        .filter(|f| before.field(*f) != after.field(*f))
        .map(|f| f.label())
        .collect();
    if before.style != after.style {
        changed.push("style");
    }
    if before.year != after.year {
        changed.push("year");
    }
    if before.wikipedia_url != after.wikipedia_url {
        changed.push("wikipedia_url");
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::MockProvider;
    use crate::providers::ollama::OllamaProvider;

    fn record(id: &str, title: &str, author: &str) -> ArtworkRecord {
        let mut record = ArtworkRecord::new(id);
        record.title = title.into();
        record.author = author.into();
        record
    }

    fn complete_record(id: &str) -> ArtworkRecord {
        let mut record = record(id, "Saturn Devouring His Son", "Francisco de Goya");
        record.century = "XIX".into();
        record.location = "Museo del Prado, Madrid, Spain".into();
        record
    }

    #[tokio::test]
    async fn unreachable_endpoint_leaves_record_unchanged() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let enricher = Enricher::new(Arc::new(OllamaProvider::new().with_base_url(base)), "llama3.2:latest");
        let original = record("a1", "", "Vermeer");
        let mut catalog = Catalog::new(vec![original.clone()]);

        let report = enricher.enrich_catalog(&mut catalog, None).await;
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 0);
        assert!(!report.changed());
        assert_eq!(catalog.records()[0], original);
        assert!(matches!(enricher.enrich(&original).await, Err(FrameError::EnrichmentService(_))));
    }

    #[tokio::test]
    async fn failure_does_not_stop_the_batch() {
        let provider = Arc::new(
            MockProvider::new("mock")
                .then_fail("connection refused")
                .then_reply("Title: The Milkmaid\nCentury: XVII\nLocation: Rijksmuseum, Amsterdam, Netherlands"),
        );
        let enricher = Enricher::new(provider.clone(), "m");
        let mut catalog = Catalog::new(vec![
            record("a1", "", "Vermeer"),
            complete_record("done"),
            record("a2", "", "Vermeer"),
        ]);

        let report = enricher.enrich_catalog(&mut catalog, None).await;
        assert_eq!(report.candidates, 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.outcomes[0].state, EnrichmentState::Failed);
        assert_eq!(provider.requests().len(), 2);

        assert_eq!(catalog.get("a1").unwrap().title, "");
        let a2 = catalog.get("a2").unwrap();
        assert_eq!(a2.title, "The Milkmaid");
        assert!(a2.enriched);
        assert_eq!(catalog.get("done").unwrap(), &complete_record("done"));
    }

    #[tokio::test]
    async fn partial_reply_updates_only_what_it_names() {
        let provider = Arc::new(MockProvider::new("mock").with_response("Title: Girl with a Pearl Earring"));
        let enricher = Enricher::new(provider, "m");
        let mut catalog = Catalog::new(vec![record("a1", "", "Vermeer")]);

        let report = enricher.enrich_catalog(&mut catalog, None).await;
        assert_eq!(report.outcomes[0].updated_fields, vec!["title"]);
        let a1 = catalog.get("a1").unwrap();
        assert_eq!(a1.title, "Girl with a Pearl Earring");
        assert_eq!(a1.author, "Vermeer");
        assert!(!a1.enriched);
    }

    #[tokio::test]
    async fn increment_limits_the_batch() {
        let provider = Arc::new(MockProvider::new("mock").with_response("Century: XVII"));
        let enricher = Enricher::new(provider.clone(), "m");
        let mut catalog = Catalog::new(vec![
            record("a1", "", "A"),
            record("a2", "", "B"),
            record("a3", "", "C"),
        ]);

        let report = enricher.enrich_catalog(&mut catalog, Some(2)).await;
        assert_eq!(report.candidates, 3);
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(provider.requests().len(), 2);
        assert_eq!(catalog.get("a3").unwrap().century, "");
    }

    #[tokio::test]
    async fn reply_without_fields_counts_as_failure() {
        let provider = Arc::new(MockProvider::new("mock").with_response("I don't know this painting."));
        let enricher = Enricher::new(provider, "m");
        let original = record("a1", "", "Vermeer");
        let mut catalog = Catalog::new(vec![original.clone()]);

        let report = enricher.enrich_catalog(&mut catalog, None).await;
        assert_eq!(report.failed(), 1);
        assert_eq!(report.succeeded(), 0);
        assert!(!report.changed());
        assert!(report.outcomes[0].error.as_deref().unwrap().contains("no usable metadata"));
        assert_eq!(catalog.records()[0], original);
    }
}
