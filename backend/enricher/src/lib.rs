pub mod enricher;
pub mod parse;
pub mod prompt;
pub mod providers;

pub use enricher::{EnrichmentOutcome, EnrichmentReport, EnrichmentState, Enricher};
pub use parse::{parse_response, ParsedMetadata};
pub use prompt::{build_prompt, build_request, SYSTEM_PROMPT};
pub use providers::mock::MockProvider;
pub use providers::ollama::OllamaProvider;
