//! Default values applied when the environment leaves a setting unset.

use std::path::PathBuf;

/// Port of the TV's secure WebSocket API.
pub const DEFAULT_TV_PORT: u16 = 8002;

/// Seconds to wait for the TV to answer a single request.
pub const DEFAULT_TV_TIMEOUT_SECS: u64 = 10;

/// Name the TV shows in its list of paired devices.
pub const DEFAULT_TV_CLIENT_NAME: &str = "TheFrame";

/// Catalog file used when `THEFRAME_CATALOG` is unset.
pub const DEFAULT_CATALOG_PATH: &str = "artworks.json";

/// Local Ollama server.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

pub const DEFAULT_AI_MODEL: &str = "llama3.2:latest";

pub const DEFAULT_LOG_LEVEL: &str = "info";

const ANNOTATED_FILE_NAME: &str = "annotated.jpg";

/// Fixed location of the annotated image: the user cache dir when there is
/// one, otherwise the system temp dir.
pub fn default_annotated_path() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("theframe"))
        .unwrap_or_else(|| std::env::temp_dir().join("theframe"))
        .join(ANNOTATED_FILE_NAME)
}
