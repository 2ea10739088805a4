mod errors_cmd;
mod generate_cmd;
mod populate_cmd;
mod terminal_output;
mod upload_cmd;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use theframe_config::{
    redacted_settings, validate_for_errors, validate_for_generate, validate_for_populate,
    validate_for_upload, Overrides, Settings,
};
use theframe_core::FrameError;
use theframe_enricher::OllamaProvider;
use theframe_logging::init_logger;

use terminal_output::note_error;
use upload_cmd::UploadOptions;

#[derive(Parser)]
#[command(name = "theframe")]
#[command(about = "TheFrame: curate an art catalog and push it to a Samsung Frame TV")]
#[command(version)]
struct Cli {
    /// Catalog JSON file (overrides THEFRAME_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a random artwork to the TV
    Upload {
        /// Draw title, author, century and location onto the image
        #[arg(long)]
        embed: bool,
        /// TV address
        #[arg(long)]
        ip: Option<String>,
        /// Pairing token
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        port: Option<u16>,
        /// Prepare the image but do not contact the TV
        #[arg(long)]
        dry_run: bool,
        /// Leave previously uploaded artworks on the TV
        #[arg(long)]
        keep_old: bool,
        /// Upload without selecting the new artwork
        #[arg(long)]
        no_activate: bool,
        #[arg(long)]
        debug: bool,
    },
    /// Scan an images directory and merge new artworks into the catalog
    Generate {
        #[arg(long)]
        images_dir: Option<PathBuf>,
        /// URL the images directory is served under
        #[arg(long)]
        base_url: Option<String>,
        #[arg(long)]
        debug: bool,
    },
    /// Fill missing metadata with a local Ollama model
    Populate {
        /// Enrich at most N records this run
        #[arg(long, value_name = "N")]
        increment: Option<usize>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        debug: bool,
    },
    /// Report incomplete and inconsistent catalog entries
    Errors {
        #[arg(long)]
        debug: bool,
    },
}

impl Commands {
    fn overrides(&self, catalog: Option<PathBuf>) -> Overrides {
        let mut overrides = Overrides {
            catalog_path: catalog,
            ..Default::default()
        };
        match self {
            Commands::Upload { ip, token, port, debug, .. } => {
                overrides.tv_ip = ip.clone();
                overrides.tv_token = token.clone();
                overrides.tv_port = *port;
                overrides.debug = *debug;
            }
            Commands::Generate { images_dir, base_url, debug } => {
                overrides.images_dir = images_dir.clone();
                overrides.base_url = base_url.clone();
                overrides.debug = *debug;
            }
            Commands::Populate { model, debug, .. } => {
                overrides.ai_model = model.clone();
                overrides.debug = *debug;
            }
            Commands::Errors { debug } => overrides.debug = *debug,
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    settings.apply(cli.command.overrides(cli.catalog.clone()));
    init_logger(&settings.log_level, settings.log_dir.as_deref());
    debug!(settings = %redacted_settings(&settings), "Effective settings");

    match run(cli.command, &settings).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Command failed");
            note_error(&format!("{e:#}"));
            if let Some(hint) = hint_for(&e) {
                note_error(hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, settings: &Settings) -> Result<ExitCode> {
    match command {
        Commands::Upload { embed, dry_run, keep_old, no_activate, .. } => {
            // A dry run never talks to the TV, so it needs no address or token.
            if !dry_run {
                validate_for_upload(settings).into_result()?;
            }
            let options = UploadOptions {
                embed,
                dry_run,
                keep_old,
                no_activate,
            };
            let summary = upload_cmd::run(settings, &options).await?;
            debug!(
                artwork = %summary.artwork_id,
                content_id = ?summary.content_id,
                annotated = ?summary.annotated,
                "Upload finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Generate { .. } => {
            validate_for_generate(settings).into_result()?;
            generate_cmd::run(settings).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Populate { increment, .. } => {
            validate_for_populate(settings).into_result()?;
            let provider = Arc::new(OllamaProvider::new().with_base_url(&settings.ollama_url));
            let succeeded = populate_cmd::run(settings, provider, increment).await?;
            Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Commands::Errors { .. } => {
            validate_for_errors(settings).into_result()?;
            errors_cmd::run(settings).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Extra advice for failures the user can fix on their side.
fn hint_for(error: &anyhow::Error) -> Option<&'static str> {
    match error.downcast_ref::<FrameError>()? {
        FrameError::TvAuth { .. } => Some(
            "The TV did not accept this client. Re-pair: allow TheFrame in the TV's device \
             connection manager, then set THEFRAME_TV_TOKEN to the token it issues.",
        ),
        FrameError::TvUnreachable { .. } | FrameError::ConnectionReset(_) => Some(
            "Check that the TV is on, on the same network, and that THEFRAME_TV_IP is correct.",
        ),
        FrameError::EnrichmentService(_) => Some("Check that Ollama is running at THEFRAME_OLLAMA_URL."),
        FrameError::FontUnavailable { .. } => Some("Point THEFRAME_FONT at a TrueType font file."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload_flags() {
        let cli = Cli::parse_from([
            "theframe", "--catalog", "art.json", "upload", "--embed", "--ip", "10.0.0.5", "--dry-run",
        ]);
        assert_eq!(cli.catalog, Some(PathBuf::from("art.json")));
        let overrides = cli.command.overrides(cli.catalog.clone());
        assert_eq!(overrides.tv_ip.as_deref(), Some("10.0.0.5"));
        assert_eq!(overrides.catalog_path, Some(PathBuf::from("art.json")));
        assert!(matches!(cli.command, Commands::Upload { embed: true, dry_run: true, keep_old: false, .. }));
    }

    #[test]
    fn catalog_flag_is_accepted_after_the_subcommand() {
        let cli = Cli::parse_from(["theframe", "populate", "--increment", "5", "--catalog", "x.json"]);
        assert_eq!(cli.catalog, Some(PathBuf::from("x.json")));
        assert!(matches!(cli.command, Commands::Populate { increment: Some(5), .. }));
    }

    #[test]
    fn debug_flag_raises_log_level() {
        let cli = Cli::parse_from(["theframe", "errors", "--debug"]);
        let mut settings = Settings::default();
        settings.apply(cli.command.overrides(None));
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn auth_and_network_failures_get_different_hints() {
        let auth = anyhow::Error::new(FrameError::TvAuth { host: "tv".into() });
        let down = anyhow::Error::new(FrameError::TvUnreachable {
            host: "tv".into(),
            reason: "refused".into(),
        });
        let auth_hint = hint_for(&auth).unwrap();
        let down_hint = hint_for(&down).unwrap();
        assert!(auth_hint.contains("Re-pair"));
        assert!(down_hint.contains("network"));
        assert!(hint_for(&anyhow::anyhow!("plain")).is_none());
    }
}
