// LobbyScout - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config discovery and validation
// 3. Logging initialisation (debug mode support)
// 4. Startup open of the current session log
// 5. Running the tail loop until Ctrl-C

use lobbyscout::app::geo::IpApiClient;
use lobbyscout::app::notify::WebhookNotifier;
use lobbyscout::app::pipeline::{LobbyReporter, ReportStats};
use lobbyscout::app::tail::{run_tail, TailEngine, TailSettings};
use lobbyscout::app::http;
use lobbyscout::core::interpreter::{LineInterpreter, LOBBY_LINE_PATTERN};
use lobbyscout::core::locator::SessionLogLocator;
use lobbyscout::platform::config::{self, AppConfig, PlatformPaths};
use lobbyscout::util::{self, error::LobbyScoutError, error::LookupError};

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// LobbyScout - reports which country each matchmaking lobby is hosted in.
///
/// Follows the game's session log. Lobbies already in the log at startup are
/// printed to the console; lobbies joined while running are also posted to
/// the configured webhook.
#[derive(Parser, Debug)]
#[command(name = "LobbyScout", version, about)]
struct Cli {
    /// Path to config.toml (defaults to ./config.toml, then the platform
    /// config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Config is read before logging starts because it carries the log level.
    // Neither step logs; their outcome is reported once logging is up.
    let platform_paths = PlatformPaths::resolve();
    let loaded = config::find_config_file(cli.config.as_deref(), &platform_paths)
        .and_then(|path| config::load_config(&path));

    let config_level = loaded
        .as_ref()
        .ok()
        .and_then(|l| l.config.log_level.clone());
    util::logging::init(cli.debug, config_level.as_deref());

    tracing::info!(
        version = util::constants::APP_VERSION,
        debug = cli.debug,
        "LobbyScout starting"
    );

    match &platform_paths.config_dir {
        Some(dir) => tracing::debug!(config = %dir.display(), "Platform paths resolved"),
        None => tracing::warn!("Could not determine platform directories"),
    }

    let config = match loaded {
        Ok(loaded) => {
            tracing::info!(path = %loaded.path.display(), "Loaded config.toml");
            for warning in &loaded.warnings {
                tracing::warn!("{}", warning);
            }
            loaded.config
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                "No usable config. Make sure there is a config.toml next to LobbyScout."
            );
            wait_for_enter();
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            std::process::exit(1);
        }
    };

    match runtime.block_on(run(config)) {
        Ok(stats) => {
            tracing::info!(
                lines = stats.lines,
                malformed = stats.malformed_lines,
                lobbies = stats.lobbies,
                lookups_failed = stats.lookups_failed,
                notified = stats.notifications_sent,
                notify_failed = stats.notifications_failed,
                "LobbyScout stopped"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "LobbyScout cannot start");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Build the pipeline and tail until Ctrl-C.
async fn run(config: AppConfig) -> Result<ReportStats, LobbyScoutError> {
    let settings = TailSettings {
        poll_interval: config.poll_interval,
        rotation_check_threshold: config.rotation_check_threshold,
    };

    let interpreter = LineInterpreter::new().map_err(|source| LobbyScoutError::Pattern {
        pattern: LOBBY_LINE_PATTERN,
        source,
    })?;
    let client = http::build_client(config.request_timeout).map_err(LookupError::Http)?;
    let geo = IpApiClient::new(client.clone(), config.geolocation_base_url.as_str());
    let notifier = WebhookNotifier::new(client, config.webhook_url.as_str(), config.player_name.as_str());
    let mut reporter = LobbyReporter::new(interpreter, geo, notifier);

    // Fatal if there is no session log yet: nothing to follow.
    let engine = TailEngine::start(SessionLogLocator::new(config.logs_root()), &settings)?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                shutdown.cancel();
            }
            Err(e) => tracing::warn!(error = %e, "Cannot listen for Ctrl-C"),
        }
    });

    tracing::info!(player = %config.player_name, "Started. Keep this window open.");
    run_tail(engine, &mut reporter, settings.poll_interval, cancel).await;

    Ok(reporter.stats())
}

/// Block until the user presses Enter, so a double-clicked console window
/// stays open long enough to read the error.
fn wait_for_enter() {
    print!("Press Enter to exit...");
    let _ = std::io::stdout().flush();
    let mut buf = String::new();
    let _ = std::io::stdin().read_line(&mut buf);
}
