//! Guest Quest server binary.
//!
//! Configuration comes from the environment:
//!
//! - `GUESTQUEST_ADDR`: bind address (default `0.0.0.0:3000`); if unset,
//!   `PORT` alone is honoured as `0.0.0.0:$PORT`
//! - `GUESTQUEST_CHARACTERS_DIR`: directory of extra `<setId>.json` sets
//! - `GUESTQUEST_TURN_SECONDS`: turn length in seconds (default 60)
//! - `RUST_LOG`: tracing filter (default `info`)

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use guestquest::prelude::*;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    addr: String,
    characters_dir: Option<PathBuf>,
    turn_duration: Duration,
}

impl Settings {
    fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let addr = var("GUESTQUEST_ADDR")
            .or_else(|| var("PORT").map(|port| format!("0.0.0.0:{}", port.trim())))
            .unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let turn_duration = var("GUESTQUEST_TURN_SECONDS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| RoomConfig::default().turn_duration);

        Self {
            addr,
            characters_dir: var("GUESTQUEST_CHARACTERS_DIR").map(PathBuf::from),
            turn_duration,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let settings = Settings::from_env();
    match run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(settings: Settings) -> Result<(), GuestQuestError> {
    let mut catalog = CharacterCatalog::builtin();
    if let Some(dir) = &settings.characters_dir {
        let loaded = catalog.load_dir(dir)?;
        tracing::info!(dir = %dir.display(), loaded, "loaded character sets");
    }

    let server = GuestQuestServer::builder()
        .bind(&settings.addr)
        .room_config(RoomConfig {
            turn_duration: settings.turn_duration,
            ..RoomConfig::default()
        })
        .catalog(catalog)
        .build()
        .await?;

    tracing::info!(addr = %server.local_addr().map(|a| a.to_string()).unwrap_or_default(), "listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
