mod config;
mod console;

use std::sync::Arc;

use anyhow::{Context, Result};
use boardcast_backend::gateway::{Gateway, HttpGateway};
use boardcast_backend::stream::{RetryPolicy, StreamSupervisor};
use boardcast_backend::DEFAULT_CONNECT_TIMEOUT;
use boardcast_core::app::{BoardcastApp, GlassesApp, SessionInfo};
use boardcast_core::device::{ButtonEvent, Capabilities, PressKind};
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::fmt::time::ChronoLocal;

use crate::config::Config;
use crate::console::{ConsoleDisplay, ConsoleSpeaker};

/// Console runtime for the chess announcement glasses app. Stdin stands in
/// for the hardware button: every line is a press.
#[derive(Parser)]
struct Cli {
    /// User to run the development session as
    #[arg(long, default_value = "console-user")]
    user: String,

    /// Pretend the device has no audio output
    #[arg(long)]
    no_audio: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!(
        package = %config.package_name,
        port = config.port,
        backend = %config.backend_url,
        mode = ?config.delivery_mode,
        "Configuration loaded successfully. Starting glasses service..."
    );
    // SecretString keeps the credential out of the log output.
    tracing::debug!(api_key = ?config.api_key, "platform credential loaded");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 4. Backend Clients ---
    let gateway =
        Arc::new(HttpGateway::new(&config.backend_url).context("Failed to build backend gateway")?);

    // The probe is informational. The service still starts when the backend
    // is down; sessions surface failures per trigger instead.
    match gateway.health().await {
        Ok(health) => tracing::info!(status = %health.status, "backend reachable"),
        Err(e) => tracing::warn!(error = %e, "backend not reachable at startup"),
    }

    let stream_client = reqwest::Client::builder()
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()
        .context("Failed to build event-stream client")?;

    // --- 5. Application Setup ---
    let speaker = Arc::new(ConsoleSpeaker {
        audio_output: !args.no_audio,
    });
    let display = Arc::new(ConsoleDisplay);
    let backend_url = config.backend_url.clone();
    let app = Arc::new(BoardcastApp::new(
        config.delivery_mode,
        gateway,
        move |updates| {
            StreamSupervisor::new(
                &backend_url,
                stream_client.clone(),
                updates,
                RetryPolicy::default(),
            )
        },
        speaker,
        display,
    ));

    // --- 6. Development Session ---
    // One synthetic session standing in for the platform callbacks.
    let session_id = uuid::Uuid::new_v4().to_string();
    let info = SessionInfo {
        session_id: session_id.clone(),
        user_id: args.user.clone(),
        capabilities: Capabilities {
            audio_output: !args.no_audio,
            model: Some("console".to_string()),
        },
    };
    app.on_session(info).await.context("Failed to start session")?;
    tracing::info!("Press Enter to trigger the button, type 'long' for a long press, Ctrl-C to quit");

    let button_app = app.clone();
    let button_session = session_id.clone();
    let stdin_buttons = tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let kind = if line.trim() == "long" {
                PressKind::Long
            } else {
                PressKind::Short
            };
            let press = ButtonEvent {
                id: "primary".to_string(),
                kind,
            };
            if !button_app.route_button(&button_session, press).await {
                break;
            }
        }
    });

    tokio::select! {
        _ = stdin_buttons => {
            tracing::info!("Input closed, shutting down...");
        },
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
        }
    }

    app.on_stop(&session_id, &args.user, "service shutting down")
        .await?;
    Ok(())
}
